use clap::{Arg, ArgAction, ArgMatches, ColorChoice, Command, value_parser};

use std::{path::PathBuf, str::FromStr};

use crate::{
    clock::DEFAULT_PLACES,
    coordinate::{DateSpec, TimeCoordinate},
    error::Error,
    harvest::Products,
    runtime::Runtime,
    scheme::{FileScheme, receiver::Receiver},
};

pub struct Cli {
    /// Arguments passed by user
    matches: ArgMatches,
}

fn measurement_arg() -> Arg {
    Arg::new("measurement")
        .short('m')
        .long("measurement")
        .value_name("PATH")
        .value_parser(value_parser!(PathBuf))
        .help("Measurement path. Its last component is the measurement name,
which prefixes every file name.")
}

fn date_args() -> [Arg; 2] {
    [
        Arg::new("date1")
            .value_name("DATE1")
            .required(false)
            .help("\"today\", \"yesterday\", a year or a GPS week.
Omitted: today (UTC)."),
        Arg::new("date2")
            .value_name("DATE2")
            .required(false)
            .value_parser(value_parser!(i64))
            .help("Day of year (1-366) when DATE1 is a year,
day of week (0-6, 0 is Sunday) when DATE1 is a GPS week."),
    ]
}

fn json_arg() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("JSON output")
}

impl Cli {
    /// Build new command line interface
    pub fn new() -> Self {
        Self {
            matches: Self::command().get_matches(),
        }
    }

    fn command() -> Command {
        Command::new("ppp-timing")
            .author("Guillaume W. Bres, <guillaume.bressaix@gmail.com>")
            .version(env!("CARGO_PKG_VERSION"))
            .about("GPS timing metrology: file scheme, PPP results and clock series")
            .color(ColorChoice::Always)
            .arg_required_else_help(true)
            .subcommand_required(true)
            .subcommand(
                Command::new("date")
                    .about("Resolve a date and print its GPS and civil coordinates")
                    .args(date_args())
                    .next_help_heading("GPS coordinates")
                    .arg(
                        Arg::new("week")
                            .long("week")
                            .value_name("WEEK")
                            .value_parser(value_parser!(u32))
                            .conflicts_with_all(["date1", "date2"])
                            .help("GPS week. Unlike DATE1, any week is accepted."),
                    )
                    .arg(
                        Arg::new("dow")
                            .long("dow")
                            .value_name("DOW")
                            .requires("week")
                            .value_parser(value_parser!(u8))
                            .help("GPS day of week. Default is 0 (Sunday)."),
                    )
                    .next_help_heading("Output")
                    .arg(
                        measurement_arg()
                            .help("Also print the canonical names of this measurement"),
                    )
                    .arg(json_arg()),
            )
            .subcommand(
                Command::new("mkdirs")
                    .about("Create the weekly and correction tier directories")
                    .arg(measurement_arg().required(true)),
            )
            .subcommand(
                Command::new("daily")
                    .about("Target path of a daily receiver file")
                    .arg(measurement_arg().required(true))
                    .args(date_args())
                    .next_help_heading("Receiver")
                    .arg(
                        Arg::new("receiver")
                            .long("receiver")
                            .short('r')
                            .value_name("mosaic|netrs")
                            .requires("station")
                            .help("Receiver family. Prints the remote directory and file name."),
                    )
                    .arg(
                        Arg::new("station")
                            .long("station")
                            .short('s')
                            .value_name("ID")
                            .requires("receiver")
                            .help("Station identifier used in remote file names"),
                    )
                    .arg(
                        Arg::new("mkdir")
                            .long("mkdir")
                            .action(ArgAction::SetTrue)
                            .help("Create the daily directory"),
                    ),
            )
            .subcommand(
                Command::new("last")
                    .about("Last daily and weekly files of a measurement")
                    .arg(measurement_arg().required(true)),
            )
            .subcommand(
                Command::new("weekly")
                    .about("Daily files of a GPS week and the weekly file they make")
                    .arg(measurement_arg().required(true))
                    .arg(
                        Arg::new("week")
                            .long("week")
                            .short('w')
                            .value_name("WEEK")
                            .required(true)
                            .value_parser(value_parser!(u32))
                            .help("GPS week"),
                    )
                    .next_help_heading("Archiving")
                    .arg(
                        Arg::new("zip")
                            .long("zip")
                            .action(ArgAction::SetTrue)
                            .help("Zip the daily files, and the weekly file when it exists"),
                    )
                    .arg(
                        Arg::new("cleanup")
                            .long("cleanup")
                            .action(ArgAction::SetTrue)
                            .requires("zip")
                            .help("Remove the daily directory once archived"),
                    ),
            )
            .subcommand(
                Command::new("phase")
                    .about("Normalized clock offset series from clock records")
                    .arg(
                        Arg::new("output")
                            .short('o')
                            .long("output")
                            .value_name("FILE")
                            .required(true)
                            .value_parser(value_parser!(PathBuf))
                            .help("Output file"),
                    )
                    .arg(
                        Arg::new("files")
                            .value_name("CLK")
                            .required(true)
                            .action(ArgAction::Append)
                            .value_parser(value_parser!(PathBuf))
                            .help("Clock record files. Consumed in numeric order of the
digits embedded in their names. Files terminated by '.gz' are decompressed."),
                    )
                    .arg(
                        Arg::new("gzip")
                            .long("gzip")
                            .action(ArgAction::SetTrue)
                            .help("Gzip compressed output"),
                    )
                    .arg(
                        Arg::new("places")
                            .long("places")
                            .value_name("N")
                            .value_parser(value_parser!(usize))
                            .help("Decimal places of the offsets. Default is 12 (picosecond)."),
                    ),
            )
            .subcommand(
                Command::new("summary")
                    .about("Parse a PPP summary report")
                    .arg(
                        Arg::new("file")
                            .value_name("SUM")
                            .required(true)
                            .value_parser(value_parser!(PathBuf)),
                    )
                    .arg(json_arg()),
            )
            .subcommand(
                Command::new("ingest")
                    .about("Append PPP summary reports to the position and offset datasets")
                    .arg(measurement_arg().help(
                        "Measurement path. Deduced from the location of each report when omitted.",
                    ))
                    .arg(
                        Arg::new("files")
                            .value_name("SUM")
                            .required(true)
                            .action(ArgAction::Append)
                            .value_parser(value_parser!(PathBuf)),
                    ),
            )
            .subcommand(
                Command::new("harvest")
                    .about("Stage PPP results of a weekly file, then ingest them")
                    .arg(measurement_arg().required(true))
                    .arg(
                        Arg::new("input")
                            .long("input")
                            .short('i')
                            .value_name("OBS")
                            .required(true)
                            .value_parser(value_parser!(PathBuf))
                            .help("Weekly file that was submitted"),
                    )
                    .arg(
                        Arg::new("sum")
                            .long("sum")
                            .value_name("SUM")
                            .required(true)
                            .value_parser(value_parser!(PathBuf))
                            .help("Summary report"),
                    )
                    .arg(
                        Arg::new("clk")
                            .long("clk")
                            .value_name("CLK")
                            .required(true)
                            .value_parser(value_parser!(PathBuf))
                            .help("Clock records"),
                    )
                    .arg(
                        Arg::new("zip")
                            .long("zip")
                            .value_name("ZIP")
                            .value_parser(value_parser!(PathBuf))
                            .help("Complete result archive"),
                    ),
            )
    }

    /// Selected subcommand
    pub fn subcommand(&self) -> Option<(&str, &ArgMatches)> {
        self.matches.subcommand()
    }
}

/// Absolute measurement path, if one was passed
pub fn measurement(matches: &ArgMatches) -> Result<Option<PathBuf>, Error> {
    matches
        .get_one::<PathBuf>("measurement")
        .map(|path| FileScheme::measurement_root(path))
        .transpose()
}

/// Measurement path of subcommands that require one
pub fn measurement_path(matches: &ArgMatches) -> Result<PathBuf, Error> {
    measurement(matches)?.ok_or(Error::MeasurementPath(String::new()))
}

pub fn json(matches: &ArgMatches) -> bool {
    matches.get_flag("json")
}

/// [DateSpec] from the positional arguments
pub fn date_spec(matches: &ArgMatches) -> Result<DateSpec, Error> {
    let date2 = matches.get_one::<i64>("date2").copied();

    match matches.get_one::<String>("date1") {
        None => Ok(DateSpec::Pair(0, 0)),
        Some(date1) => match DateSpec::from_str(date1)? {
            DateSpec::Pair(date1, _) => Ok(DateSpec::Pair(date1, date2.unwrap_or(0))),
            other => Ok(other),
        },
    }
}

/// Designated day. Explicit `--week` bypasses date resolution.
pub fn coordinate(matches: &ArgMatches, runtime: &Runtime) -> Result<TimeCoordinate, Error> {
    let week = matches
        .try_get_one::<u32>("week")
        .ok()
        .flatten()
        .copied();

    match week {
        Some(week) => {
            let dow = matches.get_one::<u8>("dow").copied().unwrap_or(0);
            TimeCoordinate::from_gps(week, dow)
        },
        None => runtime.resolve(date_spec(matches)?),
    }
}

pub fn receiver(matches: &ArgMatches) -> Result<Option<(Receiver, String)>, Error> {
    let Some(receiver) = matches.get_one::<String>("receiver") else {
        return Ok(None);
    };
    let station = matches
        .get_one::<String>("station")
        .cloned()
        .unwrap_or_default();
    Ok(Some((Receiver::from_str(receiver)?, station)))
}

pub fn files(matches: &ArgMatches) -> Vec<PathBuf> {
    matches
        .get_many::<PathBuf>("files")
        .map(|files| files.cloned().collect())
        .unwrap_or_default()
}

pub fn places(matches: &ArgMatches) -> usize {
    matches
        .get_one::<usize>("places")
        .copied()
        .unwrap_or(DEFAULT_PLACES)
}

pub fn products(matches: &ArgMatches) -> Option<Products> {
    Some(Products {
        input: matches.get_one::<PathBuf>("input")?.clone(),
        sum: matches.get_one::<PathBuf>("sum")?.clone(),
        clk: matches.get_one::<PathBuf>("clk")?.clone(),
        zip: matches.get_one::<PathBuf>("zip").cloned(),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use hifitime::prelude::Epoch;

    fn matches(args: &[&str]) -> ArgMatches {
        let matches = Cli::command().try_get_matches_from(args).unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        sub.clone()
    }

    #[test]
    fn command_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn date_resolution() {
        let rt = Runtime::new(Epoch::from_gregorian_utc_at_midnight(2022, 1, 5));

        let m = matches(&["ppp-timing", "date"]);
        assert_eq!(date_spec(&m).unwrap(), DateSpec::Pair(0, 0));
        assert_eq!(coordinate(&m, &rt).unwrap().as_gps(), (2191, 3));

        let m = matches(&["ppp-timing", "date", "yesterday"]);
        assert_eq!(coordinate(&m, &rt).unwrap().as_gps(), (2191, 2));

        let m = matches(&["ppp-timing", "date", "2022", "8"]);
        assert_eq!(coordinate(&m, &rt).unwrap().as_gps(), (2191, 6));

        let m = matches(&["ppp-timing", "date", "2200", "3"]);
        assert_eq!(coordinate(&m, &rt).unwrap().as_gps(), (2200, 3));

        let m = matches(&["ppp-timing", "date", "--week", "100", "--dow", "2"]);
        assert_eq!(coordinate(&m, &rt).unwrap().as_gps(), (100, 2));

        let m = matches(&["ppp-timing", "date", "1979", "8"]);
        assert!(coordinate(&m, &rt).is_err());

        let m = matches(&["ppp-timing", "date", "tomorrow"]);
        assert!(coordinate(&m, &rt).is_err());
    }

    #[test]
    fn subcommand_arguments() {
        let m = matches(&["ppp-timing", "phase", "-o", "out.txt", "b.clk", "a.clk", "--gzip"]);
        assert_eq!(files(&m), vec![PathBuf::from("b.clk"), PathBuf::from("a.clk")]);
        assert_eq!(places(&m), DEFAULT_PLACES);
        assert!(m.get_flag("gzip"));

        let m = matches(&[
            "ppp-timing", "daily", "-m", "/data/SITE", "2022", "38", "-r", "netrs", "-s", "ABCD",
        ]);
        assert_eq!(measurement(&m).unwrap(), Some(PathBuf::from("/data/SITE")));
        let (rx, station) = receiver(&m).unwrap().unwrap();
        assert_eq!(rx, Receiver::NetRs);
        assert_eq!(station, "ABCD");

        let m = matches(&[
            "ppp-timing", "harvest", "-m", "/data/SITE", "-i", "w.obs", "--sum", "r.sum", "--clk",
            "r.clk",
        ]);
        let products = products(&m).unwrap();
        assert_eq!(products.input, PathBuf::from("w.obs"));
        assert!(products.zip.is_none());

        let m = matches(&["ppp-timing", "weekly", "-m", "/data/SITE", "-w", "2200", "--zip"]);
        assert!(m.get_flag("zip"));
        assert!(!m.get_flag("cleanup"));
        assert!(
            Cli::command()
                .try_get_matches_from(["ppp-timing", "weekly", "-m", "x", "-w", "1", "--cleanup"])
                .is_err()
        );

        let m = matches(&["ppp-timing", "last", "-m", "/data/SITE/.."]);
        assert_eq!(measurement_path(&m).unwrap(), PathBuf::from("/data"));

        let m = matches(&["ppp-timing", "last", "-m", "/"]);
        assert!(matches!(measurement_path(&m), Err(Error::MeasurementPath(_))));

        let m = matches(&["ppp-timing", "date"]);
        assert_eq!(measurement(&m).unwrap(), None);

        assert!(
            Cli::command()
                .try_get_matches_from(["ppp-timing", "daily", "-m", "x", "-r", "mosaic"])
                .is_err()
        );
    }
}
