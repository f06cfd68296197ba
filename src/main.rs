#![doc(
    html_logo_url = "https://raw.githubusercontent.com/nav-solutions/.github/master/logos/logo2.jpg"
)]
#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

/*
 * PPP-TIMING is part of the nav-solutions framework.
 * Authors: Guillaume W. Bres <guillaume.bressaix@gmail.com> et al,
 * (cf. https://github.com/nav-solutions/ppp-timing/graphs/contributors)
 * This framework is shipped under Mozilla Public V2 license.
 *
 * Documentation: https://github.com/nav-solutions/ppp-timing
 */

use clap::ArgMatches;
use env_logger::{Builder, Target};
use itertools::Itertools;
use log::{error, info, warn};
use serde::Serialize;

use std::path::{Path, PathBuf};

mod cli;
mod clock;
mod coordinate;
mod dataset;
mod error;
mod fd;
mod harvest;
mod runtime;
mod scheme;
mod summary;
mod tier;
mod utils;

use crate::{
    cli::Cli,
    clock::series::ClockSeries,
    coordinate::TimeCoordinate,
    dataset::AppendOutcome,
    error::Error,
    fd::FileDescriptor,
    harvest::{IngestOutcome, harvest, ingest_file},
    runtime::Runtime,
    scheme::{
        FULL_WEEK, FileScheme,
        archive::archive_week,
        search::{daily_files, find_last_daily, find_last_weekly},
    },
    summary::SummaryReport,
    tier::CorrectionTier,
    utils::{format_filesize, numeric_path_cmp},
};

/// Canonical names of one day of a measurement
#[derive(Debug, Serialize)]
struct Names {
    daily_file: String,
    daily_dir: PathBuf,
    daily_archive: String,
    weekly_file: String,
    weekly_archive: String,
    num_files: usize,
    full_week: bool,
    positions: Vec<PathBuf>,
    offsets: Vec<PathBuf>,
}

impl Names {
    fn new(scheme: &FileScheme) -> Self {
        Self {
            daily_file: scheme.daily_file(),
            daily_dir: scheme.daily_dir(),
            daily_archive: scheme.daily_archive(),
            weekly_file: scheme.weekly_file(),
            weekly_archive: scheme.weekly_archive(),
            num_files: scheme.num_files(),
            full_week: scheme.is_full_week(),
            positions: CorrectionTier::ALL
                .iter()
                .map(|tier| scheme.position_path(*tier))
                .collect(),
            offsets: CorrectionTier::ALL
                .iter()
                .map(|tier| scheme.offset_path(*tier))
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DateReport {
    #[serde(flatten)]
    coordinate: TimeCoordinate,
    week_of_year: u16,
    previous_day: Option<TimeCoordinate>,
    names: Option<Names>,
}

fn date(matches: &ArgMatches, runtime: &Runtime) -> Result<(), Error> {
    let t = cli::coordinate(matches, runtime)?;

    let names = match cli::measurement(matches)? {
        Some(root) => Some(Names::new(&FileScheme::observe(&root, t)?)),
        None => None,
    };

    let report = DateReport {
        coordinate: t,
        week_of_year: t.week_of_year(),
        previous_day: t.previous_day(),
        names,
    };

    if cli::json(matches) {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let (year, doy) = t.as_civil();
    println!("date:         {}-{}-{}", t.yyyy(), t.mm(), t.dd());
    println!("day of year:  {} {:03}", year, doy);
    println!("week of year: {:02} (from January 1st)", report.week_of_year);
    println!("gps week:     {}", t.week_str());
    println!("gps dow:      {}", t.dow_str());
    println!("gps days:     {}", t.gps_days_str());

    if let Some(prev) = report.previous_day {
        println!("previous day: {}", prev);
    }

    if let Some(names) = report.names {
        println!("daily file:     {}", names.daily_file);
        println!("daily dir:      {}", names.daily_dir.display());
        println!(
            "daily archive:  {} ({} files{})",
            names.daily_archive,
            names.num_files,
            if names.full_week { ", full week" } else { "" }
        );
        println!("weekly file:    {}", names.weekly_file);
        println!("weekly archive: {}", names.weekly_archive);
        for (pos, offset) in names.positions.iter().zip(names.offsets.iter()) {
            println!("datasets:       {} {}", pos.display(), offset.display());
        }
    }

    Ok(())
}

fn mkdirs(matches: &ArgMatches, runtime: &Runtime) -> Result<(), Error> {
    let root = cli::measurement_path(matches)?;
    let t = runtime.resolve(coordinate::DateSpec::Today)?;
    let scheme = FileScheme::new(&root, t, 0);

    scheme.create_output_dirs()?;

    for dir in scheme.output_dirs() {
        println!("{}", dir.display());
    }
    Ok(())
}

fn daily(matches: &ArgMatches, runtime: &Runtime) -> Result<(), Error> {
    let root = cli::measurement_path(matches)?;
    let t = cli::coordinate(matches, runtime)?;

    if runtime.is_future(&t)? {
        return Err(Error::FutureDate(t.to_string()));
    }

    let scheme = FileScheme::observe(&root, t)?;

    if matches.get_flag("mkdir") {
        let dir = scheme.create_daily_dir()?;
        info!("{} - created {}", runtime.log_time(), dir.display());
    }

    let path = scheme.daily_path();
    if path.exists() {
        warn!("{} - {} already exists", runtime.log_time(), path.display());
    }

    println!("{}", path.display());

    if let Some((receiver, station)) = cli::receiver(matches)? {
        println!(
            "remote: {}{}",
            receiver.remote_dir(&t),
            receiver.remote_file(&t, &station)
        );
        if receiver.needs_conversion() {
            info!(
                "{} - {:?} files need a conversion to RINEX",
                runtime.log_time(),
                receiver
            );
        }
    }

    Ok(())
}

fn last(matches: &ArgMatches) -> Result<(), Error> {
    let root = cli::measurement_path(matches)?;

    match find_last_daily(&root)? {
        Some(t) => {
            let scheme = FileScheme::new(&root, t, 0);
            println!("last daily:  {} ({})", scheme.daily_file(), t);
        },
        None => println!("last daily:  none"),
    }

    match find_last_weekly(&root)? {
        Some(week) => println!("last weekly: week {:04}", week),
        None => println!("last weekly: none"),
    }

    Ok(())
}

fn weekly(matches: &ArgMatches, runtime: &Runtime) -> Result<(), Error> {
    let root = cli::measurement_path(matches)?;
    let week = matches.get_one::<u32>("week").copied().unwrap_or_default();

    let t = TimeCoordinate::from_gps(week, 0)?;
    let scheme = FileScheme::observe(&root, t)?;
    let files = daily_files(&scheme)?;

    for file in files.iter() {
        let size = file.metadata().map(|m| m.len()).unwrap_or_default();
        println!("{} ({})", file.display(), format_filesize(size));
    }

    if files.len() < FULL_WEEK {
        return Err(Error::IncompleteWeek(files.len()));
    }

    info!(
        "{} - week {} complete ({} files)",
        runtime.log_time(),
        t.week_str(),
        files.len()
    );

    println!("weekly:         {}", scheme.weekly_path().display());

    if !matches.get_flag("zip") {
        println!("daily archive:  {}", scheme.daily_archive_path().display());
        println!("weekly archive: {}", scheme.weekly_archive_path().display());
        return Ok(());
    }

    let archives = archive_week(&scheme, &files, matches.get_flag("cleanup"))?;

    println!("daily archive:  {}", archives.daily.display());
    match &archives.weekly {
        Some(weekly) => println!("weekly archive: {}", weekly.display()),
        None => warn!(
            "{} - {} not found, weekly archive skipped",
            runtime.log_time(),
            scheme.weekly_file()
        ),
    }
    if let Some(removed) = &archives.removed {
        println!("removed:        {}", removed.display());
    }
    Ok(())
}

fn phase(matches: &ArgMatches, runtime: &Runtime) -> Result<(), Error> {
    let output = matches
        .get_one::<PathBuf>("output")
        .cloned()
        .unwrap_or_default();
    let gzip = matches.get_flag("gzip");
    let places = cli::places(matches);

    let files = cli::files(matches)
        .into_iter()
        .sorted_by(|a, b| numeric_path_cmp(a, b))
        .collect::<Vec<_>>();

    let series = ClockSeries::from_files(&files)?;

    let Some(stats) = series.stats() else {
        return Err(Error::EmptySeries);
    };

    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut fd = FileDescriptor::create(&output, gzip)?;
    series.write(&mut fd, places, &name, &runtime.created())?;
    fd.finish()?;

    info!(
        "{} - {} epochs from {} to {} written to {}",
        runtime.log_time(),
        stats.epochs,
        stats.start,
        stats.end,
        output.display()
    );

    if stats.missing > 0 {
        warn!(
            "{} - {} epoch(s) missing (tau={:?}s)",
            runtime.log_time(),
            stats.missing,
            stats.tau
        );
    }
    if stats.skipped > 0 || stats.rejected > 0 {
        warn!(
            "{} - {} line(s) skipped, {} epoch(s) rejected",
            runtime.log_time(),
            stats.skipped,
            stats.rejected
        );
    }

    Ok(())
}

fn summary(matches: &ArgMatches) -> Result<(), Error> {
    let path = matches
        .get_one::<PathBuf>("file")
        .cloned()
        .unwrap_or_default();

    let report = SummaryReport::from_file(&path)?;

    if cli::json(matches) {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("tier:     {} ({})", report.tier.long_name(), report.tier.code());
    println!("end:      {} ({})", report.iso, report.timestamp);
    println!("ecef:     {} {} {}", report.ecef[0], report.ecef[1], report.ecef[2]);
    println!("llh:      {} / {} / {}", report.llh[0], report.llh[1], report.llh[2]);
    println!("offset:   {} {} {}", report.offset1, report.offset2, report.scale);
    Ok(())
}

fn print_ingested(sum: &Path, outcome: &IngestOutcome) {
    let state = |outcome: &AppendOutcome| match outcome {
        AppendOutcome::Appended => "appended".to_string(),
        AppendOutcome::Stale { latest } => format!("stale (latest {})", latest),
    };
    println!(
        "{}: {} position {}, offset {}",
        sum.display(),
        outcome.tier,
        state(&outcome.position),
        state(&outcome.offset)
    );
}

fn ingest(matches: &ArgMatches, runtime: &Runtime) -> Result<(), Error> {
    let root = cli::measurement(matches)?;
    let created = runtime.created();

    for sum in cli::files(matches) {
        let outcome = ingest_file(&sum, root.as_deref(), &created)?;
        print_ingested(&sum, &outcome);
    }
    Ok(())
}

fn harvest_products(matches: &ArgMatches, runtime: &Runtime) -> Result<(), Error> {
    let root = cli::measurement_path(matches)?;
    let products = cli::products(matches).ok_or(Error::MissingField("products"))?;

    let report = harvest(&root, &products, &runtime.created())?;

    for path in report.staged.iter() {
        println!("{}", path.display());
    }
    if let Some(retired) = &report.retired {
        println!("retired: {}", retired.display());
    }
    print_ingested(&products.sum, &report.ingested);
    Ok(())
}

fn run(cli: &Cli, runtime: &Runtime) -> Result<(), Error> {
    match cli.subcommand() {
        Some(("date", matches)) => date(matches, runtime),
        Some(("mkdirs", matches)) => mkdirs(matches, runtime),
        Some(("daily", matches)) => daily(matches, runtime),
        Some(("last", matches)) => last(matches),
        Some(("weekly", matches)) => weekly(matches, runtime),
        Some(("phase", matches)) => phase(matches, runtime),
        Some(("summary", matches)) => summary(matches),
        Some(("ingest", matches)) => ingest(matches, runtime),
        Some(("harvest", matches)) => harvest_products(matches, runtime),
        _ => Ok(()),
    }
}

pub fn main() {
    let mut builder = Builder::from_default_env();

    builder
        .target(Target::Stdout)
        .format_timestamp_secs()
        .format_module_path(false)
        .init();

    let runtime = match Runtime::now() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("failed to determine system time: {}", e);
            std::process::exit(1);
        },
    };

    let cli = Cli::new();

    if let Err(e) = run(&cli, &runtime) {
        error!("{} - {}", runtime.log_time(), e);
        std::process::exit(1);
    }
}
