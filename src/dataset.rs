//! Append only position and offset datasets.
//!
//! One dataset file per measurement, [DatasetKind] and [CorrectionTier].
//! Lines are keyed by their leading unix timestamp, which only grows:
//! an entry that is not strictly newer than the latest one is refused.
use std::{
    fs::{File, OpenOptions},
    io::{BufRead, BufReader, Write},
    path::{Path, PathBuf},
};

use log::{info, warn};

use crate::{error::Error, summary::SummaryReport, tier::CorrectionTier};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DatasetKind {
    Position,
    Offset,
}

impl DatasetKind {
    fn title(&self) -> &'static str {
        match self {
            Self::Position => "# PPP position data (ITRF)",
            Self::Offset => "# PPP clock offset data",
        }
    }

    fn legend(&self) -> &'static str {
        match self {
            Self::Position => {
                "# fields: unix epoch, iso_8601, ecef(x), ecef(y), ecef(z), lat, lon, height"
            },
            Self::Offset => "# fields: unix epoch, iso_8601, offset1, offset2, scale",
        }
    }

    /// 4 line header block
    pub fn header(&self, measurement: &str, tier: CorrectionTier, created: &str) -> [String; 4] {
        [
            self.title().to_string(),
            format!("# measurement: {}", measurement),
            format!(
                "# with {} corrections (file created {} UTC)",
                tier.dir_name(),
                created
            ),
            self.legend().to_string(),
        ]
    }
}

/// Dataset line
pub trait DatasetEntry {
    /// Dataset this entry belongs to
    const KIND: DatasetKind;

    /// Unix timestamp keying this entry
    fn timestamp(&self) -> i64;

    /// Formatted line, without line terminator
    fn format_line(&self) -> String;
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionEntry {
    pub timestamp: i64,
    pub iso: String,
    pub ecef: [String; 3],
    pub llh: [String; 3],
}

impl DatasetEntry for PositionEntry {
    const KIND: DatasetKind = DatasetKind::Position;

    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn format_line(&self) -> String {
        let [x, y, z] = &self.ecef;
        let [lat, lon, hgt] = self.llh.clone().map(|v| v.replace(' ', "_"));
        format!(
            "{} {} {} {} {} {} {} {}",
            self.timestamp, self.iso, x, y, z, lat, lon, hgt
        )
    }
}

impl From<&SummaryReport> for PositionEntry {
    fn from(report: &SummaryReport) -> Self {
        Self {
            timestamp: report.timestamp,
            iso: report.iso.clone(),
            ecef: report.ecef.clone(),
            llh: report.llh.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OffsetEntry {
    pub timestamp: i64,
    pub iso: String,
    pub offset1: String,
    pub offset2: String,
    pub scale: String,
}

impl DatasetEntry for OffsetEntry {
    const KIND: DatasetKind = DatasetKind::Offset;

    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn format_line(&self) -> String {
        format!(
            "{} {} {} {} {}",
            self.timestamp, self.iso, self.offset1, self.offset2, self.scale
        )
    }
}

impl From<&SummaryReport> for OffsetEntry {
    fn from(report: &SummaryReport) -> Self {
        Self {
            timestamp: report.timestamp,
            iso: report.iso.clone(),
            offset1: report.offset1.clone(),
            offset2: report.offset2.clone(),
            scale: report.scale.clone(),
        }
    }
}

/// Result of an append attempt
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    /// Line appended
    Appended,
    /// Entry not newer than the `latest` timestamp already stored.
    /// The file is left untouched.
    Stale { latest: i64 },
}

/// State of an existing dataset file
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct DatasetState {
    /// Header block present
    pub has_header: bool,
    /// Greatest timestamp among data lines
    pub latest: Option<i64>,
    /// Number of data lines
    pub entries: usize,
    /// Number of lines neither header nor data
    pub invalid: usize,
}

/// Dataset file of one measurement, kind and tier
#[derive(Debug, Clone)]
pub struct Dataset {
    path: PathBuf,
    measurement: String,
    tier: CorrectionTier,
}

impl Dataset {
    pub fn new(path: &Path, measurement: &str, tier: CorrectionTier) -> Self {
        Self {
            path: path.to_path_buf(),
            measurement: measurement.to_string(),
            tier,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Scans the file once. A missing file is an empty dataset.
    pub fn state(&self) -> Result<DatasetState, Error> {
        let mut state = DatasetState::default();

        if !self.path.exists() {
            return Ok(state);
        }

        let reader = BufReader::new(File::open(&self.path)?);

        for line in reader.lines() {
            let line = line?;
            if line.starts_with('#') {
                state.has_header = true;
                continue;
            }

            let Some(first) = line.split_whitespace().next() else {
                continue;
            };

            match first.parse::<i64>() {
                Ok(timestamp) => {
                    state.entries += 1;
                    state.latest = Some(state.latest.map_or(timestamp, |t| t.max(timestamp)));
                },
                Err(_) => {
                    warn!("{}: invalid line \"{}\"", self.path.display(), line);
                    state.invalid += 1;
                },
            }
        }

        Ok(state)
    }

    /// Appends `entry` if it is strictly newer than every stored entry.
    /// The file and its header are created on first write. A file holding
    /// invalid lines only is not a dataset and is never written to.
    pub fn append<E: DatasetEntry>(
        &self,
        entry: &E,
        created: &str,
    ) -> Result<AppendOutcome, Error> {
        let state = self.state()?;

        if !state.has_header && state.entries == 0 && state.invalid > 0 {
            return Err(Error::CorruptDataset(self.path.display().to_string()));
        }

        if let Some(latest) = state.latest {
            if entry.timestamp() <= latest {
                warn!(
                    "{}: later data already present ({} <= {})",
                    self.path.display(),
                    entry.timestamp(),
                    latest
                );
                return Ok(AppendOutcome::Stale { latest });
            }
        }

        let mut fd = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        // header goes before the first data line, or never
        if !state.has_header && state.entries == 0 {
            for line in E::KIND.header(&self.measurement, self.tier, created) {
                writeln!(fd, "{}", line)?;
            }
        }

        let line = entry.format_line();
        writeln!(fd, "{}", line)?;
        info!("{}: {}", self.path.display(), line);

        Ok(AppendOutcome::Appended)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::scheme::test::Scratch;
    use std::fs;

    fn offset(timestamp: i64) -> OffsetEntry {
        OffsetEntry {
            timestamp,
            iso: "1970-01-01T00:00:00".to_string(),
            offset1: "-277.3000".to_string(),
            offset2: "0.1666".to_string(),
            scale: "ns".to_string(),
        }
    }

    #[test]
    fn monotonic_appends() {
        let scratch = Scratch::new("dataset-monotonic");
        let path = scratch.path().join("SITE_offset_final.dat");
        let dataset = Dataset::new(&path, "SITE", CorrectionTier::Final);

        assert_eq!(dataset.state().unwrap(), DatasetState::default());

        for t in [100, 200, 300] {
            let outcome = dataset.append(&offset(t), "2022-01-10T00:00:00").unwrap();
            assert_eq!(outcome, AppendOutcome::Appended);
        }

        let before = fs::read_to_string(&path).unwrap();
        let lines = before.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "# PPP clock offset data");
        assert_eq!(lines[1], "# measurement: SITE");
        assert_eq!(
            lines[2],
            "# with final corrections (file created 2022-01-10T00:00:00 UTC)"
        );
        assert!(lines[3].starts_with("# fields: unix epoch"));
        assert_eq!(lines[4], "100 1970-01-01T00:00:00 -277.3000 0.1666 ns");
        assert_eq!(lines.iter().filter(|l| l.starts_with('#')).count(), 4);

        let outcome = dataset.append(&offset(150), "2022-01-11T00:00:00").unwrap();
        assert_eq!(outcome, AppendOutcome::Stale { latest: 300 });

        let outcome = dataset.append(&offset(300), "2022-01-11T00:00:00").unwrap();
        assert_eq!(outcome, AppendOutcome::Stale { latest: 300 });

        let after = fs::read_to_string(&path).unwrap();
        assert_eq!(before, after);

        let state = dataset.state().unwrap();
        assert!(state.has_header);
        assert_eq!(state.entries, 3);
        assert_eq!(state.latest, Some(300));
    }

    #[test]
    fn position_line() {
        let entry = PositionEntry {
            timestamp: 1_641_686_370,
            iso: "2022-01-08T23:59:30".to_string(),
            ecef: [
                "1115268.0231".to_string(),
                "-4843378.7311".to_string(),
                "3983377.9426".to_string(),
            ],
            llh: [
                "38 53 56.12345".to_string(),
                "-77 02 12.34567".to_string(),
                "12.3456".to_string(),
            ],
        };
        assert_eq!(
            entry.format_line(),
            concat!(
                "1641686370 2022-01-08T23:59:30 ",
                "1115268.0231 -4843378.7311 3983377.9426 ",
                "38_53_56.12345 -77_02_12.34567 12.3456"
            )
        );

        let scratch = Scratch::new("dataset-position");
        let path = scratch.path().join("SITE_pos_rapid.dat");
        let dataset = Dataset::new(&path, "SITE", CorrectionTier::Rapid);
        dataset.append(&entry, "2022-01-10T00:00:00").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# PPP position data (ITRF)\n"));
        assert!(content.contains("# with rapid corrections"));
    }

    #[test]
    fn existing_data_without_header() {
        let scratch = Scratch::new("dataset-headerless");
        let path = scratch.path().join("SITE_offset_ultra.dat");
        fs::write(&path, "500 x 1 2 ns\n\n400 x 1 2 ns\n").unwrap();

        let dataset = Dataset::new(&path, "SITE", CorrectionTier::Ultra);
        let state = dataset.state().unwrap();
        assert!(!state.has_header);
        assert_eq!(state.latest, Some(500));
        assert_eq!(state.entries, 2);

        assert_eq!(
            dataset.append(&offset(450), "now").unwrap(),
            AppendOutcome::Stale { latest: 500 }
        );
    }

    #[test]
    fn invalid_lines_only() {
        let scratch = Scratch::new("dataset-invalid");
        let path = scratch.path().join("SITE_offset_rapid.dat");
        let garbage = "not a dataset\n\nepoch offset\n";
        fs::write(&path, garbage).unwrap();

        let dataset = Dataset::new(&path, "SITE", CorrectionTier::Rapid);
        let state = dataset.state().unwrap();
        assert!(!state.has_header);
        assert_eq!(state.entries, 0);
        assert_eq!(state.invalid, 2);

        assert!(matches!(
            dataset.append(&offset(100), "now"),
            Err(Error::CorruptDataset(_))
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), garbage);

        // valid data next to invalid lines is still a dataset
        fs::write(&path, "100 x 1 2 ns\nepoch offset\n").unwrap();
        assert_eq!(
            dataset.append(&offset(200), "now").unwrap(),
            AppendOutcome::Appended
        );
        let content = fs::read_to_string(&path).unwrap();
        assert!(!content.contains('#'));
        assert!(content.ends_with("200 1970-01-01T00:00:00 -277.3000 0.1666 ns\n"));
    }
}
