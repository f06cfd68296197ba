//! Normalized clock offset ("phase") series built from one or more `.clk` files.
use std::{
    io::{BufRead, Write},
    path::{Path, PathBuf},
};

use log::{debug, trace, warn};
use serde::Serialize;

use crate::{
    clock::{ClockEpochRecord, ClockLineError},
    error::Error,
    fd::open_reader,
    utils::format_ddhhmmss,
};

/// Summary statistics of a [ClockSeries]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesStats {
    /// First epoch (ISO-8601)
    pub start: String,
    /// Last epoch (ISO-8601)
    pub end: String,
    /// Last - first epoch (s)
    pub duration: i64,
    /// Sampling interval (s), taken from the first two epochs of the
    /// first file. Unknown with less than two epochs.
    pub tau: Option<i64>,
    /// Number of epochs in the series
    pub epochs: usize,
    /// Number of epochs a uniformly sampled series would hold
    pub expected: i64,
    /// `expected - epochs`. An estimate: it assumes `tau` holds
    /// over the whole series.
    pub missing: i64,
    /// Lines that failed to parse
    pub skipped: usize,
    /// Epochs rejected because not strictly after the previous one
    pub rejected: usize,
}

#[derive(Debug, Default, Clone)]
pub struct ClockSeries {
    /// Input files, in order of consumption
    pub sources: Vec<PathBuf>,
    /// Records, strictly increasing in time
    pub records: Vec<ClockEpochRecord>,
    /// Epochs of the first file, until tau is known
    first_file_epochs: Vec<i64>,
    /// Number of skipped lines
    skipped: usize,
    /// Number of rejected epochs
    rejected: usize,
}

impl ClockSeries {
    /// Builds a [ClockSeries] from files, consumed in the given order.
    /// Callers must sort them beforehand.
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self, Error> {
        let mut series = Self::default();
        for path in paths {
            let path = path.as_ref();
            debug!("consuming {}", path.display());
            let reader = open_reader(path)?;
            series.consume(path, reader)?;
        }
        Ok(series)
    }

    /// Consumes one more input. Malformed lines and epochs that do not move
    /// forward in time are skipped; only I/O errors abort.
    pub fn consume<R: BufRead>(&mut self, source: &Path, reader: R) -> Result<(), Error> {
        let is_first_file = self.sources.is_empty();
        self.sources.push(source.to_path_buf());

        for (nth, line) in reader.lines().enumerate() {
            let line = line?;

            let record = match ClockEpochRecord::parse(&line) {
                Ok(record) => record,
                Err(ClockLineError::NotARecord) => continue,
                Err(e) => {
                    warn!(
                        "{}:{} - {}: bad line \"{}\"",
                        source.display(),
                        nth + 1,
                        e,
                        line.trim_end()
                    );
                    self.skipped += 1;
                    continue;
                },
            };

            if let Some(last) = self.records.last() {
                if record.timestamp <= last.timestamp {
                    warn!(
                        "{}:{} - {} is not after {}: epoch rejected",
                        source.display(),
                        nth + 1,
                        record.iso,
                        last.iso
                    );
                    self.rejected += 1;
                    continue;
                }
            }

            trace!("{} - {:+.3E}", record.iso, record.offset);

            if is_first_file && self.first_file_epochs.len() < 2 {
                self.first_file_epochs.push(record.timestamp);
            }

            self.records.push(record);
        }

        Ok(())
    }

    /// Sampling interval (s), from the first two epochs of the first file
    pub fn tau(&self) -> Option<i64> {
        match self.first_file_epochs.as_slice() {
            [t0, t1] => Some(t1 - t0),
            _ => None,
        }
    }

    /// Statistics, None for an empty series
    pub fn stats(&self) -> Option<SeriesStats> {
        let first = self.records.first()?;
        let last = self.records.last()?;

        let duration = last.timestamp - first.timestamp;
        let epochs = self.records.len();
        let tau = self.tau();

        let expected = match tau {
            Some(tau) if tau > 0 => duration / tau + 1,
            _ => epochs as i64,
        };

        Some(SeriesStats {
            start: first.iso.clone(),
            end: last.iso.clone(),
            duration,
            tau,
            epochs,
            expected,
            missing: expected - epochs as i64,
            skipped: self.skipped,
            rejected: self.rejected,
        })
    }

    /// Provenance header block
    pub fn header(&self, output: &str, created: &str) -> Result<Vec<String>, Error> {
        let stats = self.stats().ok_or(Error::EmptySeries)?;

        let origin = self
            .sources
            .first()
            .and_then(|p| p.parent())
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        let mut lines = vec![
            format!("# --> {} phase", env!("CARGO_PKG_NAME")),
            format!("# Output file: {}", output),
            format!("# Created {} UTC", created),
            format!("# Generated from {}/:", origin),
        ];

        for source in self.sources.iter() {
            let name = source
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            lines.push(format!("#     {}", name));
        }

        lines.push(format!("# Start: {}", stats.start));
        lines.push(format!("# End:   {}", stats.end));

        match stats.tau {
            Some(tau) => lines.push(format!("# Tau: {} seconds", tau)),
            None => lines.push("# Tau: unknown".to_string()),
        }

        lines.push(format!(
            "# Duration: {} ({} seconds)",
            format_ddhhmmss(stats.duration),
            stats.duration
        ));
        lines.push(format!(
            "# Wrote {} lines of data; there should",
            stats.epochs
        ));
        lines.push(format!(
            "# be {} epochs, so {} epochs are missing",
            stats.expected, stats.missing
        ));
        lines.push("#".to_string());

        Ok(lines)
    }

    /// Writes the header block followed by one line per epoch
    pub fn write<W: Write>(
        &self,
        w: &mut W,
        places: usize,
        output: &str,
        created: &str,
    ) -> Result<usize, Error> {
        for line in self.header(output, created)? {
            writeln!(w, "{}", line)?;
        }
        for record in self.records.iter() {
            writeln!(w, "{}", record.format(places))?;
        }
        Ok(self.records.len())
    }
}
