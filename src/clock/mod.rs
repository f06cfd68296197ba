//! Clock offset records, as found in PPP `.clk` products.
//!
//! Data lines start with the `AR` marker:
//!
//! ```text
//! AR SITE 2022 01 02 00 00  0.000000  2   -1.234567890123E-07  1.0E-10
//! ```
//!
//! Fields #2 to #7 are the epoch (the fractional part of the seconds is
//! discarded), field #9 is the clock offset in seconds.
use std::str::FromStr;

use hifitime::prelude::Epoch;
use thiserror::Error;

use crate::{
    coordinate::{day_of_year, unix_days},
    utils::{format_dec, iso_seconds},
};

pub mod series;

/// Marker of clock data lines
pub const RECORD_MARKER: &str = "AR";

/// Default number of decimals of the normalized offsets (picosecond)
pub const DEFAULT_PLACES: usize = 12;

const OFFSET_FIELD: usize = 9;

/// Reasons a clock line is skipped
#[derive(Debug, Error, PartialEq)]
pub enum ClockLineError {
    #[error("not a clock record")]
    NotARecord,
    #[error("missing field #{0}")]
    MissingField(usize),
    #[error("invalid {0} field \"{1}\"")]
    InvalidField(&'static str, String),
    #[error("invalid epoch \"{0}\"")]
    InvalidEpoch(String),
}

/// One normalized clock offset sample
#[derive(Debug, Clone, PartialEq)]
pub struct ClockEpochRecord {
    /// Unix timestamp (s)
    pub timestamp: i64,
    /// Clock offset (s)
    pub offset: f64,
    /// ISO-8601 epoch, seconds resolution
    pub iso: String,
    /// Day of year of the epoch
    pub day_of_year: u16,
}

fn field<'a>(fields: &[&'a str], index: usize) -> Result<&'a str, ClockLineError> {
    fields
        .get(index)
        .copied()
        .ok_or(ClockLineError::MissingField(index))
}

fn parse_field<T: FromStr>(
    fields: &[&str],
    index: usize,
    name: &'static str,
) -> Result<T, ClockLineError> {
    let value = field(fields, index)?;
    value
        .parse::<T>()
        .map_err(|_| ClockLineError::InvalidField(name, value.to_string()))
}

/// Strict ISO-8601 check of a formatted epoch (`YYYY-MM-DDTHH:MM:SS`)
pub fn iso_valid(iso: &str) -> bool {
    iso.len() == 19 && Epoch::from_str(&format!("{} UTC", iso)).is_ok()
}

impl ClockEpochRecord {
    /// True for lines that should be parsed as records
    pub fn is_record(line: &str) -> bool {
        line.starts_with(RECORD_MARKER)
    }

    /// Parses one record line
    pub fn parse(line: &str) -> Result<Self, ClockLineError> {
        if !Self::is_record(line) {
            return Err(ClockLineError::NotARecord);
        }

        let fields = line.split_whitespace().collect::<Vec<_>>();

        let year = parse_field::<i32>(&fields, 2, "year")?;
        let month = parse_field::<u8>(&fields, 3, "month")?;
        let day = parse_field::<u8>(&fields, 4, "day")?;
        let hours = parse_field::<u8>(&fields, 5, "hour")?;
        let minutes = parse_field::<u8>(&fields, 6, "minute")?;

        let seconds = field(&fields, 7)?;
        let whole = seconds.split('.').next().unwrap_or_default();
        let seconds = whole
            .parse::<u8>()
            .map_err(|_| ClockLineError::InvalidField("seconds", seconds.to_string()))?;

        let offset = parse_field::<f64>(&fields, OFFSET_FIELD, "offset")?;

        let iso = iso_seconds(year, month, day, hours, minutes, seconds);

        if seconds > 59
            || Epoch::maybe_from_gregorian_utc(year, month, day, hours, minutes, seconds, 0)
                .is_err()
            || !iso_valid(&iso)
        {
            return Err(ClockLineError::InvalidEpoch(iso));
        }

        let invalid = |_| ClockLineError::InvalidEpoch(iso.clone());

        let timestamp = unix_days(year, month, day).map_err(invalid)? * 86_400
            + hours as i64 * 3600
            + minutes as i64 * 60
            + seconds as i64;

        let day_of_year = day_of_year(year, month, day).map_err(invalid)?;

        Ok(Self {
            timestamp,
            offset,
            iso,
            day_of_year,
        })
    }

    /// Normalized line: `<offset> <iso> <doy>`
    pub fn format(&self, places: usize) -> String {
        format!(
            "{} {} {:03}",
            format_dec(self.offset, places),
            self.iso,
            self.day_of_year
        )
    }
}
