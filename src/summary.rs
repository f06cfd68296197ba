//! PPP summary report (`.sum`) parser.
//!
//! The report is line labeled and fixed width. Every value we extract is
//! described by one [LAYOUT] entry: the line label, the value it feeds and
//! the [Column] it occupies.
use std::{io::BufRead, path::Path};

use hifitime::prelude::Epoch;
use log::{debug, trace};
use serde::Serialize;

use crate::{
    coordinate::unix_days,
    error::Error,
    fd::open_reader,
    tier::CorrectionTier,
    utils::iso_seconds,
};

/// Location of a value inside a labeled line
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Column {
    /// `width` characters starting at `offset`
    Fixed { offset: usize, width: usize },
    /// Everything from `offset` to the end of line
    Rest { offset: usize },
    /// Last 3 characters preceding the first underscore
    TierCode,
    /// Whitespace separated tokens following the label
    Tokens,
}

impl Column {
    /// Extracts the (trimmed) value from `line`. Short lines are
    /// tolerated like a slice would be: the value is truncated.
    pub fn extract<'a>(&self, line: &'a str) -> Option<&'a str> {
        let value = match self {
            Self::Fixed { offset, width } => {
                let end = (offset + width).min(line.len());
                line.get(*offset..end)?
            },
            Self::Rest { offset } => line.get(*offset..)?,
            Self::TierCode => {
                let (head, _) = line.split_once('_')?;
                let start = head.len().checked_sub(3)?;
                head.get(start..)?
            },
            Self::Tokens => line.split_once(char::is_whitespace)?.1,
        };

        let value = value.trim();
        if value.is_empty() { None } else { Some(value) }
    }
}

/// Values of the report
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Field {
    Tier,
    Now,
    Begin,
    End,
    Interval,
    EcefX,
    EcefY,
    EcefZ,
    Latitude,
    Longitude,
    Height,
    Offset,
}

/// Report format: (label prefix, field, column)
pub const LAYOUT: &[(&str, Field, Column)] = &[
    ("SP3", Field::Tier, Column::TierCode),
    ("NOW", Field::Now, Column::Rest { offset: 4 }),
    ("BEG", Field::Begin, Column::Rest { offset: 4 }),
    ("END", Field::End, Column::Rest { offset: 4 }),
    ("INT", Field::Interval, Column::Rest { offset: 4 }),
    ("POS   X", Field::EcefX, Column::Fixed { offset: 49, width: 13 }),
    ("POS   Y", Field::EcefY, Column::Fixed { offset: 49, width: 13 }),
    ("POS   Z", Field::EcefZ, Column::Fixed { offset: 49, width: 13 }),
    ("POS LAT", Field::Latitude, Column::Fixed { offset: 47, width: 16 }),
    ("POS LON", Field::Longitude, Column::Fixed { offset: 47, width: 16 }),
    ("POS HGT", Field::Height, Column::Fixed { offset: 47, width: 16 }),
    ("OFF", Field::Offset, Column::Tokens),
];

/// Parsed summary report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    /// Correction tier of the solution
    pub tier: CorrectionTier,
    /// Report creation time, as written
    pub now: Option<String>,
    /// First data epoch, fraction removed
    pub begin: Option<String>,
    /// Last data epoch, fraction removed
    pub end: String,
    /// Data interval, as written
    pub interval: Option<String>,
    /// ECEF X, Y, Z (m), as written
    pub ecef: [String; 3],
    /// Latitude, longitude and height, spaces preserved
    pub llh: [String; 3],
    /// Clock offset
    pub offset1: String,
    /// Clock offset uncertainty
    pub offset2: String,
    /// Offset unit
    pub scale: String,
    /// Unix timestamp of the last data epoch
    pub timestamp: i64,
    /// ISO-8601 of the last data epoch
    pub iso: String,
}

/// Removes the fractional seconds, `2022-01-02 23:59:30.00`
fn drop_fraction(value: &str) -> &str {
    match value.rsplit_once('.') {
        Some((whole, _)) => whole,
        None => value,
    }
}

/// `YYYY-MM-DD HH:MM:SS` (UTC) to (unix timestamp, ISO-8601)
fn parse_datetime(value: &str) -> Result<(i64, String), Error> {
    let invalid = || Error::InvalidField {
        field: "END",
        value: value.to_string(),
    };

    let numbers = value
        .split(|c: char| c == '-' || c == ':' || c.is_whitespace() || c == 'T')
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<i32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| invalid())?;

    let [year, month, day, hh, mm, ss] = numbers[..] else {
        return Err(invalid());
    };

    let in_range = |v: i32, max: i32| (0..=max).contains(&v);
    if !in_range(month, 12) || !in_range(day, 31) || !in_range(hh, 23) {
        return Err(invalid());
    }
    if !in_range(mm, 59) || !in_range(ss, 59) {
        return Err(invalid());
    }

    let (month, day, hh, mm, ss) = (month as u8, day as u8, hh as u8, mm as u8, ss as u8);

    Epoch::maybe_from_gregorian_utc(year, month, day, hh, mm, ss, 0).map_err(|_| invalid())?;

    let timestamp = unix_days(year, month, day).map_err(|_| invalid())? * 86_400
        + hh as i64 * 3600
        + mm as i64 * 60
        + ss as i64;

    Ok((timestamp, iso_seconds(year, month, day, hh, mm, ss)))
}

#[derive(Default)]
struct Collected {
    tier: Option<CorrectionTier>,
    now: Option<String>,
    begin: Option<String>,
    end: Option<String>,
    interval: Option<String>,
    ecef: [Option<String>; 3],
    llh: [Option<String>; 3],
    offset: Option<(String, String, String)>,
}

impl Collected {
    fn latch(&mut self, field: Field, value: &str) -> Result<(), Error> {
        match field {
            Field::Tier => self.tier = Some(CorrectionTier::from_code(value)?),
            Field::Now => self.now = Some(value.to_string()),
            Field::Begin => self.begin = Some(drop_fraction(value).to_string()),
            Field::End => self.end = Some(drop_fraction(value).to_string()),
            Field::Interval => self.interval = Some(value.to_string()),
            Field::EcefX => self.ecef[0] = Some(value.to_string()),
            Field::EcefY => self.ecef[1] = Some(value.to_string()),
            Field::EcefZ => self.ecef[2] = Some(value.to_string()),
            Field::Latitude => self.llh[0] = Some(value.to_string()),
            Field::Longitude => self.llh[1] = Some(value.to_string()),
            Field::Height => self.llh[2] = Some(value.to_string()),
            Field::Offset => {
                let tokens = value.split_whitespace().collect::<Vec<_>>();
                let [offset1, offset2, scale] = tokens[..] else {
                    return Err(Error::InvalidField {
                        field: "OFF",
                        value: value.to_string(),
                    });
                };
                self.offset = Some((offset1.to_string(), offset2.to_string(), scale.to_string()));
            },
        }
        Ok(())
    }
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, Error> {
    value.ok_or(Error::MissingField(field))
}

impl SummaryReport {
    /// Parses the report file
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        debug!("parsing {}", path.display());
        let reader = open_reader(path)?;
        Self::parse(reader)
    }

    /// Parses a report. Repeated labels: the last occurrence wins.
    /// An unknown tier code aborts the parsing.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self, Error> {
        let mut collected = Collected::default();

        for line in reader.lines() {
            let line = line?;

            for (label, field, column) in LAYOUT.iter() {
                if !line.starts_with(*label) {
                    continue;
                }
                if let Some(value) = column.extract(&line) {
                    trace!("{:?}: \"{}\"", field, value);
                    collected.latch(*field, value)?;
                }
            }
        }

        let end = required(collected.end, "END")?;
        let (timestamp, iso) = parse_datetime(&end)?;

        let [x, y, z] = collected.ecef;
        let [lat, lon, hgt] = collected.llh;
        let (offset1, offset2, scale) = required(collected.offset, "OFF")?;

        Ok(Self {
            tier: required(collected.tier, "SP3")?,
            now: collected.now,
            begin: collected.begin,
            end,
            interval: collected.interval,
            ecef: [
                required(x, "POS X")?,
                required(y, "POS Y")?,
                required(z, "POS Z")?,
            ],
            llh: [
                required(lat, "POS LAT")?,
                required(lon, "POS LON")?,
                required(hgt, "POS HGT")?,
            ],
            offset1,
            offset2,
            scale,
            timestamp,
            iso,
        })
    }
}
