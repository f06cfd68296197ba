//! GPS week / civil calendar coordinates.
//!
//! A [TimeCoordinate] is built either from a civil (year, day of year) pair
//! or from a (GPS week, day of week) pair. Whichever side is supplied, the
//! other one is derived from the same absolute day index, counted from the
//! GPS epoch (1980-01-06, a Sunday).
use hifitime::prelude::{Duration, Epoch};
use serde::Serialize;

use crate::error::Error;

/// GPS epoch, as (year, month, day)
const GPS_EPOCH: (i32, u8, u8) = (1980, 1, 6);

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Minimal week number accepted when a raw pair is interpreted as GPS week/dow.
const MIN_RESOLVED_GPS_WEEK: i64 = 2100;

/// Last civil year of the coordinate domain
pub const MAX_YEAR: i32 = 9999;

/// GPS day index of 9999-12-31, the last day of the domain
pub const MAX_GPS_DAYS: u32 = 2_929_239;

fn midnight(year: i32, month: u8, day: u8) -> Result<Epoch, Error> {
    Ok(Epoch::maybe_from_gregorian_utc(year, month, day, 0, 0, 0, 0)?)
}

/// Whole days from `t0` to `t1`. Both are civil midnights, so the
/// rounding absorbs any leap second in between.
fn days_between(t0: Epoch, t1: Epoch) -> i64 {
    ((t1 - t0).to_seconds() / SECONDS_PER_DAY).round() as i64
}

fn gps_epoch() -> Result<Epoch, Error> {
    midnight(GPS_EPOCH.0, GPS_EPOCH.1, GPS_EPOCH.2)
}

/// Number of days in civil `year`
pub fn days_in_year(year: i32) -> Result<u16, Error> {
    let next = year
        .checked_add(1)
        .ok_or(Error::InvalidCoordinate(year as i64, 0))?;
    Ok(days_between(midnight(year, 1, 1)?, midnight(next, 1, 1)?) as u16)
}

/// 1-based day of year of a civil date
pub fn day_of_year(year: i32, month: u8, day: u8) -> Result<u16, Error> {
    Ok(days_between(midnight(year, 1, 1)?, midnight(year, month, day)?) as u16 + 1)
}

/// Days elapsed since 1970-01-01 for a civil date
pub fn unix_days(year: i32, month: u8, day: u8) -> Result<i64, Error> {
    Ok(days_between(midnight(1970, 1, 1)?, midnight(year, month, day)?))
}

/// How a caller designates the day to process
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DateSpec {
    Today,
    Yesterday,
    /// Raw pair: either (year, day of year) or (gps week, day of week)
    Pair(i64, i64),
}

impl std::str::FromStr for DateSpec {
    type Err = Error;

    /// Parses the first date argument. A numeric value is only half
    /// of a [DateSpec::Pair]; the second member defaults to 0.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().to_lowercase();
        match trimmed.as_str() {
            "today" | "now" => Ok(Self::Today),
            "yesterday" => Ok(Self::Yesterday),
            _ => {
                let value = trimmed
                    .parse::<i64>()
                    .map_err(|_| Error::InvalidCoordinate(0, 0))?;
                Ok(Self::Pair(value, 0))
            },
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TimeCoordinate {
    /// Days elapsed since the GPS epoch
    pub gps_days: u32,
    /// GPS week
    pub gps_week: u32,
    /// GPS day of week, 0 = Sunday
    pub gps_dow: u8,
    /// Civil year
    pub year: i32,
    /// Civil day of year (1-based)
    pub day_of_year: u16,
    /// Civil month (1-based)
    pub month: u8,
    /// Civil day of month (1-based)
    pub day: u8,
}

impl TimeCoordinate {
    /// Builds a [TimeCoordinate] from the absolute GPS day index,
    /// up to [MAX_GPS_DAYS]. Every other constructor funnels through here.
    pub fn from_gps_days(gps_days: u32) -> Result<Self, Error> {
        if gps_days > MAX_GPS_DAYS {
            return Err(Error::InvalidCoordinate(
                (gps_days / 7) as i64,
                (gps_days % 7) as i64,
            ));
        }

        // noon avoids landing on the wrong side of midnight
        // when leap seconds sit between the two instants
        let t = gps_epoch()? + Duration::from_days(gps_days as f64) + Duration::from_hours(12.0);
        let (year, month, day, _, _, _, _) = t.to_gregorian_utc();

        Ok(Self {
            gps_days,
            gps_week: gps_days / 7,
            gps_dow: (gps_days % 7) as u8,
            year,
            month,
            day,
            day_of_year: day_of_year(year, month, day)?,
        })
    }

    /// Builds a [TimeCoordinate] from a civil year (1980..=[MAX_YEAR])
    /// and 1-based day of year.
    pub fn from_civil(year: i32, doy: u16) -> Result<Self, Error> {
        let invalid = Error::InvalidCoordinate(year as i64, doy as i64);

        if !(GPS_EPOCH.0..=MAX_YEAR).contains(&year) || doy == 0 || doy > days_in_year(year)? {
            return Err(invalid);
        }

        let days = days_between(gps_epoch()?, midnight(year, 1, 1)?) + doy as i64 - 1;

        let days = u32::try_from(days).map_err(|_| invalid)?;
        Self::from_gps_days(days)
    }

    /// Builds a [TimeCoordinate] from a GPS week and day of week (0 = Sunday).
    pub fn from_gps(week: u32, dow: u8) -> Result<Self, Error> {
        if dow > 6 {
            return Err(Error::InvalidCoordinate(week as i64, dow as i64));
        }
        let days = week
            .checked_mul(7)
            .and_then(|days| days.checked_add(dow as u32))
            .ok_or(Error::InvalidCoordinate(week as i64, dow as i64))?;
        Self::from_gps_days(days)
    }

    /// Civil day containing `t` (UTC)
    pub fn from_epoch(t: Epoch) -> Result<Self, Error> {
        let (year, month, day, _, _, _, _) = t.to_gregorian_utc();
        Self::from_civil(year, day_of_year(year, month, day)?)
    }

    /// Resolves a [DateSpec] against `now`, the current UTC instant.
    ///
    /// A raw pair is checked as (gps week, day of week) first: week beyond
    /// 2100 and day in 0..=6. Then as (year, day of year): year from 1980 on
    /// and day in 1..=366. (0, 0) designates `now`. Both interpretations
    /// stop at [MAX_YEAR].
    pub fn resolve(spec: DateSpec, now: Epoch) -> Result<Self, Error> {
        match spec {
            DateSpec::Today | DateSpec::Pair(0, 0) => Self::from_epoch(now),
            DateSpec::Yesterday => Self::from_epoch(now - Duration::from_days(1.0)),
            DateSpec::Pair(date_1, date_2) => {
                if date_1 > MIN_RESOLVED_GPS_WEEK && (0..=6).contains(&date_2) {
                    let week = u32::try_from(date_1)
                        .map_err(|_| Error::InvalidCoordinate(date_1, date_2))?;
                    Self::from_gps(week, date_2 as u8)
                } else if date_1 >= GPS_EPOCH.0 as i64 && (1..=366).contains(&date_2) {
                    let year = i32::try_from(date_1)
                        .map_err(|_| Error::InvalidCoordinate(date_1, date_2))?;
                    Self::from_civil(year, date_2 as u16)
                } else {
                    Err(Error::InvalidCoordinate(date_1, date_2))
                }
            },
        }
    }

    /// (gps week, day of week)
    pub fn as_gps(&self) -> (u32, u8) {
        (self.gps_week, self.gps_dow)
    }

    /// (year, day of year)
    pub fn as_civil(&self) -> (i32, u16) {
        (self.year, self.day_of_year)
    }

    /// Previous day. Walks the GPS day index, so it wraps
    /// weeks and years correctly.
    pub fn previous_day(&self) -> Option<Self> {
        let days = self.gps_days.checked_sub(1)?;
        Self::from_gps_days(days).ok()
    }

    /// Week counted from January 1st: `floor(doy / 7) + 1`.
    /// This is a display field and it is NOT the ISO-8601 week number.
    pub fn week_of_year(&self) -> u16 {
        self.day_of_year / 7 + 1
    }

    /// Midnight UTC of this day
    pub fn epoch(&self) -> Result<Epoch, Error> {
        midnight(self.year, self.month, self.day)
    }

    pub fn yyyy(&self) -> String {
        format!("{:04}", self.year)
    }

    pub fn yy(&self) -> String {
        format!("{:02}", self.year.rem_euclid(100))
    }

    pub fn ddd(&self) -> String {
        format!("{:03}", self.day_of_year)
    }

    pub fn mm(&self) -> String {
        format!("{:02}", self.month)
    }

    pub fn dd(&self) -> String {
        format!("{:02}", self.day)
    }

    pub fn week_str(&self) -> String {
        format!("{:04}", self.gps_week)
    }

    pub fn dow_str(&self) -> String {
        format!("{:02}", self.gps_dow)
    }

    pub fn gps_days_str(&self) -> String {
        format!("{:05}", self.gps_days)
    }
}

impl std::fmt::Display for TimeCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{:03} (gps week {:04} day {})",
            self.year, self.day_of_year, self.gps_week, self.gps_dow
        )
    }
}

#[cfg(test)]
mod test {
    use super::{
        DateSpec, MAX_GPS_DAYS, MAX_YEAR, TimeCoordinate, day_of_year, days_in_year, unix_days,
    };
    use crate::error::Error;
    use hifitime::prelude::Epoch;
    use std::str::FromStr;

    #[test]
    fn gps_epoch_anchor() {
        let t = TimeCoordinate::from_civil(1980, 6).unwrap();
        assert_eq!(t.gps_week, 0);
        assert_eq!(t.gps_dow, 0);
        assert_eq!(t.gps_days, 0);
        assert_eq!((t.month, t.day), (1, 6));
    }

    #[test]
    fn before_gps_epoch() {
        assert!(TimeCoordinate::from_civil(1980, 5).is_err());
        assert!(TimeCoordinate::from_civil(1979, 200).is_err());
    }

    #[test]
    fn known_dates() {
        // 2022-01-02 was the first day of gps week 2191
        let t = TimeCoordinate::from_civil(2022, 2).unwrap();
        assert_eq!(t.as_gps(), (2191, 0));

        // 2024-12-31, leap year
        let t = TimeCoordinate::from_civil(2024, 366).unwrap();
        assert_eq!((t.month, t.day), (12, 31));
        assert_eq!(t.as_gps(), (2347, 2));

        let t = TimeCoordinate::from_gps(2191, 6).unwrap();
        assert_eq!(t.as_civil(), (2022, 8));
    }

    #[test]
    fn round_trip() {
        for year in [1980, 1999, 2000, 2016, 2017, 2023, 2024, 2037] {
            let first = if year == 1980 { 6 } else { 1 };
            for doy in first..=days_in_year(year).unwrap() {
                let t = TimeCoordinate::from_civil(year, doy).unwrap();
                let (week, dow) = t.as_gps();
                assert_eq!(TimeCoordinate::from_gps(week, dow).unwrap(), t);
                assert_eq!(t.gps_days, t.gps_week * 7 + t.gps_dow as u32);
                assert_eq!(t.as_civil(), (year, doy));
            }
        }
    }

    #[test]
    fn consecutive_days() {
        let mut t = TimeCoordinate::from_civil(2016, 360).unwrap();
        for _ in 0..20 {
            let next = TimeCoordinate::from_gps_days(t.gps_days + 1).unwrap();
            assert_eq!(next.previous_day(), Some(t));
            t = next;
        }
        assert_eq!(t.as_civil(), (2017, 14));
    }

    #[test]
    fn previous_day_wraps_year() {
        let t = TimeCoordinate::from_civil(2023, 1).unwrap();
        let prev = t.previous_day().unwrap();
        assert_eq!(prev.as_civil(), (2022, 365));
        let first = TimeCoordinate::from_gps_days(0).unwrap();
        assert!(first.previous_day().is_none());
    }

    #[test]
    fn invalid_day() {
        assert!(TimeCoordinate::from_civil(2023, 366).is_err());
        assert!(TimeCoordinate::from_civil(2023, 0).is_err());
        assert!(TimeCoordinate::from_gps(2200, 7).is_err());
    }

    #[test]
    fn week_of_year_is_not_iso() {
        let t = TimeCoordinate::from_civil(2022, 6).unwrap();
        assert_eq!(t.week_of_year(), 1);
        let t = TimeCoordinate::from_civil(2022, 7).unwrap();
        assert_eq!(t.week_of_year(), 2);
    }

    #[test]
    fn calendar_helpers() {
        assert_eq!(days_in_year(2023).unwrap(), 365);
        assert_eq!(days_in_year(2024).unwrap(), 366);
        assert_eq!(days_in_year(2000).unwrap(), 366);
        assert_eq!(days_in_year(2100).unwrap(), 365);
        assert_eq!(day_of_year(2024, 3, 1).unwrap(), 61);
        assert_eq!(unix_days(1970, 1, 1).unwrap(), 0);
        assert_eq!(unix_days(2022, 1, 2).unwrap(), 18994);
        assert!(days_in_year(i32::MAX).is_err());
        assert!(unix_days(2023, 2, 29).is_err());
    }

    #[test]
    fn formatted_fields() {
        let t = TimeCoordinate::from_civil(2022, 8).unwrap();
        assert_eq!(t.yyyy(), "2022");
        assert_eq!(t.yy(), "22");
        assert_eq!(t.ddd(), "008");
        assert_eq!(t.mm(), "01");
        assert_eq!(t.dd(), "08");
        assert_eq!(t.week_str(), "2191");
        assert_eq!(t.dow_str(), "06");
        assert_eq!(t.gps_days_str(), "15343");
    }

    #[test]
    fn resolution() {
        let now = Epoch::from_gregorian_utc(2022, 1, 5, 13, 45, 0, 0);

        let today = TimeCoordinate::resolve(DateSpec::Today, now).unwrap();
        assert_eq!(today.as_civil(), (2022, 5));

        let zero = TimeCoordinate::resolve(DateSpec::Pair(0, 0), now).unwrap();
        assert_eq!(zero, today);

        let yesterday = TimeCoordinate::resolve(DateSpec::Yesterday, now).unwrap();
        assert_eq!(yesterday.as_civil(), (2022, 4));

        let gps = TimeCoordinate::resolve(DateSpec::Pair(2191, 3), now).unwrap();
        assert_eq!(gps, today);

        let civil = TimeCoordinate::resolve(DateSpec::Pair(2022, 5), now).unwrap();
        assert_eq!(civil, today);

        let invalid = [
            (1970, 100),
            (2022, 400),
            (1500, 3),
            (2022, 0),
            (-1, 2),
            (i32::MAX as i64, 100),
            (10_000, 100),
            (600_000_000, 3),
            (i64::MAX, 3),
        ];

        for (d1, d2) in invalid {
            match TimeCoordinate::resolve(DateSpec::Pair(d1, d2), now) {
                Err(Error::InvalidCoordinate(a, b)) => assert_eq!((a, b), (d1, d2)),
                other => panic!("({}, {}) should be invalid, got {:?}", d1, d2, other),
            }
        }
    }

    #[test]
    fn domain_upper_bound() {
        let last = TimeCoordinate::from_civil(MAX_YEAR, 365).unwrap();
        assert_eq!(last.gps_days, MAX_GPS_DAYS);
        assert_eq!((last.month, last.day), (12, 31));

        let (week, dow) = last.as_gps();
        assert_eq!(TimeCoordinate::from_gps(week, dow).unwrap(), last);
        assert_eq!(TimeCoordinate::from_gps_days(MAX_GPS_DAYS).unwrap(), last);

        assert!(TimeCoordinate::from_civil(MAX_YEAR + 1, 1).is_err());
        assert!(TimeCoordinate::from_civil(i32::MAX, 100).is_err());
        assert!(TimeCoordinate::from_gps_days(MAX_GPS_DAYS + 1).is_err());

        match TimeCoordinate::from_gps(600_000_000, 3) {
            Err(Error::InvalidCoordinate(a, b)) => assert_eq!((a, b), (600_000_000, 3)),
            other => panic!("week 600000000 should be invalid, got {:?}", other),
        }

        let next_week = (MAX_GPS_DAYS + 1) / 7;
        let next_dow = ((MAX_GPS_DAYS + 1) % 7) as u8;
        assert!(TimeCoordinate::from_gps(next_week, next_dow).is_err());
    }

    #[test]
    fn date_spec_parsing() {
        assert_eq!(DateSpec::from_str("Yesterday").unwrap(), DateSpec::Yesterday);
        assert_eq!(DateSpec::from_str("today").unwrap(), DateSpec::Today);
        assert_eq!(DateSpec::from_str("2200").unwrap(), DateSpec::Pair(2200, 0));
        assert!(DateSpec::from_str("tomorrow").is_err());
    }
}
