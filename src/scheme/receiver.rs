use crate::{coordinate::TimeCoordinate, error::Error};

/// Remote receiver families, which store their daily
/// files under different naming conventions
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Receiver {
    /// Septentrio Mosaic: RINEX observation files
    Mosaic,
    /// Trimble NetRS: raw `.T00` files
    NetRs,
}

impl std::str::FromStr for Receiver {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mosaic" => Ok(Self::Mosaic),
            "netrs" => Ok(Self::NetRs),
            other => Err(Error::InvalidField {
                field: "receiver",
                value: other.to_string(),
            }),
        }
    }
}

impl Receiver {
    /// Remote directory holding the daily file
    pub fn remote_dir(&self, t: &TimeCoordinate) -> String {
        match self {
            Self::Mosaic => format!("DSK1/SSN/GRB0051/{}{}/", t.yy(), t.ddd()),
            Self::NetRs => format!("{}{}/", t.yyyy(), t.mm()),
        }
    }

    /// Remote daily file name
    pub fn remote_file(&self, t: &TimeCoordinate, station: &str) -> String {
        match self {
            Self::Mosaic => format!("{}{}0.{}o", station, t.ddd(), t.yy()),
            Self::NetRs => format!("{}{}{}{}0000a.T00", station, t.yyyy(), t.mm(), t.dd()),
        }
    }

    /// True if the remote file needs an external conversion to RINEX
    pub fn needs_conversion(&self) -> bool {
        matches!(self, Self::NetRs)
    }
}

#[cfg(test)]
mod test {
    use super::Receiver;
    use crate::coordinate::TimeCoordinate;
    use std::str::FromStr;

    #[test]
    fn remote_names() {
        let t = TimeCoordinate::from_civil(2022, 38).unwrap();

        let rx = Receiver::from_str("mosaic").unwrap();
        assert_eq!(rx.remote_dir(&t), "DSK1/SSN/GRB0051/22038/");
        assert_eq!(rx.remote_file(&t, "abcd"), "abcd0380.22o");
        assert!(!rx.needs_conversion());

        let rx = Receiver::from_str("NetRS").unwrap();
        assert_eq!(rx.remote_dir(&t), "202202/");
        assert_eq!(rx.remote_file(&t, "ABCD"), "ABCD202202070000a.T00");
        assert!(rx.needs_conversion());

        assert!(Receiver::from_str("ublox").is_err());
    }
}
