use hifitime::prelude::{Duration, Epoch, TimeScale};

use crate::{
    coordinate::{DateSpec, TimeCoordinate},
    error::Error,
    utils::epoch_iso,
};

/// Process wide state: the instant we were deployed at.
/// Every decision involving "now" reads it from here.
#[derive(Debug, Copy, Clone)]
pub struct Runtime {
    /// Deployment [Epoch], in UTC
    t_utc: Epoch,
}

impl Runtime {
    pub fn new(epoch: Epoch) -> Self {
        Self {
            t_utc: epoch.to_time_scale(TimeScale::UTC),
        }
    }

    /// Captures the system time
    pub fn now() -> Result<Self, Error> {
        Ok(Self::new(Epoch::now()?))
    }

    /// Returns current epoch in [TimeScale::UTC]
    pub fn utc_time(&self) -> Epoch {
        self.t_utc
    }

    /// Rounded [Self::utc_time], for log prefixes
    pub fn log_time(&self) -> Epoch {
        self.utc_time().round(Duration::from_seconds(1.0))
    }

    /// Resolves a [DateSpec] against the deployment time
    pub fn resolve(&self, spec: DateSpec) -> Result<TimeCoordinate, Error> {
        TimeCoordinate::resolve(spec, self.t_utc)
    }

    /// True if `t` designates a day that has not started yet
    pub fn is_future(&self, t: &TimeCoordinate) -> Result<bool, Error> {
        Ok(t.epoch()? > self.t_utc)
    }

    /// Creation stamp written in file headers (ISO-8601, UTC)
    pub fn created(&self) -> String {
        epoch_iso(self.t_utc)
    }
}

#[cfg(test)]
mod test {
    use super::Runtime;
    use crate::coordinate::{DateSpec, TimeCoordinate};
    use hifitime::prelude::Epoch;

    #[test]
    fn fixed_instant() {
        let rt = Runtime::new(Epoch::from_gregorian_utc(2022, 1, 5, 13, 45, 12, 500_000_000));
        assert_eq!(rt.created(), "2022-01-05T13:45:12");

        let today = rt.resolve(DateSpec::Today).unwrap();
        assert_eq!(today.as_gps(), (2191, 3));
        assert!(!rt.is_future(&today).unwrap());

        let yesterday = rt.resolve(DateSpec::Yesterday).unwrap();
        assert_eq!(yesterday.as_gps(), (2191, 2));

        let tomorrow = TimeCoordinate::from_gps(2191, 4).unwrap();
        assert!(rt.is_future(&tomorrow).unwrap());
    }
}
