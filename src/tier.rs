use serde::Serialize;

use crate::error::Error;

/// Quality class of a PPP solution.
/// Ordering follows quality:
/// [CorrectionTier::Ultra] < [CorrectionTier::Rapid] < [CorrectionTier::Final].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrectionTier {
    /// Ultra-rapid orbits and clocks
    Ultra,
    /// Rapid orbits and clocks
    Rapid,
    /// Final orbits and clocks
    Final,
}

impl CorrectionTier {
    /// All tiers, by increasing quality
    pub const ALL: [Self; 3] = [Self::Ultra, Self::Rapid, Self::Final];

    /// Decodes the 3 letter code found in summary reports
    pub fn from_code(code: &str) -> Result<Self, Error> {
        match code.trim() {
            "ULT" => Ok(Self::Ultra),
            "RAP" => Ok(Self::Rapid),
            "FIN" => Ok(Self::Final),
            other => Err(Error::UnknownTier(other.to_string())),
        }
    }

    /// 3 letter code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Ultra => "ULT",
            Self::Rapid => "RAP",
            Self::Final => "FIN",
        }
    }

    /// Name of this tier's subtree in the measurement path
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Ultra => "ultra",
            Self::Rapid => "rapid",
            Self::Final => "final",
        }
    }

    /// Name used in staged product files and dataset headers
    pub fn long_name(&self) -> &'static str {
        match self {
            Self::Ultra => "ultra-rapid",
            Self::Rapid => "rapid",
            Self::Final => "final",
        }
    }

    /// True when no better solution can be expected: inputs
    /// consumed at this tier are retired rather than resubmitted.
    pub fn retires_input(&self) -> bool {
        *self == Self::Final
    }
}

impl std::fmt::Display for CorrectionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

#[cfg(test)]
mod test {
    use super::CorrectionTier;

    #[test]
    fn quality_ordering() {
        assert!(CorrectionTier::Ultra < CorrectionTier::Rapid);
        assert!(CorrectionTier::Rapid < CorrectionTier::Final);
        assert!(CorrectionTier::Final.retires_input());
        assert!(!CorrectionTier::Rapid.retires_input());
        assert!(!CorrectionTier::Ultra.retires_input());
    }

    #[test]
    fn codes() {
        for tier in CorrectionTier::ALL {
            assert_eq!(CorrectionTier::from_code(tier.code()).unwrap(), tier);
            assert_eq!(tier.to_string(), tier.dir_name());
        }
        assert!(CorrectionTier::from_code("XYZ").is_err());
        assert!(CorrectionTier::from_code("fin").is_err());
    }
}
