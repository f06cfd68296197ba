//! Canonical names and paths of every artifact of a measurement.
//!
//! A measurement lives in its own directory; the directory name is the
//! measurement identity `M` and prefixes every file name:
//!
//! ```text
//! M/
//!   download/M__WWWW_daily/M__WWWW_DD.obs   daily receiver files
//!   download/M__WWWW_daily.zip              daily archive
//!   weekly/M__WWWW_weekly.obs               weekly concatenation
//!   weekly/final/                           retired weekly inputs
//!   {ultra,rapid,final}/{clk,sum,misc,zip}  per tier products
//! ```
//!
//! When the daily directory does not hold exactly 7 files, archive and
//! weekly names carry the count: `M__WWWW_1_file_daily.zip`,
//! `M__WWWW_5_files_weekly.obs`. Downstream tools match on these names.
use std::{
    fs,
    path::{Component, Path, PathBuf},
};

use log::debug;

use crate::{coordinate::TimeCoordinate, error::Error, tier::CorrectionTier};

pub mod archive;
pub mod receiver;
pub mod search;

/// Number of daily files in a complete week
pub const FULL_WEEK: usize = 7;

/// Fixed subdirectories of each [CorrectionTier] subtree
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Subdir {
    /// Raw clock records
    Clock,
    /// Raw summary reports
    Summary,
    /// Derived position and offset datasets
    Misc,
    /// Compressed result archives
    Archive,
}

impl Subdir {
    pub const ALL: [Self; 4] = [Self::Clock, Self::Summary, Self::Misc, Self::Archive];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Clock => "clk",
            Self::Summary => "sum",
            Self::Misc => "misc",
            Self::Archive => "zip",
        }
    }
}

/// `""` for a full week, `"_1_file"` or `"_N_files"` otherwise
fn count_suffix(num_files: usize) -> String {
    match num_files {
        FULL_WEEK => String::new(),
        1 => "_1_file".to_string(),
        n => format!("_{}_files", n),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileScheme {
    /// Measurement path
    root: PathBuf,
    /// Measurement identity
    name: String,
    /// Day being processed
    coordinate: TimeCoordinate,
    /// Number of files found in the daily directory
    num_files: usize,
}

impl FileScheme {
    /// Builds a [FileScheme] for the measurement stored in `root`.
    /// The measurement identity is the last component of `root`.
    pub fn new(root: &Path, coordinate: TimeCoordinate, num_files: usize) -> Self {
        Self {
            root: root.to_path_buf(),
            name: Self::measurement_name(root),
            coordinate,
            num_files,
        }
    }

    /// Builds a [FileScheme] counting the files currently
    /// present in the daily directory (0 when it does not exist).
    pub fn observe(root: &Path, coordinate: TimeCoordinate) -> Result<Self, Error> {
        let mut scheme = Self::new(root, coordinate, 0);
        let daily_dir = scheme.daily_dir();

        if daily_dir.is_dir() {
            let mut count = 0;
            for entry in fs::read_dir(&daily_dir)? {
                if entry?.file_type()?.is_file() {
                    count += 1;
                }
            }
            scheme.num_files = count;
        }

        debug!(
            "{} - {} file(s) in {}",
            coordinate,
            scheme.num_files,
            daily_dir.display()
        );

        Ok(scheme)
    }

    /// Absolute measurement path. `.` and `..` components are resolved
    /// lexically, so the identity is the name of the directory designated.
    /// Paths without a final name (`/`) are rejected.
    pub fn measurement_root(path: &Path) -> Result<PathBuf, Error> {
        let invalid = || Error::MeasurementPath(path.display().to_string());

        let mut root = PathBuf::new();
        for component in std::path::absolute(path).map_err(|_| invalid())?.components() {
            match component {
                Component::CurDir => {},
                Component::ParentDir => {
                    root.pop();
                },
                other => root.push(other),
            }
        }

        if Self::measurement_name(&root).is_empty() {
            return Err(invalid());
        }
        Ok(root)
    }

    /// Measurement identity of a measurement path
    pub fn measurement_name(root: &Path) -> String {
        root.file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_files(&self) -> usize {
        self.num_files
    }

    /// True when the daily directory holds a complete week
    pub fn is_full_week(&self) -> bool {
        self.num_files == FULL_WEEK
    }

    /// `M__WWWW`
    pub fn week_name(&self) -> String {
        format!("{}__{}", self.name, self.coordinate.week_str())
    }

    /// `M__WWWW_DD.obs`
    pub fn daily_file(&self) -> String {
        format!("{}_{}.obs", self.week_name(), self.coordinate.dow_str())
    }

    pub fn download_dir(&self) -> PathBuf {
        self.root.join("download")
    }

    /// `M__WWWW_daily`
    pub fn daily_dir_name(&self) -> String {
        format!("{}_daily", self.week_name())
    }

    pub fn daily_dir(&self) -> PathBuf {
        self.download_dir().join(self.daily_dir_name())
    }

    pub fn daily_path(&self) -> PathBuf {
        self.daily_dir().join(self.daily_file())
    }

    /// `M__WWWW_daily.zip` or `M__WWWW_N_file(s)_daily.zip`
    pub fn daily_archive(&self) -> String {
        format!(
            "{}{}_daily.zip",
            self.week_name(),
            count_suffix(self.num_files)
        )
    }

    pub fn daily_archive_path(&self) -> PathBuf {
        self.download_dir().join(self.daily_archive())
    }

    /// `M__WWWW_weekly.obs` or `M__WWWW_N_file(s)_weekly.obs`
    pub fn weekly_file(&self) -> String {
        format!(
            "{}{}_weekly.obs",
            self.week_name(),
            count_suffix(self.num_files)
        )
    }

    pub fn weekly_dir(&self) -> PathBuf {
        self.root.join("weekly")
    }

    /// Where weekly inputs go once final corrections were obtained
    pub fn weekly_final_dir(&self) -> PathBuf {
        self.weekly_dir().join("final")
    }

    pub fn weekly_path(&self) -> PathBuf {
        self.weekly_dir().join(self.weekly_file())
    }

    /// `<weekly file>.zip`
    pub fn weekly_archive(&self) -> String {
        format!("{}.zip", self.weekly_file())
    }

    pub fn weekly_archive_path(&self) -> PathBuf {
        self.weekly_dir().join(self.weekly_archive())
    }

    pub fn tier_dir(&self, tier: CorrectionTier) -> PathBuf {
        self.root.join(tier.dir_name())
    }

    pub fn tier_subdir(&self, tier: CorrectionTier, subdir: Subdir) -> PathBuf {
        self.tier_dir(tier).join(subdir.name())
    }

    /// `M_pos_<tier>.dat`
    pub fn position_file(&self, tier: CorrectionTier) -> String {
        format!("{}_pos_{}.dat", self.name, tier.dir_name())
    }

    pub fn position_path(&self, tier: CorrectionTier) -> PathBuf {
        self.tier_subdir(tier, Subdir::Misc)
            .join(self.position_file(tier))
    }

    /// `M_offset_<tier>.dat`
    pub fn offset_file(&self, tier: CorrectionTier) -> String {
        format!("{}_offset_{}.dat", self.name, tier.dir_name())
    }

    pub fn offset_path(&self, tier: CorrectionTier) -> PathBuf {
        self.tier_subdir(tier, Subdir::Misc)
            .join(self.offset_file(tier))
    }

    /// Staged PPP product: `<tier>/<subdir>/<base>_<tier long name>.<extension>`
    pub fn product_path(
        &self,
        tier: CorrectionTier,
        subdir: Subdir,
        base: &str,
        extension: &str,
    ) -> PathBuf {
        self.tier_subdir(tier, subdir)
            .join(format!("{}_{}.{}", base, tier.long_name(), extension))
    }

    /// Every directory this scheme writes into, daily directory excepted
    pub fn output_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = vec![self.weekly_dir(), self.weekly_final_dir()];
        for tier in CorrectionTier::ALL {
            dirs.push(self.tier_dir(tier));
            for subdir in Subdir::ALL {
                dirs.push(self.tier_subdir(tier, subdir));
            }
        }
        dirs
    }

    /// Creates [Self::output_dirs]. Existing directories are not an error.
    pub fn create_output_dirs(&self) -> Result<(), Error> {
        for dir in self.output_dirs() {
            fs::create_dir_all(&dir)?;
            debug!("created {}", dir.display());
        }
        Ok(())
    }

    /// Creates the daily directory. Existing directory is not an error.
    pub fn create_daily_dir(&self) -> Result<PathBuf, Error> {
        let dir = self.daily_dir();
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}
