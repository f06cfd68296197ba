//! Staging of PPP results and dataset ingestion.
use std::{
    fs,
    path::{Component, Path, PathBuf},
};

use hifitime::prelude::Epoch;
use log::{debug, info, warn};

use crate::{
    coordinate::TimeCoordinate,
    dataset::{AppendOutcome, Dataset, OffsetEntry, PositionEntry},
    error::Error,
    scheme::{FileScheme, Subdir},
    summary::SummaryReport,
    tier::CorrectionTier,
};

/// Measurement path of a file stored in one of the tier subtrees:
/// the parent of the first `final`, `rapid` or `ultra` component.
pub fn measurement_root_from(path: &Path) -> Result<PathBuf, Error> {
    let mut root = PathBuf::new();

    for component in path.components() {
        if let Component::Normal(name) = component {
            let name = name.to_string_lossy().to_lowercase();
            let is_tier = CorrectionTier::ALL
                .iter()
                .any(|tier| tier.dir_name() == name);
            if is_tier && root.file_name().is_some() {
                return Ok(root);
            }
        }
        root.push(component);
    }

    Err(Error::MeasurementPath(path.display().to_string()))
}

/// File name up to the first `.`
fn base_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    name.split('.').next().unwrap_or_default().to_string()
}

/// Renames `from` to `to`, copying across file systems
fn move_file(from: &Path, to: &Path) -> Result<(), Error> {
    if fs::rename(from, to).is_err() {
        fs::copy(from, to)?;
        fs::remove_file(from)?;
    }
    debug!("moved {} to {}", from.display(), to.display());
    Ok(())
}

/// Outcome of one report ingestion
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    pub tier: CorrectionTier,
    pub position: AppendOutcome,
    pub offset: AppendOutcome,
}

/// Scheme of the day the report ends on
fn report_scheme(root: &Path, report: &SummaryReport) -> Result<FileScheme, Error> {
    let t = TimeCoordinate::from_epoch(Epoch::from_unix_seconds(report.timestamp as f64))?;
    Ok(FileScheme::new(root, t, 0))
}

/// Appends the report to the position and offset datasets of its tier
pub fn ingest(root: &Path, report: &SummaryReport, created: &str) -> Result<IngestOutcome, Error> {
    let scheme = report_scheme(root, report)?;
    let tier = report.tier;

    fs::create_dir_all(scheme.tier_subdir(tier, Subdir::Misc))?;

    let position = Dataset::new(&scheme.position_path(tier), scheme.name(), tier)
        .append(&PositionEntry::from(report), created)?;

    let offset = Dataset::new(&scheme.offset_path(tier), scheme.name(), tier)
        .append(&OffsetEntry::from(report), created)?;

    Ok(IngestOutcome {
        tier,
        position,
        offset,
    })
}

/// Parses and ingests a summary file. Without `root`, the measurement path
/// is deduced from the location of the file.
pub fn ingest_file(sum: &Path, root: Option<&Path>, created: &str) -> Result<IngestOutcome, Error> {
    let root = match root {
        Some(root) => root.to_path_buf(),
        None => FileScheme::measurement_root(&measurement_root_from(sum)?)?,
    };
    let report = SummaryReport::from_file(sum)?;
    info!(
        "{} - {} solution, ends {}",
        sum.display(),
        report.tier,
        report.iso
    );
    ingest(&root, &report, created)
}

/// PPP result files of one submission
#[derive(Debug, Clone)]
pub struct Products {
    /// Weekly file that was submitted
    pub input: PathBuf,
    /// Summary report
    pub sum: PathBuf,
    /// Clock records
    pub clk: PathBuf,
    /// Complete result archive
    pub zip: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct HarvestReport {
    pub tier: CorrectionTier,
    /// Final location of every product
    pub staged: Vec<PathBuf>,
    /// Final location of the retired input
    pub retired: Option<PathBuf>,
    pub ingested: IngestOutcome,
}

/// Stages PPP products into their tier subtree, named after the submitted
/// input (`<base>_<tier long name>.<ext>`). Inputs of a final solution are
/// retired into `weekly/final`. The report is then ingested.
pub fn harvest(root: &Path, products: &Products, created: &str) -> Result<HarvestReport, Error> {
    let report = SummaryReport::from_file(&products.sum)?;
    let tier = report.tier;
    let scheme = report_scheme(root, &report)?;
    let base = base_name(&products.input);

    info!("{} - {} solution", base, tier.long_name());

    scheme.create_output_dirs()?;

    let mut moves = vec![
        (&products.sum, Subdir::Summary, "sum"),
        (&products.clk, Subdir::Clock, "clk"),
    ];
    if let Some(zip) = &products.zip {
        moves.push((zip, Subdir::Archive, "zip"));
    }

    let mut staged = Vec::with_capacity(moves.len());
    for (from, subdir, extension) in moves {
        let to = scheme.product_path(tier, subdir, &base, extension);
        move_file(from, &to)?;
        info!("staged {}", to.display());
        staged.push(to);
    }

    let retired = if tier.retires_input() {
        match products.input.file_name() {
            Some(name) if products.input.is_file() => {
                let to = scheme.weekly_final_dir().join(name);
                move_file(&products.input, &to)?;
                info!("retired {}", to.display());
                Some(to)
            },
            _ => {
                warn!("{}: no input to retire", products.input.display());
                None
            },
        }
    } else {
        None
    };

    let ingested = ingest(root, &report, created)?;

    Ok(HarvestReport {
        tier,
        staged,
        retired,
        ingested,
    })
}
