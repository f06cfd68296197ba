//! Locates the last artifacts already produced for a measurement.
use std::{
    fs,
    path::{Path, PathBuf},
};

use itertools::Itertools;
use log::debug;

use crate::{
    coordinate::TimeCoordinate,
    error::Error,
    scheme::FileScheme,
    utils::numeric_path_cmp,
};

/// Leading digits of the part following `__`: the GPS week
pub fn parse_week(file_name: &str) -> Option<u32> {
    let (_, dated) = file_name.split_once("__")?;
    let digits = dated
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect::<String>();
    digits.parse::<u32>().ok()
}

/// (GPS week, day of week) of a daily file name, `M__WWWW_DD.obs`.
/// Accepts non padded day of week.
pub fn parse_week_and_day(file_name: &str) -> Option<(u32, u8)> {
    let (_, dated) = file_name.split_once("__")?;
    let dated = dated.split('.').next()?;
    let mut fields = dated.split('_');

    let week = fields.next()?.parse::<u32>().ok()?;
    let dow = fields.next()?.parse::<u8>().ok()?;

    if dow > 6 {
        return None;
    }
    Some((week, dow))
}

/// Entries of `dir` accepted by `filter`, numerically sorted by file name.
/// A missing directory has no entries.
pub fn sorted_entries<F: Fn(&Path, &str) -> bool>(
    dir: &Path,
    filter: F,
) -> Result<Vec<PathBuf>, Error> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if filter(&path, &name) {
            entries.push(path);
        }
    }

    Ok(entries
        .into_iter()
        .sorted_by(|a, b| numeric_path_cmp(a, b))
        .collect())
}

/// Daily files of the week designated by `scheme`, in numeric order
pub fn daily_files(scheme: &FileScheme) -> Result<Vec<PathBuf>, Error> {
    sorted_entries(&scheme.daily_dir(), |path, _| path.is_file())
}

/// Last daily file downloaded in `root/download`.
///
/// Week directories are scanned in numeric order, latest first. When no
/// directory holds a daily file, the latest daily archive is used and
/// assumed to be a complete week (day of week 6).
pub fn find_last_daily(root: &Path) -> Result<Option<TimeCoordinate>, Error> {
    let name = FileScheme::measurement_name(root);
    let download = root.join("download");

    let weeks = sorted_entries(&download, |path, entry| {
        path.is_dir() && entry.starts_with(&name)
    })?;

    for week in weeks.iter().rev() {
        let days = sorted_entries(week, |path, _| path.is_file())?;

        let last = days.iter().rev().find_map(|day| {
            let file_name = day.file_name()?.to_string_lossy().to_string();
            parse_week_and_day(&file_name)
        });

        if let Some((week, dow)) = last {
            debug!("last daily file: week {} day {}", week, dow);
            return TimeCoordinate::from_gps(week, dow).map(Some);
        }
    }

    let archives = sorted_entries(&download, |path, entry| {
        path.is_file() && entry.starts_with(&name) && entry.ends_with(".zip")
    })?;

    let last_week = archives.iter().rev().find_map(|archive| {
        let file_name = archive.file_name()?.to_string_lossy().to_string();
        parse_week(&file_name)
    });

    match last_week {
        Some(week) => {
            debug!("last daily archive: week {}", week);
            TimeCoordinate::from_gps(week, 6).map(Some)
        },
        None => Ok(None),
    }
}

/// GPS week of the last weekly file in `root/weekly`
pub fn find_last_weekly(root: &Path) -> Result<Option<u32>, Error> {
    let weekly = root.join("weekly");

    let files = sorted_entries(&weekly, |path, entry| {
        path.is_file() && entry.contains(".obs")
    })?;

    Ok(files.iter().rev().find_map(|file| {
        let file_name = file.file_name()?.to_string_lossy().to_string();
        parse_week(&file_name)
    }))
}
