//! Zip archives of a complete week.
//!
//! Once a week is complete, its daily files are zipped into the daily
//! archive (`download/M__WWWW_daily.zip`) and the weekly file, when it was
//! produced, into the weekly archive (`weekly/M__WWWW_weekly.obs.zip`).
//! The weekly file itself is kept: it is the input of the PPP submission.
use std::{
    fs::{self, File},
    io,
    path::{Path, PathBuf},
};

use log::{debug, info};
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use crate::{error::Error, scheme::FileScheme};

/// Archives produced for one week
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekArchives {
    /// Daily archive
    pub daily: PathBuf,
    /// Weekly archive, if the weekly file exists
    pub weekly: Option<PathBuf>,
    /// Daily directory that was removed after archiving
    pub removed: Option<PathBuf>,
}

fn deflated() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// Deflates `files` into a new `archive`. Entries are named after
/// the file names, in the given order.
pub fn zip_files<P: AsRef<Path>>(archive: &Path, files: &[P]) -> Result<usize, Error> {
    let mut zip = ZipWriter::new(File::create(archive)?);

    let mut entries = 0;
    for file in files {
        let file = file.as_ref();
        let Some(name) = file.file_name() else {
            continue;
        };
        zip.start_file(name.to_string_lossy().to_string(), deflated())?;
        io::copy(&mut File::open(file)?, &mut zip)?;
        debug!("{}: added {}", archive.display(), file.display());
        entries += 1;
    }

    zip.finish()?;
    Ok(entries)
}

/// Archives the week designated by `scheme`, which must have been observed
/// so the archive names carry the right file count. `files` are the daily
/// files, in numeric order. With `cleanup`, the daily directory is removed
/// once its archive is written.
pub fn archive_week(
    scheme: &FileScheme,
    files: &[PathBuf],
    cleanup: bool,
) -> Result<WeekArchives, Error> {
    let daily = scheme.daily_archive_path();
    let entries = zip_files(&daily, files)?;
    info!("{}: {} daily file(s)", daily.display(), entries);

    let weekly_path = scheme.weekly_path();
    let weekly = if weekly_path.is_file() {
        let archive = scheme.weekly_archive_path();
        zip_files(&archive, &[&weekly_path])?;
        info!("{}: {}", archive.display(), scheme.weekly_file());
        Some(archive)
    } else {
        debug!("{} not produced yet", weekly_path.display());
        None
    };

    let removed = if cleanup {
        let dir = scheme.daily_dir();
        fs::remove_dir_all(&dir)?;
        info!("removed {}", dir.display());
        Some(dir)
    } else {
        None
    };

    Ok(WeekArchives {
        daily,
        weekly,
        removed,
    })
}

#[cfg(test)]
mod test {
    use super::{archive_week, zip_files};
    use crate::{
        coordinate::TimeCoordinate,
        scheme::{
            FileScheme,
            search::{daily_files, find_last_daily},
            test::Scratch,
        },
    };
    use std::{fs, fs::File, io::Read};
    use zip::ZipArchive;

    /// Complete week 100 of SITE, returns the observed scheme
    fn full_week(scratch: &Scratch) -> FileScheme {
        let t = TimeCoordinate::from_gps(100, 0).unwrap();
        let dir = FileScheme::new(scratch.path(), t, 0).create_daily_dir().unwrap();
        for dow in 0..7 {
            let t = TimeCoordinate::from_gps(100, dow).unwrap();
            let daily = FileScheme::new(scratch.path(), t, 0);
            fs::write(dir.join(daily.daily_file()), format!("obs {}", dow)).unwrap();
        }
        FileScheme::observe(scratch.path(), t).unwrap()
    }

    fn entry_names(path: &std::path::Path) -> Vec<String> {
        let archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
        archive.file_names().map(|name| name.to_string()).collect()
    }

    #[test]
    fn daily_archive() {
        let scratch = Scratch::new("archive-daily");
        let scheme = full_week(&scratch);
        let files = daily_files(&scheme).unwrap();
        assert_eq!(files.len(), 7);

        let archives = archive_week(&scheme, &files, false).unwrap();
        assert_eq!(
            archives.daily,
            scratch.path().join("download").join("SITE__0100_daily.zip")
        );
        assert!(archives.weekly.is_none());
        assert!(archives.removed.is_none());
        assert!(scheme.daily_dir().is_dir());

        let mut names = entry_names(&archives.daily);
        names.sort();
        assert_eq!(names.len(), 7);
        assert_eq!(names[0], "SITE__0100_00.obs");
        assert_eq!(names[6], "SITE__0100_06.obs");

        let mut zip = ZipArchive::new(File::open(&archives.daily).unwrap()).unwrap();
        let mut content = String::new();
        zip.by_name("SITE__0100_03.obs")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "obs 3");
    }

    #[test]
    fn weekly_archive_and_cleanup() {
        let scratch = Scratch::new("archive-cleanup");
        let scheme = full_week(&scratch);
        let files = daily_files(&scheme).unwrap();

        fs::create_dir_all(scheme.weekly_dir()).unwrap();
        fs::write(scheme.weekly_path(), "weekly obs").unwrap();

        let archives = archive_week(&scheme, &files, true).unwrap();

        let weekly = archives.weekly.unwrap();
        assert_eq!(
            weekly,
            scratch.path().join("weekly").join("SITE__0100_weekly.obs.zip")
        );
        assert_eq!(entry_names(&weekly), vec!["SITE__0100_weekly.obs".to_string()]);
        assert!(scheme.weekly_path().is_file());

        assert_eq!(archives.removed, Some(scheme.daily_dir()));
        assert!(!scheme.daily_dir().exists());
        assert!(archives.daily.is_file());

        // the archive stands for the removed week
        let last = find_last_daily(scratch.path()).unwrap().unwrap();
        assert_eq!(last.as_gps(), (100, 6));
    }

    #[test]
    fn nameless_entries_skipped() {
        let scratch = Scratch::new("archive-nameless");
        let file = scratch.path().join("a.obs");
        fs::write(&file, "a").unwrap();

        let archive = scratch.path().join("a.zip");
        let added = zip_files(&archive, &[file.clone(), "/".into()]).unwrap();
        assert_eq!(added, 1);
        assert_eq!(entry_names(&archive), vec!["a.obs".to_string()]);
    }
}
