use std::{cmp::Ordering, path::Path};

use hifitime::prelude::Epoch;

/// Signed decimal with `places` decimals: `+0.000000123457`
pub fn format_dec(value: f64, places: usize) -> String {
    format!("{:+.*}", places, value)
}

/// `DDD:HH:MM:SS` representation of a number of seconds
pub fn format_ddhhmmss(seconds: i64) -> String {
    let abs = seconds.unsigned_abs();
    let formatted = format!(
        "{:03}:{:02}:{:02}:{:02}",
        abs / 86_400,
        (abs % 86_400) / 3600,
        (abs % 3600) / 60,
        abs % 60
    );
    if seconds < 0 {
        format!("-{}", formatted)
    } else {
        formatted
    }
}

/// Human readable file size
pub fn format_filesize(size: u64) -> String {
    let mut value = size as f64;
    for unit in ["", "Ki", "Mi", "Gi", "Ti", "Pi", "Ei", "Zi"] {
        if value.abs() < 1024.0 {
            return format!("{:.1}{}B", value, unit);
        }
        value /= 1024.0;
    }
    format!("{:.1}YiB", value)
}

/// ISO-8601 (seconds resolution, no time zone designator)
pub fn iso_seconds(year: i32, month: u8, day: u8, hh: u8, mm: u8, ss: u8) -> String {
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
        year, month, day, hh, mm, ss
    )
}

/// ISO-8601 (seconds resolution) of an [Epoch], in UTC
pub fn epoch_iso(t: Epoch) -> String {
    let (y, m, d, hh, mm, ss, _) = t.to_gregorian_utc();
    iso_seconds(y, m, d, hh, mm, ss)
}

/// Digit runs embedded in a file name, leading zeros removed
fn digit_runs(name: &str) -> Vec<&str> {
    name.split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .map(|run| run.trim_start_matches('0'))
        .collect()
}

/// Compares two names by the numbers embedded in them, run after run.
/// Zero padded and non padded week numbers are therefore ordered
/// consistently. Ties are broken lexicographically.
pub fn numeric_cmp(lhs: &str, rhs: &str) -> Ordering {
    let (a, b) = (digit_runs(lhs), digit_runs(rhs));
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| x.len().cmp(&y.len()).then_with(|| x.cmp(y)))
        .find(|ord| *ord != Ordering::Equal)
        .unwrap_or_else(|| a.len().cmp(&b.len()))
        .then_with(|| lhs.cmp(rhs))
}

/// [numeric_cmp] applied to file names
pub fn numeric_path_cmp(lhs: &Path, rhs: &Path) -> Ordering {
    let name = |p: &Path| {
        p.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    };
    numeric_cmp(&name(lhs), &name(rhs))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decimals() {
        assert_eq!(format_dec(-1.234567890123E-7, 12), "-0.000000123457");
        assert_eq!(format_dec(2.5E-9, 12), "+0.000000002500");
        assert_eq!(format_dec(0.0, 3), "+0.000");
    }

    #[test]
    fn durations() {
        assert_eq!(format_ddhhmmss(0), "000:00:00:00");
        assert_eq!(format_ddhhmmss(300), "000:00:05:00");
        assert_eq!(format_ddhhmmss(604_770), "006:23:59:30");
        assert_eq!(format_ddhhmmss(-3661), "-000:01:01:01");
    }

    #[test]
    fn filesizes() {
        assert_eq!(format_filesize(512), "512.0B");
        assert_eq!(format_filesize(2048), "2.0KiB");
        assert_eq!(format_filesize(5 * 1024 * 1024), "5.0MiB");
    }

    #[test]
    fn numeric_ordering() {
        let mut names = vec![
            "SITE__2201_03.obs",
            "SITE__2200_6.obs",
            "SITE__2201_00.obs",
            "SITE__2200_05.obs",
        ];
        names.sort_by(|a, b| numeric_cmp(a, b));
        assert_eq!(
            names,
            vec![
                "SITE__2200_05.obs",
                "SITE__2200_6.obs",
                "SITE__2201_00.obs",
                "SITE__2201_03.obs",
            ]
        );
    }

    #[test]
    fn iso() {
        assert_eq!(iso_seconds(2022, 1, 2, 3, 4, 5), "2022-01-02T03:04:05");
        let t = Epoch::from_gregorian_utc(2022, 1, 2, 23, 59, 30, 0);
        assert_eq!(epoch_iso(t), "2022-01-02T23:59:30");
    }
}
