//! Dated output files

use chrono::{Local, NaiveDate};
use std::io;
use std::path::{Path, PathBuf};

/// Today's date in the local timezone
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

const DATE_FORMAT: &str = "%Y-%m-%d";

/// `<dir>/YYYY-MM-DD.<extension>`
pub fn dated_file(dir: &Path, date: NaiveDate, extension: &str) -> PathBuf {
    dir.join(format!("{}.{extension}", date.format(DATE_FORMAT)))
}

/// The date a [`dated_file`] was filed under, if its stem is `YYYY-MM-DD`
pub fn file_date(path: &Path) -> Option<NaiveDate> {
    let stem = path.file_stem()?.to_str()?;
    NaiveDate::parse_from_str(stem, DATE_FORMAT).ok()
}

/// Write `contents` to `path`, creating parent directories and replacing any
/// existing file
pub async fn write_text(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, contents).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dated_file() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        assert_eq!(
            dated_file(Path::new("data/ths_finance"), date, "json"),
            PathBuf::from("data/ths_finance/2026-01-05.json")
        );
    }

    #[test]
    fn test_file_date() {
        assert_eq!(
            file_date(Path::new("reports/ths_finance/2026-01-05.md")),
            NaiveDate::from_ymd_opt(2026, 1, 5)
        );
        assert_eq!(file_date(Path::new("reports/latest.md")), None);
        assert_eq!(file_date(Path::new("2026-13-40.md")), None);
    }

    #[tokio::test]
    async fn test_write_text_creates_parents_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("2026-01-05.md");

        write_text(&path, "first").await.unwrap();
        write_text(&path, "second").await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
    }
}
