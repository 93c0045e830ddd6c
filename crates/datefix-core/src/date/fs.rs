use std::path::Path;

use chrono::NaiveDateTime;
use filetime::FileTime;

/// Last modification time of `path` as a local naive datetime.
pub fn modified_date(path: &Path) -> Option<NaiveDateTime> {
    let meta = std::fs::metadata(path).ok()?;
    let mtime = FileTime::from_last_modification_time(&meta);
    from_file_time(mtime)
}

// NaiveDateTime is local time everywhere else; convert from the UTC epoch
fn from_file_time(ft: FileTime) -> Option<NaiveDateTime> {
    let utc = chrono::DateTime::from_timestamp(ft.unix_seconds(), 0)?;
    Some(utc.with_timezone(&chrono::Local).naive_local())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn test_modified_date_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        File::create(&path).unwrap();

        let dt = NaiveDate::from_ymd_opt(2019, 6, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        let local = dt.and_local_timezone(chrono::Local).single().unwrap();
        filetime::set_file_mtime(&path, FileTime::from_unix_time(local.timestamp(), 0)).unwrap();

        assert_eq!(modified_date(&path), Some(dt));
        assert_eq!(modified_date(&dir.path().join("missing.jpg")), None);
    }
}
