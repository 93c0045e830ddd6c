use chrono::NaiveDateTime;
use exif::{In, Reader, Tag};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use super::{MetadataDates, MetadataProvider};
use crate::error::Result;
use crate::name_codec::is_leap_second;

/// In-process provider reading EXIF tags with `kamadak-exif`.
/// Files that are not EXIF containers (most videos) get no metadata dates.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifProvider;

impl MetadataProvider for ExifProvider {
    fn read_dates(&self, files: &[PathBuf]) -> Result<Vec<MetadataDates>> {
        Ok(files
            .iter()
            .map(|path| match read_exif_dates(path) {
                Some(dates) => dates,
                None => {
                    tracing::debug!(path = %path.display(), "no readable EXIF");
                    MetadataDates::default()
                }
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "exif"
    }
}

/// Read primary (`DateTimeOriginal`) and secondary (`DateTimeDigitized`,
/// falling back to `DateTime`) dates from a file.
/// EXIF datetimes have no timezone info - they are local time as-is.
pub fn read_exif_dates(path: &Path) -> Option<MetadataDates> {
    let file = File::open(path).ok()?;
    let exif = Reader::new()
        .read_from_container(&mut BufReader::new(file))
        .ok()?;

    let field_date = |tag: Tag| {
        exif.get_field(tag, In::PRIMARY)
            .and_then(|field| parse_exif_datetime(&field.display_value().to_string()))
    };

    Some(MetadataDates {
        primary: field_date(Tag::DateTimeOriginal),
        secondary: field_date(Tag::DateTimeDigitized).or_else(|| field_date(Tag::DateTime)),
    })
}

pub fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    let cleaned = s
        .trim()
        .replace('-', ":")
        .replace('/', ":")
        .replace('\\', ":")
        .replace('.', ":");

    if let Ok(dt) = NaiveDateTime::parse_from_str(&cleaned, "%Y:%m:%d %H:%M:%S") {
        return (!is_leap_second(&dt)).then_some(dt);
    }

    if let Ok(d) = chrono::NaiveDate::parse_from_str(cleaned.split(' ').next()?, "%Y:%m:%d") {
        return d.and_hms_opt(0, 0, 0);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_parse_exif_datetime() {
        let expected = NaiveDate::from_ymd_opt(2015, 7, 6)
            .unwrap()
            .and_hms_opt(18, 21, 32)
            .unwrap();
        assert_eq!(parse_exif_datetime("2015:07:06 18:21:32"), Some(expected));
        assert_eq!(parse_exif_datetime("2015-07-06 18:21:32"), Some(expected));
        assert_eq!(
            parse_exif_datetime("2015:07:06"),
            Some(NaiveDate::from_ymd_opt(2015, 7, 6).unwrap().and_hms_opt(0, 0, 0).unwrap())
        );
        assert_eq!(parse_exif_datetime("0000:00:00 00:00:00"), None);
        assert_eq!(parse_exif_datetime("2015:07:06 18:21:60"), None);
        assert_eq!(parse_exif_datetime(""), None);
    }

    #[test]
    fn test_non_exif_file_degrades() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        File::create(&path).unwrap().write_all(b"not an image").unwrap();
        let missing = dir.path().join("missing.jpg");

        let dates = ExifProvider.read_dates(&[path, missing]).unwrap();
        assert_eq!(dates.len(), 2);
        assert!(dates.iter().all(|d| *d == MetadataDates::default()));
    }
}
