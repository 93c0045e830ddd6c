use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::name_codec;

/// A named timestamp source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum SourceId {
    /// EXIF `DateTimeOriginal` (or the provider's equivalent)
    PrimaryMetadataDate,
    /// EXIF `DateTimeDigitized` / `CreateDate`
    SecondaryMetadataDate,
    /// Date embedded in the file name
    FilenameDate,
    /// Filesystem last modification time
    FilesystemModifiedDate,
}

impl SourceId {
    /// Default priority order.
    pub const ALL: [SourceId; 4] = [
        SourceId::PrimaryMetadataDate,
        SourceId::SecondaryMetadataDate,
        SourceId::FilenameDate,
        SourceId::FilesystemModifiedDate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SourceId::PrimaryMetadataDate => "PrimaryMetadataDate",
            SourceId::SecondaryMetadataDate => "SecondaryMetadataDate",
            SourceId::FilenameDate => "FilenameDate",
            SourceId::FilesystemModifiedDate => "FilesystemModifiedDate",
        }
    }

    /// Whether the date comes from the metadata provider (as opposed to
    /// the file name or the filesystem).
    pub fn is_metadata(self) -> bool {
        matches!(
            self,
            SourceId::PrimaryMetadataDate | SourceId::SecondaryMetadataDate
        )
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let id = match lower.as_str() {
            "primarymetadatadate" | "primary" => SourceId::PrimaryMetadataDate,
            "secondarymetadatadate" | "secondary" => SourceId::SecondaryMetadataDate,
            "filenamedate" | "filename" => SourceId::FilenameDate,
            "filesystemmodifieddate" | "mtime" => SourceId::FilesystemModifiedDate,
            _ => return Err(Error::UnsupportedSource(s.to_string())),
        };
        Ok(id)
    }
}

impl TryFrom<String> for SourceId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// One source paired with the date it yields for a file, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimestampCandidate {
    pub source: SourceId,
    pub value: Option<NaiveDateTime>,
}

/// A media file taking part in one analysis pass.
#[derive(Debug, Clone)]
pub struct MediaItem {
    /// Full path on disk
    pub path: PathBuf,
    /// Just the filename
    pub filename: String,
    /// Filename without extension
    pub stem: String,
    /// Extension without the dot, as found on disk
    pub extension: Option<String>,
    /// Candidate dates in source priority order
    pub dates: Vec<TimestampCandidate>,
    /// The current name already follows the canonical date format
    pub normalized: bool,
}

impl MediaItem {
    pub fn new(path: PathBuf, dates: Vec<TimestampCandidate>) -> Self {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (stem, extension) = split_filename(&filename);
        let normalized = name_codec::is_normalized(&filename);
        Self {
            stem: stem.to_string(),
            extension: extension.map(str::to_string),
            filename,
            path,
            dates,
            normalized,
        }
    }

    /// Date from `source`, `None` when the source is absent or has no date.
    pub fn date(&self, source: SourceId) -> Option<NaiveDateTime> {
        self.dates
            .iter()
            .find(|c| c.source == source)
            .and_then(|c| c.value)
    }

    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }
}

/// Split a filename into stem and extension the way `Path` does, so that
/// dotfiles keep their leading dot in the stem.
pub fn split_filename(filename: &str) -> (&str, Option<&str>) {
    match filename.rfind('.') {
        Some(0) | None => (filename, None),
        Some(pos) => (&filename[..pos], Some(&filename[pos + 1..])),
    }
}
