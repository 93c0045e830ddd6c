pub mod exif;
pub mod exiftool;
pub mod fs;
pub mod guess;

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::error::Result;
use crate::media::{SourceId, TimestampCandidate};

/// Dates a metadata provider found for one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetadataDates {
    pub primary: Option<NaiveDateTime>,
    pub secondary: Option<NaiveDateTime>,
}

/// Source of embedded metadata dates, queried once per batch of files.
pub trait MetadataProvider {
    /// Return one entry per input file, in the same order.
    ///
    /// A file the provider cannot read gets [`MetadataDates::default`];
    /// only a failure of the whole batch is an error.
    fn read_dates(&self, files: &[PathBuf]) -> Result<Vec<MetadataDates>>;

    fn name(&self) -> &'static str;
}

/// Build the ordered candidate list for one file.
///
/// Filename and filesystem dates are only computed when `sources` asks for
/// them.
pub fn collect_dates(
    path: &Path,
    metadata: &MetadataDates,
    sources: &[SourceId],
) -> Vec<TimestampCandidate> {
    sources
        .iter()
        .map(|&source| {
            let value = match source {
                SourceId::PrimaryMetadataDate => metadata.primary,
                SourceId::SecondaryMetadataDate => metadata.secondary,
                SourceId::FilenameDate => path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .and_then(guess::guess_date_from_filename)
                    .map(|g| g.datetime),
                SourceId::FilesystemModifiedDate => fs::modified_date(path),
            };
            TimestampCandidate { source, value }
        })
        .collect()
}
