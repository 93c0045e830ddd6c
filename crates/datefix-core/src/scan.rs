use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Camera formats `mime_guess` does not know as image/video.
const EXTRA_MEDIA_EXTENSIONS: &[&str] = &["mts", "m2ts", "heic", "heif", "dng", "cr2", "cr3", "nef", "arw", "insv"];

/// Content of one folder, sorted by name.
#[derive(Debug, Default)]
pub struct FolderListing {
    pub media: Vec<PathBuf>,
    pub subfolders: Vec<PathBuf>,
}

/// List media files and subfolders of `dir`. Hidden entries are ignored.
pub fn scan_folder(dir: &Path) -> Result<FolderListing> {
    if !dir.is_dir() {
        return Err(Error::InvalidDirectory(dir.to_path_buf()));
    }

    let mut listing = FolderListing::default();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') {
            continue;
        }
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            listing.subfolders.push(entry.path());
        } else if file_type.is_file() && is_media(&entry.path()) {
            listing.media.push(entry.path());
        }
    }

    listing.media.sort();
    listing.subfolders.sort();
    Ok(listing)
}

/// Whether `path` looks like a photo or a video.
pub fn is_media(path: &Path) -> bool {
    let by_mime = mime_guess::from_path(path).iter().any(|mime| {
        mime.type_() == mime_guess::mime::IMAGE || mime.type_() == mime_guess::mime::VIDEO
    });
    by_mime
        || path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| EXTRA_MEDIA_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}
