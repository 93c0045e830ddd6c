use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Why a single rename did not happen.
#[derive(Debug, Error)]
pub enum RenameError {
    #[error("target already exists: {}", .0.display())]
    TargetExists(PathBuf),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Performs renames decided by the planner. Renames never leave the file's
/// directory.
pub trait FsMutator {
    /// Whether `dir` holds an entry named exactly `name` (byte-exact, even on
    /// case-insensitive filesystems).
    fn name_taken(&self, dir: &Path, name: &str) -> io::Result<bool>;

    /// Rename `path` to `new_name` in the same directory, returning the new
    /// path.
    fn rename(&self, path: &Path, new_name: &str) -> Result<PathBuf, RenameError>;
}

/// [`FsMutator`] on the real filesystem.
///
/// In dry-run mode nothing is touched; names handed out and names left
/// behind are remembered so later collision checks in the same pass see the
/// directory as a real run would.
#[derive(Debug, Default)]
pub struct StdFs {
    dry_run: bool,
    claimed: RefCell<HashSet<PathBuf>>,
    vacated: RefCell<HashSet<PathBuf>>,
}

impl StdFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            ..Self::default()
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

impl FsMutator for StdFs {
    fn name_taken(&self, dir: &Path, name: &str) -> io::Result<bool> {
        let path = dir.join(name);
        if self.claimed.borrow().contains(&path) {
            return Ok(true);
        }
        if self.vacated.borrow().contains(&path) {
            return Ok(false);
        }
        exact_name_exists(dir, name)
    }

    fn rename(&self, path: &Path, new_name: &str) -> Result<PathBuf, RenameError> {
        let dir = path.parent().unwrap_or_else(|| Path::new(""));
        let dest = dir.join(new_name);
        if self.name_taken(dir, new_name)? {
            return Err(RenameError::TargetExists(dest));
        }

        if self.dry_run {
            self.claimed.borrow_mut().remove(path);
            self.vacated.borrow_mut().insert(path.to_path_buf());
            self.vacated.borrow_mut().remove(&dest);
            self.claimed.borrow_mut().insert(dest.clone());
        } else {
            fs::rename(path, &dest)?;
        }
        Ok(dest)
    }
}

/// Check for an entry named exactly `name`. A plain `exists()` would also
/// match case variants on Windows and macOS, so hits are confirmed against
/// the directory listing.
pub fn exact_name_exists(dir: &Path, name: &str) -> io::Result<bool> {
    let dir = if dir.as_os_str().is_empty() { Path::new(".") } else { dir };
    match fs::symlink_metadata(dir.join(name)) {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    }
    for entry in fs::read_dir(dir)? {
        if entry?.file_name().to_str() == Some(name) {
            return Ok(true);
        }
    }
    Ok(false)
}
