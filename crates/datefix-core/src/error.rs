use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("not a directory: {}", .0.display())]
    InvalidDirectory(PathBuf),

    #[error("unsupported date source: {0}")]
    UnsupportedSource(String),

    #[error("invalid settings: {0}")]
    Settings(String),

    #[error("metadata provider failed: {0}")]
    Metadata(String),

    #[error("more than {max} files named after {base}")]
    CollisionExhausted { base: String, max: u32 },

    #[error(transparent)]
    Rename(#[from] crate::writer::RenameError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
