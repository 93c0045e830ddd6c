use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::Deserialize;

use super::exif::parse_exif_datetime;
use super::{MetadataDates, MetadataProvider};
use crate::error::{Error, Result};

/// Subset of `exiftool -json` output we ask for.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ExifToolEntry {
    source_file: String,
    #[serde(default)]
    date_time_original: Option<serde_json::Value>,
    #[serde(default)]
    create_date: Option<serde_json::Value>,
}

/// Provider backed by an external `exiftool` executable, run once per batch.
/// Handles videos too, unlike [`super::exif::ExifProvider`].
#[derive(Debug, Clone)]
pub struct ExifToolProvider {
    program: PathBuf,
}

impl ExifToolProvider {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for ExifToolProvider {
    fn default() -> Self {
        Self::new("exiftool")
    }
}

impl MetadataProvider for ExifToolProvider {
    fn read_dates(&self, files: &[PathBuf]) -> Result<Vec<MetadataDates>> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        // File names go through stdin (-@ -) so long batches never hit
        // command line limits.
        let mut child = Command::new(&self.program)
            .args([
                "-json",
                "-q",
                "-q",
                "-charset",
                "filename=utf8",
                "-api",
                "QuickTimeUTC",
                "-d",
                "%Y-%m-%d %H:%M:%S",
                "-DateTimeOriginal",
                "-CreateDate",
                "-@",
                "-",
            ])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                Error::Metadata(format!("cannot run {}: {}", self.program.display(), e))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Metadata("exiftool stdin unavailable".to_string()))?;
        let output = std::thread::scope(|s| {
            let writer = s.spawn(move || -> std::io::Result<()> {
                for path in files {
                    writeln!(stdin, "{}", path.display())?;
                }
                Ok(())
            });
            let output = child.wait_with_output();
            let written = writer.join().unwrap_or_else(|_| {
                Err(std::io::Error::other("exiftool stdin writer panicked"))
            });
            written.and(output)
        })?;

        // exiftool exits non-zero when a single file is unreadable, so only
        // an empty stdout with errors not tied to our files fails the batch.
        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if output.status.success() || only_file_errors(&stderr, files) {
                tracing::debug!(stderr = %stderr.trim(), "exiftool read no file");
                return Ok(vec![MetadataDates::default(); files.len()]);
            }
            return Err(Error::Metadata(format!(
                "exiftool failed ({}): {}",
                output.status,
                stderr.trim()
            )));
        }

        let by_path = parse_exiftool_json(&output.stdout)?;
        Ok(files
            .iter()
            .map(|path| {
                by_path
                    .get(&path_key(path))
                    .copied()
                    .unwrap_or_default()
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "exiftool"
    }
}

/// Parse `exiftool -json` output into dates keyed by normalized source path.
fn parse_exiftool_json(bytes: &[u8]) -> Result<HashMap<String, MetadataDates>> {
    let entries: Vec<ExifToolEntry> = serde_json::from_slice(bytes)
        .map_err(|e| Error::Metadata(format!("unreadable exiftool output: {}", e)))?;

    Ok(entries
        .into_iter()
        .map(|entry| {
            let dates = MetadataDates {
                primary: entry.date_time_original.as_ref().and_then(value_date),
                secondary: entry.create_date.as_ref().and_then(value_date),
            };
            (path_key(Path::new(&entry.source_file)), dates)
        })
        .collect())
}

fn value_date(value: &serde_json::Value) -> Option<chrono::NaiveDateTime> {
    value.as_str().and_then(parse_exif_datetime)
}

/// Whether every stderr line is an `Error: <reason> - <file>` line about one
/// of `files`.
fn only_file_errors(stderr: &str, files: &[PathBuf]) -> bool {
    let keys: HashSet<String> = files.iter().map(|p| path_key(p)).collect();
    let mut lines = stderr.lines().map(str::trim).filter(|l| !l.is_empty()).peekable();
    lines.peek().is_some()
        && lines.all(|line| {
            line.starts_with("Error: ")
                && line
                    .rsplit_once(" - ")
                    .is_some_and(|(_, file)| keys.contains(&path_key(Path::new(file))))
        })
}

// exiftool reports paths with forward slashes on every platform
fn path_key(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
