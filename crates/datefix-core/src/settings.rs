use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::date::exif::ExifProvider;
use crate::date::exiftool::ExifToolProvider;
use crate::date::MetadataProvider;
use crate::error::{Error, Result};
use crate::media::SourceId;
use crate::reconcile::{ReconcileOptions, DEFAULT_TOLERANCE_SECS};

fn default_sources() -> Vec<SourceId> {
    SourceId::ALL.to_vec()
}

fn default_tolerance_secs() -> i64 {
    DEFAULT_TOLERANCE_SECS
}

fn default_exiftool_path() -> PathBuf {
    PathBuf::from("exiftool")
}

/// Which metadata provider to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Exif,
    ExifTool,
}

/// Settings shared by every operation. Loadable from TOML; missing keys
/// take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Date sources, highest priority first
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceId>,
    /// Two dates this close (in seconds) are the same date
    #[serde(default = "default_tolerance_secs")]
    pub tolerance_secs: i64,
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default = "default_exiftool_path")]
    pub exiftool_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            tolerance_secs: default_tolerance_secs(),
            provider: ProviderKind::default(),
            exiftool_path: default_exiftool_path(),
        }
    }
}

impl Settings {
    /// Load and validate settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&text)
            .map_err(|e| Error::Settings(format!("{}: {}", path.display(), e)))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(Error::Settings("no date source configured".to_string()));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.sources.iter().find(|s| !seen.insert(**s)) {
            return Err(Error::Settings(format!("date source listed twice: {}", dup)));
        }
        if self.tolerance_secs < 0 || TimeDelta::try_seconds(self.tolerance_secs).is_none() {
            return Err(Error::Settings(format!(
                "invalid tolerance: {}",
                self.tolerance_secs
            )));
        }
        Ok(())
    }

    /// Engine options for these settings, with an optional reference override.
    pub fn reconcile_options(&self, reference: Option<SourceId>) -> ReconcileOptions {
        ReconcileOptions {
            sources: self.sources.clone(),
            tolerance: TimeDelta::seconds(self.tolerance_secs),
            reference,
        }
    }

    pub fn metadata_provider(&self) -> Box<dyn MetadataProvider> {
        match self.provider {
            ProviderKind::Exif => Box::new(ExifProvider),
            ProviderKind::ExifTool => Box::new(ExifToolProvider::new(self.exiftool_path.clone())),
        }
    }
}
