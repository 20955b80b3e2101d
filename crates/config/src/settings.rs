// Application settings
// Loaded from ~/.config/sheetgate/settings.toml (or --config <path>)

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Default upload limit: 2 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 2 * 1024 * 1024;

pub const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// SQLite file holding imported records.
    pub database: PathBuf,

    /// Uploads larger than this are rejected before parsing.
    pub max_upload_bytes: u64,

    /// Default page size for listings.
    pub page_size: u32,

    /// Optional TOML schema registry; built-in schemas when unset.
    /// Relative paths resolve against the settings file's directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schemas: Option<PathBuf>,

    /// Log filter used when neither -v nor SHEETGATE_LOG is given.
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: Self::data_dir().join("records.db"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            page_size: DEFAULT_PAGE_SIZE,
            schemas: None,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sheetgate")
            .join("settings.toml")
    }

    fn data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sheetgate")
    }

    /// Load from an explicit path (must exist), or from the default location
    /// (falling back to defaults when no file is there).
    pub fn load(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => {
                let path = Self::config_path();
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    debug!(path = %path.display(), "no settings file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut settings = Self::from_toml(&contents).map_err(|message| SettingsError::Parse {
            path: path.to_path_buf(),
            message,
        })?;

        if let Some(base) = path.parent() {
            settings.resolve_relative(base);
        }
        debug!(path = %path.display(), "settings loaded");
        Ok(settings)
    }

    fn from_toml(contents: &str) -> Result<Self, String> {
        toml::from_str(contents).map_err(|e| e.to_string())
    }

    fn resolve_relative(&mut self, base: &Path) {
        if self.database.is_relative() {
            self.database = base.join(&self.database);
        }
        if let Some(schemas) = self.schemas.as_mut() {
            if schemas.is_relative() {
                *schemas = base.join(&*schemas);
            }
        }
    }
}
