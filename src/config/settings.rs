//! Application settings and paths.
//!
//! Settings live in `settings.json` inside the XDG config directory and
//! supply defaults that command-line flags override.

use crate::error::{ConfigError, ConfigResult};
use crate::types::{PortList, ProtocolPolicy};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Application directory paths following the XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/titlescan)
    pub config_dir: PathBuf,
}

impl Paths {
    /// Resolve the platform configuration directory.
    pub fn resolve() -> ConfigResult<Self> {
        let project = ProjectDirs::from("com", "titlescan", env!("CARGO_PKG_NAME"))
            .ok_or(ConfigError::DirectoryNotFound)?;

        Ok(Self {
            config_dir: project.config_dir().to_path_buf(),
        })
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }
}

/// Application-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Ports probed when none are given.
    pub ports: PortList,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum number of concurrent probes.
    pub workers: usize,
    /// Verify TLS certificates on https probes.
    pub verify_tls: bool,
    /// Which protocols are tried on which port.
    pub protocol_policy: ProtocolPolicy,
    /// Custom User-Agent header.
    pub user_agent: Option<String>,
    /// Directory for log files (current directory when unset).
    pub log_dir: Option<PathBuf>,
    /// Directory for default-named result files (current directory when unset).
    pub output_dir: Option<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            ports: PortList::web_defaults(),
            timeout_secs: 5,
            workers: 10,
            verify_tls: false,
            protocol_policy: ProtocolPolicy::default(),
            user_agent: None,
            log_dir: None,
            output_dir: None,
        }
    }
}

impl AppSettings {
    /// Load settings from an explicit file, or the default location.
    ///
    /// A missing default file yields the built-in defaults; a missing
    /// explicit file is an error.
    pub fn load(explicit: Option<&Path>) -> ConfigResult<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            return Ok((Self::load_from(path)?, Some(path.to_path_buf())));
        }

        let Ok(paths) = Paths::resolve() else {
            return Ok((Self::default(), None));
        };
        let file = paths.settings_file();
        if !file.exists() {
            return Ok((Self::default(), None));
        }

        Ok((Self::load_from(&file)?, Some(file)))
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))
    }

    /// Save settings to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| ConfigError::WriteFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}
