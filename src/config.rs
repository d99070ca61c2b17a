use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const CONFIG_ENV: &str = "DOCPILOT_CONFIG";
pub const BACKEND_URL_ENV: &str = "DOCPILOT_BACKEND_URL";
pub const OUTPUT_DIR_ENV: &str = "DOCPILOT_OUTPUT_DIR";

const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
const DEFAULT_OUTPUT_FILENAME: &str = "generated.docx";
const DEFAULT_TRANSCRIPT_WINDOW: usize = 8;
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend_url: String,
    pub default_output_filename: String,
    pub output_dir: PathBuf,
    pub transcript_window: usize,
    pub request_timeout_secs: u64,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            default_output_filename: DEFAULT_OUTPUT_FILENAME.to_string(),
            output_dir: PathBuf::from("."),
            transcript_window: DEFAULT_TRANSCRIPT_WINDOW,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl AppConfig {
    pub fn default_path() -> PathBuf {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".docpilot")
                .join("config.toml"),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!("no config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let mut config: Self = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.normalize();
        Ok(config)
    }

    pub fn load() -> (Self, Option<ConfigError>) {
        let path = Self::default_path();
        let (mut config, failure) = match Self::from_file(&path) {
            Ok(config) => (config, None),
            Err(err) => (Self::default(), Some(err)),
        };
        config.apply_overrides(
            std::env::var(BACKEND_URL_ENV).ok(),
            std::env::var(OUTPUT_DIR_ENV).ok(),
        );
        (config, failure)
    }

    pub fn apply_overrides(&mut self, backend_url: Option<String>, output_dir: Option<String>) {
        if let Some(url) = backend_url.filter(|url| !url.trim().is_empty()) {
            self.backend_url = url.trim().to_string();
        }
        if let Some(dir) = output_dir.filter(|dir| !dir.trim().is_empty()) {
            self.output_dir = PathBuf::from(dir.trim());
        }
        self.normalize();
    }

    fn normalize(&mut self) {
        let defaults = Self::default();
        let url = self.backend_url.trim().trim_end_matches('/');
        self.backend_url = if url.is_empty() {
            defaults.backend_url
        } else {
            url.to_string()
        };
        if self.default_output_filename.trim().is_empty() {
            self.default_output_filename = defaults.default_output_filename;
        }
        if self.output_dir.as_os_str().is_empty() {
            self.output_dir = defaults.output_dir;
        }
        if self.transcript_window == 0 {
            self.transcript_window = defaults.transcript_window;
        }
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = defaults.request_timeout_secs;
        }
        if self.log_level.trim().is_empty() {
            self.log_level = defaults.log_level;
        }
    }
}
