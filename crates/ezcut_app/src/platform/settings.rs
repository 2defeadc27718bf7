use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ezcut_engine::{
    parse_base_url, ClientError, ClientSettings, DEFAULT_ADMIN_TIMEOUT, DEFAULT_BASE_URL,
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_POLL_INTERVAL, DEFAULT_STATUS_TIMEOUT,
    DEFAULT_UPLOAD_TIMEOUT,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SETTINGS_FILENAME: &str = "ezcut.ron";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings from {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error(transparent)]
    BaseUrl(#[from] ClientError),
}

/// Contents of `ezcut.ron`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub base_url: String,
    pub poll_interval_ms: u64,
    pub connect_timeout_secs: u64,
    pub status_timeout_secs: u64,
    pub upload_timeout_secs: u64,
    pub admin_timeout_secs: u64,
    pub log_level: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT.as_secs(),
            status_timeout_secs: DEFAULT_STATUS_TIMEOUT.as_secs(),
            upload_timeout_secs: DEFAULT_UPLOAD_TIMEOUT.as_secs(),
            admin_timeout_secs: DEFAULT_ADMIN_TIMEOUT.as_secs(),
            log_level: "info".to_string(),
        }
    }
}

/// Where the settings came from, for the startup log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsSource {
    File(PathBuf),
    Defaults,
}

/// Reads settings from `explicit` or from `ezcut.ron` in the working directory.
///
/// A missing default file means defaults; a missing explicit file is an error.
pub fn load(explicit: Option<&Path>) -> Result<(AppSettings, SettingsSource), SettingsError> {
    let path = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(SETTINGS_FILENAME));

    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound && explicit.is_none() => {
            return Ok((AppSettings::default(), SettingsSource::Defaults));
        }
        Err(source) => return Err(SettingsError::Io { path, source }),
    };

    let settings = ron::from_str(&content).map_err(|source| SettingsError::Parse {
        path: path.clone(),
        source,
    })?;
    Ok((settings, SettingsSource::File(path)))
}

impl AppSettings {
    /// Engine settings, with `base_url_override` taking precedence over the file.
    pub fn client_settings(
        &self,
        base_url_override: Option<&str>,
    ) -> Result<ClientSettings, SettingsError> {
        let base_url = parse_base_url(base_url_override.unwrap_or(&self.base_url))?;
        Ok(ClientSettings {
            base_url,
            connect_timeout: secs("connect_timeout_secs", self.connect_timeout_secs)?,
            status_timeout: secs("status_timeout_secs", self.status_timeout_secs)?,
            upload_timeout: secs("upload_timeout_secs", self.upload_timeout_secs)?,
            admin_timeout: secs("admin_timeout_secs", self.admin_timeout_secs)?,
            poll_interval: positive(
                "poll_interval_ms",
                Duration::from_millis(self.poll_interval_ms),
            )?,
        })
    }
}

fn secs(field: &'static str, value: u64) -> Result<Duration, SettingsError> {
    positive(field, Duration::from_secs(value))
}

fn positive(field: &'static str, value: Duration) -> Result<Duration, SettingsError> {
    if value.is_zero() {
        return Err(SettingsError::Invalid {
            field,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}
