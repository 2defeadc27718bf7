use std::time::Duration;

use url::Url;

use crate::{ClientError, ErrorKind};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Connection settings for the processing service.
///
/// Each operation picks one of three timeout classes: status reads are quick,
/// uploads may take tens of minutes, everything else sits in between.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: Url,
    pub connect_timeout: Duration,
    pub status_timeout: Duration,
    pub upload_timeout: Duration,
    pub admin_timeout: Duration,
    pub poll_interval: Duration,
}

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_STATUS_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_ADMIN_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

impl ClientSettings {
    /// Settings for `base_url` with the default timeouts and poll interval.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            status_timeout: DEFAULT_STATUS_TIMEOUT,
            upload_timeout: DEFAULT_UPLOAD_TIMEOUT,
            admin_timeout: DEFAULT_ADMIN_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self::new(parse_base_url(base_url)?))
    }

    /// Absolute URL for `path` under the base URL, keeping any base path prefix.
    pub fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        let joined = format!(
            "{}/{}",
            url.path().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        url.set_path(&joined);
        url
    }
}

pub fn parse_base_url(raw: &str) -> Result<Url, ClientError> {
    let url = Url::parse(raw.trim()).map_err(|err| {
        ClientError::new("configure", ErrorKind::Validation, format!("invalid base url {raw:?}: {err}"))
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ClientError::new(
            "configure",
            ErrorKind::Validation,
            format!("unsupported scheme {other:?} in base url"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_under_base_path() {
        let settings = ClientSettings::with_base_url("http://api.example.com/ezcut/").unwrap();
        assert_eq!(
            settings.endpoint("/job/abc").as_str(),
            "http://api.example.com/ezcut/job/abc"
        );
    }

    #[test]
    fn endpoint_on_bare_host() {
        let settings = ClientSettings::with_base_url(DEFAULT_BASE_URL).unwrap();
        assert_eq!(settings.poll_interval, DEFAULT_POLL_INTERVAL);
        assert_eq!(settings.endpoint("health").as_str(), "http://localhost:8000/health");
    }

    #[test]
    fn rejects_non_http_scheme() {
        let err = ClientSettings::with_base_url("ftp://example.com").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }
}
