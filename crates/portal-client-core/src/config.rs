use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8787";
pub const ENV_API_BASE_URL: &str = "PORTAL_API_BASE_URL";
pub const ENV_CAPTURE_TIMEOUT_MS: &str = "PORTAL_CAPTURE_TIMEOUT_MS";
pub const ENV_LOG_FILTER: &str = "PORTAL_LOG_FILTER";
pub const DEFAULT_LOG_FILTER: &str = "info";
pub const DEFAULT_CAPTURE_TIMEOUT_MS: u64 = 15_000;
pub const MIN_CAPTURE_TIMEOUT_MS: u64 = 250;
pub const CAPTURE_PATH: &str = "/api/billing/capture";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigInputError {
    #[error("base url must not be empty")]
    EmptyBaseUrl,
    #[error("base url must use http:// or https:// and include a host")]
    InvalidBaseUrl,
    #[error("invalid {key} value '{value}': expected milliseconds")]
    InvalidTimeout { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureClientSettings {
    pub base_url: String,
    pub base_url_source: &'static str,
    pub timeout: Duration,
}

impl CaptureClientSettings {
    pub fn from_env() -> Result<Self, ConfigInputError> {
        let (base_url, base_url_source) = resolve_api_base_url()?;
        let timeout = resolve_capture_timeout()?;
        Ok(Self {
            base_url,
            base_url_source,
            timeout,
        })
    }
}

pub fn resolve_api_base_url() -> Result<(String, &'static str), ConfigInputError> {
    if let Some(base_url) = env_non_empty(ENV_API_BASE_URL) {
        return normalize_base_url(&base_url).map(|normalized| (normalized, ENV_API_BASE_URL));
    }
    normalize_base_url(DEFAULT_API_BASE_URL).map(|normalized| (normalized, "default_local"))
}

pub fn resolve_capture_timeout() -> Result<Duration, ConfigInputError> {
    let Some(raw) = env_non_empty(ENV_CAPTURE_TIMEOUT_MS) else {
        return Ok(Duration::from_millis(DEFAULT_CAPTURE_TIMEOUT_MS));
    };
    let millis = raw
        .parse::<u64>()
        .map_err(|_| ConfigInputError::InvalidTimeout {
            key: ENV_CAPTURE_TIMEOUT_MS,
            value: raw.clone(),
        })?;
    Ok(clamp_capture_timeout(millis))
}

#[must_use]
pub fn clamp_capture_timeout(millis: u64) -> Duration {
    Duration::from_millis(millis.max(MIN_CAPTURE_TIMEOUT_MS))
}

#[must_use]
pub fn resolve_log_filter() -> String {
    env_non_empty(ENV_LOG_FILTER).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
}

pub fn normalize_base_url(raw: &str) -> Result<String, ConfigInputError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigInputError::EmptyBaseUrl);
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigInputError::InvalidBaseUrl);
    }
    let Some((_, remainder)) = trimmed.split_once("://") else {
        return Err(ConfigInputError::InvalidBaseUrl);
    };
    if remainder.trim().is_empty() || remainder.starts_with('/') {
        return Err(ConfigInputError::InvalidBaseUrl);
    }
    Ok(trimmed.to_string())
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
