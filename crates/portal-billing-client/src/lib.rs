use std::time::Duration;

use async_trait::async_trait;
use portal_client_core::config::{
    CAPTURE_PATH, CaptureClientSettings, ConfigInputError, DEFAULT_CAPTURE_TIMEOUT_MS,
    clamp_capture_timeout, normalize_base_url,
};
use portal_client_core::finalization::{
    CaptureReplyError, CaptureRequestBody, CaptureTransport, FinalizationOutcome,
    REQUEST_ID_HEADER, capture_request_id, classify_capture_reply,
};
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct BillingClientConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl BillingClientConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_ms: DEFAULT_CAPTURE_TIMEOUT_MS,
        }
    }
}

impl From<CaptureClientSettings> for BillingClientConfig {
    fn from(settings: CaptureClientSettings) -> Self {
        Self {
            base_url: settings.base_url,
            timeout_ms: u64::try_from(settings.timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture_client_base_url_invalid:{0}")]
    InvalidBaseUrl(#[from] ConfigInputError),
    #[error("capture_request_failed:{message}")]
    Request { message: String },
    #[error("capture_request_timed_out")]
    Timeout,
    #[error("capture_read_failed:{message}")]
    Read { message: String },
    #[error("capture_http_{status}:{body}")]
    Http { status: StatusCode, body: String },
    #[error("capture_json_decode_failed:{message}")]
    Decode { message: String },
}

/// Capture transport over HTTP. Each call is a single POST; nothing here
/// retries, because a repeated capture could double-submit to the processor.
#[derive(Debug, Clone)]
pub struct BillingClient {
    base_url: String,
    timeout: Duration,
    http: reqwest::Client,
}

impl BillingClient {
    pub fn new(config: BillingClientConfig) -> Result<Self, CaptureError> {
        let base_url = normalize_base_url(&config.base_url)?;
        Ok(Self {
            base_url,
            timeout: clamp_capture_timeout(config.timeout_ms),
            http: reqwest::Client::new(),
        })
    }

    pub fn from_env() -> Result<Self, CaptureError> {
        let settings = CaptureClientSettings::from_env()?;
        tracing::debug!(
            base_url = %settings.base_url,
            source = settings.base_url_source,
            "resolved capture endpoint"
        );
        Self::new(settings.into())
    }

    #[must_use]
    pub fn capture_url(&self) -> String {
        format!("{}{CAPTURE_PATH}", self.base_url)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn capture_order(
        &self,
        order_token: &str,
    ) -> Result<FinalizationOutcome, CaptureError> {
        let body = CaptureRequestBody {
            order_token: order_token.to_string(),
        };
        let response = self
            .http
            .post(self.capture_url())
            .header(REQUEST_ID_HEADER, capture_request_id())
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(map_send_error)?;
        decode_capture_response(response).await
    }
}

#[async_trait]
impl CaptureTransport for BillingClient {
    type Error = CaptureError;

    async fn capture(&self, order_token: &str) -> Result<FinalizationOutcome, Self::Error> {
        self.capture_order(order_token).await
    }
}

fn map_send_error(error: reqwest::Error) -> CaptureError {
    if error.is_timeout() {
        CaptureError::Timeout
    } else {
        CaptureError::Request {
            message: error.to_string(),
        }
    }
}

async fn decode_capture_response(
    response: reqwest::Response,
) -> Result<FinalizationOutcome, CaptureError> {
    let status = response.status();
    let bytes = response.bytes().await.map_err(|error| {
        if error.is_timeout() {
            CaptureError::Timeout
        } else {
            CaptureError::Read {
                message: error.to_string(),
            }
        }
    })?;
    classify_capture_body(status, &bytes)
}

pub fn classify_capture_body(
    status: StatusCode,
    body: &[u8],
) -> Result<FinalizationOutcome, CaptureError> {
    classify_capture_reply(status.as_u16(), body).map_err(|error| match error {
        CaptureReplyError::Http { .. } => format_http_error(status, body),
        CaptureReplyError::Decode { message } => CaptureError::Decode { message },
    })
}

pub fn format_http_error(status: StatusCode, body: &[u8]) -> CaptureError {
    let body = non_empty_string(String::from_utf8_lossy(body).to_string())
        .unwrap_or_else(|| "<empty>".to_string());
    CaptureError::Http { status, body }
}

fn non_empty_string(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
