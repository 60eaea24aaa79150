use futures_util::future::{Either, select};
use gloo_net::http::Request;
use portal_client_core::config::{CAPTURE_PATH, ConfigInputError, normalize_base_url};
use portal_client_core::finalization::{
    CaptureReplyError, CaptureRequestBody, FinalizationOutcome, REQUEST_ID_HEADER,
    capture_request_id, classify_capture_reply,
};

use super::*;

#[derive(Debug, thiserror::Error)]
pub(super) enum BrowserCaptureError {
    #[error("capture_client_base_url_invalid:{0}")]
    Config(#[from] ConfigInputError),
    #[error("capture_request_failed:{0}")]
    Network(String),
    #[error("capture_request_timed_out")]
    Timeout,
    #[error("capture_read_failed:{0}")]
    Read(String),
    #[error(transparent)]
    Reply(#[from] CaptureReplyError),
}

/// Browser capture transport. One `fetch` per call, raced against
/// [`CAPTURE_REQUEST_TIMEOUT`].
#[derive(Debug, Clone)]
pub(super) struct BrowserCaptureTransport {
    capture_url: String,
}

impl BrowserCaptureTransport {
    /// Uses `window.__PORTAL_API_BASE__` when set, otherwise the page origin.
    pub(super) fn from_window() -> Result<Self, BrowserCaptureError> {
        let base_url = api_base_override()
            .or_else(page_origin)
            .ok_or(ConfigInputError::EmptyBaseUrl)?;
        let base_url = normalize_base_url(&base_url)?;
        Ok(Self {
            capture_url: format!("{base_url}{CAPTURE_PATH}"),
        })
    }
}

#[async_trait::async_trait(?Send)]
impl CaptureTransport for BrowserCaptureTransport {
    type Error = BrowserCaptureError;

    async fn capture(&self, order_token: &str) -> Result<FinalizationOutcome, Self::Error> {
        let request = Request::post(&self.capture_url)
            .header(REQUEST_ID_HEADER, &capture_request_id())
            .json(&CaptureRequestBody {
                order_token: order_token.to_string(),
            })
            .map_err(|error| BrowserCaptureError::Network(error.to_string()))?;

        let send = Box::pin(request.send());
        let timeout = Box::pin(sleep(CAPTURE_REQUEST_TIMEOUT));
        let response = match select(send, timeout).await {
            Either::Left((result, _)) => {
                result.map_err(|error| BrowserCaptureError::Network(error.to_string()))?
            }
            Either::Right(((), _)) => return Err(BrowserCaptureError::Timeout),
        };

        let status = response.status();
        let body = response
            .binary()
            .await
            .map_err(|error| BrowserCaptureError::Read(error.to_string()))?;
        Ok(classify_capture_reply(status, &body)?)
    }
}

fn api_base_override() -> Option<String> {
    let window = web_sys::window()?;
    let value = js_sys::Reflect::get(&window, &JsValue::from_str(API_BASE_HOOK)).ok()?;
    let base = value.as_string()?.trim().to_string();
    if base.is_empty() { None } else { Some(base) }
}

fn page_origin() -> Option<String> {
    web_sys::window()?.location().origin().ok()
}
