//! Post-redirect capture return.
//!
//! The controller reads the order token once on mount, hands out a single
//! [`CaptureTicket`], and folds the capture result into a terminal
//! [`FinalizationState`]. It never retries.

use std::fmt::Display;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::presentation::{ActionButton, ActionKind, FinalizationView, StatusTone};
use crate::route::{QueryParams, TOKEN_QUERY_KEY};

pub const PROCESSING_MESSAGE: &str = "Processing your payment. Please don't close this page.";
pub const MISSING_TOKEN_MESSAGE: &str = "Missing payment token. Return to billing and try again.";
pub const SUCCESS_MESSAGE: &str = "Payment captured successfully. Funds will appear in your balance shortly.";
pub const CAPTURE_FAILED_MESSAGE: &str = "Failed to capture payment. Please try again from billing.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizationRequest {
    order_token: String,
}

impl FinalizationRequest {
    #[must_use]
    pub fn from_query(query: &QueryParams) -> Option<Self> {
        query
            .get_non_empty(TOKEN_QUERY_KEY)
            .map(|token| Self {
                order_token: token.to_string(),
            })
    }

    #[must_use]
    pub fn order_token(&self) -> &str {
        &self.order_token
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizationOutcome {
    Succeeded,
    Declined { reason: String },
}

impl FinalizationOutcome {
    /// Maps the wire shape onto an outcome. A reason is kept byte for byte; a
    /// failure with a missing or blank reason gets the generic message.
    #[must_use]
    pub fn from_wire(success: bool, error: Option<String>) -> Self {
        if success {
            return Self::Succeeded;
        }
        let reason = error
            .filter(|reason| !reason.trim().is_empty())
            .unwrap_or_else(|| CAPTURE_FAILED_MESSAGE.to_string());
        Self::Declined { reason }
    }
}

/// Body returned by the capture endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<CaptureResponse> for FinalizationOutcome {
    fn from(response: CaptureResponse) -> Self {
        Self::from_wire(response.success, response.error)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureReplyError {
    #[error("capture_http_{status}:{body}")]
    Http { status: u16, body: String },
    #[error("capture_json_decode_failed:{message}")]
    Decode { message: String },
}

/// Classifies a capture endpoint reply. A 2xx body must be the capture shape;
/// a non-2xx body counts as a decline only when it is the capture shape with
/// `success: false`, anything else is an HTTP error.
pub fn classify_capture_reply(
    status: u16,
    body: &[u8],
) -> Result<FinalizationOutcome, CaptureReplyError> {
    if (200..=299).contains(&status) {
        return serde_json::from_slice::<CaptureResponse>(body)
            .map(FinalizationOutcome::from)
            .map_err(|error| CaptureReplyError::Decode {
                message: error.to_string(),
            });
    }

    match serde_json::from_slice::<CaptureResponse>(body) {
        Ok(response) if !response.success => Ok(response.into()),
        _ => {
            let body = String::from_utf8_lossy(body).trim().to_string();
            Err(CaptureReplyError::Http {
                status,
                body: if body.is_empty() {
                    "<empty>".to_string()
                } else {
                    body
                },
            })
        }
    }
}

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation id sent with every capture call, `req_<uuid v4 simple>`.
#[must_use]
pub fn capture_request_id() -> String {
    format!("req_{}", Uuid::new_v4().simple())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRequestBody {
    #[serde(rename = "orderToken")]
    pub order_token: String,
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait CaptureTransport {
    type Error: Display;

    /// Finalizes the authorized payment identified by `order_token`.
    /// Implementations make exactly one attempt.
    async fn capture(&self, order_token: &str) -> Result<FinalizationOutcome, Self::Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalizationStatus {
    Processing,
    Success,
    Error,
}

impl FinalizationStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Processing)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizationState {
    pub status: FinalizationStatus,
    pub message: String,
}

impl FinalizationState {
    fn processing() -> Self {
        Self {
            status: FinalizationStatus::Processing,
            message: PROCESSING_MESSAGE.to_string(),
        }
    }
}

/// Proof that the one capture call for this mount has been claimed.
#[derive(Debug, PartialEq, Eq)]
pub struct CaptureTicket {
    order_token: String,
}

impl CaptureTicket {
    #[must_use]
    pub fn order_token(&self) -> &str {
        &self.order_token
    }
}

#[derive(Debug)]
pub struct FinalizationController {
    request: Option<FinalizationRequest>,
    state: FinalizationState,
    capture_fired: bool,
}

impl FinalizationController {
    /// Reads the order token synchronously. A missing token goes straight to
    /// the terminal error state and no capture will ever be issued.
    #[must_use]
    pub fn mount(query: &QueryParams) -> Self {
        let request = FinalizationRequest::from_query(query);
        let state = if request.is_some() {
            FinalizationState::processing()
        } else {
            tracing::warn!("capture return opened without an order token");
            FinalizationState {
                status: FinalizationStatus::Error,
                message: MISSING_TOKEN_MESSAGE.to_string(),
            }
        };
        Self {
            request,
            state,
            capture_fired: false,
        }
    }

    #[must_use]
    pub fn state(&self) -> &FinalizationState {
        &self.state
    }

    #[must_use]
    pub fn request(&self) -> Option<&FinalizationRequest> {
        self.request.as_ref()
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.state.status == FinalizationStatus::Processing
    }

    #[must_use]
    pub fn capture_fired(&self) -> bool {
        self.capture_fired
    }

    /// Claims the single capture call. Returns `None` when there is no token,
    /// the call was already claimed, or the state is already terminal.
    pub fn take_capture_ticket(&mut self) -> Option<CaptureTicket> {
        if self.capture_fired || self.state.status.is_terminal() {
            return None;
        }
        let request = self.request.as_ref()?;
        self.capture_fired = true;
        Some(CaptureTicket {
            order_token: request.order_token.clone(),
        })
    }

    /// Applies the capture result. Returns `true` when the state changed; a
    /// result arriving after a terminal state is dropped.
    pub fn resolve<E: Display>(
        &mut self,
        ticket: CaptureTicket,
        result: Result<FinalizationOutcome, E>,
    ) -> bool {
        if self.state.status.is_terminal() {
            tracing::debug!("ignoring capture result after terminal state");
            return false;
        }

        let next = match result {
            Ok(FinalizationOutcome::Succeeded) => {
                tracing::info!(order_token = ticket.order_token(), "payment captured");
                FinalizationState {
                    status: FinalizationStatus::Success,
                    message: SUCCESS_MESSAGE.to_string(),
                }
            }
            Ok(FinalizationOutcome::Declined { reason }) => {
                tracing::warn!(
                    order_token = ticket.order_token(),
                    reason = %reason,
                    "payment capture declined"
                );
                FinalizationState {
                    status: FinalizationStatus::Error,
                    message: reason,
                }
            }
            Err(error) => {
                tracing::error!(
                    order_token = ticket.order_token(),
                    error = %error,
                    "payment capture request failed"
                );
                FinalizationState {
                    status: FinalizationStatus::Error,
                    message: CAPTURE_FAILED_MESSAGE.to_string(),
                }
            }
        };
        self.state = next;
        true
    }

    /// Claims the ticket and awaits the transport once. A no-op when the
    /// ticket is unavailable.
    pub async fn run<T>(&mut self, transport: &T) -> &FinalizationState
    where
        T: CaptureTransport + ?Sized,
    {
        if let Some(ticket) = self.take_capture_ticket() {
            let result = transport.capture(ticket.order_token()).await;
            self.resolve(ticket, result);
        }
        &self.state
    }

    #[must_use]
    pub fn view(&self) -> FinalizationView {
        let tone = match self.state.status {
            FinalizationStatus::Processing => StatusTone::Pending,
            FinalizationStatus::Success => StatusTone::Success,
            FinalizationStatus::Error => StatusTone::Error,
        };
        FinalizationView {
            status: self.state.status,
            title: tone.headline().to_string(),
            message: self.state.message.clone(),
            tone,
            buttons: vec![
                ActionButton::new(ActionKind::BillingOverview, !self.is_busy()),
                ActionButton::new(ActionKind::Dashboard, true),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    enum Reply {
        Outcome(FinalizationOutcome),
        Fail(&'static str),
    }

    struct ScriptedTransport {
        reply: Reply,
        calls: AtomicUsize,
        tokens: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn new(reply: Reply) -> Self {
            Self {
                reply,
                calls: AtomicUsize::new(0),
                tokens: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CaptureTransport for ScriptedTransport {
        type Error = String;

        async fn capture(&self, order_token: &str) -> Result<FinalizationOutcome, Self::Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.tokens
                .lock()
                .expect("tokens lock")
                .push(order_token.to_string());
            match &self.reply {
                Reply::Outcome(outcome) => Ok(outcome.clone()),
                Reply::Fail(message) => Err((*message).to_string()),
            }
        }
    }

    fn mount(query: &str) -> FinalizationController {
        FinalizationController::mount(&QueryParams::parse(query))
    }

    #[tokio::test]
    async fn missing_token_errors_without_calling_capture() {
        let transport = ScriptedTransport::new(Reply::Outcome(FinalizationOutcome::Succeeded));
        let mut controller = mount("");
        assert_eq!(controller.state().status, FinalizationStatus::Error);
        assert_eq!(controller.state().message, MISSING_TOKEN_MESSAGE);

        controller.run(&transport).await;
        assert_eq!(transport.calls(), 0);
        assert_eq!(controller.state().message, MISSING_TOKEN_MESSAGE);
        assert!(!controller.capture_fired());
    }

    #[tokio::test]
    async fn blank_token_counts_as_missing() {
        let transport = ScriptedTransport::new(Reply::Outcome(FinalizationOutcome::Succeeded));
        let mut controller = mount("?token=%20%20");
        controller.run(&transport).await;
        assert_eq!(transport.calls(), 0);
        assert_eq!(controller.state().status, FinalizationStatus::Error);
    }

    #[tokio::test]
    async fn successful_capture_calls_once_and_succeeds() {
        let transport = ScriptedTransport::new(Reply::Outcome(FinalizationOutcome::Succeeded));
        let mut controller = mount("?token=ORDER123&PayerID=XYZ");
        assert_eq!(controller.state().status, FinalizationStatus::Processing);
        assert!(controller.is_busy());

        let state = controller.run(&transport).await.clone();
        assert_eq!(state.status, FinalizationStatus::Success);
        assert!(state.message.contains("successfully"));
        assert_eq!(transport.calls(), 1);
        assert_eq!(
            transport.tokens.lock().expect("tokens lock").as_slice(),
            ["ORDER123".to_string()]
        );
    }

    #[tokio::test]
    async fn capture_is_never_issued_twice_per_mount() {
        let transport = ScriptedTransport::new(Reply::Outcome(FinalizationOutcome::Succeeded));
        let mut controller = mount("token=ORDER123");
        controller.run(&transport).await;
        controller.run(&transport).await;
        assert!(controller.take_capture_ticket().is_none());
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn declined_capture_passes_reason_through() {
        let transport = ScriptedTransport::new(Reply::Outcome(FinalizationOutcome::Declined {
            reason: "X".to_string(),
        }));
        let mut controller = mount("token=ORDER123");
        controller.run(&transport).await;
        assert_eq!(controller.state().status, FinalizationStatus::Error);
        assert_eq!(controller.state().message, "X");
    }

    #[tokio::test]
    async fn transport_failure_is_normalized_to_generic_message() {
        let transport = ScriptedTransport::new(Reply::Fail("socket hang up: 10.0.0.7:443"));
        let mut controller = mount("token=ORDER123");
        controller.run(&transport).await;
        assert_eq!(controller.state().status, FinalizationStatus::Error);
        assert_eq!(controller.state().message, CAPTURE_FAILED_MESSAGE);
        assert!(!controller.state().message.contains("socket"));
        assert_eq!(transport.calls(), 1);
    }

    #[test]
    fn terminal_state_ignores_late_results() {
        let mut controller = mount("token=ORDER123");
        let ticket = controller.take_capture_ticket().expect("first ticket");
        assert!(controller.take_capture_ticket().is_none());
        assert!(controller.resolve::<String>(ticket, Ok(FinalizationOutcome::Succeeded)));

        let stray = CaptureTicket {
            order_token: "ORDER123".to_string(),
        };
        assert!(!controller.resolve(stray, Err("late failure".to_string())));
        assert_eq!(controller.state().status, FinalizationStatus::Success);
    }

    #[test]
    fn wire_failure_without_reason_uses_generic_message() {
        assert_eq!(
            FinalizationOutcome::from_wire(false, None),
            FinalizationOutcome::Declined {
                reason: CAPTURE_FAILED_MESSAGE.to_string()
            }
        );
        assert_eq!(
            FinalizationOutcome::from_wire(false, Some("   ".to_string())),
            FinalizationOutcome::Declined {
                reason: CAPTURE_FAILED_MESSAGE.to_string()
            }
        );
        assert_eq!(
            FinalizationOutcome::from_wire(true, Some("ignored".to_string())),
            FinalizationOutcome::Succeeded
        );
    }

    #[test]
    fn capture_response_decodes_optional_error() {
        let ok: CaptureResponse =
            serde_json::from_str(r#"{"success":true}"#).expect("success body");
        assert_eq!(FinalizationOutcome::from(ok), FinalizationOutcome::Succeeded);

        let declined: CaptureResponse =
            serde_json::from_str(r#"{"success":false,"error":"INSTRUMENT_DECLINED"}"#)
                .expect("declined body");
        assert_eq!(
            FinalizationOutcome::from(declined),
            FinalizationOutcome::Declined {
                reason: "INSTRUMENT_DECLINED".to_string()
            }
        );
    }

    #[test]
    fn capture_request_ids_are_prefixed_uuids() {
        let first = capture_request_id();
        let second = capture_request_id();

        let hex = first.strip_prefix("req_").expect("req_ prefix");
        assert_eq!(hex.len(), 32);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, second);
    }

    #[test]
    fn padded_decline_reason_is_kept_verbatim() {
        let outcome = classify_capture_reply(
            200,
            br#"{"success":false,"error":"  Card declined by issuer\n"}"#,
        );
        let mut controller = FinalizationController::mount(&QueryParams::parse("token=EC-9"));
        let ticket = controller.take_capture_ticket().expect("ticket");

        assert!(controller.resolve(ticket, outcome));
        assert_eq!(controller.state().status, FinalizationStatus::Error);
        assert_eq!(controller.state().message, "  Card declined by issuer\n");
    }

    #[test]
    fn capture_reply_classification() {
        assert_eq!(
            classify_capture_reply(200, br#"{"success":true}"#),
            Ok(FinalizationOutcome::Succeeded)
        );
        assert_eq!(
            classify_capture_reply(422, br#"{"success":false,"error":"ORDER_NOT_APPROVED"}"#),
            Ok(FinalizationOutcome::Declined {
                reason: "ORDER_NOT_APPROVED".to_string()
            })
        );
        assert_eq!(
            classify_capture_reply(500, br#"{"success":true}"#),
            Err(CaptureReplyError::Http {
                status: 500,
                body: r#"{"success":true}"#.to_string()
            })
        );
        assert_eq!(
            classify_capture_reply(503, b"  "),
            Err(CaptureReplyError::Http {
                status: 503,
                body: "<empty>".to_string()
            })
        );
        assert!(matches!(
            classify_capture_reply(200, b"<html>"),
            Err(CaptureReplyError::Decode { .. })
        ));
    }

    #[test]
    fn billing_button_is_gated_while_busy_but_dashboard_is_not() {
        let mut controller = mount("token=ORDER123");
        let view = controller.view();
        assert_eq!(view.tone, StatusTone::Pending);
        assert!(!view.button(ActionKind::BillingOverview).expect("billing").enabled);
        assert!(view.button(ActionKind::Dashboard).expect("dashboard").enabled);

        let ticket = controller.take_capture_ticket().expect("ticket");
        controller.resolve::<String>(ticket, Ok(FinalizationOutcome::Succeeded));
        let view = controller.view();
        assert_eq!(view.tone, StatusTone::Success);
        assert!(view.button(ActionKind::BillingOverview).expect("billing").enabled);
        assert!(view.button(ActionKind::Dashboard).expect("dashboard").enabled);
    }

    #[test]
    fn missing_token_view_enables_both_exits() {
        let view = mount("").view();
        assert_eq!(view.status, FinalizationStatus::Error);
        assert!(view.buttons.iter().all(|button| button.enabled));
    }
}
