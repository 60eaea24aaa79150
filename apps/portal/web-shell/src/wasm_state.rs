use portal_client_core::{FallbackOutcome, FinalizationStatus};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub(crate) struct BootDiagnostics {
    pub(crate) phase: String,
    pub(crate) detail: String,
    pub(crate) boot_started_at_unix_ms: Option<u64>,
    pub(crate) route_path: String,
    pub(crate) surface: Option<ShellSurface>,
    pub(crate) capture_status: Option<FinalizationStatus>,
    pub(crate) capture_latency_ms: Option<u64>,
    pub(crate) terminal_attached: bool,
    pub(crate) close_outcome: Option<FallbackOutcome>,
    pub(crate) last_error: Option<String>,
}

impl Default for BootDiagnostics {
    fn default() -> Self {
        Self {
            phase: "idle".to_string(),
            detail: "waiting for boot".to_string(),
            boot_started_at_unix_ms: None,
            route_path: "/".to_string(),
            surface: None,
            capture_status: None,
            capture_latency_ms: None,
            terminal_attached: false,
            close_outcome: None,
            last_error: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ShellSurface {
    CaptureReturn,
    Console,
}
