//! Platform-independent state for the portal client.
//!
//! Two views live here: the post-redirect capture return
//! ([`finalization`]) and the detached SSH console window ([`console`]).
//! Hosts (the browser shell, the operator CLI, tests) supply the I/O through
//! the [`finalization::CaptureTransport`], [`console::WindowHost`] and
//! [`console::TerminalCollaborator`] traits.

pub mod config;
pub mod console;
pub mod finalization;
pub mod presentation;
pub mod route;

pub use console::{
    CLOSE_FALLBACK_DELAY, CloseFallback, FallbackOutcome, SessionIdentity,
    SessionWindowController, TerminalBinding, TerminalCollaborator, TitleGuard, WindowHost,
    WindowLifecycleState, console_title,
};
pub use finalization::{
    CaptureReplyError, CaptureResponse, CaptureTicket, CaptureTransport, FinalizationController,
    FinalizationOutcome, FinalizationRequest, FinalizationState, FinalizationStatus,
    REQUEST_ID_HEADER, capture_request_id, classify_capture_reply,
};
pub use presentation::{ActionButton, ActionKind, ConsoleView, FinalizationView, StatusTone};
pub use route::{QueryParams, ShellRoute, decode_label};
