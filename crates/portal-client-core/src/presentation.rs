//! Stateless view projections. Hosts render these; nothing here owns state.

use serde::Serialize;

use crate::console::TerminalBinding;
use crate::finalization::FinalizationStatus;
use crate::route::ShellRoute;

pub const MISSING_SESSION_TITLE: &str = "No console session";
pub const MISSING_SESSION_MESSAGE: &str =
    "This window was opened without a session. Close it and launch the console again from the dashboard.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusTone {
    Pending,
    Success,
    Error,
}

impl StatusTone {
    #[must_use]
    pub fn headline(self) -> &'static str {
        match self {
            Self::Pending => "Processing payment",
            Self::Success => "Payment complete",
            Self::Error => "Payment failed",
        }
    }

    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            Self::Pending => "\u{27f3}",
            Self::Success => "\u{2713}",
            Self::Error => "\u{2715}",
        }
    }

    /// Foreground / background colour pair.
    #[must_use]
    pub fn colors(self) -> (&'static str, &'static str) {
        match self {
            Self::Pending => ("#bfdbfe", "#0f172a"),
            Self::Success => ("#bbf7d0", "#052e16"),
            Self::Error => ("#fecaca", "#3f1d1d"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    BillingOverview,
    Dashboard,
}

impl ActionKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::BillingOverview => "Back to billing",
            Self::Dashboard => "Go to dashboard",
        }
    }

    #[must_use]
    pub fn route(self) -> ShellRoute {
        match self {
            Self::BillingOverview => ShellRoute::BillingOverview,
            Self::Dashboard => ShellRoute::Dashboard,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionButton {
    pub kind: ActionKind,
    pub label: String,
    pub path: String,
    pub enabled: bool,
}

impl ActionButton {
    #[must_use]
    pub fn new(kind: ActionKind, enabled: bool) -> Self {
        Self {
            kind,
            label: kind.label().to_string(),
            path: kind.route().to_path(),
            enabled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinalizationView {
    pub status: FinalizationStatus,
    pub title: String,
    pub message: String,
    pub tone: StatusTone,
    pub buttons: Vec<ActionButton>,
}

impl FinalizationView {
    #[must_use]
    pub fn button(&self, kind: ActionKind) -> Option<&ActionButton> {
        self.buttons.iter().find(|button| button.kind == kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConsoleView {
    /// No session id: only a close affordance is offered.
    MissingSession { title: String, message: String },
    Active {
        header: String,
        binding: TerminalBinding,
    },
}

impl ConsoleView {
    #[must_use]
    pub fn missing_session() -> Self {
        Self::MissingSession {
            title: MISSING_SESSION_TITLE.to_string(),
            message: MISSING_SESSION_MESSAGE.to_string(),
        }
    }

    #[must_use]
    pub fn binding(&self) -> Option<&TerminalBinding> {
        match self {
            Self::Active { binding, .. } => Some(binding),
            Self::MissingSession { .. } => None,
        }
    }

    #[must_use]
    pub fn offers_reload(&self) -> bool {
        matches!(self, Self::Active { .. })
    }
}
