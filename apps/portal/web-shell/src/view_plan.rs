//! DOM-free layout of the two shell views. The wasm layer walks these plans;
//! keeping them plain data lets the layout be tested natively.

use portal_client_core::{ActionKind, ConsoleView, FinalizationView, TerminalBinding};
use serde_json::{Value, json};

use crate::wasm_constants::{
    CAPTURE_BILLING_BUTTON_ID, CAPTURE_DASHBOARD_BUTTON_ID, CONSOLE_CLOSE_BUTTON_ID,
    CONSOLE_RELOAD_BUTTON_ID, CONSOLE_TERMINAL_ID,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ActionPlan {
    pub(crate) id: &'static str,
    pub(crate) kind: ActionKind,
    pub(crate) label: String,
    pub(crate) target_path: String,
    pub(crate) disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StatusPanelPlan {
    pub(crate) icon: &'static str,
    pub(crate) heading: String,
    pub(crate) message: String,
    pub(crate) foreground: &'static str,
    pub(crate) background: &'static str,
    pub(crate) actions: Vec<ActionPlan>,
}

pub(crate) fn action_button_id(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::BillingOverview => CAPTURE_BILLING_BUTTON_ID,
        ActionKind::Dashboard => CAPTURE_DASHBOARD_BUTTON_ID,
    }
}

pub(crate) fn status_panel_plan(view: &FinalizationView) -> StatusPanelPlan {
    let (foreground, background) = view.tone.colors();
    StatusPanelPlan {
        icon: view.tone.icon(),
        heading: view.title.clone(),
        message: view.message.clone(),
        foreground,
        background,
        actions: view
            .buttons
            .iter()
            .map(|button| ActionPlan {
                id: action_button_id(button.kind),
                kind: button.kind,
                label: button.label.clone(),
                target_path: button.path.clone(),
                disabled: !button.enabled,
            })
            .collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConsoleControl {
    Reload,
    Close,
}

impl ConsoleControl {
    pub(crate) fn id(self) -> &'static str {
        match self {
            Self::Reload => CONSOLE_RELOAD_BUTTON_ID,
            Self::Close => CONSOLE_CLOSE_BUTTON_ID,
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Reload => "Reload",
            Self::Close => "Close",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ConsoleBody {
    Terminal { container_id: &'static str },
    Notice { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConsolePanelPlan {
    pub(crate) header: String,
    pub(crate) controls: Vec<ConsoleControl>,
    pub(crate) body: ConsoleBody,
}

pub(crate) fn console_panel_plan(view: &ConsoleView) -> ConsolePanelPlan {
    match view {
        ConsoleView::Active { header, .. } => ConsolePanelPlan {
            header: header.clone(),
            controls: vec![ConsoleControl::Reload, ConsoleControl::Close],
            body: ConsoleBody::Terminal {
                container_id: CONSOLE_TERMINAL_ID,
            },
        },
        ConsoleView::MissingSession { title, message } => ConsolePanelPlan {
            header: title.clone(),
            controls: vec![ConsoleControl::Close],
            body: ConsoleBody::Notice {
                message: message.clone(),
            },
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PageTransitionAction {
    None,
    /// The page is being discarded: drop the console so the title is restored.
    Teardown,
    /// The page came back from the back/forward cache without a console.
    Remount,
}

/// `pagehide` with `persisted` set keeps the page alive in the back/forward
/// cache, so the console and its handlers must survive it.
pub(crate) fn page_hide_action(persisted: bool) -> PageTransitionAction {
    if persisted {
        PageTransitionAction::None
    } else {
        PageTransitionAction::Teardown
    }
}

pub(crate) fn page_show_action(persisted: bool, console_mounted: bool) -> PageTransitionAction {
    if persisted && !console_mounted {
        PageTransitionAction::Remount
    } else {
        PageTransitionAction::None
    }
}

/// Options object handed to the page's terminal component.
pub(crate) fn terminal_mount_options(binding: &TerminalBinding) -> Value {
    json!({
        "sessionId": binding.session_id,
        "fullScreen": binding.full_screen,
        "fitToContainer": binding.fit_to_container,
    })
}
