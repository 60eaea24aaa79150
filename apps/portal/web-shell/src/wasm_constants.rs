use std::time::Duration;

use portal_client_core::config::DEFAULT_CAPTURE_TIMEOUT_MS;

pub(crate) const SHELL_ROOT_ID: &str = "portal-web-shell-root";
pub(crate) const SHELL_STATUS_ID: &str = "portal-web-shell-status";

pub(crate) const CAPTURE_PANEL_ID: &str = "portal-web-shell-capture";
pub(crate) const CAPTURE_ICON_ID: &str = "portal-web-shell-capture-icon";
pub(crate) const CAPTURE_HEADING_ID: &str = "portal-web-shell-capture-heading";
pub(crate) const CAPTURE_MESSAGE_ID: &str = "portal-web-shell-capture-message";
pub(crate) const CAPTURE_BILLING_BUTTON_ID: &str = "portal-web-shell-capture-billing";
pub(crate) const CAPTURE_DASHBOARD_BUTTON_ID: &str = "portal-web-shell-capture-dashboard";

pub(crate) const CONSOLE_PANEL_ID: &str = "portal-web-shell-console";
pub(crate) const CONSOLE_HEADER_ID: &str = "portal-web-shell-console-header";
pub(crate) const CONSOLE_RELOAD_BUTTON_ID: &str = "portal-web-shell-console-reload";
pub(crate) const CONSOLE_CLOSE_BUTTON_ID: &str = "portal-web-shell-console-close";
pub(crate) const CONSOLE_TERMINAL_ID: &str = "portal-web-shell-console-terminal";
pub(crate) const CONSOLE_NOTICE_ID: &str = "portal-web-shell-console-notice";

/// Optional `window` override for the capture API origin.
pub(crate) const API_BASE_HOOK: &str = "__PORTAL_API_BASE__";
/// `window` object exposing `mount(container, options)` for the terminal.
pub(crate) const TERMINAL_HOOK: &str = "__PORTAL_TERMINAL__";
pub(crate) const TERMINAL_MOUNT_METHOD: &str = "mount";

pub(crate) const CAPTURE_REQUEST_TIMEOUT: Duration = Duration::from_millis(DEFAULT_CAPTURE_TIMEOUT_MS);
