use portal_client_core::{TerminalBinding, TerminalCollaborator, WindowHost};

use super::*;

/// The live browser window behind the console controller.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct BrowserWindow;

impl WindowHost for BrowserWindow {
    fn document_title(&self) -> String {
        dom::document()
            .map(|document| document.title())
            .unwrap_or_default()
    }

    fn set_document_title(&self, title: &str) {
        if let Ok(document) = dom::document() {
            document.set_title(title);
        }
    }

    fn close_window(&self) {
        if let Some(window) = web_sys::window() {
            if let Err(error) = window.close() {
                console_error(&format!("window.close failed: {error:?}"));
            }
        }
    }

    fn is_window_closed(&self) -> bool {
        web_sys::window().is_none_or(|window| window.closed().unwrap_or(false))
    }

    fn navigate_back(&self) {
        let Some(window) = web_sys::window() else {
            return;
        };
        match window.history() {
            Ok(history) => {
                if let Err(error) = history.back() {
                    console_error(&format!("history.back failed: {error:?}"));
                }
            }
            Err(error) => console_error(&format!("history is unavailable: {error:?}")),
        }
    }

    fn reload(&self) {
        if let Some(window) = web_sys::window() {
            if let Err(error) = window.location().reload() {
                console_error(&format!("location.reload failed: {error:?}"));
            }
        }
    }
}

/// Hands the binding to the page's terminal component through
/// `window.__PORTAL_TERMINAL__.mount(container, options)`.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct BrowserTerminal;

impl TerminalCollaborator for BrowserTerminal {
    fn attach(&self, binding: &TerminalBinding) {
        if let Err(error) = mount_terminal(binding) {
            console_error(&format!("terminal mount failed: {error}"));
            render_terminal_unavailable(&error);
        }
    }
}

fn mount_terminal(binding: &TerminalBinding) -> Result<(), String> {
    let window = web_sys::window().ok_or_else(|| "window is unavailable".to_string())?;
    let hook = js_sys::Reflect::get(&window, &JsValue::from_str(TERMINAL_HOOK))
        .map_err(|_| format!("failed to read window.{TERMINAL_HOOK}"))?;
    if hook.is_undefined() || hook.is_null() {
        return Err(format!("window.{TERMINAL_HOOK} is not installed"));
    }
    let mount = js_sys::Reflect::get(&hook, &JsValue::from_str(TERMINAL_MOUNT_METHOD))
        .map_err(|_| format!("failed to read {TERMINAL_HOOK}.{TERMINAL_MOUNT_METHOD}"))?
        .dyn_into::<js_sys::Function>()
        .map_err(|_| format!("{TERMINAL_HOOK}.{TERMINAL_MOUNT_METHOD} is not a function"))?;

    let container = dom::document()?
        .get_element_by_id(CONSOLE_TERMINAL_ID)
        .ok_or_else(|| "terminal container is missing".to_string())?;
    let options = serde_json::to_string(&terminal_mount_options(binding))
        .map_err(|error| format!("failed to encode terminal options: {error}"))?;
    let options = js_sys::JSON::parse(&options)
        .map_err(|_| "failed to build terminal options".to_string())?;

    mount
        .call2(&hook, &container, &options)
        .map_err(|error| format!("terminal mount threw: {error:?}"))?;
    Ok(())
}
