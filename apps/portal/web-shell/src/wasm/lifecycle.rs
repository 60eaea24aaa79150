use super::*;

pub(super) fn set_boot_phase(phase: &str, detail: &str) {
    DIAGNOSTICS.with(|state| {
        let mut state = state.borrow_mut();
        state.phase = phase.to_string();
        state.detail = detail.to_string();
        if phase != "error" {
            state.last_error = None;
        }
    });
    update_status_dom(phase, detail, false);
}

pub(super) fn set_boot_error(message: &str) {
    DIAGNOSTICS.with(|state| {
        let mut state = state.borrow_mut();
        state.phase = "error".to_string();
        state.detail = "startup failed".to_string();
        state.last_error = Some(message.to_string());
    });
    console_error(message);
    update_status_dom("error", message, true);
}

/// The status line stays hidden unless boot fails.
pub(super) fn update_status_dom(phase: &str, detail: &str, is_error: bool) {
    let Ok(document) = dom::document() else {
        return;
    };
    let Some(status) = document
        .get_element_by_id(SHELL_STATUS_ID)
        .and_then(|element| element.dyn_into::<HtmlElement>().ok())
    else {
        return;
    };
    let label = if is_error { "Boot error" } else { "Boot" };
    status.set_inner_text(&format!("{label}: {phase} ({detail})"));
    let _ = status
        .style()
        .set_property("display", if is_error { "block" } else { "none" });
    let _ = status.style().set_property("color", "#f87171");
}

pub(super) fn console_error(message: &str) {
    web_sys::console::error_1(&JsValue::from_str(message));
}

pub(super) fn epoch_millis_now() -> u64 {
    let now = js_sys::Date::now();
    if !now.is_finite() || now.is_sign_negative() {
        return 0;
    }
    now.floor().min(u64::MAX as f64) as u64
}

pub(super) fn current_pathname() -> String {
    let Some(window) = web_sys::window() else {
        return "/".to_string();
    };
    let Ok(pathname) = window.location().pathname() else {
        return "/".to_string();
    };
    if pathname.trim().is_empty() {
        "/".to_string()
    } else {
        pathname
    }
}

pub(super) fn current_search() -> String {
    web_sys::window()
        .and_then(|window| window.location().search().ok())
        .unwrap_or_default()
}
