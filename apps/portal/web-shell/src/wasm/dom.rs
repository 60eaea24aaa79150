use super::*;

use crate::view_plan::{ConsoleBody, ConsolePanelPlan, StatusPanelPlan};

pub(super) fn document() -> Result<web_sys::Document, String> {
    web_sys::window()
        .ok_or_else(|| "window is unavailable".to_string())?
        .document()
        .ok_or_else(|| "document is unavailable".to_string())
}

pub(super) fn create_element(tag: &str, id: Option<&str>) -> Result<HtmlElement, String> {
    let element = document()?
        .create_element(tag)
        .map_err(|_| format!("failed to create {tag} element"))?
        .dyn_into::<HtmlElement>()
        .map_err(|_| format!("{tag} element is not HtmlElement"))?;
    if let Some(id) = id {
        element.set_id(id);
    }
    Ok(element)
}

pub(super) fn apply_style(element: &HtmlElement, rules: &[(&str, &str)]) -> Result<(), String> {
    let style = element.style();
    for (property, value) in rules {
        style
            .set_property(property, value)
            .map_err(|_| format!("failed to set {property} on #{}", element.id()))?;
    }
    Ok(())
}

pub(super) fn ensure_shell_root() -> Result<HtmlElement, String> {
    let document = document()?;
    if let Some(existing) = document.get_element_by_id(SHELL_ROOT_ID) {
        return existing
            .dyn_into::<HtmlElement>()
            .map_err(|_| "shell root exists but is not HtmlElement".to_string());
    }
    let body = document
        .body()
        .ok_or_else(|| "document body is unavailable".to_string())?;

    let root = create_element("main", Some(SHELL_ROOT_ID))?;
    apply_style(
        &root,
        &[
            ("position", "fixed"),
            ("inset", "0"),
            ("display", "flex"),
            ("flex-direction", "column"),
            ("background", "#080A10"),
            ("color", "#e2e8f0"),
            ("font-family", "ui-sans-serif, system-ui, sans-serif"),
        ],
    )?;
    body.append_child(&root)
        .map_err(|_| "failed to append shell root".to_string())?;

    let status = create_element("div", Some(SHELL_STATUS_ID))?;
    apply_style(
        &status,
        &[
            ("display", "none"),
            ("position", "fixed"),
            ("bottom", "12px"),
            ("left", "12px"),
            ("font-family", "monospace"),
            ("font-size", "12px"),
        ],
    )?;
    body.append_child(&status)
        .map_err(|_| "failed to append status element".to_string())?;

    Ok(root)
}

/// Replaces the shell root's content with `child`.
fn mount_panel(child: &HtmlElement) -> Result<(), String> {
    let root = ensure_shell_root()?;
    root.set_inner_html("");
    root.append_child(child)
        .map_err(|_| format!("failed to mount #{}", child.id()))?;
    Ok(())
}

fn create_button(id: &str, label: &str, disabled: bool) -> Result<HtmlElement, String> {
    let button = create_element("button", Some(id))?;
    button.set_inner_text(label);
    if let Some(button) = button.dyn_ref::<web_sys::HtmlButtonElement>() {
        button.set_disabled(disabled);
    }
    apply_style(
        &button,
        &[
            ("padding", "8px 14px"),
            ("border-radius", "6px"),
            ("border", "1px solid #334155"),
            ("background", "#111827"),
            ("color", "#e2e8f0"),
            ("cursor", if disabled { "not-allowed" } else { "pointer" }),
            ("opacity", if disabled { "0.5" } else { "1" }),
        ],
    )?;
    Ok(button)
}

fn bind_click(
    element: &HtmlElement,
    handler: impl FnMut(web_sys::Event) + 'static,
) -> Result<Closure<dyn FnMut(web_sys::Event)>, String> {
    let closure = Closure::<dyn FnMut(web_sys::Event)>::new(handler);
    element
        .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())
        .map_err(|_| format!("failed to bind click on #{}", element.id()))?;
    Ok(closure)
}

pub(super) fn render_status_panel(plan: &StatusPanelPlan) -> Result<(), String> {
    let panel = create_element("section", Some(CAPTURE_PANEL_ID))?;
    apply_style(
        &panel,
        &[
            ("margin", "auto"),
            ("max-width", "420px"),
            ("padding", "32px"),
            ("border-radius", "12px"),
            ("text-align", "center"),
            ("background", plan.background),
            ("color", plan.foreground),
        ],
    )?;

    let icon = create_element("div", Some(CAPTURE_ICON_ID))?;
    icon.set_inner_text(plan.icon);
    apply_style(&icon, &[("font-size", "40px")])?;
    let heading = create_element("h1", Some(CAPTURE_HEADING_ID))?;
    heading.set_inner_text(&plan.heading);
    apply_style(&heading, &[("font-size", "20px"), ("margin", "12px 0 8px")])?;
    let message = create_element("p", Some(CAPTURE_MESSAGE_ID))?;
    message.set_inner_text(&plan.message);

    let actions = create_element("div", None)?;
    apply_style(
        &actions,
        &[
            ("display", "flex"),
            ("gap", "8px"),
            ("justify-content", "center"),
            ("margin-top", "20px"),
        ],
    )?;

    let mut handlers = Vec::with_capacity(plan.actions.len());
    for action in &plan.actions {
        let button = create_button(action.id, &action.label, action.disabled)?;
        let kind = action.kind;
        handlers.push(bind_click(&button, move |_| activate_capture_action(kind))?);
        let _ = actions.append_child(&button);
    }

    for child in [&icon, &heading, &message, &actions] {
        let _ = panel.append_child(child);
    }
    mount_panel(&panel)?;
    CAPTURE_ACTION_HANDLERS.with(|slot| *slot.borrow_mut() = handlers);
    Ok(())
}

pub(super) fn render_console_panel(plan: &ConsolePanelPlan) -> Result<(), String> {
    let panel = create_element("section", Some(CONSOLE_PANEL_ID))?;
    apply_style(
        &panel,
        &[("display", "flex"), ("flex-direction", "column"), ("flex", "1")],
    )?;

    let bar = create_element("header", None)?;
    apply_style(
        &bar,
        &[
            ("display", "flex"),
            ("align-items", "center"),
            ("gap", "8px"),
            ("padding", "8px 12px"),
            ("border-bottom", "1px solid #1f2937"),
        ],
    )?;
    let header = create_element("span", Some(CONSOLE_HEADER_ID))?;
    header.set_inner_text(&plan.header);
    apply_style(
        &header,
        &[
            ("flex", "1"),
            ("font-family", "ui-monospace, SFMono-Regular, Menlo, monospace"),
            ("font-size", "13px"),
        ],
    )?;
    let _ = bar.append_child(&header);

    let mut handlers = Vec::with_capacity(plan.controls.len());
    for control in &plan.controls {
        let control = *control;
        let button = create_button(control.id(), control.label(), false)?;
        handlers.push(bind_click(&button, move |_| activate_console_control(control))?);
        let _ = bar.append_child(&button);
    }
    let _ = panel.append_child(&bar);

    let body = match &plan.body {
        ConsoleBody::Terminal { container_id } => {
            let container = create_element("div", Some(*container_id))?;
            apply_style(&container, &[("flex", "1"), ("min-height", "0")])?;
            container
        }
        ConsoleBody::Notice { message } => {
            let notice = create_element("p", Some(CONSOLE_NOTICE_ID))?;
            notice.set_inner_text(message);
            apply_style(&notice, &[("margin", "auto"), ("max-width", "420px")])?;
            notice
        }
    };
    let _ = panel.append_child(&body);

    mount_panel(&panel)?;
    CONSOLE_CONTROL_HANDLERS.with(|slot| *slot.borrow_mut() = handlers);
    Ok(())
}

/// Placeholder shown in the terminal container when the page did not
/// provide a terminal component.
pub(super) fn render_terminal_unavailable(reason: &str) {
    let Ok(document) = document() else {
        return;
    };
    if let Some(container) = document
        .get_element_by_id(CONSOLE_TERMINAL_ID)
        .and_then(|element| element.dyn_into::<HtmlElement>().ok())
    {
        container.set_inner_text(&format!("Terminal unavailable: {reason}"));
    }
}
