use super::*;

/// Billing and dashboard live outside this shell, so leaving is a full
/// navigation rather than a history push.
pub(super) fn navigate_to_path(path: &str) {
    let Some(window) = web_sys::window() else {
        return;
    };
    if let Err(error) = window.location().assign(path) {
        console_error(&format!("navigation to {path} failed: {error:?}"));
    }
}

/// Wires `pagehide`/`pageshow`. A discarded page drops the console so the
/// previous title comes back and a late close fallback finds the view gone;
/// a page kept in the back/forward cache keeps it, and a restored page that
/// lost its console mounts it again.
pub(super) fn install_page_transition_handlers() -> Result<(), String> {
    if PAGEHIDE_HANDLER.with(|slot| slot.borrow().is_some()) {
        return Ok(());
    }
    let window = web_sys::window().ok_or_else(|| "window is unavailable".to_string())?;

    let hide = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
        if page_hide_action(event_persisted(&event)) == PageTransitionAction::Teardown {
            teardown_console();
        }
    });
    window
        .add_event_listener_with_callback("pagehide", hide.as_ref().unchecked_ref())
        .map_err(|_| "failed to install pagehide handler".to_string())?;
    PAGEHIDE_HANDLER.with(|slot| *slot.borrow_mut() = Some(hide));

    let show = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
        let mounted = CONSOLE.with(|slot| slot.try_borrow().is_ok_and(|slot| slot.is_some()));
        if page_show_action(event_persisted(&event), mounted) == PageTransitionAction::Remount {
            if let Err(error) = remount_console() {
                set_boot_error(&error);
            }
        }
    });
    window
        .add_event_listener_with_callback("pageshow", show.as_ref().unchecked_ref())
        .map_err(|_| "failed to install pageshow handler".to_string())?;
    PAGESHOW_HANDLER.with(|slot| *slot.borrow_mut() = Some(show));
    Ok(())
}

fn event_persisted(event: &web_sys::Event) -> bool {
    event
        .dyn_ref::<web_sys::PageTransitionEvent>()
        .is_some_and(web_sys::PageTransitionEvent::persisted)
}
