#![allow(clippy::needless_pass_by_value)]

#[cfg(any(target_arch = "wasm32", test))]
mod view_plan;
#[cfg(any(target_arch = "wasm32", test))]
mod wasm_constants;
#[cfg(target_arch = "wasm32")]
mod wasm_state;

#[cfg(target_arch = "wasm32")]
mod wasm {
    use std::cell::RefCell;

    use gloo_timers::future::sleep;
    use portal_client_core::route::QueryParams;
    use portal_client_core::{
        ActionKind, CaptureTransport, FinalizationController, SessionWindowController, ShellRoute,
    };
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::spawn_local;
    use web_sys::HtmlElement;

    use crate::view_plan::{
        ConsoleControl, PageTransitionAction, console_panel_plan, page_hide_action,
        page_show_action, status_panel_plan, terminal_mount_options,
    };
    use crate::wasm_constants::*;
    use crate::wasm_state::{BootDiagnostics, ShellSurface};

    mod dom;
    mod host;
    mod lifecycle;
    mod network;
    mod routing;

    use dom::*;
    use host::*;
    use lifecycle::*;
    use network::*;
    use routing::*;

    thread_local! {
        static DIAGNOSTICS: RefCell<BootDiagnostics> = RefCell::new(BootDiagnostics::default());
        static FINALIZATION: RefCell<Option<FinalizationController>> = const { RefCell::new(None) };
        static CONSOLE: RefCell<Option<SessionWindowController<BrowserWindow>>> = const { RefCell::new(None) };
        static CAPTURE_ACTION_HANDLERS: RefCell<Vec<Closure<dyn FnMut(web_sys::Event)>>> = const { RefCell::new(Vec::new()) };
        static CONSOLE_CONTROL_HANDLERS: RefCell<Vec<Closure<dyn FnMut(web_sys::Event)>>> = const { RefCell::new(Vec::new()) };
        static PAGEHIDE_HANDLER: RefCell<Option<Closure<dyn FnMut(web_sys::Event)>>> = const { RefCell::new(None) };
        static PAGESHOW_HANDLER: RefCell<Option<Closure<dyn FnMut(web_sys::Event)>>> = const { RefCell::new(None) };
    }

    #[wasm_bindgen(start)]
    pub fn start() {
        console_error_panic_hook::set_once();
        DIAGNOSTICS.with(|state| {
            state.borrow_mut().boot_started_at_unix_ms = Some(epoch_millis_now());
        });
        set_boot_phase("booting", "initializing portal web shell");
        if let Err(error) = boot() {
            set_boot_error(&error);
        }
    }

    fn boot() -> Result<(), String> {
        ensure_shell_root()?;
        install_page_transition_handlers()?;

        let path = current_pathname();
        let query = QueryParams::parse(&current_search());
        DIAGNOSTICS.with(|state| state.borrow_mut().route_path = path.clone());

        match ShellRoute::from_path(&path) {
            ShellRoute::CaptureReturn => mount_capture_return(&query),
            ShellRoute::Console { session_id } => mount_console(session_id.as_deref(), &query),
            other => Err(format!("route {} is not served by this shell", other.to_path())),
        }
    }

    fn mount_capture_return(query: &QueryParams) -> Result<(), String> {
        FINALIZATION.with(|slot| *slot.borrow_mut() = Some(FinalizationController::mount(query)));
        DIAGNOSTICS.with(|state| state.borrow_mut().surface = Some(ShellSurface::CaptureReturn));
        // A broken render must not strand an authorized payment: report it and
        // still issue the capture.
        if let Err(error) = render_capture_return() {
            set_boot_error(&error);
        }

        let ticket = FINALIZATION.with(|slot| {
            slot.borrow_mut()
                .as_mut()
                .and_then(FinalizationController::take_capture_ticket)
        });
        let Some(ticket) = ticket else {
            set_boot_phase("ready", "capture return without order token");
            return Ok(());
        };

        set_boot_phase("capturing", "finalizing payment");
        let started_at = epoch_millis_now();
        spawn_local(async move {
            let result = match BrowserCaptureTransport::from_window() {
                Ok(transport) => transport.capture(ticket.order_token()).await,
                Err(error) => Err(error),
            };
            if let Err(error) = &result {
                console_error(&format!("payment capture failed: {error}"));
            }
            let changed = FINALIZATION.with(|slot| {
                slot.borrow_mut()
                    .as_mut()
                    .is_some_and(|controller| controller.resolve(ticket, result))
            });
            if !changed {
                return;
            }
            record_capture_result(epoch_millis_now().saturating_sub(started_at));
            match render_capture_return() {
                Ok(()) => set_boot_phase("ready", "capture finished"),
                Err(error) => set_boot_error(&error),
            }
        });
        Ok(())
    }

    fn render_capture_return() -> Result<(), String> {
        let Some(view) = FINALIZATION.with(|slot| slot.borrow().as_ref().map(FinalizationController::view))
        else {
            return Ok(());
        };
        render_status_panel(&status_panel_plan(&view))
    }

    fn record_capture_result(latency_ms: u64) {
        let status = FINALIZATION.with(|slot| {
            slot.borrow()
                .as_ref()
                .map(|controller| controller.state().status)
        });
        DIAGNOSTICS.with(|state| {
            let mut state = state.borrow_mut();
            state.capture_status = status;
            state.capture_latency_ms = Some(latency_ms);
        });
    }

    /// Click path for the capture panel buttons. The billing action is gated
    /// on the controller so a stale enabled button cannot skip the busy state.
    pub(super) fn activate_capture_action(kind: ActionKind) {
        let target = FINALIZATION.with(|slot| {
            slot.borrow().as_ref().and_then(|controller| {
                controller
                    .view()
                    .button(kind)
                    .filter(|button| button.enabled)
                    .map(|button| button.path.clone())
            })
        });
        if let Some(target) = target {
            navigate_to_path(&target);
        }
    }

    /// Mounts the console again for the current location after a
    /// back/forward cache restore found it torn down.
    pub(super) fn remount_console() -> Result<(), String> {
        let query = QueryParams::parse(&current_search());
        match ShellRoute::from_path(&current_pathname()) {
            ShellRoute::Console { session_id } => mount_console(session_id.as_deref(), &query),
            _ => Ok(()),
        }
    }

    fn mount_console(session_id: Option<&str>, query: &QueryParams) -> Result<(), String> {
        let identity = portal_client_core::SessionIdentity::from_route(session_id, query);
        // The terminal container has to exist before the controller attaches.
        render_console_panel(&console_panel_plan(&identity.console_view()))?;

        let terminal = BrowserTerminal;
        let controller =
            SessionWindowController::mount(BrowserWindow, &terminal, session_id, query);
        let attached = controller.view().binding().is_some();
        CONSOLE.with(|slot| *slot.borrow_mut() = Some(controller));
        DIAGNOSTICS.with(|state| {
            let mut state = state.borrow_mut();
            state.surface = Some(ShellSurface::Console);
            state.terminal_attached = attached;
        });
        set_boot_phase("ready", if attached { "console attached" } else { "console without session" });
        Ok(())
    }

    pub(super) fn activate_console_control(control: ConsoleControl) {
        match control {
            ConsoleControl::Reload => CONSOLE.with(|slot| {
                if let Some(controller) = slot.borrow().as_ref() {
                    controller.reload();
                }
            }),
            ConsoleControl::Close => request_console_close(),
        }
    }

    fn request_console_close() {
        let fallback = CONSOLE.with(|slot| {
            slot.borrow()
                .as_ref()
                .and_then(SessionWindowController::request_close)
        });
        let Some(fallback) = fallback else {
            return;
        };
        spawn_local(async move {
            let delay = fallback.delay();
            let outcome = fallback.fire_after(sleep(delay)).await;
            DIAGNOSTICS.with(|state| state.borrow_mut().close_outcome = Some(outcome));
        });
    }

    /// Drops the mounted console so the title override is restored and any
    /// pending close fallback sees the view as gone.
    pub(super) fn teardown_console() {
        let controller = CONSOLE.with(|slot| match slot.try_borrow_mut() {
            Ok(mut slot) => slot.take(),
            Err(_) => {
                console_error("console teardown raced an active handler");
                None
            }
        });
        drop(controller);
        CONSOLE_CONTROL_HANDLERS.with(|handlers| handlers.borrow_mut().clear());
    }

    #[wasm_bindgen]
    pub fn boot_diagnostics_json() -> String {
        DIAGNOSTICS.with(|state| {
            serde_json::to_string(&*state.borrow()).unwrap_or_else(|_| {
                "{\"phase\":\"error\",\"detail\":\"diagnostics serialization failed\"}".to_string()
            })
        })
    }

    #[wasm_bindgen]
    pub fn capture_view_json() -> String {
        FINALIZATION.with(|slot| {
            slot.borrow()
                .as_ref()
                .and_then(|controller| serde_json::to_string(&controller.view()).ok())
                .unwrap_or_else(|| "null".to_string())
        })
    }

    #[wasm_bindgen]
    pub fn console_view_json() -> String {
        CONSOLE.with(|slot| {
            slot.borrow()
                .as_ref()
                .and_then(|controller| {
                    serde_json::to_string(&serde_json::json!({
                        "view": controller.view(),
                        "lifecycle": controller.lifecycle(),
                    }))
                    .ok()
                })
                .unwrap_or_else(|| "null".to_string())
        })
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm::boot_diagnostics_json;

#[cfg(not(target_arch = "wasm32"))]
pub fn boot_diagnostics_json() -> String {
    "{\"phase\":\"native\",\"detail\":\"web shell diagnostics only available on wasm\"}".to_string()
}
