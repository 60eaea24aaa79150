//! Detached SSH console window.
//!
//! The controller owns the window/document lifecycle only: the title override
//! (restored when the controller drops), the reload action and the two-stage
//! close sequence. Session transport belongs to the [`TerminalCollaborator`].

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Serialize;

use crate::presentation::ConsoleView;
use crate::route::{LABEL_QUERY_KEY, QueryParams, decode_label};

pub const CONSOLE_TITLE_SUFFIX: &str = "SSH Console";
pub const CLOSE_FALLBACK_DELAY: Duration = Duration::from_millis(100);

/// Browser window and document operations used by the console view.
pub trait WindowHost {
    fn document_title(&self) -> String;
    fn set_document_title(&self, title: &str);
    /// Asks the platform to close the window. May silently do nothing.
    fn close_window(&self);
    fn is_window_closed(&self) -> bool;
    fn navigate_back(&self);
    /// Full reload of the current view.
    fn reload(&self);
}

/// External component that establishes and renders the live session.
pub trait TerminalCollaborator {
    fn attach(&self, binding: &TerminalBinding);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerminalBinding {
    pub session_id: String,
    pub full_screen: bool,
    pub fit_to_container: bool,
}

impl TerminalBinding {
    #[must_use]
    pub fn for_session(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            full_screen: true,
            fit_to_container: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub session_id: Option<String>,
    pub label: Option<String>,
}

impl SessionIdentity {
    #[must_use]
    pub fn from_route(session_id: Option<&str>, query: &QueryParams) -> Self {
        let session_id = session_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(ToString::to_string);
        let label = query
            .get(LABEL_QUERY_KEY)
            .map(decode_label)
            .filter(|label| !label.trim().is_empty());
        Self { session_id, label }
    }

    /// Header text: the label when there is one, otherwise the raw id.
    #[must_use]
    pub fn header(&self) -> Option<&str> {
        self.label.as_deref().or(self.session_id.as_deref())
    }

    #[must_use]
    pub fn console_view(&self) -> ConsoleView {
        match (&self.session_id, self.header()) {
            (Some(session_id), Some(header)) => ConsoleView::Active {
                header: header.to_string(),
                binding: TerminalBinding::for_session(session_id.clone()),
            },
            _ => ConsoleView::missing_session(),
        }
    }
}

#[must_use]
pub fn console_title(label: Option<&str>) -> String {
    match label {
        Some(label) => format!("{label} \u{b7} {CONSOLE_TITLE_SUFFIX}"),
        None => CONSOLE_TITLE_SUFFIX.to_string(),
    }
}

/// Holds a document title override; the captured title is put back on drop.
pub struct TitleGuard<H: WindowHost> {
    host: H,
    previous: String,
}

impl<H: WindowHost> TitleGuard<H> {
    pub fn acquire(host: H, title: &str) -> Self {
        let previous = host.document_title();
        host.set_document_title(title);
        Self { host, previous }
    }

    #[must_use]
    pub fn previous(&self) -> &str {
        &self.previous
    }
}

impl<H: WindowHost> Drop for TitleGuard<H> {
    fn drop(&mut self) {
        self.host.set_document_title(&self.previous);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WindowLifecycleState {
    pub close_requested: bool,
    pub closed: bool,
}

#[derive(Debug)]
struct WindowLifecycle {
    alive: AtomicBool,
    close_pending: AtomicBool,
    closed: AtomicBool,
}

impl WindowLifecycle {
    fn new() -> Self {
        Self {
            alive: AtomicBool::new(true),
            close_pending: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackOutcome {
    /// The owning view was torn down first; nothing was touched.
    ViewGone,
    WindowClosed,
    NavigatedBack,
}

/// The one delayed check scheduled by a close request.
#[must_use = "the fallback does nothing unless it is fired"]
pub struct CloseFallback<H: WindowHost> {
    host: H,
    lifecycle: Arc<WindowLifecycle>,
    delay: Duration,
}

impl<H: WindowHost> CloseFallback<H> {
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn fire(self) -> FallbackOutcome {
        if !self.lifecycle.alive.load(Ordering::SeqCst) {
            return FallbackOutcome::ViewGone;
        }
        self.lifecycle.close_pending.store(false, Ordering::SeqCst);
        if self.host.is_window_closed() {
            self.lifecycle.closed.store(true, Ordering::SeqCst);
            return FallbackOutcome::WindowClosed;
        }
        tracing::info!("window close was refused, navigating back");
        self.host.navigate_back();
        FallbackOutcome::NavigatedBack
    }

    /// Awaits the host's timer and then fires. `sleep` should resolve after
    /// [`CloseFallback::delay`].
    pub async fn fire_after<S>(self, sleep: S) -> FallbackOutcome
    where
        S: Future<Output = ()>,
    {
        sleep.await;
        self.fire()
    }
}

pub struct SessionWindowController<H: WindowHost + Clone> {
    host: H,
    identity: SessionIdentity,
    view: ConsoleView,
    lifecycle: Arc<WindowLifecycle>,
    _title: TitleGuard<H>,
}

impl<H: WindowHost + Clone> SessionWindowController<H> {
    /// Sets the title override and, only when a session id is present,
    /// attaches the terminal.
    pub fn mount(
        host: H,
        terminal: &dyn TerminalCollaborator,
        session_id: Option<&str>,
        query: &QueryParams,
    ) -> Self {
        let identity = SessionIdentity::from_route(session_id, query);
        let title = TitleGuard::acquire(host.clone(), &console_title(identity.label.as_deref()));

        let view = identity.console_view();
        match view.binding() {
            Some(binding) => {
                tracing::debug!(session_id = %binding.session_id, "attaching console terminal");
                terminal.attach(binding);
            }
            None => tracing::warn!("console window opened without a session id"),
        }

        Self {
            host,
            identity,
            view,
            lifecycle: Arc::new(WindowLifecycle::new()),
            _title: title,
        }
    }

    #[must_use]
    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    #[must_use]
    pub fn view(&self) -> &ConsoleView {
        &self.view
    }

    #[must_use]
    pub fn lifecycle(&self) -> WindowLifecycleState {
        WindowLifecycleState {
            close_requested: self.lifecycle.close_pending.load(Ordering::SeqCst),
            closed: self.lifecycle.closed.load(Ordering::SeqCst),
        }
    }

    /// Hard reset: reloads the whole view so the session is re-established
    /// from scratch.
    pub fn reload(&self) {
        tracing::info!(
            session_id = self.identity.session_id.as_deref().unwrap_or_default(),
            "reloading console window"
        );
        self.host.reload();
    }

    /// Starts the close sequence. Returns the fallback check the host must
    /// fire after [`CLOSE_FALLBACK_DELAY`], or `None` when a close is already
    /// pending.
    pub fn request_close(&self) -> Option<CloseFallback<H>> {
        if self.lifecycle.close_pending.swap(true, Ordering::SeqCst) {
            tracing::debug!("close already pending, ignoring");
            return None;
        }
        self.host.close_window();
        Some(CloseFallback {
            host: self.host.clone(),
            lifecycle: Arc::clone(&self.lifecycle),
            delay: CLOSE_FALLBACK_DELAY,
        })
    }
}

impl<H: WindowHost + Clone> Drop for SessionWindowController<H> {
    fn drop(&mut self) {
        // Fallbacks check this before touching the host; the title guard
        // restores afterwards when the fields drop.
        self.lifecycle.alive.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Default)]
    struct FakeWindowState {
        title: String,
        titles: Vec<String>,
        close_calls: usize,
        closed: bool,
        back_calls: usize,
        reload_calls: usize,
    }

    #[derive(Debug, Clone)]
    struct FakeWindow {
        allow_close: bool,
        state: Arc<Mutex<FakeWindowState>>,
    }

    impl FakeWindow {
        fn new(title: &str, allow_close: bool) -> Self {
            Self {
                allow_close,
                state: Arc::new(Mutex::new(FakeWindowState {
                    title: title.to_string(),
                    ..FakeWindowState::default()
                })),
            }
        }

        fn with<T>(&self, read: impl FnOnce(&FakeWindowState) -> T) -> T {
            read(&self.state.lock().expect("fake window lock"))
        }
    }

    impl WindowHost for FakeWindow {
        fn document_title(&self) -> String {
            self.with(|state| state.title.clone())
        }

        fn set_document_title(&self, title: &str) {
            let mut state = self.state.lock().expect("fake window lock");
            state.title = title.to_string();
            state.titles.push(title.to_string());
        }

        fn close_window(&self) {
            let mut state = self.state.lock().expect("fake window lock");
            state.close_calls += 1;
            if self.allow_close {
                state.closed = true;
            }
        }

        fn is_window_closed(&self) -> bool {
            self.with(|state| state.closed)
        }

        fn navigate_back(&self) {
            self.state.lock().expect("fake window lock").back_calls += 1;
        }

        fn reload(&self) {
            self.state.lock().expect("fake window lock").reload_calls += 1;
        }
    }

    #[derive(Default)]
    struct RecordingTerminal {
        attached: Mutex<Vec<TerminalBinding>>,
    }

    impl TerminalCollaborator for RecordingTerminal {
        fn attach(&self, binding: &TerminalBinding) {
            self.attached
                .lock()
                .expect("terminal lock")
                .push(binding.clone());
        }
    }

    fn mount(
        window: &FakeWindow,
        terminal: &RecordingTerminal,
        session_id: Option<&str>,
        query: &str,
    ) -> SessionWindowController<FakeWindow> {
        SessionWindowController::mount(
            window.clone(),
            terminal,
            session_id,
            &QueryParams::parse(query),
        )
    }

    #[test]
    fn title_is_labelled_while_mounted_and_restored_after() {
        let window = FakeWindow::new("Portal", true);
        let terminal = RecordingTerminal::default();
        let controller = mount(&window, &terminal, Some("sess_1"), "?label=Web-01");
        assert_eq!(window.document_title(), "Web-01 \u{b7} SSH Console");
        drop(controller);
        assert_eq!(window.document_title(), "Portal");
    }

    #[test]
    fn title_without_label_is_generic() {
        let window = FakeWindow::new("Portal", true);
        let terminal = RecordingTerminal::default();
        let controller = mount(&window, &terminal, Some("sess_1"), "");
        assert_eq!(window.document_title(), "SSH Console");
        assert_eq!(
            controller.view(),
            &ConsoleView::Active {
                header: "sess_1".to_string(),
                binding: TerminalBinding::for_session("sess_1"),
            }
        );
    }

    #[test]
    fn missing_session_never_attaches_terminal_and_still_restores_title() {
        let window = FakeWindow::new("Portal", true);
        let terminal = RecordingTerminal::default();
        let controller = mount(&window, &terminal, None, "?label=Web-01");
        assert!(matches!(
            controller.view(),
            ConsoleView::MissingSession { .. }
        ));
        assert!(terminal.attached.lock().expect("terminal lock").is_empty());
        assert!(!controller.view().offers_reload());
        drop(controller);
        assert_eq!(window.document_title(), "Portal");
    }

    #[test]
    fn terminal_receives_id_and_layout_hints_only() {
        let window = FakeWindow::new("Portal", true);
        let terminal = RecordingTerminal::default();
        let _controller = mount(&window, &terminal, Some("sess_9"), "?label=db%2520primary");
        let attached = terminal.attached.lock().expect("terminal lock").clone();
        assert_eq!(
            attached,
            vec![TerminalBinding {
                session_id: "sess_9".to_string(),
                full_screen: true,
                fit_to_container: true,
            }]
        );
    }

    #[test]
    fn malformed_label_is_shown_raw() {
        let window = FakeWindow::new("Portal", true);
        let terminal = RecordingTerminal::default();
        let controller = mount(&window, &terminal, Some("sess_1"), "?label=100%25");
        assert_eq!(controller.identity().label.as_deref(), Some("100%"));
        assert_eq!(
            controller.view(),
            &ConsoleView::Active {
                header: "100%".to_string(),
                binding: TerminalBinding::for_session("sess_1"),
            }
        );
        assert_eq!(window.document_title(), "100% \u{b7} SSH Console");
    }

    #[test]
    fn double_encoded_label_is_decoded_once_more() {
        let identity = SessionIdentity::from_route(
            Some("sess_1"),
            &QueryParams::parse("label=db%2520primary"),
        );
        assert_eq!(identity.label.as_deref(), Some("db primary"));
        assert_eq!(identity.header(), Some("db primary"));
    }

    #[test]
    fn reload_is_a_full_host_reload() {
        let window = FakeWindow::new("Portal", true);
        let terminal = RecordingTerminal::default();
        let controller = mount(&window, &terminal, Some("sess_1"), "");
        controller.reload();
        assert_eq!(window.with(|state| state.reload_calls), 1);
        assert_eq!(terminal.attached.lock().expect("terminal lock").len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn close_allowed_by_platform_skips_fallback_navigation() {
        let window = FakeWindow::new("Portal", true);
        let terminal = RecordingTerminal::default();
        let controller = mount(&window, &terminal, Some("sess_1"), "");

        let fallback = controller.request_close().expect("fallback");
        assert!(controller.lifecycle().close_requested);
        let outcome = fallback
            .fire_after(tokio::time::sleep(CLOSE_FALLBACK_DELAY))
            .await;

        assert_eq!(outcome, FallbackOutcome::WindowClosed);
        assert_eq!(window.with(|state| state.back_calls), 0);
        assert_eq!(
            controller.lifecycle(),
            WindowLifecycleState {
                close_requested: false,
                closed: true,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn refused_close_navigates_back_once_after_delay() {
        let window = FakeWindow::new("Portal", false);
        let terminal = RecordingTerminal::default();
        let controller = mount(&window, &terminal, Some("sess_1"), "");

        let fallback = controller.request_close().expect("fallback");
        let delay = fallback.delay();
        let task = tokio::spawn(fallback.fire_after(tokio::time::sleep(delay)));

        tokio::time::advance(delay - Duration::from_millis(1)).await;
        tokio::task::yield_now().await;
        assert_eq!(window.with(|state| state.back_calls), 0);

        tokio::time::advance(Duration::from_millis(1)).await;
        let outcome = task.await.expect("fallback task");
        assert_eq!(outcome, FallbackOutcome::NavigatedBack);
        assert_eq!(window.with(|state| state.back_calls), 1);
        assert_eq!(window.with(|state| state.close_calls), 1);
    }

    #[test]
    fn second_close_while_pending_is_ignored() {
        let window = FakeWindow::new("Portal", false);
        let terminal = RecordingTerminal::default();
        let controller = mount(&window, &terminal, Some("sess_1"), "");
        let first = controller.request_close();
        assert!(first.is_some());
        assert!(controller.request_close().is_none());
        assert_eq!(window.with(|state| state.close_calls), 1);

        if let Some(fallback) = first {
            assert_eq!(fallback.fire(), FallbackOutcome::NavigatedBack);
        }
        assert!(!controller.lifecycle().close_requested);
    }

    #[test]
    fn fallback_after_teardown_does_not_touch_the_window() {
        let window = FakeWindow::new("Portal", false);
        let terminal = RecordingTerminal::default();
        let controller = mount(&window, &terminal, Some("sess_1"), "?label=Web-01");
        let fallback = controller.request_close().expect("fallback");
        drop(controller);

        assert_eq!(fallback.fire(), FallbackOutcome::ViewGone);
        assert_eq!(window.with(|state| state.back_calls), 0);
        assert_eq!(window.document_title(), "Portal");
    }

    #[test]
    fn title_guard_restores_on_early_drop() {
        let window = FakeWindow::new("Before", true);
        {
            let guard = TitleGuard::acquire(window.clone(), "During");
            assert_eq!(guard.previous(), "Before");
            assert_eq!(window.document_title(), "During");
        }
        assert_eq!(window.document_title(), "Before");
        assert_eq!(
            window.with(|state| state.titles.clone()),
            vec!["During".to_string(), "Before".to_string()]
        );
    }
}
