//! Toast presenter.
//!
//! Validates requests, suppresses duplicates of visible messages, and tears
//! down the container once its last toast is hidden.

use crate::backend::{ContainerSpec, ToastBackend};
use crate::config::Config;
use crate::error::NotifyError;
use crate::log_entry::Metadata;
use crate::reporter::ErrorReporter;
use crate::toast::{
    IdGenerator, TimestampIdGenerator, ToastElement, ToastHandle, ToastId, ToastKind, ToastMarkup,
    WidgetOptions,
};
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;

const CONTEXT: &str = "NotificationService";
pub const FALLBACK_MESSAGE: &str = "⚠️ Something went wrong.";
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

pub struct NotificationService<B, G = TimestampIdGenerator> {
    backend: B,
    ids: G,
    reporter: ErrorReporter,
    container: ContainerSpec,
    default_timeout_ms: u64,
    // Toasts still waiting for their hidden notification
    listeners: HashSet<ToastId>,
}

impl<B: ToastBackend> NotificationService<B> {
    pub fn new(backend: B, reporter: ErrorReporter) -> Self {
        Self::with_id_generator(backend, reporter, TimestampIdGenerator)
    }

    pub fn from_config(backend: B, reporter: ErrorReporter, config: &Config) -> Self {
        let mut service = Self::new(backend, reporter);
        service.container = ContainerSpec::new(config.container_id.clone());
        service.default_timeout_ms = config.default_timeout_ms;
        service
    }
}

impl<B: ToastBackend, G: IdGenerator> NotificationService<B, G> {
    pub fn with_id_generator(backend: B, reporter: ErrorReporter, ids: G) -> Self {
        Self {
            backend,
            ids,
            reporter,
            container: ContainerSpec::default(),
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            listeners: HashSet::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn pending(&self) -> usize {
        self.listeners.len()
    }

    /// Shows a toast, or returns `Ok(None)` when none was created
    /// (duplicate of a visible message, or a rendering failure).
    ///
    /// Invalid arguments are replaced with defaults and reported. The only
    /// `Err` is a fail-fast report of a rendering failure.
    pub fn show_toast(
        &mut self,
        message: &str,
        kind: &str,
        timeout_ms: i64,
    ) -> Result<Option<ToastHandle>, NotifyError> {
        let message = if message.trim().is_empty() {
            self.reporter.report(
                CONTEXT,
                "Toast message must be a non-empty string",
                Metadata::new().with("providedMessage", message),
                "warn",
            )?;
            FALLBACK_MESSAGE.to_string()
        } else {
            message.to_string()
        };

        let kind = match ToastKind::from_name(kind) {
            Some(kind) => kind,
            None => {
                let valid: Vec<Value> = ToastKind::ALL
                    .iter()
                    .map(|k| Value::from(k.as_str()))
                    .collect();
                self.reporter.report(
                    CONTEXT,
                    &format!("Invalid toast type: {}. Defaulting to 'warning'", kind),
                    Metadata::new()
                        .with("providedType", kind)
                        .with("validTypes", valid),
                    "warn",
                )?;
                ToastKind::Warning
            }
        };

        let timeout_ms = if timeout_ms > 0 {
            timeout_ms as u64
        } else {
            self.reporter.report(
                CONTEXT,
                &format!(
                    "Invalid timeout: {}. Defaulting to {}ms",
                    timeout_ms, self.default_timeout_ms
                ),
                Metadata::new().with("providedTimeout", timeout_ms),
                "warn",
            )?;
            self.default_timeout_ms
        };

        self.present(message, kind, timeout_ms)
    }

    pub fn success(
        &mut self,
        message: &str,
        timeout_ms: Option<i64>,
    ) -> Result<Option<ToastHandle>, NotifyError> {
        self.show_kind(message, ToastKind::Success, timeout_ms)
    }

    pub fn error(
        &mut self,
        message: &str,
        timeout_ms: Option<i64>,
    ) -> Result<Option<ToastHandle>, NotifyError> {
        self.show_kind(message, ToastKind::Danger, timeout_ms)
    }

    pub fn warning(
        &mut self,
        message: &str,
        timeout_ms: Option<i64>,
    ) -> Result<Option<ToastHandle>, NotifyError> {
        self.show_kind(message, ToastKind::Warning, timeout_ms)
    }

    pub fn info(
        &mut self,
        message: &str,
        timeout_ms: Option<i64>,
    ) -> Result<Option<ToastHandle>, NotifyError> {
        self.show_kind(message, ToastKind::Info, timeout_ms)
    }

    pub fn primary(
        &mut self,
        message: &str,
        timeout_ms: Option<i64>,
    ) -> Result<Option<ToastHandle>, NotifyError> {
        self.show_kind(message, ToastKind::Primary, timeout_ms)
    }

    pub fn secondary(
        &mut self,
        message: &str,
        timeout_ms: Option<i64>,
    ) -> Result<Option<ToastHandle>, NotifyError> {
        self.show_kind(message, ToastKind::Secondary, timeout_ms)
    }

    /// Handles the widget's hidden notification for `id`.
    ///
    /// Removes the toast node, then the container if it is now empty.
    /// Each id is handled once; later or unknown ids are ignored.
    pub fn on_hidden(&mut self, id: &ToastId) -> bool {
        if !self.listeners.remove(id) {
            return false;
        }

        self.backend.remove_node(id);
        if self.backend.container_exists() && self.backend.container_len() == 0 {
            self.backend.remove_container();
        }
        true
    }

    fn show_kind(
        &mut self,
        message: &str,
        kind: ToastKind,
        timeout_ms: Option<i64>,
    ) -> Result<Option<ToastHandle>, NotifyError> {
        let timeout_ms =
            timeout_ms.unwrap_or_else(|| i64::try_from(self.default_timeout_ms).unwrap_or(i64::MAX));
        self.show_toast(message, kind.as_str(), timeout_ms)
    }

    fn present(
        &mut self,
        message: String,
        kind: ToastKind,
        timeout_ms: u64,
    ) -> Result<Option<ToastHandle>, NotifyError> {
        if !self.backend.container_exists() {
            if let Err(e) = self.backend.create_container(&self.container) {
                self.reporter.report(
                    CONTEXT,
                    "Failed to create toast container",
                    Metadata::new()
                        .with("containerId", self.container.id.clone())
                        .with_error(e),
                    "error",
                )?;
                return Ok(None);
            }
        }

        if self.backend.toast_bodies().iter().any(|body| body == &message) {
            self.reporter.report(
                CONTEXT,
                "Duplicate toast message detected. Skipping to prevent UI spam.",
                Metadata::new().with("duplicateMessage", message),
                "info",
            )?;
            return Ok(None);
        }

        let id = self.ids.next_id();
        let markup = ToastMarkup {
            id: id.clone(),
            message,
            kind,
        };
        let options = WidgetOptions {
            delay: Duration::from_millis(timeout_ms),
        };

        match self.render(&markup, options) {
            Ok(handle) => {
                self.listeners.insert(id);
                Ok(Some(handle))
            }
            Err(e) => {
                self.discard(&id);
                self.reporter.report(
                    CONTEXT,
                    "Failed to render toast notification",
                    Metadata::new()
                        .with("message", markup.message.clone())
                        .with("type", kind.as_str())
                        .with("timeout", timeout_ms)
                        .with("toastId", id.as_str())
                        .with_error(e),
                    "error",
                )?;
                Ok(None)
            }
        }
    }

    fn render(
        &mut self,
        markup: &ToastMarkup,
        options: WidgetOptions,
    ) -> Result<ToastHandle, NotifyError> {
        self.backend.insert_toast(markup)?;
        let widget = self.backend.show(&markup.id, options)?;

        Ok(ToastHandle {
            id: markup.id.clone(),
            element: ToastElement {
                id: markup.id.clone(),
                html: markup.render(),
            },
            widget,
        })
    }

    // A failed toast must not linger and block later identical messages.
    fn discard(&mut self, id: &ToastId) {
        self.backend.remove_node(id);
        if self.backend.container_exists() && self.backend.container_len() == 0 {
            self.backend.remove_container();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::recording::RecordingConsole;
    use crate::log_entry::LogLevel;
    use crate::memory_backend::MemoryBackend;

    #[derive(Debug, Default)]
    struct SequentialIds(u32);

    impl IdGenerator for SequentialIds {
        fn next_id(&mut self) -> ToastId {
            self.0 += 1;
            ToastId::new(format!("toast-{}", self.0))
        }
    }

    fn setup(
        fail_fast: bool,
    ) -> (NotificationService<MemoryBackend, SequentialIds>, RecordingConsole) {
        let console = RecordingConsole::new();
        let reporter = ErrorReporter::new(console.clone(), fail_fast);
        let service = NotificationService::with_id_generator(
            MemoryBackend::new(),
            reporter,
            SequentialIds::default(),
        );
        (service, console)
    }

    #[test]
    fn shows_toast_in_lazily_created_container() {
        let (mut service, _) = setup(false);
        assert!(!service.backend().container_exists());

        let handle = service.success("Saved", Some(2000)).unwrap().unwrap();

        assert_eq!(handle.id, ToastId::new("toast-1"));
        assert_eq!(handle.widget.delay, Duration::from_millis(2000));
        assert!(handle.element.html.contains("text-bg-success"));

        let container = service.backend().container().unwrap();
        assert_eq!(container.id, "toast-wrapper");
        assert_eq!(container.z_index, 1100);
        let node = service.backend().node(&handle.id).unwrap();
        assert!(node.shown);
        assert_eq!(node.body, "Saved");
    }

    #[test]
    fn blank_message_is_replaced_and_still_shown() {
        let (mut service, console) = setup(false);

        let first = service.show_toast("", "warning", 5000).unwrap();
        assert!(first.is_some());
        assert_eq!(service.backend().toast_bodies(), vec![FALLBACK_MESSAGE.to_string()]);
        assert_eq!(console.count_containing("must be a non-empty string"), 1);

        let mut fresh = setup(false).0;
        assert!(fresh.show_toast("   ", "warning", 5000).unwrap().is_some());
        assert_eq!(fresh.backend().toast_bodies(), vec![FALLBACK_MESSAGE.to_string()]);
    }

    #[test]
    fn duplicate_visible_message_is_suppressed() {
        let (mut service, console) = setup(false);

        assert!(service.info("Connection lost", None).unwrap().is_some());
        assert!(service.info("Connection lost", None).unwrap().is_none());
        assert!(service.error("Connection lost", None).unwrap().is_none());

        assert_eq!(service.backend().container_len(), 1);
        let dup = console
            .emitted()
            .into_iter()
            .find(|e| e.line.contains("Duplicate toast message"))
            .unwrap();
        assert_eq!(dup.level, LogLevel::Info);
        assert_eq!(dup.metadata["duplicateMessage"], "Connection lost");
    }

    #[test]
    fn unknown_kind_defaults_to_warning() {
        let (mut service, console) = setup(false);

        let handle = service.show_toast("Heads up", "bogus-type", 5000).unwrap().unwrap();

        assert_eq!(service.backend().node(&handle.id).unwrap().kind, ToastKind::Warning);
        assert!(handle.element.html.contains("text-bg-warning"));
        assert_eq!(console.count_containing("Invalid toast type: bogus-type"), 1);
    }

    #[test]
    fn non_positive_timeout_defaults() {
        let (mut service, console) = setup(false);

        let zero = service.show_toast("a", "info", 0).unwrap().unwrap();
        let negative = service.show_toast("b", "info", -20).unwrap().unwrap();
        let omitted = service.primary("c", None).unwrap().unwrap();

        for handle in [zero, negative, omitted] {
            assert_eq!(handle.widget.delay, Duration::from_millis(DEFAULT_TIMEOUT_MS));
        }
        assert_eq!(console.count_containing("Invalid timeout"), 2);
    }

    #[test]
    fn hidden_last_toast_removes_container() {
        let (mut service, _) = setup(false);
        let a = service.warning("first", None).unwrap().unwrap();
        let b = service.secondary("second", None).unwrap().unwrap();

        assert!(service.on_hidden(&a.id));
        assert!(service.backend().container_exists());
        assert_eq!(service.backend().toast_bodies(), vec!["second".to_string()]);

        assert!(service.on_hidden(&b.id));
        assert!(!service.backend().container_exists());
        assert_eq!(service.pending(), 0);

        // One-shot
        assert!(!service.on_hidden(&b.id));
    }

    #[test]
    fn message_can_be_shown_again_after_hidden() {
        let (mut service, _) = setup(false);
        let first = service.info("Retrying", None).unwrap().unwrap();
        service.on_hidden(&first.id);

        assert!(service.info("Retrying", None).unwrap().is_some());
        assert!(service.backend().container_exists());
    }

    #[test]
    fn render_failure_returns_none_and_cleans_up() {
        let (mut service, console) = setup(false);
        service.backend_mut().set_widget_available(false);

        assert!(service.info("Upload failed", None).unwrap().is_none());
        assert!(!service.backend().container_exists());
        assert_eq!(service.pending(), 0);

        let failure = console
            .emitted()
            .into_iter()
            .find(|e| e.level == LogLevel::Error)
            .unwrap();
        assert_eq!(failure.metadata["message"], "Upload failed");
        assert_eq!(failure.metadata["type"], "info");
        assert_eq!(failure.metadata["timeout"], 5000);
        assert_eq!(failure.metadata["toastId"], "toast-1");
        assert_eq!(
            failure.metadata["errorDetails"]["message"],
            "Toast widget error: toast widget library unavailable"
        );

        service.backend_mut().set_widget_available(true);
        assert!(service.info("Upload failed", None).unwrap().is_some());
    }

    #[test]
    fn render_failure_fails_fast_in_development() {
        let (mut service, _) = setup(true);
        service.backend_mut().set_widget_available(false);

        let result = service.show_toast("Upload failed", "danger", 1000);
        match result {
            Err(NotifyError::FailFast(msg)) => {
                assert_eq!(msg, "[NotificationService] Failed to render toast notification")
            }
            other => panic!("expected fail-fast, got {:?}", other),
        }
    }

    #[test]
    fn validation_warnings_never_fail_fast() {
        let (mut service, _) = setup(true);
        assert!(service.show_toast(" ", "nope", -1).unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn auto_hide_tears_down_container() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let reporter = ErrorReporter::new(RecordingConsole::new(), false);
        let mut service = NotificationService::new(MemoryBackend::with_hidden_channel(tx), reporter);

        let handle = service.success("Done", Some(300)).unwrap().unwrap();
        assert!(handle.id.as_str().starts_with("toast-"));

        let hidden = rx.recv().await.unwrap();
        assert_eq!(hidden, handle.id);
        assert!(service.on_hidden(&hidden));
        assert!(!service.backend().container_exists());
    }

    #[tokio::test(start_paused = true)]
    async fn user_dismiss_tears_down_and_ignores_later_timer() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let reporter = ErrorReporter::new(RecordingConsole::new(), false);
        let mut service = NotificationService::new(MemoryBackend::with_hidden_channel(tx), reporter);

        let first = service.info("Saved", Some(300)).unwrap().unwrap();
        assert!(service.backend().dismiss(&first.id));

        let dismissed = rx.recv().await.unwrap();
        assert_eq!(dismissed, first.id);
        assert!(service.on_hidden(&dismissed));
        assert!(!service.backend().container_exists());
        assert!(!service.backend().dismiss(&first.id));

        let second = service.info("Saved", Some(i64::MAX)).unwrap().unwrap();

        // The first toast's auto-hide still fires
        let stale = rx.recv().await.unwrap();
        assert_eq!(stale, first.id);
        assert!(!service.on_hidden(&stale));

        let nodes = service.backend().nodes();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].id, second.id);
        assert!(nodes[0].shown);
    }

    #[test]
    fn oversized_default_timeout_does_not_warn() {
        let console = RecordingConsole::new();
        let reporter = ErrorReporter::new(console.clone(), false);
        let config = Config {
            default_timeout_ms: u64::MAX,
            ..Config::default()
        };
        let mut service = NotificationService::from_config(MemoryBackend::new(), reporter, &config);

        let handle = service.success("Big", None).unwrap().unwrap();

        assert_eq!(handle.widget.delay, Duration::from_millis(i64::MAX as u64));
        assert_eq!(console.count_containing("Invalid timeout"), 0);
    }
}
