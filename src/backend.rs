use crate::error::NotifyError;
use crate::toast::{ToastId, ToastMarkup, WidgetHandle, WidgetOptions};

/// The toast container: anchored bottom-right, stacked above page content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub id: String,
    pub class: String,
    pub z_index: u32,
}

impl ContainerSpec {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            class: "toast-container position-fixed bottom-0 end-0 p-3".to_string(),
            z_index: 1100,
        }
    }
}

impl Default for ContainerSpec {
    fn default() -> Self {
        Self::new("toast-wrapper")
    }
}

/// Rendering capabilities needed to present toasts.
///
/// Implementations own the document and the host widget. Hidden
/// notifications are delivered back through
/// [`NotificationService::on_hidden`](crate::notification::NotificationService::on_hidden).
pub trait ToastBackend {
    fn container_exists(&self) -> bool;

    fn create_container(&mut self, spec: &ContainerSpec) -> Result<(), NotifyError>;

    fn remove_container(&mut self);

    /// Number of toast nodes currently in the container.
    fn container_len(&self) -> usize;

    /// Text of every rendered toast body, in insertion order.
    fn toast_bodies(&self) -> Vec<String>;

    fn insert_toast(&mut self, markup: &ToastMarkup) -> Result<(), NotifyError>;

    /// Constructs the widget for an inserted toast and shows it.
    fn show(&mut self, id: &ToastId, options: WidgetOptions) -> Result<WidgetHandle, NotifyError>;

    /// Returns false if no node had this id.
    fn remove_node(&mut self, id: &ToastId) -> bool;
}
