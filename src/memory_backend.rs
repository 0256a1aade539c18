use crate::backend::{ContainerSpec, ToastBackend};
use crate::error::NotifyError;
use crate::toast::{ToastId, ToastKind, ToastMarkup, WidgetHandle, WidgetOptions};
use log::{debug, info};
use tokio::sync::mpsc;
use tokio::time::sleep;

#[derive(Debug, Clone)]
pub struct MemoryNode {
    pub id: ToastId,
    pub body: String,
    pub kind: ToastKind,
    pub html: String,
    pub shown: bool,
}

/// In-process document holding one toast container.
///
/// When a hidden channel is attached, each shown toast sends its id on the
/// channel once its delay elapses, the way the host widget fires its hidden
/// event.
#[derive(Debug)]
pub struct MemoryBackend {
    container: Option<ContainerSpec>,
    nodes: Vec<MemoryNode>,
    widget_available: bool,
    hidden_tx: Option<mpsc::UnboundedSender<ToastId>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            container: None,
            nodes: Vec::new(),
            widget_available: true,
            hidden_tx: None,
        }
    }

    pub fn with_hidden_channel(hidden_tx: mpsc::UnboundedSender<ToastId>) -> Self {
        Self {
            hidden_tx: Some(hidden_tx),
            ..Self::new()
        }
    }

    /// Simulates a missing widget library: every `show` fails.
    pub fn set_widget_available(&mut self, available: bool) {
        self.widget_available = available;
    }

    pub fn container(&self) -> Option<&ContainerSpec> {
        self.container.as_ref()
    }

    pub fn nodes(&self) -> &[MemoryNode] {
        &self.nodes
    }

    pub fn node(&self, id: &ToastId) -> Option<&MemoryNode> {
        self.nodes.iter().find(|node| &node.id == id)
    }

    /// User clicked the dismiss control.
    pub fn dismiss(&self, id: &ToastId) -> bool {
        match &self.hidden_tx {
            Some(tx) if self.node(id).is_some() => tx.send(id.clone()).is_ok(),
            _ => false,
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ToastBackend for MemoryBackend {
    fn container_exists(&self) -> bool {
        self.container.is_some()
    }

    fn create_container(&mut self, spec: &ContainerSpec) -> Result<(), NotifyError> {
        debug!("Creating toast container #{}", spec.id);
        self.container = Some(spec.clone());
        Ok(())
    }

    fn remove_container(&mut self) {
        if let Some(spec) = self.container.take() {
            debug!("Removed toast container #{}", spec.id);
        }
        self.nodes.clear();
    }

    fn container_len(&self) -> usize {
        self.nodes.len()
    }

    fn toast_bodies(&self) -> Vec<String> {
        self.nodes.iter().map(|node| node.body.clone()).collect()
    }

    fn insert_toast(&mut self, markup: &ToastMarkup) -> Result<(), NotifyError> {
        if self.container.is_none() {
            return Err(NotifyError::Render("toast container is missing".to_string()));
        }

        self.nodes.push(MemoryNode {
            id: markup.id.clone(),
            body: markup.message.clone(),
            kind: markup.kind,
            html: markup.render(),
            shown: false,
        });
        Ok(())
    }

    fn show(&mut self, id: &ToastId, options: WidgetOptions) -> Result<WidgetHandle, NotifyError> {
        if !self.widget_available {
            return Err(NotifyError::Widget("toast widget library unavailable".to_string()));
        }

        let hidden_tx = self.hidden_tx.clone();
        let node = self
            .nodes
            .iter_mut()
            .find(|node| &node.id == id)
            .ok_or_else(|| NotifyError::Widget(format!("no toast element with id {}", id)))?;

        if let Some(tx) = hidden_tx {
            let runtime = tokio::runtime::Handle::try_current()
                .map_err(|e| NotifyError::Widget(format!("cannot schedule auto-hide: {}", e)))?;
            let hidden_id = id.clone();
            runtime.spawn(async move {
                sleep(options.delay).await;
                let _ = tx.send(hidden_id);
            });
        }

        node.shown = true;
        info!("[{}] {}", node.kind, node.body);

        Ok(WidgetHandle {
            toast_id: id.clone(),
            delay: options.delay,
        })
    }

    fn remove_node(&mut self, id: &ToastId) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|node| &node.id != id);
        before != self.nodes.len()
    }
}
