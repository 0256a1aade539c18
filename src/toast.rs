use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Severity variant of a toast, mapped onto a `text-bg-*` style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Danger,
    #[default]
    Warning,
    Info,
    Primary,
    Secondary,
}

impl ToastKind {
    pub const ALL: [ToastKind; 6] = [
        ToastKind::Success,
        ToastKind::Danger,
        ToastKind::Warning,
        ToastKind::Info,
        ToastKind::Primary,
        ToastKind::Secondary,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ToastKind::Success => "success",
            ToastKind::Danger => "danger",
            ToastKind::Warning => "warning",
            ToastKind::Info => "info",
            ToastKind::Primary => "primary",
            ToastKind::Secondary => "secondary",
        }
    }

    pub fn css_class(&self) -> String {
        format!("text-bg-{}", self.as_str())
    }
}

impl fmt::Display for ToastKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToastId(String);

impl ToastId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ToastId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub trait IdGenerator {
    fn next_id(&mut self) -> ToastId;
}

/// `toast-<epoch-ms>-<9 random base36 chars>`
#[derive(Debug, Default)]
pub struct TimestampIdGenerator;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 9;

impl IdGenerator for TimestampIdGenerator {
    fn next_id(&mut self) -> ToastId {
        let suffix: String =
            std::iter::repeat_with(|| BASE36[rand::random_range(0..BASE36.len())] as char)
                .take(SUFFIX_LEN)
                .collect();
        ToastId(format!("toast-{}-{}", Utc::now().timestamp_millis(), suffix))
    }
}

/// Markup for one toast: body text plus dismiss control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastMarkup {
    pub id: ToastId,
    pub message: String,
    pub kind: ToastKind,
}

impl ToastMarkup {
    pub fn render(&self) -> String {
        format!(
            r#"<div id="{id}" class="toast fade align-items-center {class} border-0 mb-2" role="status" aria-live="polite" aria-atomic="true"><div class="d-flex"><div class="toast-body">{body}</div><button type="button" class="btn-close btn-close-white me-2 m-auto" data-bs-dismiss="toast" aria-label="Close"></button></div></div>"#,
            id = escape_html(self.id.as_str()),
            class = self.kind.css_class(),
            body = escape_html(&self.message),
        )
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Options passed to the host widget when it is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetOptions {
    pub delay: Duration,
}

/// Widget instance created for a shown toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetHandle {
    pub toast_id: ToastId,
    pub delay: Duration,
}

#[derive(Debug, Clone)]
pub struct ToastElement {
    pub id: ToastId,
    pub html: String,
}

/// Returned by a successful `show_toast`.
#[derive(Debug, Clone)]
pub struct ToastHandle {
    pub id: ToastId,
    pub element: ToastElement,
    pub widget: WidgetHandle,
}
