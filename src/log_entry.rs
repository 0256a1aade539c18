use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt;

/// Severity of a report. Anything unrecognized is treated as `Warn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    /// Coerces a free-form level name. Invalid names silently become `Warn`.
    pub fn normalize(level: &str) -> Self {
        match level {
            "info" => LogLevel::Info,
            "error" => LogLevel::Error,
            _ => LogLevel::Warn,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured summary of an error attached to a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub name: String,
    pub message: String,
    pub stack: String,
}

impl ErrorDetails {
    pub fn from_error<E: Error + ?Sized>(name: &str, err: &E) -> Self {
        let mut stack = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            stack.push_str("\n    caused by: ");
            stack.push_str(&cause.to_string());
            source = cause.source();
        }

        Self {
            name: name.to_string(),
            message: err.to_string(),
            stack,
        }
    }
}

/// Open key/value metadata for a report, plus an optional raw error.
///
/// The raw error is never serialized. The reporter replaces it with an
/// `errorDetails` entry before anything is emitted.
#[derive(Debug, Default)]
pub struct Metadata {
    fields: Map<String, Value>,
    error: Option<RawError>,
}

#[derive(Debug)]
struct RawError {
    name: &'static str,
    error: Box<dyn Error + Send + Sync>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_error<E>(mut self, error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        self.error = Some(RawError {
            name: short_type_name::<E>(),
            error: Box::new(error),
        });
        self
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Drops the raw error, returning the plain fields with `errorDetails`
    /// filled in when an error was attached.
    pub fn into_fields(self) -> Map<String, Value> {
        let mut fields = self.fields;
        if let Some(raw) = self.error {
            let details = ErrorDetails::from_error(raw.name, raw.error.as_ref());
            // ErrorDetails only holds strings
            if let Ok(value) = serde_json::to_value(details) {
                fields.insert("errorDetails".to_string(), value);
            }
        }
        fields
    }
}

impl From<Map<String, Value>> for Metadata {
    fn from(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            error: None,
        }
    }
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// A single report as returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub context: String,
    pub message: String,
    pub metadata: Map<String, Value>,
    pub level: LogLevel,
    /// ISO 8601 UTC timestamp
    pub timestamp: String,
}

impl LogEntry {
    /// `[context] message`
    pub fn formatted_message(&self) -> String {
        format!("[{}] {}", self.context, self.message)
    }

    /// `[timestamp] [context] message`, the line written to the console.
    pub fn console_line(&self) -> String {
        format!("[{}] {}", self.timestamp, self.formatted_message())
    }
}
