use crate::log_entry::LogLevel;
use log::{error, info, warn};
use serde_json::{Map, Value};

/// Severity-tagged output channels for reports.
pub trait ConsoleSink: Send + Sync {
    fn supports(&self, _level: LogLevel) -> bool {
        true
    }

    fn emit(&self, level: LogLevel, line: &str, metadata: &Map<String, Value>);
}

/// Writes reports through the `log` facade under the `console` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogConsole;

impl ConsoleSink for LogConsole {
    fn emit(&self, level: LogLevel, line: &str, metadata: &Map<String, Value>) {
        let metadata = Value::Object(metadata.clone());
        match level {
            LogLevel::Info => info!(target: "console", "{} {}", line, metadata),
            LogLevel::Warn => warn!(target: "console", "{} {}", line, metadata),
            LogLevel::Error => error!(target: "console", "{} {}", line, metadata),
        }
    }
}
