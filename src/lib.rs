pub mod backend;
pub mod config;
pub mod console;
pub mod error;
pub mod log_entry;
pub mod memory_backend;
pub mod notification;
pub mod reporter;
pub mod throttle;
pub mod toast;

pub use error::NotifyError;
pub use log_entry::{LogEntry, LogLevel, Metadata};
pub use notification::NotificationService;
pub use reporter::ErrorReporter;
