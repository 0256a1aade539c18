use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifyError {
    /// An error-level report while fail-fast mode is on.
    #[error("{0}")]
    FailFast(String),

    #[error("Toast widget error: {0}")]
    Widget(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
