//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Non-zero code from the prior-form endpoint; carries the server message.
    #[error("Portal rejected request: {0}")]
    Portal(String),

    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Submission failed: {0}")]
    Submission(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Notification error: {0}")]
    Notice(String),
}

impl DomainError {
    /// Text to push to the user for business failures.
    ///
    /// Returns `None` for kinds that are only logged (auth, transport, parse, config, notice).
    pub fn notice_message(&self) -> Option<String> {
        match self {
            DomainError::Portal(msg) | DomainError::DataUnavailable(msg) => Some(msg.clone()),
            DomainError::Submission(msg) => Some(format!("打卡发生错误：{}", msg)),
            _ => None,
        }
    }
}
