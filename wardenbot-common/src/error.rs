// ================================================================
// File: wardenbot-common/src/error.rs
// ================================================================

use std::time::Duration;

use thiserror::Error;
use twilight_http::error::ErrorType;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed configuration. Fatal at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Target not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The platform refused an elevated gateway intent.
    #[error("Privileged intent not granted: {0}")]
    PrivilegedIntent(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Bot is not running")]
    NotRunning,

    #[error("Bot is not connected")]
    NotConnected,

    #[error("Bot worker stopped before the action completed")]
    WorkerStopped,

    #[error("Timed out after {0:?} waiting for the bot")]
    Timeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Classify REST failures by status so callers can tell a missing target
/// from a permission problem.
impl From<twilight_http::Error> for Error {
    fn from(err: twilight_http::Error) -> Self {
        if let ErrorType::Response { status, .. } = err.kind() {
            match status.get() {
                401 => return Error::Auth(err.to_string()),
                403 => return Error::PermissionDenied(err.to_string()),
                404 => return Error::NotFound(err.to_string()),
                _ => {}
            }
        }
        Error::Http(err.to_string())
    }
}

impl From<twilight_http::response::DeserializeBodyError> for Error {
    fn from(err: twilight_http::response::DeserializeBodyError) -> Self {
        Error::Http(format!("could not decode response body: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failure() {
        assert!(Error::NotConnected.to_string().contains("not connected"));
        assert!(Error::NotFound("guild 1".into()).to_string().starts_with("Target not found"));
        assert!(
            Error::Timeout(Duration::from_secs(20))
                .to_string()
                .contains("Timed out")
        );
    }

    #[test]
    fn io_errors_convert_with_question_mark() {
        fn open_missing() -> Result<(), Error> {
            std::fs::read("/nonexistent/wardenbot.env")?;
            Ok(())
        }

        let err = open_missing().unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().starts_with("I/O error"));
    }
}
