use thiserror::Error;

/// Creates an anyhow error prefixed with the current file and line number
#[macro_export]
macro_rules! file_error {
    ($($arg:tt)*) => {
        anyhow!(
            "[{}:{}] {}",
            std::path::Path::new(file!())
                .file_name()
                .map(|name| name.to_string_lossy())
                .unwrap_or_default(),
            line!(),
            format!($($arg)*)
        )
    };
}

/// Reasons a raw transmission cannot be turned into a [`crate::message::MessageHeader`].
///
/// Any of these skips the message; none of them ends the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("message is {len} characters long, header needs {needed}")]
    TooShort { len: usize, needed: usize },

    #[error("invalid arrival time {0:?}")]
    InvalidTimestamp(String),

    #[error("invalid {field} field {value:?}")]
    InvalidField { field: &'static str, value: String },
}

/// Failure talking to the remote storage service.
///
/// Only [`ApiError::Timeout`] is retried, and only while persisting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("invalid JSON response: {0}")]
    InvalidJson(String),

    #[error("{url} returned HTTP {status}")]
    Status { status: u16, url: String },

    #[error("request failed: {0}")]
    Transport(String),
}

impl ApiError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::InvalidJson(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Status {
                status: status.as_u16(),
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            }
        } else {
            Self::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_timeouts_are_retryable() {
        assert!(ApiError::Timeout("slow".to_string()).is_timeout());
        assert!(!ApiError::InvalidJson("eof".to_string()).is_timeout());
        assert!(!ApiError::Status { status: 500, url: "http://x/".to_string() }.is_timeout());
        assert!(!ApiError::Transport("refused".to_string()).is_timeout());
    }

    #[test]
    fn parse_error_display() {
        let err = ParseError::TooShort { len: 12, needed: 37 };
        assert_eq!(err.to_string(), "message is 12 characters long, header needs 37");
    }
}
