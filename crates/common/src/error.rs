use thiserror::Error;

/// Failures that can abort a single poll cycle.
///
/// The set is closed so the cycle boundary can match on the kind. Every
/// variant is currently handled the same way: log and retry on the next cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BotError {
    #[error("Request to {endpoint} failed: {reason}")]
    Transport { endpoint: String, reason: String },

    #[error("Request to {endpoint} returned HTTP {code}")]
    StatusCode { endpoint: String, code: u16 },

    #[error("API response is not valid JSON: {0}")]
    Decode(String),

    #[error("Unexpected API response shape: {0}")]
    Shape(String),

    #[error("Missing required field `{field}`")]
    MissingField { field: &'static str },

    #[error("Undocumented homework status `{code}`")]
    UnknownStatus { code: String },
}

impl BotError {
    /// Stable name of the error kind, logged as the `error_kind` field.
    pub fn kind(&self) -> &'static str {
        match self {
            BotError::Transport { .. } => "transport",
            BotError::StatusCode { .. } => "status_code",
            BotError::Decode(_) => "decode",
            BotError::Shape(_) => "shape",
            BotError::MissingField { .. } => "missing_field",
            BotError::UnknownStatus { .. } => "unknown_status",
        }
    }

    /// Whether the failure came from talking to the remote API rather than
    /// from the content of a response it returned.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            BotError::Transport { .. } | BotError::StatusCode { .. }
        )
    }
}

/// Startup configuration problems. Any of these is fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("Environment variable {var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}
