//! Error types for the client.

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by record, query and session operations.
///
/// Precondition errors are raised locally before anything touches the
/// network. Transport errors mean the server could not be reached or replied
/// with something that is not an error document. Protocol errors carry the
/// server's own verdict.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("object has no id")]
    MissingObjectId,

    #[error("missing required field: {field}")]
    MissingField { field: String },

    #[error("invalid value for {field}: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("transport error: {0}")]
    Transport(#[from] docsync_http::Error),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    #[error("{message} (code {code})")]
    Api { code: i64, message: String },

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    pub fn missing_field(field: impl Into<String>) -> Self {
        Error::MissingField {
            field: field.into(),
        }
    }

    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Raised locally, before any request was issued.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Error::MissingObjectId
                | Error::MissingField { .. }
                | Error::InvalidField { .. }
                | Error::Config { .. }
        )
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Http { .. })
    }

    pub fn is_protocol(&self) -> bool {
        matches!(self, Error::InvalidResponse(_) | Error::Api { .. })
    }

    /// Server-reported error code, if the server reported one.
    pub fn code(&self) -> Option<i64> {
        match self {
            Error::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}
