//! Global error types for the GitLab REST client.
//!
//! Every failure the client can surface is unified into a single `GlError`
//! enum with conversions from the underlying library errors.

use thiserror::Error;

/// Convenience type alias for Results using GlError.
pub type GlResult<T> = Result<T, GlError>;

/// Unified error type covering all error categories.
#[derive(Error, Debug)]
pub enum GlError {
    // -- Local validation errors --
    /// Wrong number of positional arguments, or parameters passed to an
    /// endpoint that does not accept them. Raised before any network call.
    #[error("arity error: {0}")]
    Arity(String),

    /// The endpoint name is not present in the loaded endpoint table.
    #[error("unknown endpoint: {0}")]
    UnknownEndpoint(String),

    /// A paginated endpoint returned something other than a sequence.
    #[error("contract error: {0}")]
    Contract(String),

    /// A file-upload source could not be read.
    #[error("cannot read upload file {path}: {message}")]
    FileAccess {
        /// Path the caller supplied.
        path: String,
        /// Underlying I/O failure.
        message: String,
    },

    // -- Configuration errors --
    /// Failed to load, parse, or validate configuration.
    #[error("configuration error: {0}")]
    Config(String),

    // -- Network errors --
    /// The HTTP exchange itself could not complete (DNS, connect, TLS).
    #[error("transport error: {0}")]
    Transport(String),

    /// The HTTP exchange timed out.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// The server answered with a failure status.
    #[error("{verb} {url} failed with {status} {reason}: {glimpse}")]
    Api {
        /// HTTP verb of the failed request.
        verb: String,
        /// Fully resolved request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase for the status.
        reason: String,
        /// Whitespace-collapsed, truncated start of the response body.
        glimpse: String,
    },

    /// A successful response body was not valid JSON.
    #[error("{verb} {url} returned {status} with an undecodable body: {message}")]
    Decode {
        /// HTTP verb of the request.
        verb: String,
        /// Fully resolved request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Parser error message.
        message: String,
    },

    // -- File/IO errors --
    /// File system operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    // -- Generic --
    /// Wrapping anyhow errors for interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GlError {
    /// Whether the error came from the network layer rather than the server.
    pub fn is_transport(&self) -> bool {
        matches!(self, GlError::Transport(_) | GlError::Timeout(_))
    }

    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            GlError::Api { status, .. } | GlError::Decode { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for GlError {
    fn from(e: serde_json::Error) -> Self {
        GlError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for GlError {
    fn from(e: serde_yaml::Error) -> Self {
        GlError::Config(format!("invalid endpoint table: {e}"))
    }
}

impl From<toml::de::Error> for GlError {
    fn from(e: toml::de::Error) -> Self {
        GlError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = GlError::Api {
            verb: "GET".into(),
            url: "https://gitlab.example.com/api/v4/projects/1".into(),
            status: 500,
            reason: "Internal Server Error".into(),
            glimpse: "oops".into(),
        };
        assert_eq!(
            err.to_string(),
            "GET https://gitlab.example.com/api/v4/projects/1 failed with 500 Internal Server Error: oops"
        );
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn test_transport_classification() {
        assert!(GlError::Timeout("slow".into()).is_transport());
        assert!(GlError::Transport("refused".into()).is_transport());
        assert!(!GlError::Arity("x".into()).is_transport());
        assert_eq!(GlError::Contract("x".into()).status(), None);
    }

    #[test]
    fn test_config_error_display() {
        let err = GlError::Config("bad value".to_string());
        assert_eq!(err.to_string(), "configuration error: bad value");
    }
}
