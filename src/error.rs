use thiserror::Error;

/// HTTP statuses the server uses to signal it is temporarily unable to serve a request.
pub const RETRYABLE_STATUS: [u16; 4] = [429, 502, 503, 504];

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Configuration key or environment variable that caused the error (e.g., "port", "INFINISPAN_PORT")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., the offending value, the request URL)
    pub details: Option<String>,
    /// Source of the error (e.g., "settings_loader", "http_transport")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Coarse classification of an [`Error`].
///
/// Retry decisions are made on the kind alone, see [`ErrorKind::is_transient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Decode,
    UnknownCache,
    Connection,
    Timeout,
    Authentication,
    /// Non-success response that the server marked as temporary (busy, gateway trouble).
    RemoteBusy,
    Remote,
    RetryExhausted,
    Configuration,
    Io,
    Serialization,
}

impl ErrorKind {
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            ErrorKind::Connection | ErrorKind::Timeout | ErrorKind::RemoteBusy
        )
    }
}

/// Unified error type for the Infinispan client.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Decode error: {message}")]
    Decode { message: String },

    #[error("Unknown cache '{name}': no such cache in the configuration")]
    UnknownCache { name: String },

    #[error("Connection error: {message}{}", format_context(.context))]
    Connection {
        message: String,
        context: ErrorContext,
    },

    #[error("Timeout: {message}{}", format_context(.context))]
    Timeout {
        message: String,
        context: ErrorContext,
    },

    #[error("Authentication failed: HTTP {status}: {message}")]
    Authentication { status: u16, message: String },

    #[error("Remote error: HTTP {status}: {message}")]
    Remote {
        status: u16,
        message: String,
        retryable: bool,
    },

    #[error("Retry exhausted after {attempts} attempts, last error: {source}")]
    RetryExhausted { attempts: u32, source: Box<Error> },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn decode(msg: impl Into<String>) -> Self {
        Error::Decode {
            message: msg.into(),
        }
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration {
            message: msg.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub fn connection_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Connection {
            message: msg.into(),
            context,
        }
    }

    pub fn timeout_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Timeout {
            message: msg.into(),
            context,
        }
    }

    /// Map a non-success HTTP response to the matching error variant.
    ///
    /// 401/403 are authentication failures; statuses in [`RETRYABLE_STATUS`] are transient.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let message = body.into();
        match status {
            401 | 403 => Error::Authentication { status, message },
            _ => Error::Remote {
                status,
                message,
                retryable: RETRYABLE_STATUS.contains(&status),
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Decode { .. } => ErrorKind::Decode,
            Error::UnknownCache { .. } => ErrorKind::UnknownCache,
            Error::Connection { .. } => ErrorKind::Connection,
            Error::Timeout { .. } => ErrorKind::Timeout,
            Error::Authentication { .. } => ErrorKind::Authentication,
            Error::Remote {
                retryable: true, ..
            } => ErrorKind::RemoteBusy,
            Error::Remote { .. } => ErrorKind::Remote,
            Error::RetryExhausted { .. } => ErrorKind::RetryExhausted,
            Error::Configuration { .. } => ErrorKind::Configuration,
            Error::Io(_) => ErrorKind::Io,
            Error::Serialization(_) => ErrorKind::Serialization,
        }
    }

    /// Whether another attempt of the same operation may succeed.
    pub fn is_transient(&self) -> bool {
        self.kind().is_transient()
    }

    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Authentication { status, .. } | Error::Remote { status, .. } => Some(*status),
            Error::RetryExhausted { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Connection { context, .. }
            | Error::Timeout { context, .. }
            | Error::Configuration { context, .. } => Some(context),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(Error::from_status(401, "").kind(), ErrorKind::Authentication);
        assert_eq!(Error::from_status(403, "").kind(), ErrorKind::Authentication);
        assert_eq!(Error::from_status(503, "busy").kind(), ErrorKind::RemoteBusy);
        assert_eq!(Error::from_status(429, "").kind(), ErrorKind::RemoteBusy);
        assert_eq!(Error::from_status(400, "bad").kind(), ErrorKind::Remote);
        assert_eq!(Error::from_status(500, "boom").kind(), ErrorKind::Remote);
    }

    #[test]
    fn test_transient_classification() {
        let transient = [
            ErrorKind::Connection,
            ErrorKind::Timeout,
            ErrorKind::RemoteBusy,
        ];
        for kind in transient {
            assert!(kind.is_transient(), "{:?} should be transient", kind);
        }

        let terminal = [
            ErrorKind::Decode,
            ErrorKind::UnknownCache,
            ErrorKind::Authentication,
            ErrorKind::Remote,
            ErrorKind::RetryExhausted,
            ErrorKind::Configuration,
            ErrorKind::Io,
            ErrorKind::Serialization,
        ];
        for kind in terminal {
            assert!(!kind.is_transient(), "{:?} should not be transient", kind);
        }
    }

    #[test]
    fn test_retry_exhausted_reports_cause() {
        let err = Error::RetryExhausted {
            attempts: 4,
            source: Box::new(Error::from_status(503, "busy")),
        };
        assert_eq!(err.status(), Some(503));
        assert!(!err.is_transient());
        let msg = err.to_string();
        assert!(msg.contains("4 attempts"));
        assert!(msg.contains("HTTP 503"));
    }

    #[test]
    fn test_context_formatting() {
        let err = Error::configuration_with_context(
            "invalid port",
            ErrorContext::new()
                .with_field_path("INFINISPAN_PORT")
                .with_details("value: abc"),
        );
        assert_eq!(
            err.to_string(),
            "Configuration error: invalid port (field: INFINISPAN_PORT, details: value: abc)"
        );
        assert!(err.context().is_some());
    }
}
