use std::fmt;

use crate::xml::{ResponseFault, XmlError};

/// Client error taxonomy.
///
/// Argument errors are programming mistakes against the operation catalog and
/// are never retried. [`ApiError::Fault`] is the vendor rejecting a well-formed
/// request; callers are expected to match on it.
#[derive(Debug)]
pub enum ApiError {
    /// No catalog entry with this name.
    UnknownOperation(String),
    /// An argument the operation does not declare.
    UnknownArgument { operation: String, argument: String },
    /// A required argument was not supplied.
    MissingArgument { operation: String, argument: String },
    /// An argument has the wrong shape for the operation.
    InvalidArgument {
        operation: String,
        argument: String,
        reason: String,
    },
    /// The remote service answered `SUCCESS=false`.
    Fault(ResponseFault),
    /// Request serialization or response parsing failed.
    Xml(XmlError),
    /// Network failure or non-success HTTP status.
    Transport(String),
    /// The OAuth token endpoint rejected the refresh.
    Auth(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<ApiError>,
        /// Additional context message.
        context: String,
    },
}

impl ApiError {
    /// The remote fault, looking through any context wrappers.
    pub fn fault(&self) -> Option<&ResponseFault> {
        match self {
            ApiError::Fault(fault) => Some(fault),
            ApiError::WithContext { source, .. } => source.fault(),
            _ => None,
        }
    }

    pub fn is_fault(&self) -> bool {
        self.fault().is_some()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::UnknownOperation(name) => write!(f, "Unknown operation: {}", name),
            ApiError::UnknownArgument {
                operation,
                argument,
            } => write!(f, "{} does not accept argument '{}'", operation, argument),
            ApiError::MissingArgument {
                operation,
                argument,
            } => write!(f, "{} requires argument '{}'", operation, argument),
            ApiError::InvalidArgument {
                operation,
                argument,
                reason,
            } => write!(f, "{}: invalid argument '{}': {}", operation, argument, reason),
            ApiError::Fault(fault) => write!(f, "Response fault: {}", fault),
            ApiError::Xml(e) => write!(f, "XML error: {}", e),
            ApiError::Transport(msg) => write!(f, "Transport error: {}", msg),
            ApiError::Auth(msg) => write!(f, "Authentication error: {}", msg),
            ApiError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Fault(fault) => Some(fault),
            ApiError::Xml(e) => Some(e),
            ApiError::WithContext { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<XmlError> for ApiError {
    fn from(err: XmlError) -> Self {
        ApiError::Xml(err)
    }
}

impl From<ResponseFault> for ApiError {
    fn from(fault: ResponseFault) -> Self {
        ApiError::Fault(fault)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `ApiError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, ApiError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<ApiError>> ResultExt<T> for Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::WithContext {
            source: Box::new(e.into()),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| ApiError::WithContext {
            source: Box::new(e.into()),
            context: f(),
        })
    }
}
