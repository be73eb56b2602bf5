use std::fmt;

/// Classification of a single provider call failure.
///
/// Transient failures (network errors, 5xx responses, timeouts) are retried
/// by the executor; permanent failures (4xx responses, bad auth, undecodable
/// bodies) escalate to a hard failure for that provider immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Retryable failure: network error, 5xx-class response, or timeout.
    Transient(String),
    /// Non-retryable failure: 4xx-class response, auth failure, malformed response.
    Permanent(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Transient(msg) => write!(f, "transient provider error: {}", msg),
            ProviderError::Permanent(msg) => write!(f, "permanent provider error: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

impl ProviderError {
    /// Classifies a non-success HTTP status per the provider contract:
    /// >= 500 is transient, everything else (4xx and friends) is permanent.
    pub fn from_status(status: reqwest::StatusCode, detail: String) -> Self {
        if status.is_server_error() {
            ProviderError::Transient(detail)
        } else {
            ProviderError::Permanent(detail)
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    /// Network-level errors (connect, timeout, send) are transient; decode
    /// and request-construction errors are permanent.
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() || err.is_builder() {
            ProviderError::Permanent(err.to_string())
        } else {
            ProviderError::Transient(err.to_string())
        }
    }
}

/// Application-level error types for the batch boundary.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Lead identity could not be resolved upstream.
    NotFound(String),
    /// Error interacting with an external collaborator.
    ExternalApiError(String),
    /// Internal error (task failure, invalid state).
    InternalError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::ExternalApiError(msg) => write!(f, "External API error: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}
