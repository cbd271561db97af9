use thiserror::Error;

use crate::config::error::ConfigError;

/// Application-wide error type.
///
/// Every failure on the fetch / notify / persist path is expressed as one of
/// these variants so the run loop can decide per author whether to retry,
/// skip, or just log.
#[derive(Error, Debug)]
pub enum AppError {
    /// Transport-level failure or a non-success HTTP status from a remote API
    #[error("{platform} request failed: {message}")]
    ExternalApi {
        platform: String,
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// The platform rejected the request as rate-limited or blocked
    #[error("{platform} rejected the request as rate-limited (code {code})")]
    RateLimited { platform: String, code: i64 },

    /// Well-formed API error response that should not be retried
    #[error("{platform} API error {code}: {message}")]
    Api {
        platform: String,
        code: i64,
        message: String,
    },

    /// Success envelope whose payload is missing or has the wrong shape
    #[error("Malformed response from {platform}: {message}")]
    MalformedResponse { platform: String, message: String },

    /// Validation error with field-specific details
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Configuration error with key information
    #[error("Configuration error: {key}")]
    Configuration {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// Reading or writing durable state failed
    #[error("Persistence failed for {path}")]
    Persistence {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    /// A notification provider could not deliver a message
    #[error("Notification via {provider} failed: {message}")]
    Notification { provider: String, message: String },

    /// Internal error for unexpected failures
    #[error("Internal error")]
    Internal {
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    /// Whether the fetch policy should try the request again
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::ExternalApi { .. } | AppError::RateLimited { .. }
        )
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal { source: error }
    }
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        let key = match &error {
            ConfigError::ValidationError { field, .. } => field.clone(),
            _ => "settings".to_string(),
        };
        AppError::Configuration {
            key,
            source: anyhow::Error::new(error),
        }
    }
}

/// Type alias for Result with AppError to simplify function signatures
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let transport = AppError::ExternalApi {
            platform: "bilibili".into(),
            message: "timed out".into(),
            source: None,
        };
        let limited = AppError::RateLimited {
            platform: "bilibili".into(),
            code: -412,
        };
        let hard = AppError::Api {
            platform: "bilibili".into(),
            code: -400,
            message: "bad request".into(),
        };
        let malformed = AppError::MalformedResponse {
            platform: "bilibili".into(),
            message: "missing data".into(),
        };

        assert!(transport.is_retryable());
        assert!(limited.is_retryable());
        assert!(!hard.is_retryable());
        assert!(!malformed.is_retryable());
    }

    #[test]
    fn test_config_error_keeps_field_name() {
        let err: AppError = ConfigError::validation("fetch.max_retries", "must be positive").into();
        match err {
            AppError::Configuration { key, .. } => assert_eq!(key, "fetch.max_retries"),
            other => panic!("Expected Configuration error, got {other:?}"),
        }
    }

    #[test]
    fn test_display_messages() {
        let err = AppError::RateLimited {
            platform: "bilibili".into(),
            code: -412,
        };
        assert_eq!(
            err.to_string(),
            "bilibili rejected the request as rate-limited (code -412)"
        );
    }
}
