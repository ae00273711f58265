use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Authentication error: {message}")]
    Authentication { message: String },

    #[error("Authorization error: {message}")]
    Authorization { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Key generation error: {message}")]
    Generation { message: String },

    #[error("Publish error: {message}")]
    Publish { message: String },
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }

    pub fn publish(message: impl Into<String>) -> Self {
        Self::Publish {
            message: message.into(),
        }
    }

    /// Whether the error was caused by the caller rather than the server
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::Authentication { .. }
                | Self::Authorization { .. }
                | Self::NotFound { .. }
                | Self::Configuration { .. }
        )
    }

    /// Short label used for metrics and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::Authentication { .. } => "authentication",
            Self::Authorization { .. } => "authorization",
            Self::NotFound { .. } => "not_found",
            Self::Configuration { .. } => "configuration",
            Self::Conflict { .. } => "conflict",
            Self::Storage { .. } => "storage",
            Self::Generation { .. } => "generation",
            Self::Publish { .. } => "publish",
        }
    }
}

impl From<validator::ValidationErrors> for DomainError {
    fn from(err: validator::ValidationErrors) -> Self {
        DomainError::validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let error = DomainError::not_found("Api 'api_1' not found");
        assert_eq!(error.to_string(), "Not found: Api 'api_1' not found");
    }

    #[test]
    fn test_validation_error() {
        let error = DomainError::validation("Invalid input");
        assert_eq!(error.to_string(), "Validation error: Invalid input");
    }

    #[test]
    fn test_caller_errors() {
        assert!(DomainError::validation("x").is_caller_error());
        assert!(DomainError::authentication("x").is_caller_error());
        assert!(DomainError::authorization("x").is_caller_error());
        assert!(DomainError::not_found("x").is_caller_error());
        assert!(DomainError::configuration("x").is_caller_error());

        assert!(!DomainError::storage("x").is_caller_error());
        assert!(!DomainError::generation("x").is_caller_error());
        assert!(!DomainError::conflict("x").is_caller_error());
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(DomainError::storage("x").kind(), "storage");
        assert_eq!(DomainError::publish("x").kind(), "publish");
    }
}
