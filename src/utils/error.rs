use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatchError {
    #[error("HTTP request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("{collaborator} returned status {status}: {message}")]
    CollaboratorError {
        collaborator: String,
        status: u16,
        message: String,
    },

    #[error("{collaborator} returned an empty response")]
    EmptyResponse { collaborator: String },

    #[error("Stage '{stage}' failed: {details}")]
    StageError {
        stage: String,
        details: String,
        #[source]
        source: Option<Box<MatchError>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Collaborator,
    Configuration,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MatchError {
    /// Wraps a failure with the stage it happened in. Classification and
    /// recovery hints still come from the wrapped error.
    pub fn stage(stage: impl Into<String>, source: MatchError) -> Self {
        MatchError::StageError {
            stage: stage.into(),
            details: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// A stage failure with no underlying collaborator error.
    pub fn stage_failed(stage: impl Into<String>, details: impl Into<String>) -> Self {
        MatchError::StageError {
            stage: stage.into(),
            details: details.into(),
            source: None,
        }
    }

    fn stage_source(&self) -> Option<&MatchError> {
        match self {
            MatchError::StageError {
                source: Some(source),
                ..
            } => Some(source),
            _ => None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        if let Some(source) = self.stage_source() {
            return source.category();
        }
        match self {
            MatchError::ApiError(_) => ErrorCategory::Network,
            MatchError::CollaboratorError { .. } | MatchError::EmptyResponse { .. } => {
                ErrorCategory::Collaborator
            }
            MatchError::ConfigValidationError { .. }
            | MatchError::InvalidConfigValueError { .. }
            | MatchError::MissingConfigError { .. } => ErrorCategory::Configuration,
            MatchError::SerializationError(_) | MatchError::StageError { .. } => {
                ErrorCategory::Data
            }
            MatchError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        if let Some(source) = self.stage_source() {
            return source.severity();
        }
        match self {
            // a single run failed; the caller may retry it
            MatchError::ApiError(_)
            | MatchError::CollaboratorError { .. }
            | MatchError::EmptyResponse { .. }
            | MatchError::StageError { .. } => ErrorSeverity::Medium,
            MatchError::ConfigValidationError { .. }
            | MatchError::InvalidConfigValueError { .. }
            | MatchError::MissingConfigError { .. }
            | MatchError::SerializationError(_) => ErrorSeverity::High,
            MatchError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        if let Some(source) = self.stage_source() {
            return source.recovery_suggestion();
        }
        match self {
            MatchError::ApiError(_) => {
                "Check network connectivity and the configured LLM base URL".to_string()
            }
            MatchError::CollaboratorError { status, .. } if *status == 401 || *status == 403 => {
                "Check that OPENAI_API_KEY is set and valid".to_string()
            }
            MatchError::CollaboratorError { status, .. } if *status == 429 => {
                "The provider is rate limiting requests; wait and run again".to_string()
            }
            MatchError::CollaboratorError { .. } | MatchError::EmptyResponse { .. } => {
                "The model provider failed; run again or switch model".to_string()
            }
            MatchError::ConfigValidationError { field, .. }
            | MatchError::InvalidConfigValueError { field, .. } => {
                format!("Fix the '{}' setting in your configuration", field)
            }
            MatchError::MissingConfigError { field } => {
                format!("Provide '{}' via flag, config file or environment", field)
            }
            MatchError::IoError(_) => "Check file paths and permissions".to_string(),
            MatchError::SerializationError(_) => {
                "Check that the input is valid JSON".to_string()
            }
            MatchError::StageError { stage, .. } => {
                format!("Inspect the logs for the '{}' stage and run again", stage)
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not reach a remote service: {}", self),
            ErrorCategory::Collaborator => format!("The model provider failed: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Data => format!("Matching failed: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }

    /// Process exit code for the binaries.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, MatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_error_wraps_source_message() {
        let inner = MatchError::CollaboratorError {
            collaborator: "language model".to_string(),
            status: 500,
            message: "boom".to_string(),
        };
        let err = MatchError::stage("Extract", inner);

        assert_eq!(err.category(), ErrorCategory::Collaborator);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert!(err.to_string().contains("Extract"));
        assert!(err.to_string().contains("boom"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_stage_error_keeps_io_classification() {
        let inner = MatchError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "post.txt",
        ));
        let err = MatchError::stage("Fetch", inner);

        assert_eq!(err.category(), ErrorCategory::System);
        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.recovery_suggestion(), "Check file paths and permissions");
    }

    #[test]
    fn test_stage_failure_without_source_is_data_error() {
        let err = MatchError::stage_failed("Assemble", "no verdict was produced");

        assert_eq!(err.category(), ErrorCategory::Data);
        assert_eq!(err.exit_code(), 2);
        assert!(err.recovery_suggestion().contains("'Assemble'"));
    }

    #[test]
    fn test_config_errors_exit_with_one() {
        let err = MatchError::MissingConfigError {
            field: "OPENAI_API_KEY".to_string(),
        };
        assert_eq!(err.exit_code(), 1);
        assert!(err.recovery_suggestion().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_auth_failure_suggests_checking_key() {
        let err = MatchError::CollaboratorError {
            collaborator: "language model".to_string(),
            status: 401,
            message: "invalid key".to_string(),
        };
        assert!(err.recovery_suggestion().contains("OPENAI_API_KEY"));
        assert_eq!(err.exit_code(), 2);
    }
}
