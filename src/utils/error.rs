use thiserror::Error;

#[derive(Error, Debug)]
pub enum KbError {
    #[error("Disease not found: {id}")]
    NotFound { id: String },

    #[error("Detection attempted with an empty disease catalog")]
    EmptyCatalog,

    #[error("A detection is already in progress")]
    Busy,

    #[error("Invalid value '{value}' for {field}: {reason}")]
    Validation {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Detection did not complete within {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Malformed embedded data in {source_name}: {message}")]
    MalformedSeed {
        source_name: String,
        message: String,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidation { field: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Payload-free mirror of the [`KbError`] variants, for state that must be
/// cloned and compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    EmptyCatalog,
    Busy,
    Validation,
    Timeout,
    MalformedSeed,
    Config,
    ConfigValidation,
    Io,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Lookup,
    Detection,
    Query,
    Data,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl KbError {
    pub fn validation(field: &str, value: &str, reason: impl Into<String>) -> Self {
        KbError::Validation {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn malformed_seed(source_name: &str, message: impl Into<String>) -> Self {
        KbError::MalformedSeed {
            source_name: source_name.to_string(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            KbError::NotFound { .. } => ErrorKind::NotFound,
            KbError::EmptyCatalog => ErrorKind::EmptyCatalog,
            KbError::Busy => ErrorKind::Busy,
            KbError::Validation { .. } => ErrorKind::Validation,
            KbError::Timeout { .. } => ErrorKind::Timeout,
            KbError::MalformedSeed { .. } => ErrorKind::MalformedSeed,
            KbError::Config { .. } => ErrorKind::Config,
            KbError::ConfigValidation { .. } => ErrorKind::ConfigValidation,
            KbError::Io(_) => ErrorKind::Io,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            KbError::NotFound { .. } => ErrorCategory::Lookup,
            KbError::EmptyCatalog | KbError::Busy | KbError::Timeout { .. } => {
                ErrorCategory::Detection
            }
            KbError::Validation { .. } => ErrorCategory::Query,
            KbError::MalformedSeed { .. } => ErrorCategory::Data,
            KbError::Config { .. } | KbError::ConfigValidation { .. } => {
                ErrorCategory::Configuration
            }
            KbError::Io(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            KbError::NotFound { .. } | KbError::Validation { .. } => ErrorSeverity::Low,
            KbError::Busy | KbError::Timeout { .. } => ErrorSeverity::Medium,
            KbError::EmptyCatalog
            | KbError::Config { .. }
            | KbError::ConfigValidation { .. } => ErrorSeverity::High,
            KbError::MalformedSeed { .. } | KbError::Io(_) => ErrorSeverity::Critical,
        }
    }

    /// Whether repeating the same call later can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, KbError::Busy | KbError::Timeout { .. })
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            KbError::NotFound { .. } => "Pick a disease from the catalog listing",
            KbError::EmptyCatalog => "Load a catalog with at least one disease before detecting",
            KbError::Busy => "Wait for the running detection to finish, then submit again",
            KbError::Validation { .. } => "Use one of the values offered by the filter options",
            KbError::Timeout { .. } => "Retry the detection or raise detection.timeout_ms",
            KbError::MalformedSeed { .. } => "Fix the embedded seed data and rebuild",
            KbError::Config { .. } | KbError::ConfigValidation { .. } => {
                "Check the configuration file against the documented keys"
            }
            KbError::Io(_) => "Check that the file exists and is readable",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            KbError::NotFound { id } => format!("No disease with id '{}' is known", id),
            KbError::EmptyCatalog => "There are no diseases to compare the image against".to_string(),
            KbError::Busy => "An image is still being analysed".to_string(),
            KbError::Validation { field, value, .. } => {
                format!("'{}' is not a valid {}", value, field)
            }
            KbError::Timeout { .. } => "The analysis took too long and was stopped".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, KbError>;
