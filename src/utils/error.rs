use thiserror::Error;

#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("Request failed: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("{message}")]
    TransportError { status: u16, message: String },

    #[error("Could not decode response: {message}")]
    DecodeError { message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Validation error on {field}: {message}")]
    ValidationError { field: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Transport,
    Decode,
    Configuration,
    Validation,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ViewerError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ViewerError::NetworkError(_) => ErrorCategory::Network,
            ViewerError::TransportError { .. } => ErrorCategory::Transport,
            ViewerError::DecodeError { .. } => ErrorCategory::Decode,
            ViewerError::ConfigError { .. }
            | ViewerError::InvalidConfigValueError { .. }
            | ViewerError::MissingConfigError { .. } => ErrorCategory::Configuration,
            ViewerError::ValidationError { .. } => ErrorCategory::Validation,
            ViewerError::CsvError(_)
            | ViewerError::IoError(_)
            | ViewerError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Validation => ErrorSeverity::Low,
            ErrorCategory::Network | ErrorCategory::Transport => ErrorSeverity::Medium,
            ErrorCategory::Decode | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 錯誤訊息本體，不含分類前綴；用於狀態列
    pub fn status_text(&self) -> String {
        match self {
            ViewerError::TransportError { message, .. } => message.clone(),
            ViewerError::DecodeError { message } => message.clone(),
            ViewerError::ValidationError { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check that the proxy is running and reachable",
            ErrorCategory::Transport => "Check the requested parameter and try again",
            ErrorCategory::Decode => "The proxy returned malformed data; check the upstream API",
            ErrorCategory::Configuration => "Review the viewer configuration file",
            ErrorCategory::Validation => "Correct the highlighted input",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not reach the proxy: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            _ => self.status_text(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ViewerError>;
