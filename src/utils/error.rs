use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// 呼叫視覺服務時的傳輸層錯誤
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("vision service rate limited the request (HTTP {status})")]
    RateLimited { status: u16 },

    #[error("vision service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("vision service request timed out")]
    Timeout,

    #[error("connection to vision service failed: {0}")]
    Connection(String),

    #[error("vision service request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connection(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

/// 驗證失敗的種類，依檢查順序排列
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingField(&'static str),
    InvalidNumber(&'static str),
    InvalidCalories,
    InvalidConfidence,
    NoItemsDetected,
}

impl ValidationError {
    /// 違反規則的欄位名稱
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingField(name) | ValidationError::InvalidNumber(name) => name,
            ValidationError::InvalidCalories => "calories_kcal",
            ValidationError::InvalidConfidence => "confidence_score",
            ValidationError::NoItemsDetected => "items",
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingField(name) => write!(f, "Missing required field: {}", name),
            ValidationError::InvalidNumber(name) => write!(f, "Field is not numeric: {}", name),
            ValidationError::InvalidCalories => write!(f, "Invalid calories value"),
            ValidationError::InvalidConfidence => write!(f, "Invalid confidence score"),
            ValidationError::NoItemsDetected => write!(f, "No food items detected"),
        }
    }
}

impl std::error::Error for ValidationError {}

#[derive(Error, Debug)]
pub enum NutriError {
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Malformed vision response: {message}")]
    MalformedResponse { message: String },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NutriError>;

/// 回傳給呼叫端的錯誤代碼
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    MalformedResponse,
    SchemaValidationError,
    AnalysisError,
    RateLimit,
    Timeout,
    Network,
    ExternalServiceError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::MalformedResponse => "MALFORMED_RESPONSE",
            ErrorCode::SchemaValidationError => "SCHEMA_VALIDATION_ERROR",
            ErrorCode::AnalysisError => "ANALYSIS_ERROR",
            ErrorCode::RateLimit => "RATE_LIMIT",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::Network => "NETWORK",
            ErrorCode::ExternalServiceError => "EXTERNAL_SERVICE_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    ExternalService,
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

impl NutriError {
    pub fn code(&self) -> ErrorCode {
        match self {
            NutriError::Transport(TransportError::RateLimited { .. }) => ErrorCode::RateLimit,
            NutriError::Transport(TransportError::Timeout) => ErrorCode::Timeout,
            NutriError::Transport(TransportError::Connection(_)) => ErrorCode::Network,
            NutriError::Transport(TransportError::Status { .. })
            | NutriError::Transport(TransportError::Request(_)) => ErrorCode::ExternalServiceError,
            NutriError::MalformedResponse { .. } => ErrorCode::MalformedResponse,
            NutriError::Validation(_) => ErrorCode::SchemaValidationError,
            NutriError::ConfigError { .. }
            | NutriError::MissingConfigError { .. }
            | NutriError::InvalidConfigValueError { .. }
            | NutriError::IoError(_)
            | NutriError::SerializationError(_) => ErrorCode::AnalysisError,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            NutriError::ConfigError { .. }
            | NutriError::MissingConfigError { .. }
            | NutriError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            NutriError::Transport(TransportError::Timeout)
            | NutriError::Transport(TransportError::Connection(_)) => ErrorCategory::Network,
            NutriError::Transport(_) => ErrorCategory::ExternalService,
            NutriError::MalformedResponse { .. }
            | NutriError::Validation(_)
            | NutriError::SerializationError(_) => ErrorCategory::Data,
            NutriError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network | ErrorCategory::ExternalService => ErrorSeverity::Medium,
            ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            NutriError::MissingConfigError { .. } => {
                "Set DEEPSEEK_API_KEY or add api_key under [vision] in the config file"
            }
            NutriError::ConfigError { .. } | NutriError::InvalidConfigValueError { .. } => {
                "Check the configuration file and environment variables"
            }
            NutriError::Transport(TransportError::RateLimited { .. }) => {
                "Wait about 60 seconds before analyzing another meal"
            }
            NutriError::Transport(TransportError::Timeout) => {
                "Retry the analysis; consider a smaller image"
            }
            NutriError::Transport(TransportError::Connection(_)) => {
                "Check network connectivity and retry"
            }
            NutriError::Transport(_) => "The vision service is unavailable; retry later",
            NutriError::MalformedResponse { .. } => {
                "Retry with a clearer photo taken in better lighting"
            }
            NutriError::Validation(_) => "Retry with a photo where the food is clearly visible",
            NutriError::IoError(_) => "Check that the file exists and is readable",
            NutriError::SerializationError(_) => "Check the input data format",
        }
    }

    /// 給終端使用者看的訊息（不含內部細節）
    pub fn user_friendly_message(&self) -> String {
        match self {
            NutriError::Transport(TransportError::RateLimited { .. }) => {
                "Service temporarily busy, please wait 60 seconds and try again.".to_string()
            }
            NutriError::Transport(TransportError::Timeout) => {
                "Analysis took too long, try again.".to_string()
            }
            NutriError::Transport(TransportError::Connection(_)) => {
                "Network issue, please retry.".to_string()
            }
            NutriError::Transport(_) => {
                "Vision service error while analyzing the meal.".to_string()
            }
            NutriError::MalformedResponse { .. } => {
                "Failed to parse the analysis. Please try again with better lighting.".to_string()
            }
            NutriError::Validation(kind) => format!("Validation failed: {}", kind),
            other => format!("Analysis failed: {}", other),
        }
    }
}
