use rusqlite;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{error, warn};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid scope: {message}")]
    InvalidScope { message: String },

    #[error("invalid week range: {message}")]
    InvalidRange { message: String },

    #[error("{message}")]
    NotFound { message: String },

    #[error("validation failed: {message}")]
    Validation {
        message: String,
        details: Option<JsonValue>,
    },

    #[error("resource analytics are not enabled")]
    FeatureDisabled,

    #[error("database error: {message}")]
    Database { message: String },

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl AppError {
    pub fn invalid_scope(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "app::validation", %message, "invalid analytics scope");
        AppError::InvalidScope { message }
    }

    pub fn invalid_range(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "app::validation", %message, "invalid week range");
        AppError::InvalidRange { message }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "app::validation", %message, "validation error");
        AppError::Validation {
            message,
            details: None,
        }
    }

    /// Validation error whose `details` tell the caller which values are accepted.
    pub fn validation_with_details(message: impl Into<String>, details: JsonValue) -> Self {
        let message = message.into();
        warn!(target: "app::validation", %message, %details, "validation error");
        AppError::Validation {
            message,
            details: Some(details),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "app::db", %message, "resource not found");
        AppError::NotFound { message }
    }

    pub fn feature_disabled() -> Self {
        warn!(target: "app::analytics", "resource analytics requested while disabled");
        AppError::FeatureDisabled
    }

    pub fn database(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(target: "app::db", %message, "database error");
        AppError::Database { message }
    }

    pub fn config(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(target: "app::config", %message, "configuration error");
        AppError::Config { message }
    }

    pub fn other(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(target: "app::other", %message, "other error");
        AppError::Other(message)
    }

    /// True for errors caused by the request itself rather than the environment.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            AppError::InvalidScope { .. }
                | AppError::InvalidRange { .. }
                | AppError::NotFound { .. }
                | AppError::Validation { .. }
        )
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(error: rusqlite::Error) -> Self {
        match &error {
            rusqlite::Error::QueryReturnedNoRows => AppError::not_found("record not found"),
            _ => {
                error!(target: "app::db", error = ?error, "sqlite error");
                AppError::database(error.to_string())
            }
        }
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(error: serde_yaml::Error) -> Self {
        AppError::config(format!("failed to parse settings file: {error}"))
    }
}
