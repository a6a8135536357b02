pub mod analytics;

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{error, warn};

use crate::db::repositories::resource_store::SqliteResourceStore;
use crate::db::DbPool;
use crate::error::AppError;
use crate::models::settings::AnalyticsSettings;
use crate::services::resource_analytics_service::ResourceAnalyticsService;
use crate::services::settings_service::SettingsService;

/// Shared handles for the command layer. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    analytics_service: Arc<ResourceAnalyticsService>,
    settings_service: Arc<SettingsService>,
}

impl AppState {
    pub fn new(db_pool: DbPool, settings: AnalyticsSettings) -> Self {
        let store = Arc::new(SqliteResourceStore::new(db_pool.clone()));

        Self {
            analytics_service: Arc::new(ResourceAnalyticsService::new(store, settings)),
            settings_service: Arc::new(SettingsService::new(db_pool)),
        }
    }

    pub fn analytics(&self) -> Arc<ResourceAnalyticsService> {
        Arc::clone(&self.analytics_service)
    }

    pub fn settings(&self) -> Arc<SettingsService> {
        Arc::clone(&self.settings_service)
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.analytics_service.reports_dir().to_path_buf()
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
}

impl CommandError {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Option<JsonValue>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details,
        }
    }

    /// HTTP-style status for transports that need one.
    pub fn status(&self) -> u16 {
        match self.code.as_str() {
            "INVALID_SCOPE" | "INVALID_RANGE" | "VALIDATION_ERROR" => 400,
            "NOT_FOUND" | "FEATURE_DISABLED" => 404,
            _ => 500,
        }
    }
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for CommandError {}

impl From<AppError> for CommandError {
    fn from(error: AppError) -> Self {
        match error {
            AppError::InvalidScope { message } => {
                CommandError::new("INVALID_SCOPE", message, None)
            }
            AppError::InvalidRange { message } => {
                CommandError::new("INVALID_RANGE", message, None)
            }
            AppError::Validation { message, details } => {
                CommandError::new("VALIDATION_ERROR", message, details)
            }
            AppError::NotFound { message } => CommandError::new("NOT_FOUND", message, None),
            AppError::FeatureDisabled => {
                warn!(target: "app::command", "resource analytics requested while disabled");
                CommandError::new("FEATURE_DISABLED", "resource analytics are not enabled", None)
            }
            AppError::Database { message } => {
                error!(target: "app::command", %message, "database error in command");
                CommandError::new("UNKNOWN", message, None)
            }
            AppError::Config { message } => {
                error!(target: "app::command", %message, "configuration error in command");
                CommandError::new("UNKNOWN", message, None)
            }
            AppError::Serialization(error) => {
                error!(target: "app::command", error = %error, "serialization error in command");
                CommandError::new("UNKNOWN", "failed to serialize analytics result", None)
            }
            AppError::Csv(error) => {
                error!(target: "app::command", error = %error, "csv error in command");
                CommandError::new("UNKNOWN", "failed to render csv report", None)
            }
            AppError::Io(error) => {
                error!(target: "app::command", error = %error, "io error in command");
                CommandError::new("UNKNOWN", "failed to read or write report file", None)
            }
            AppError::Other(message) => {
                error!(target: "app::command", %message, "unexpected error in command");
                CommandError::new("UNKNOWN", message, None)
            }
        }
    }
}
