use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, info};

use crate::db::repositories::settings_repository::SettingsRepository;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::settings::{AnalyticsSettings, OverAllocationRule, MAX_CACHE_TTL_SECONDS};
use crate::utils::iso_week::MAX_SUPPORTED_RANGE_WEEKS;

const ENV_ENABLED: &str = "RESOURCE_ANALYTICS_ENABLED";
const ENV_CACHE_TTL_SECONDS: &str = "RESOURCE_ANALYTICS_CACHE_TTL_SECONDS";
const ENV_CACHE_CAPACITY: &str = "RESOURCE_ANALYTICS_CACHE_CAPACITY";
const ENV_OVER_ALLOCATION_RULE: &str = "RESOURCE_ANALYTICS_OVER_ALLOCATION_RULE";
const ENV_DEFAULT_RANGE_WEEKS: &str = "RESOURCE_ANALYTICS_DEFAULT_RANGE_WEEKS";
const ENV_LOG_DIRECTIVES: &str = "RESOURCE_ANALYTICS_LOG_DIRECTIVES";
const ENV_REPORTS_DIR: &str = "RESOURCE_ANALYTICS_REPORTS_DIR";

/// Loads settings from an optional YAML file, then applies
/// `RESOURCE_ANALYTICS_*` environment overrides.
pub fn load_settings(path: Option<&Path>) -> AppResult<AnalyticsSettings> {
    load_settings_with(path, |key| std::env::var(key).ok())
}

/// [`load_settings`] with an explicit environment lookup.
pub fn load_settings_with<F>(path: Option<&Path>, env: F) -> AppResult<AnalyticsSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let mut settings = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path).map_err(|err| {
                AppError::config(format!("failed to read settings file {}: {err}", path.display()))
            })?;
            let parsed: AnalyticsSettings = serde_yaml::from_str(&raw)?;
            info!(target: "app::config", path = %path.display(), "loaded analytics settings file");
            parsed
        }
        None => AnalyticsSettings::default(),
    };

    apply_env_overrides(&mut settings, env)?;
    validate(&settings)?;

    debug!(
        target: "app::config",
        enabled = settings.enabled,
        cache_ttl_seconds = settings.cache_ttl_seconds,
        cache_capacity = settings.cache_capacity,
        rule = %settings.over_allocation_rule,
        "analytics settings resolved"
    );

    Ok(settings)
}

fn apply_env_overrides<F>(settings: &mut AnalyticsSettings, env: F) -> AppResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = env(ENV_ENABLED) {
        settings.enabled = parse_bool(ENV_ENABLED, &value)?;
    }
    if let Some(value) = env(ENV_CACHE_TTL_SECONDS) {
        settings.cache_ttl_seconds = parse_number(ENV_CACHE_TTL_SECONDS, &value)?;
    }
    if let Some(value) = env(ENV_CACHE_CAPACITY) {
        settings.cache_capacity = parse_number(ENV_CACHE_CAPACITY, &value)?;
    }
    if let Some(value) = env(ENV_OVER_ALLOCATION_RULE) {
        settings.over_allocation_rule = OverAllocationRule::try_from(value.trim())
            .map_err(|err| AppError::config(format!("{ENV_OVER_ALLOCATION_RULE}: {err}")))?;
    }
    if let Some(value) = env(ENV_DEFAULT_RANGE_WEEKS) {
        settings.default_range_weeks = parse_number(ENV_DEFAULT_RANGE_WEEKS, &value)?;
    }
    if let Some(value) = env(ENV_LOG_DIRECTIVES) {
        settings.log_directives = value;
    }
    if let Some(value) = env(ENV_REPORTS_DIR) {
        let trimmed = value.trim();
        settings.reports_dir = (!trimmed.is_empty()).then(|| PathBuf::from(trimmed));
    }
    Ok(())
}

fn validate(settings: &AnalyticsSettings) -> AppResult<()> {
    if settings.cache_ttl_seconds > MAX_CACHE_TTL_SECONDS {
        return Err(AppError::config(format!(
            "cacheTtlSeconds must not exceed {MAX_CACHE_TTL_SECONDS}"
        )));
    }
    let max_weeks = MAX_SUPPORTED_RANGE_WEEKS as u32;
    if settings.default_range_weeks == 0 || settings.default_range_weeks > max_weeks {
        return Err(AppError::config(format!(
            "defaultRangeWeeks must be between 1 and {max_weeks}"
        )));
    }
    if settings.log_directives.trim().is_empty() {
        return Err(AppError::config("logDirectives must not be empty"));
    }
    Ok(())
}

fn parse_bool(key: &str, value: &str) -> AppResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(AppError::config(format!("{key}: expected a boolean, got {other}"))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> AppResult<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| {
            AppError::config(format!("{key}: expected a non-negative integer, got {value}"))
        })
}

/// Workspace settings stored in the database.
pub struct SettingsService {
    db: DbPool,
    baseline: RwLock<Option<f64>>,
}

impl SettingsService {
    pub fn new(db: DbPool) -> Self {
        Self {
            db,
            baseline: RwLock::new(None),
        }
    }

    pub fn baseline_hours_per_week(&self) -> AppResult<f64> {
        if let Ok(guard) = self.baseline.read() {
            if let Some(value) = *guard {
                return Ok(value);
            }
        }

        let value = self
            .db
            .with_read_connection(|conn| SettingsRepository::baseline_hours_per_week(conn))?;
        if let Ok(mut guard) = self.baseline.write() {
            *guard = Some(value);
        }
        Ok(value)
    }

    pub fn update_baseline_hours_per_week(&self, hours: f64) -> AppResult<f64> {
        let stored = self.db.with_transaction(|tx| {
            SettingsRepository::set_baseline_hours_per_week(tx, hours)?;
            SettingsRepository::baseline_hours_per_week(tx)
        })?;
        if let Ok(mut guard) = self.baseline.write() {
            *guard = Some(stored);
        }
        info!(target: "app::config", hours = stored, "PMO baseline hours per week updated");
        Ok(stored)
    }
}
