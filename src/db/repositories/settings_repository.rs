use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};
use tracing::warn;

use crate::db::migrations::KEY_PMO_BASELINE_HOURS_WEEK;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct AppSettingRow {
    pub key: String,
    pub value: String,
    pub updated_at: String,
}

impl TryFrom<&Row<'_>> for AppSettingRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            key: row.get("key")?,
            value: row.get("value")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

pub struct SettingsRepository;

impl SettingsRepository {
    pub fn get(conn: &Connection, key: &str) -> AppResult<Option<AppSettingRow>> {
        let mut stmt =
            conn.prepare("SELECT key, value, updated_at FROM app_settings WHERE key = ?1")?;

        let row = stmt
            .query_row([key], |row| AppSettingRow::try_from(row))
            .optional()?;

        Ok(row)
    }

    pub fn upsert(conn: &Connection, key: &str, value: &str) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO app_settings (key, value)
                VALUES (:key, :value)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = CURRENT_TIMESTAMP
            "#,
            named_params! {":key": key, ":value": value},
        )?;

        Ok(())
    }

    /// PMO baseline hours per week. Missing, unparsable or negative values read as 0.
    pub fn baseline_hours_per_week(conn: &Connection) -> AppResult<f64> {
        let Some(row) = Self::get(conn, KEY_PMO_BASELINE_HOURS_WEEK)? else {
            return Ok(0.0);
        };

        match row.value.trim().parse::<f64>() {
            Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
            _ => {
                warn!(
                    target: "app::db",
                    value = %row.value,
                    "ignoring invalid PMO baseline setting"
                );
                Ok(0.0)
            }
        }
    }

    pub fn set_baseline_hours_per_week(conn: &Connection, hours: f64) -> AppResult<()> {
        if !hours.is_finite() || hours < 0.0 {
            return Err(AppError::validation(format!(
                "baseline hours per week must be a non-negative number, got {hours}"
            )));
        }
        Self::upsert(conn, KEY_PMO_BASELINE_HOURS_WEEK, &hours.to_string())
    }
}
