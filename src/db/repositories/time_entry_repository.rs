use std::convert::TryFrom;

use rusqlite::{named_params, Connection, Row};
use tracing::warn;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::resource_analytics::RawTimeEntry;
use crate::utils::iso_week::{WeekKey, WeekRange};

#[derive(Debug, Clone)]
pub struct TimeEntryRow {
    pub subject_id: String,
    pub project_id: Option<String>,
    pub project_name: Option<String>,
    pub week_key: String,
    pub planned_hours: f64,
    pub actual_hours: f64,
}

impl TimeEntryRow {
    pub fn into_raw(self) -> AppResult<RawTimeEntry> {
        Ok(RawTimeEntry {
            week_key: WeekKey::parse(&self.week_key)?,
            subject_id: self.subject_id,
            project_id: self.project_id,
            project_name: self.project_name,
            planned_hours: self.planned_hours,
            actual_hours: self.actual_hours,
        })
    }
}

impl TryFrom<&Row<'_>> for TimeEntryRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            subject_id: row.get("subject_id")?,
            project_id: row.get("project_id")?,
            project_name: row.get("project_name")?,
            week_key: row.get("week_key")?,
            planned_hours: row.get("planned_hours")?,
            actual_hours: row.get("actual_hours")?,
        })
    }
}

pub struct TimeEntryRepository;

impl TimeEntryRepository {
    pub fn upsert(
        conn: &Connection,
        project_member_id: &str,
        week: &WeekKey,
        planned_hours: f64,
        actual_hours: f64,
    ) -> AppResult<()> {
        validate_hours("planned_hours", planned_hours)?;
        validate_hours("actual_hours", actual_hours)?;

        conn.execute(
            r#"
                INSERT INTO project_member_time_entries (
                    id, project_member_id, week_key, planned_hours, actual_hours
                ) VALUES (:id, :member_id, :week_key, :planned, :actual)
                ON CONFLICT(project_member_id, week_key) DO UPDATE SET
                    planned_hours = excluded.planned_hours,
                    actual_hours = excluded.actual_hours
            "#,
            named_params! {
                ":id": Uuid::new_v4().to_string(),
                ":member_id": project_member_id,
                ":week_key": week.to_string(),
                ":planned": planned_hours,
                ":actual": actual_hours,
            },
        )?;

        Ok(())
    }

    /// Entries of active employees across all projects inside `range`.
    pub fn department_entries(
        conn: &Connection,
        department: Option<&str>,
        range: &WeekRange,
    ) -> AppResult<Vec<RawTimeEntry>> {
        let mut stmt = conn.prepare(
            r#"
                SELECT e.id AS subject_id,
                       p.id AS project_id,
                       p.name AS project_name,
                       t.week_key AS week_key,
                       t.planned_hours AS planned_hours,
                       t.actual_hours AS actual_hours
                FROM project_member_time_entries t
                JOIN project_members pm ON pm.id = t.project_member_id
                JOIN employees e ON e.id = pm.employee_id
                LEFT JOIN projects p ON p.id = pm.project_id
                WHERE e.is_active = 1
                  AND (:department IS NULL OR e.department = :department)
                  AND t.week_key BETWEEN :from_week AND :to_week
                ORDER BY t.week_key ASC, p.id ASC, e.id ASC
            "#,
        )?;

        let rows = stmt
            .query_map(
                named_params! {
                    ":department": department,
                    ":from_week": range.from_week.to_string(),
                    ":to_week": range.to_week.to_string(),
                },
                |row| TimeEntryRow::try_from(row),
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(into_raw_entries(rows))
    }

    /// Entries booked against `project_id` inside `range`.
    pub fn project_entries(
        conn: &Connection,
        project_id: &Uuid,
        range: &WeekRange,
    ) -> AppResult<Vec<RawTimeEntry>> {
        let mut stmt = conn.prepare(
            r#"
                SELECT pm.employee_id AS subject_id,
                       p.id AS project_id,
                       p.name AS project_name,
                       t.week_key AS week_key,
                       t.planned_hours AS planned_hours,
                       t.actual_hours AS actual_hours
                FROM project_member_time_entries t
                JOIN project_members pm ON pm.id = t.project_member_id
                JOIN projects p ON p.id = pm.project_id
                WHERE pm.project_id = :project_id
                  AND t.week_key BETWEEN :from_week AND :to_week
                ORDER BY t.week_key ASC, pm.employee_id ASC
            "#,
        )?;

        let rows = stmt
            .query_map(
                named_params! {
                    ":project_id": project_id.to_string(),
                    ":from_week": range.from_week.to_string(),
                    ":to_week": range.to_week.to_string(),
                },
                |row| TimeEntryRow::try_from(row),
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(into_raw_entries(rows))
    }
}

// Stored keys that do not parse are skipped; they cannot sit on the week axis.
fn into_raw_entries(rows: Vec<TimeEntryRow>) -> Vec<RawTimeEntry> {
    rows.into_iter()
        .filter_map(|row| {
            let week_key = row.week_key.clone();
            match row.into_raw() {
                Ok(entry) => Some(entry),
                Err(error) => {
                    warn!(
                        target: "app::db",
                        %week_key,
                        %error,
                        "skipping time entry with invalid week key"
                    );
                    None
                }
            }
        })
        .collect()
}

fn validate_hours(field: &str, hours: f64) -> AppResult<()> {
    if !hours.is_finite() || hours < 0.0 {
        return Err(AppError::validation(format!(
            "{field} must be a non-negative number, got {hours}"
        )));
    }
    Ok(())
}
