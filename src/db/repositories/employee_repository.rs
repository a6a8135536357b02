use rusqlite::{named_params, Connection};

use crate::error::{AppError, AppResult};
use crate::models::resource_analytics::RawCapacityRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeRow {
    pub id: String,
    pub name: String,
    pub department: Option<String>,
    pub is_active: bool,
    pub max_capacity_hours_week: f64,
}

pub struct EmployeeRepository;

impl EmployeeRepository {
    pub fn upsert(conn: &Connection, employee: &EmployeeRow) -> AppResult<()> {
        validate_capacity(employee.max_capacity_hours_week)?;

        conn.execute(
            r#"
                INSERT INTO employees (id, name, department, is_active, max_capacity_hours_week)
                VALUES (:id, :name, :department, :is_active, :capacity)
                ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    department = excluded.department,
                    is_active = excluded.is_active,
                    max_capacity_hours_week = excluded.max_capacity_hours_week
            "#,
            named_params! {
                ":id": employee.id,
                ":name": employee.name,
                ":department": employee.department,
                ":is_active": employee.is_active,
                ":capacity": employee.max_capacity_hours_week,
            },
        )?;

        Ok(())
    }

    pub fn set_capacity(conn: &Connection, id: &str, hours: f64) -> AppResult<()> {
        validate_capacity(hours)?;
        let updated = conn.execute(
            "UPDATE employees SET max_capacity_hours_week = ?1 WHERE id = ?2",
            (hours, id),
        )?;
        if updated == 0 {
            return Err(AppError::not_found(format!("Employee {id} not found")));
        }
        Ok(())
    }

    /// Weekly capacity of every active employee, optionally limited to one
    /// department. The department match is exact and case-sensitive.
    pub fn active_capacities(
        conn: &Connection,
        department: Option<&str>,
    ) -> AppResult<Vec<RawCapacityRecord>> {
        let mut stmt = conn.prepare(
            r#"
                SELECT id, COALESCE(max_capacity_hours_week, 0) AS capacity
                FROM employees
                WHERE is_active = 1
                  AND (:department IS NULL OR department = :department)
                ORDER BY id ASC
            "#,
        )?;

        let rows = stmt
            .query_map(named_params! {":department": department}, |row| {
                Ok(RawCapacityRecord {
                    subject_id: row.get("id")?,
                    weekly_capacity_hours: row.get("capacity")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}

fn validate_capacity(hours: f64) -> AppResult<()> {
    if !hours.is_finite() || hours < 0.0 {
        return Err(AppError::validation(format!(
            "weekly capacity must be a non-negative number, got {hours}"
        )));
    }
    Ok(())
}
