use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::resource_analytics::RawCapacityRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRow {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectMemberRow {
    pub id: String,
    pub project_id: String,
    pub employee_id: String,
    pub is_project_lead: bool,
}

impl TryFrom<&Row<'_>> for ProjectMemberRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.get("id")?,
            project_id: row.get("project_id")?,
            employee_id: row.get("employee_id")?,
            is_project_lead: row.get::<_, i64>("is_project_lead")? != 0,
        })
    }
}

pub struct ProjectRepository;

impl ProjectRepository {
    pub fn upsert(conn: &Connection, project: &ProjectRow) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO projects (id, name)
                VALUES (:id, :name)
                ON CONFLICT(id) DO UPDATE SET name = excluded.name
            "#,
            named_params! {":id": project.id, ":name": project.name},
        )?;
        Ok(())
    }

    pub fn exists(conn: &Connection, id: &Uuid) -> AppResult<bool> {
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM projects WHERE id = ?1",
                [id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Adds an employee to a project, returning the membership row. Re-adding
    /// an existing member returns the existing row.
    pub fn add_member(
        conn: &Connection,
        project_id: &str,
        employee_id: &str,
        is_project_lead: bool,
    ) -> AppResult<ProjectMemberRow> {
        conn.execute(
            r#"
                INSERT INTO project_members (id, project_id, employee_id, is_project_lead)
                VALUES (:id, :project_id, :employee_id, :is_project_lead)
                ON CONFLICT(project_id, employee_id) DO UPDATE SET
                    is_project_lead = excluded.is_project_lead
            "#,
            named_params! {
                ":id": Uuid::new_v4().to_string(),
                ":project_id": project_id,
                ":employee_id": employee_id,
                ":is_project_lead": is_project_lead,
            },
        )?;

        let member = conn.query_row(
            r#"
                SELECT id, project_id, employee_id, is_project_lead
                FROM project_members
                WHERE project_id = ?1 AND employee_id = ?2
            "#,
            [project_id, employee_id],
            |row| ProjectMemberRow::try_from(row),
        )?;

        Ok(member)
    }

    /// Personal weekly capacity of every member, one record per employee.
    pub fn member_capacities(
        conn: &Connection,
        project_id: &Uuid,
    ) -> AppResult<Vec<RawCapacityRecord>> {
        let mut stmt = conn.prepare(
            r#"
                SELECT DISTINCT e.id AS id, COALESCE(e.max_capacity_hours_week, 0) AS capacity
                FROM project_members pm
                JOIN employees e ON e.id = pm.employee_id
                WHERE pm.project_id = ?1
                ORDER BY e.id ASC
            "#,
        )?;

        let rows = stmt
            .query_map([project_id.to_string()], |row| {
                Ok(RawCapacityRecord {
                    subject_id: row.get("id")?,
                    weekly_capacity_hours: row.get("capacity")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}
