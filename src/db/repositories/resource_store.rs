use uuid::Uuid;

use crate::db::repositories::employee_repository::EmployeeRepository;
use crate::db::repositories::project_repository::ProjectRepository;
use crate::db::repositories::settings_repository::SettingsRepository;
use crate::db::repositories::time_entry_repository::TimeEntryRepository;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::resource_analytics::{RawCapacityRecord, RawTimeEntry};
use crate::services::scope_resolver::ResourceDataSource;
use crate::utils::iso_week::WeekRange;

/// SQLite-backed [`ResourceDataSource`]. Every fetch runs on a read-only connection.
#[derive(Clone, Debug)]
pub struct SqliteResourceStore {
    db: DbPool,
}

impl SqliteResourceStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }
}

impl ResourceDataSource for SqliteResourceStore {
    fn fetch_department_capacities(
        &self,
        department: Option<&str>,
    ) -> AppResult<Vec<RawCapacityRecord>> {
        self.db
            .with_read_connection(|conn| EmployeeRepository::active_capacities(conn, department))
    }

    fn fetch_department_entries(
        &self,
        department: Option<&str>,
        range: &WeekRange,
    ) -> AppResult<Vec<RawTimeEntry>> {
        self.db.with_read_connection(|conn| {
            TimeEntryRepository::department_entries(conn, department, range)
        })
    }

    fn fetch_project_exists(&self, project_id: &Uuid) -> AppResult<bool> {
        self.db
            .with_read_connection(|conn| ProjectRepository::exists(conn, project_id))
    }

    fn fetch_project_members(&self, project_id: &Uuid) -> AppResult<Vec<RawCapacityRecord>> {
        self.db
            .with_read_connection(|conn| ProjectRepository::member_capacities(conn, project_id))
    }

    fn fetch_project_entries(
        &self,
        project_id: &Uuid,
        range: &WeekRange,
    ) -> AppResult<Vec<RawTimeEntry>> {
        self.db.with_read_connection(|conn| {
            TimeEntryRepository::project_entries(conn, project_id, range)
        })
    }

    fn fetch_baseline_hours_per_week(&self) -> AppResult<f64> {
        self.db
            .with_read_connection(|conn| SettingsRepository::baseline_hours_per_week(conn))
    }
}
