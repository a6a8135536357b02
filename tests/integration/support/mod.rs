#![allow(dead_code)]

use std::sync::Arc;

use resource_analytics_lib::db::repositories::employee_repository::{
    EmployeeRepository, EmployeeRow,
};
use resource_analytics_lib::db::repositories::project_repository::{
    ProjectRepository, ProjectRow,
};
use resource_analytics_lib::db::repositories::resource_store::SqliteResourceStore;
use resource_analytics_lib::db::repositories::settings_repository::SettingsRepository;
use resource_analytics_lib::db::repositories::time_entry_repository::TimeEntryRepository;
use resource_analytics_lib::db::DbPool;
use resource_analytics_lib::models::settings::AnalyticsSettings;
use resource_analytics_lib::services::resource_analytics_service::ResourceAnalyticsService;
use resource_analytics_lib::utils::iso_week::WeekKey;
use tempfile::TempDir;

pub const ALPHA: &str = "5ac7b3f2-318e-40ff-9c3a-aaaaaaaaaaaa";
pub const BETA: &str = "5ac7b3f2-318e-40ff-9c3a-bbbbbbbbbbbb";
pub const PROJECT_ALPHA: &str = "5ac7b3f2-318e-40ff-9c3a-222222222222";
pub const UNKNOWN_PROJECT: &str = "5ac7b3f2-318e-40ff-9c3a-999999999999";

pub fn open_pool() -> (TempDir, DbPool) {
    let dir = tempfile::tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("resource-analytics.sqlite")).expect("db pool");
    (dir, pool)
}

pub fn service(pool: &DbPool, settings: AnalyticsSettings) -> ResourceAnalyticsService {
    ResourceAnalyticsService::new(Arc::new(SqliteResourceStore::new(pool.clone())), settings)
}

pub fn add_employee(pool: &DbPool, id: &str, department: &str, active: bool, capacity: f64) {
    pool.with_connection(|conn| {
        EmployeeRepository::upsert(
            conn,
            &EmployeeRow {
                id: id.to_string(),
                name: format!("Employee {id}"),
                department: Some(department.to_string()),
                is_active: active,
                max_capacity_hours_week: capacity,
            },
        )
    })
    .expect("insert employee");
}

pub fn add_project(pool: &DbPool, id: &str, name: &str) {
    pool.with_connection(|conn| {
        ProjectRepository::upsert(
            conn,
            &ProjectRow {
                id: id.to_string(),
                name: name.to_string(),
            },
        )
    })
    .expect("insert project");
}

/// Books hours for `employee` on `project`, creating the membership if needed.
pub fn book(pool: &DbPool, project: &str, employee: &str, week: &str, planned: f64, actual: f64) {
    pool.with_transaction(|tx| {
        let member = ProjectRepository::add_member(tx, project, employee, false)?;
        let week = WeekKey::parse(week)?;
        TimeEntryRepository::upsert(tx, &member.id, &week, planned, actual)
    })
    .expect("book hours");
}

pub fn set_baseline(pool: &DbPool, hours: f64) {
    pool.with_connection(|conn| SettingsRepository::set_baseline_hours_per_week(conn, hours))
        .expect("set baseline");
}

/// Engineering: 37.5 + 30 + 45 = 112.5 h/week of active capacity. A Sales
/// employee and an inactive engineer also book hours that must not count.
pub fn seed_engineering(pool: &DbPool) {
    add_employee(pool, "emp-1", "Engineering", true, 37.5);
    add_employee(pool, "emp-2", "Engineering", true, 30.0);
    add_employee(pool, "emp-3", "Engineering", true, 45.0);
    add_employee(pool, "emp-4", "Sales", true, 40.0);
    add_employee(pool, "emp-5", "Engineering", false, 20.0);
    add_project(pool, ALPHA, "Alpha");
    add_project(pool, BETA, "Beta");

    book(pool, ALPHA, "emp-1", "2025-W01", 50.0, 48.0);
    book(pool, BETA, "emp-2", "2025-W01", 40.0, 36.0);
    book(pool, ALPHA, "emp-1", "2025-W02", 50.0, 44.0);
    book(pool, ALPHA, "emp-2", "2025-W02", 40.0, 40.0);
    book(pool, BETA, "emp-2", "2025-W02", 40.0, 36.0);
    book(pool, ALPHA, "emp-4", "2025-W01", 10.0, 10.0);
    book(pool, BETA, "emp-5", "2025-W02", 8.0, 8.0);

    set_baseline(pool, 100.0);
}

/// A two-member project (37.5 + 32.5 = 70 h/week) booking across the
/// 2025/2026 ISO year boundary.
pub fn seed_project_alpha(pool: &DbPool) {
    add_employee(pool, "member-1", "Engineering", true, 37.5);
    add_employee(pool, "member-2", "Design", true, 32.5);
    add_project(pool, PROJECT_ALPHA, "Alpha");

    book(pool, PROJECT_ALPHA, "member-1", "2025-W52", 30.0, 28.0);
    book(pool, PROJECT_ALPHA, "member-2", "2025-W52", 30.0, 30.0);
    book(pool, PROJECT_ALPHA, "member-1", "2026-W01", 45.0, 50.0);
    book(pool, PROJECT_ALPHA, "member-2", "2026-W01", 35.0, 42.0);
    book(pool, PROJECT_ALPHA, "member-1", "2026-W02", 20.0, 18.0);
    book(pool, PROJECT_ALPHA, "member-2", "2026-W02", 20.0, 18.0);
    book(pool, PROJECT_ALPHA, "member-1", "2026-W03", 10.0, 10.0);
}
