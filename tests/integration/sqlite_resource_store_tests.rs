mod support;

use resource_analytics_lib::db::repositories::employee_repository::EmployeeRepository;
use resource_analytics_lib::db::repositories::project_repository::ProjectRepository;
use resource_analytics_lib::db::repositories::resource_store::SqliteResourceStore;
use resource_analytics_lib::db::repositories::settings_repository::SettingsRepository;
use resource_analytics_lib::db::migrations::KEY_PMO_BASELINE_HOURS_WEEK;
use resource_analytics_lib::error::AppError;
use resource_analytics_lib::services::scope_resolver::ResourceDataSource;
use resource_analytics_lib::utils::iso_week::WeekRange;
use uuid::Uuid;

use support::{ALPHA, BETA, PROJECT_ALPHA, UNKNOWN_PROJECT};

fn range(from: &str, to: &str) -> WeekRange {
    WeekRange::parse(from, to).expect("range")
}

fn uuid(value: &str) -> Uuid {
    Uuid::parse_str(value).expect("uuid")
}

#[test]
fn department_capacities_skip_inactive_and_other_departments() {
    let (_dir, pool) = support::open_pool();
    support::seed_engineering(&pool);
    let store = SqliteResourceStore::new(pool);

    let engineering = store
        .fetch_department_capacities(Some("Engineering"))
        .expect("capacities");
    let mut ids: Vec<&str> = engineering.iter().map(|r| r.subject_id.as_str()).collect();
    ids.sort();
    assert_eq!(ids, vec!["emp-1", "emp-2", "emp-3"]);
    let total: f64 = engineering.iter().map(|r| r.weekly_capacity_hours).sum();
    assert_eq!(total, 112.5);

    let everyone = store.fetch_department_capacities(None).expect("capacities");
    assert_eq!(everyone.len(), 4);

    let nobody = store
        .fetch_department_capacities(Some("Marketing"))
        .expect("capacities");
    assert!(nobody.is_empty());
}

#[test]
fn department_entries_are_limited_to_range_and_active_staff() {
    let (_dir, pool) = support::open_pool();
    support::seed_engineering(&pool);
    let store = SqliteResourceStore::new(pool);

    let entries = store
        .fetch_department_entries(Some("Engineering"), &range("2025-W02", "2025-W02"))
        .expect("entries");
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|e| e.week_key.to_string() == "2025-W02"));
    assert!(entries.iter().all(|e| e.subject_id != "emp-5"));

    let first = &entries[0];
    assert_eq!(first.project_id.as_deref(), Some(ALPHA));
    assert_eq!(first.project_name.as_deref(), Some("Alpha"));
    assert!(entries.iter().any(|e| e.project_id.as_deref() == Some(BETA)));
}

#[test]
fn project_queries_report_membership_and_entries() {
    let (_dir, pool) = support::open_pool();
    support::seed_project_alpha(&pool);
    let store = SqliteResourceStore::new(pool.clone());
    let project = uuid(PROJECT_ALPHA);

    assert!(store.fetch_project_exists(&project).expect("exists"));
    assert!(!store.fetch_project_exists(&uuid(UNKNOWN_PROJECT)).expect("exists"));

    // Re-adding a member keeps one membership row.
    pool.with_connection(|conn| {
        ProjectRepository::add_member(conn, PROJECT_ALPHA, "member-1", true)?;
        Ok(())
    })
    .expect("re-add member");

    let members = store.fetch_project_members(&project).expect("members");
    assert_eq!(members.len(), 2);

    let entries = store
        .fetch_project_entries(&project, &range("2025-W52", "2026-W02"))
        .expect("entries");
    assert_eq!(entries.len(), 6);
    assert_eq!(entries[0].week_key.to_string(), "2025-W52");
    assert_eq!(entries[5].week_key.to_string(), "2026-W02");
}

#[test]
fn rebooking_a_week_replaces_the_hours() {
    let (_dir, pool) = support::open_pool();
    support::seed_project_alpha(&pool);
    support::book(&pool, PROJECT_ALPHA, "member-1", "2026-W01", 5.0, 6.0);
    let store = SqliteResourceStore::new(pool);

    let entries = store
        .fetch_project_entries(&uuid(PROJECT_ALPHA), &range("2026-W01", "2026-W01"))
        .expect("entries");
    let member_one: Vec<(f64, f64)> = entries
        .iter()
        .filter(|e| e.subject_id == "member-1")
        .map(|e| (e.planned_hours, e.actual_hours))
        .collect();
    assert_eq!(member_one, vec![(5.0, 6.0)]);
}

#[test]
fn malformed_week_keys_in_storage_are_skipped() {
    let (_dir, pool) = support::open_pool();
    support::seed_project_alpha(&pool);
    pool.with_connection(|conn| {
        conn.execute(
            "UPDATE project_member_time_entries \
             SET week_key = '2026-W1' WHERE week_key = '2026-W03'",
            [],
        )?;
        Ok(())
    })
    .expect("corrupt week key");
    let store = SqliteResourceStore::new(pool);

    // '2026-W1' sorts inside the range lexically but is not a valid key.
    let entries = store
        .fetch_project_entries(&uuid(PROJECT_ALPHA), &range("2025-W52", "2026-W52"))
        .expect("entries");
    assert_eq!(entries.len(), 6);
}

#[test]
fn baseline_falls_back_to_zero_for_unusable_values() {
    let (_dir, pool) = support::open_pool();
    let store = SqliteResourceStore::new(pool.clone());
    assert_eq!(store.fetch_baseline_hours_per_week().expect("baseline"), 0.0);

    support::set_baseline(&pool, 37.5);
    assert_eq!(store.fetch_baseline_hours_per_week().expect("baseline"), 37.5);

    pool.with_connection(|conn| {
        SettingsRepository::upsert(conn, KEY_PMO_BASELINE_HOURS_WEEK, "lots")
    })
    .expect("overwrite baseline");
    assert_eq!(store.fetch_baseline_hours_per_week().expect("baseline"), 0.0);

    pool.with_connection(|conn| SettingsRepository::upsert(conn, KEY_PMO_BASELINE_HOURS_WEEK, "-4"))
        .expect("overwrite baseline");
    assert_eq!(store.fetch_baseline_hours_per_week().expect("baseline"), 0.0);
}

#[test]
fn negative_hours_and_capacity_are_rejected() {
    let (_dir, pool) = support::open_pool();
    support::seed_project_alpha(&pool);

    let result =
        pool.with_connection(|conn| EmployeeRepository::set_capacity(conn, "member-1", -1.0));
    assert!(matches!(result, Err(AppError::Validation { .. })));

    let result = pool.with_connection(|conn| EmployeeRepository::set_capacity(conn, "ghost", 10.0));
    assert!(matches!(result, Err(AppError::NotFound { .. })));

    let result = pool.with_connection(|conn| {
        SettingsRepository::set_baseline_hours_per_week(conn, -5.0)
    });
    assert!(matches!(result, Err(AppError::Validation { .. })));
}
