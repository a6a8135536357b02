mod support;

use chrono::{Duration, Utc};
use resource_analytics_lib::models::resource_analytics::AnalyticsQueryParams;
use resource_analytics_lib::models::settings::{AnalyticsSettings, OverAllocationRule};
use resource_analytics_lib::services::project_stack::{build_chart_config, STACKED_PROJECT_COLORS};
use resource_analytics_lib::services::resource_analytics_service::ExportFormat;
use resource_analytics_lib::utils::iso_week::WeekKey;

use support::{ALPHA, BETA, PROJECT_ALPHA};

fn week(value: &str) -> WeekKey {
    WeekKey::parse(value).expect("week key")
}

#[test]
fn engineering_department_end_to_end() {
    let (_dir, pool) = support::open_pool();
    support::seed_engineering(&pool);
    let service = support::service(&pool, AnalyticsSettings::default());

    let result = service
        .fetch(&AnalyticsQueryParams::new(
            "department",
            "Engineering",
            "2025-W01",
            "2025-W03",
        ))
        .expect("analytics");

    let weeks: Vec<String> = result.series.iter().map(|p| p.week.to_string()).collect();
    assert_eq!(weeks, vec!["2025-W01", "2025-W02", "2025-W03"]);
    assert!(result.series.iter().all(|p| p.capacity == 112.5));
    assert_eq!((result.series[0].planned, result.series[0].actual), (90.0, 84.0));
    assert_eq!((result.series[1].planned, result.series[1].actual), (130.0, 120.0));
    assert_eq!((result.series[2].planned, result.series[2].actual), (0.0, 0.0));

    assert_eq!(result.over_allocated_weeks, vec![week("2025-W02")]);
    assert!(result.has_over_allocation);
    assert!(result.has_data);

    assert_eq!(result.summary.total_planned, 220.0);
    assert_eq!(result.summary.total_actual, 204.0);
    assert_eq!(result.cumulative_series[2].planned, 220.0);

    let breakdown: Vec<(&str, f64, f64)> = result
        .project_breakdown
        .iter()
        .map(|p| (p.project_id.as_str(), p.planned, p.actual))
        .collect();
    assert_eq!(breakdown, vec![(ALPHA, 140.0, 132.0), (BETA, 80.0, 72.0)]);

    assert_eq!(result.baseline_hours_week, 100.0);
    assert_eq!(result.baseline_total_hours, 300.0);
    assert_eq!(result.project_stack.over_baseline_weeks, vec![week("2025-W02")]);
    assert_eq!(result.project_stack.legend[0].color, STACKED_PROJECT_COLORS[0]);
    assert_eq!(result.project_stack.legend[1].color, STACKED_PROJECT_COLORS[1]);

    for (stacked, flat) in result.project_stack.series.iter().zip(&result.series) {
        let planned: f64 = stacked.planned.iter().map(|p| p.hours).sum();
        let actual: f64 = stacked.actual.iter().map(|p| p.hours).sum();
        assert!((planned - flat.planned).abs() < 1e-6);
        assert!((actual - flat.actual).abs() < 1e-6);
    }
}

#[test]
fn all_departments_include_every_active_employee() {
    let (_dir, pool) = support::open_pool();
    support::seed_engineering(&pool);
    let service = support::service(&pool, AnalyticsSettings::default());

    let result = service
        .fetch(&AnalyticsQueryParams::new("department", "__ALL__", "2025-W01", "2025-W01"))
        .expect("analytics");

    assert_eq!(result.series[0].capacity, 152.5);
    assert_eq!(result.series[0].planned, 100.0);
    assert_eq!(result.scope.id, "__ALL__");
}

#[test]
fn project_scope_crosses_the_iso_year_boundary() {
    let (_dir, pool) = support::open_pool();
    support::seed_project_alpha(&pool);
    let service = support::service(&pool, AnalyticsSettings::default());

    let result = service
        .fetch(&AnalyticsQueryParams::new("project", PROJECT_ALPHA, "2025-W52", "2026-W02"))
        .expect("analytics");

    let weeks: Vec<String> = result.series.iter().map(|p| p.week.to_string()).collect();
    assert_eq!(weeks, vec!["2025-W52", "2026-W01", "2026-W02"]);
    assert!(result.series.iter().all(|p| p.capacity == 70.0));
    assert_eq!(result.series[1].actual, 92.0);
    assert_eq!(result.over_allocated_weeks, vec![week("2026-W01")]);

    assert_eq!(result.project_breakdown.len(), 1);
    assert_eq!(result.project_breakdown[0].planned, 180.0);
    assert!(result.project_stack.over_baseline_weeks.is_empty());
    assert_eq!(result.range.to_week, week("2026-W02"));
}

#[test]
fn planned_rule_flags_planned_overruns_too() {
    let (_dir, pool) = support::open_pool();
    support::seed_engineering(&pool);
    support::add_employee(&pool, "emp-6", "Ops", true, 10.0);
    support::book(&pool, ALPHA, "emp-6", "2025-W05", 12.0, 9.0);

    let params = AnalyticsQueryParams::new("department", "Ops", "2025-W05", "2025-W05");

    let default_rule = support::service(&pool, AnalyticsSettings::default());
    assert!(default_rule.fetch(&params).expect("analytics").over_allocated_weeks.is_empty());

    let settings = AnalyticsSettings {
        over_allocation_rule: OverAllocationRule::PlannedOrActual,
        ..AnalyticsSettings::default()
    };
    let planned_rule = support::service(&pool, settings);
    assert_eq!(
        planned_rule.fetch(&params).expect("analytics").over_allocated_weeks,
        vec![week("2025-W05")]
    );
}

#[test]
fn cache_serves_stale_data_until_ttl_expires() {
    let (_dir, pool) = support::open_pool();
    support::seed_engineering(&pool);
    let settings = AnalyticsSettings {
        cache_ttl_seconds: 30,
        ..AnalyticsSettings::default()
    };
    let service = support::service(&pool, settings);
    let params = AnalyticsQueryParams::new("department", "Engineering", "2025-W03", "2025-W03");
    let now = Utc::now();

    let first = service.fetch_at(&params, now).expect("analytics");
    assert_eq!(first.series[0].planned, 0.0);

    support::book(&pool, ALPHA, "emp-3", "2025-W03", 20.0, 18.0);

    let cached = service
        .fetch_at(&params, now + Duration::seconds(10))
        .expect("analytics");
    assert_eq!(cached, first);

    let refreshed = service
        .fetch_at(&params, now + Duration::seconds(31))
        .expect("analytics");
    assert_eq!(refreshed.series[0].planned, 20.0);
    assert_eq!(service.cached_entries(), 1);
}

#[test]
fn export_writes_csv_and_json_reports() {
    let (dir, pool) = support::open_pool();
    support::seed_engineering(&pool);
    let reports = dir.path().join("reports");
    let service = support::service(&pool, AnalyticsSettings::default()).with_reports_dir(&reports);
    let params = AnalyticsQueryParams::new("department", "Engineering", "2025-W01", "2025-W03");

    let csv = service.export(&params, ExportFormat::Csv).expect("csv export");
    assert_eq!(csv.weeks, 3);
    assert!(csv.file_path.starts_with(&reports));
    let content = std::fs::read_to_string(&csv.file_path).expect("csv file");
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(
        lines[0],
        "scope_type,scope_id,from_week,to_week,week,capacity,planned,actual"
    );
    assert_eq!(
        lines[2],
        "department,Engineering,2025-W01,2025-W03,2025-W02,112.5,130,120"
    );

    let json = service.export(&params, ExportFormat::Json).expect("json export");
    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json.file_path).expect("json file"))
            .expect("json");
    assert_eq!(value["range"]["fromWeek"], "2025-W01");
    assert_eq!(value["scope"]["type"], "department");
    assert_eq!(value["overAllocatedWeeks"][0], "2025-W02");
}

#[test]
fn chart_config_has_an_area_per_project_and_variant() {
    let (_dir, pool) = support::open_pool();
    support::seed_engineering(&pool);
    let service = support::service(&pool, AnalyticsSettings::default());

    let result = service
        .fetch(&AnalyticsQueryParams::new("department", "Engineering", "2025-W01", "2025-W03"))
        .expect("analytics");
    let chart = build_chart_config(
        &result.project_stack.series,
        &result.project_breakdown,
        result.baseline_hours_week,
    );

    assert_eq!(chart.data.len(), 3);
    assert_eq!(chart.planned_areas.len(), 2);
    assert_eq!(chart.actual_areas.len(), 2);
    assert_eq!(chart.data[2].values.len(), 4);
    assert!(chart.data[2].values.values().all(|hours| *hours == 0.0));
    assert_eq!(chart.over_baseline_ranges.len(), 1);
}
