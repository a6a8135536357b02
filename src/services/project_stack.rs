//! Per-project decomposition of the weekly series.
//!
//! Every stacked week reconciles with the flat series: the per-project hours
//! of a week add up to that week's planned and actual totals. Entries without
//! a project are stacked under a synthetic "Unassigned" project so that the
//! identity holds for every scope.

use std::collections::{BTreeMap, HashMap};

use crate::models::resource_analytics::{
    ChartRow, ProjectHours, ProjectStack, ProjectStackChartConfig, ProjectTotals,
    StackAreaConfig, StackLegendEntry, StackVariant, StackedWeek, WeekSpan, WeeklyPoint,
};
use crate::services::weekly_aggregator::ProjectBuckets;
use crate::utils::iso_week::WeekKey;

pub const STACKED_PROJECT_COLORS: [&str; 9] = [
    "#2563eb", "#9333ea", "#dc2626", "#16a34a", "#f97316", "#0ea5e9", "#6366f1", "#facc15",
    "#db2777",
];

/// Planned and actual sums per bucketed project over every axis week, in
/// first-seen order.
pub fn project_totals(buckets: &ProjectBuckets) -> Vec<ProjectTotals> {
    buckets
        .projects()
        .iter()
        .enumerate()
        .map(|(index, (project_id, project_name))| {
            let (planned, actual) = buckets
                .weeks()
                .map(|week| buckets.hours(week, index))
                .fold((0.0, 0.0), |(planned, actual), (p, a)| (planned + p, actual + a));
            ProjectTotals {
                project_id: project_id.clone(),
                project_name: project_name.clone(),
                planned,
                actual,
            }
        })
        .collect()
}

/// Palette colour per project id, by position in `totals`, wrapping around.
pub fn assign_stack_colors(totals: &[ProjectTotals]) -> HashMap<String, &'static str> {
    totals
        .iter()
        .enumerate()
        .map(|(index, project)| {
            (
                project.project_id.clone(),
                STACKED_PROJECT_COLORS[index % STACKED_PROJECT_COLORS.len()],
            )
        })
        .collect()
}

/// One stacked week per point of `series`.
///
/// `series` and `totals` must both come from `buckets`. Projects are walked in
/// `totals` order, which is the order the week totals were summed in, so the
/// listed hours of a week add up to its totals exactly.
pub fn build_stacked_series(
    series: &[WeeklyPoint],
    totals: &[ProjectTotals],
    buckets: &ProjectBuckets,
    baseline: f64,
) -> Vec<StackedWeek> {
    let indexed: Vec<(&ProjectTotals, Option<usize>)> = totals
        .iter()
        .map(|project| (project, buckets.position(&project.project_id)))
        .collect();

    series
        .iter()
        .map(|point| {
            let hours_for = |index: Option<usize>| {
                index
                    .map(|index| buckets.hours(&point.week, index))
                    .unwrap_or((0.0, 0.0))
            };
            let stack = |pick: fn((f64, f64)) -> f64| -> Vec<ProjectHours> {
                indexed
                    .iter()
                    .filter_map(|(project, index)| {
                        let hours = pick(hours_for(*index));
                        (hours != 0.0).then(|| ProjectHours {
                            project_id: project.project_id.clone(),
                            project_name: project.project_name.clone(),
                            hours,
                        })
                    })
                    .collect()
            };

            StackedWeek {
                week: point.week,
                baseline,
                planned_total: point.planned,
                actual_total: point.actual,
                planned: stack(|(planned, _)| planned),
                actual: stack(|(_, actual)| actual),
            }
        })
        .collect()
}

/// Weeks whose actual total exceeds a positive baseline.
pub fn over_baseline_weeks(stacked: &[StackedWeek], baseline: f64) -> Vec<WeekKey> {
    if baseline <= 0.0 {
        return Vec::new();
    }
    stacked
        .iter()
        .filter(|week| week.actual_total > baseline)
        .map(|week| week.week)
        .collect()
}

/// Collapses ascending weeks into spans of consecutive ISO weeks.
pub fn compress_ranges(weeks: &[WeekKey]) -> Vec<WeekSpan> {
    let mut spans: Vec<WeekSpan> = Vec::new();
    for week in weeks {
        match spans.last_mut() {
            Some(span) if span.end.next() == Some(*week) => span.end = *week,
            _ => spans.push(WeekSpan {
                start: *week,
                end: *week,
            }),
        }
    }
    spans
}

pub fn legend(totals: &[ProjectTotals]) -> Vec<StackLegendEntry> {
    let colors = assign_stack_colors(totals);
    totals
        .iter()
        .map(|project| StackLegendEntry {
            project_id: project.project_id.clone(),
            project_name: project.project_name.clone(),
            color: color_for(&colors, &project.project_id),
            planned: project.planned,
            actual: project.actual,
        })
        .collect()
}

fn color_for(colors: &HashMap<String, &'static str>, project_id: &str) -> String {
    colors
        .get(project_id)
        .copied()
        .unwrap_or(STACKED_PROJECT_COLORS[0])
        .to_string()
}

/// Project breakdown and stacked view for one bucketed series.
pub fn build_project_stack(
    series: &[WeeklyPoint],
    buckets: &ProjectBuckets,
    baseline: f64,
) -> (Vec<ProjectTotals>, ProjectStack) {
    let totals = project_totals(buckets);
    let stacked = build_stacked_series(series, &totals, buckets, baseline);
    let over_baseline = over_baseline_weeks(&stacked, baseline);

    let stack = ProjectStack {
        legend: legend(&totals),
        over_baseline_ranges: compress_ranges(&over_baseline),
        over_baseline_weeks: over_baseline,
        series: stacked,
    };

    (totals, stack)
}

/// Chart rows and area descriptors for a stacked area chart.
///
/// Every row carries a `planned_<id>` and `actual_<id>` value for every
/// project, zero when the project has no hours that week.
pub fn build_chart_config(
    stacked: &[StackedWeek],
    totals: &[ProjectTotals],
    baseline: f64,
) -> ProjectStackChartConfig {
    if stacked.is_empty() || totals.is_empty() {
        return ProjectStackChartConfig::default();
    }

    let colors = assign_stack_colors(totals);
    let areas = |variant: StackVariant| -> Vec<StackAreaConfig> {
        totals
            .iter()
            .map(|project| StackAreaConfig {
                data_key: variant.data_key(&project.project_id),
                project_id: project.project_id.clone(),
                project_name: project.project_name.clone(),
                color: color_for(&colors, &project.project_id),
                variant,
            })
            .collect()
    };

    let data: Vec<ChartRow> = stacked
        .iter()
        .map(|week| {
            let mut values: BTreeMap<String, f64> = totals
                .iter()
                .flat_map(|project| {
                    [
                        (StackVariant::Planned.data_key(&project.project_id), 0.0),
                        (StackVariant::Actual.data_key(&project.project_id), 0.0),
                    ]
                })
                .collect();
            for project in &week.planned {
                values.insert(StackVariant::Planned.data_key(&project.project_id), project.hours);
            }
            for project in &week.actual {
                values.insert(StackVariant::Actual.data_key(&project.project_id), project.hours);
            }

            ChartRow {
                week: week.week,
                planned_total: week.planned_total,
                actual_total: week.actual_total,
                over_baseline: baseline > 0.0 && week.actual_total > baseline,
                values,
            }
        })
        .collect();

    let over_baseline = over_baseline_weeks(stacked, baseline);

    ProjectStackChartConfig {
        data,
        planned_areas: areas(StackVariant::Planned),
        actual_areas: areas(StackVariant::Actual),
        legend_entries: legend(totals),
        over_baseline_ranges: compress_ranges(&over_baseline),
        over_baseline_weeks: over_baseline,
    }
}
