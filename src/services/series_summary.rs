use crate::models::resource_analytics::{AnalyticsTotals, Summary, WeeklyPoint};

pub fn summarize(series: &[WeeklyPoint]) -> Summary {
    let weeks = series.len();
    if weeks == 0 {
        return Summary::default();
    }

    let (total_capacity, total_planned, total_actual) =
        series.iter().fold((0.0, 0.0, 0.0), |(capacity, planned, actual), point| {
            (
                capacity + point.capacity,
                planned + point.planned,
                actual + point.actual,
            )
        });
    let divisor = weeks as f64;

    Summary {
        total_capacity,
        total_planned,
        total_actual,
        average_capacity: total_capacity / divisor,
        average_planned: total_planned / divisor,
        average_actual: total_actual / divisor,
        weeks,
    }
}

/// Running totals over the same week axis as `series`.
pub fn cumulative(series: &[WeeklyPoint]) -> Vec<WeeklyPoint> {
    series
        .iter()
        .scan((0.0, 0.0, 0.0), |(capacity, planned, actual), point| {
            *capacity += point.capacity;
            *planned += point.planned;
            *actual += point.actual;
            Some(WeeklyPoint {
                week: point.week,
                capacity: *capacity,
                planned: *planned,
                actual: *actual,
            })
        })
        .collect()
}

pub fn baseline_total(baseline_hours_week: f64, weeks: usize) -> f64 {
    baseline_hours_week * weeks as f64
}

pub fn totals(series: &[WeeklyPoint], baseline_hours_week: f64) -> AnalyticsTotals {
    let summary = summarize(series);
    AnalyticsTotals {
        capacity: summary.total_capacity,
        planned: summary.total_planned,
        actual: summary.total_actual,
        baseline: baseline_total(baseline_hours_week, series.len()),
    }
}

/// Last week of the series, if any.
pub fn latest_point(series: &[WeeklyPoint]) -> Option<WeeklyPoint> {
    series.last().copied()
}

pub fn has_data(series: &[WeeklyPoint]) -> bool {
    !series.is_empty()
}
