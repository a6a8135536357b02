use std::collections::{BTreeMap, HashMap};

use tracing::trace;

use crate::error::AppResult;
use crate::models::resource_analytics::{
    RawCapacityRecord, RawRecords, RawTimeEntry, WeeklyPoint, UNASSIGNED_PROJECT_ID,
    UNASSIGNED_PROJECT_NAME,
};
use crate::utils::iso_week::{WeekKey, WeekRange};

/// Planned and actual hours per week, split by project.
///
/// Projects are indexed by the position they are first seen at among the
/// entries that land on the axis. Week totals are summed in that index order,
/// so any view that walks the projects in the same order adds up to exactly
/// the same floating point totals.
#[derive(Debug, Clone, Default)]
pub struct ProjectBuckets {
    projects: Vec<(String, String)>,
    positions: HashMap<String, usize>,
    weeks: BTreeMap<WeekKey, Vec<(f64, f64)>>,
}

impl ProjectBuckets {
    /// Folds `entries` onto `axis`. Entries whose week is not on the axis are
    /// dropped.
    pub fn collect(axis: &[WeekKey], entries: &[RawTimeEntry]) -> Self {
        let mut buckets = Self {
            weeks: axis.iter().map(|week| (*week, Vec::new())).collect(),
            ..Self::default()
        };

        for entry in entries {
            if !buckets.weeks.contains_key(&entry.week_key) {
                trace!(
                    target: "app::analytics",
                    week = %entry.week_key,
                    "dropping entry outside range"
                );
                continue;
            }
            let index = buckets.position_or_insert(entry);
            if let Some(hours) = buckets.weeks.get_mut(&entry.week_key) {
                if hours.len() <= index {
                    hours.resize(index + 1, (0.0, 0.0));
                }
                hours[index].0 += entry.planned_hours;
                hours[index].1 += entry.actual_hours;
            }
        }

        buckets
    }

    fn position_or_insert(&mut self, entry: &RawTimeEntry) -> usize {
        let (project_id, project_name) = project_identity(entry);
        if let Some(index) = self.positions.get(&project_id) {
            return *index;
        }
        let index = self.projects.len();
        self.positions.insert(project_id.clone(), index);
        self.projects.push((project_id, project_name));
        index
    }

    /// `(id, name)` pairs in first-seen order.
    pub fn projects(&self) -> &[(String, String)] {
        &self.projects
    }

    pub fn position(&self, project_id: &str) -> Option<usize> {
        self.positions.get(project_id).copied()
    }

    /// Axis weeks, ascending.
    pub fn weeks(&self) -> impl Iterator<Item = &WeekKey> {
        self.weeks.keys()
    }

    /// Planned and actual hours of one project in one week.
    pub fn hours(&self, week: &WeekKey, index: usize) -> (f64, f64) {
        self.weeks
            .get(week)
            .and_then(|hours| hours.get(index))
            .copied()
            .unwrap_or((0.0, 0.0))
    }

    /// Planned and actual totals of one week, summed in project order.
    pub fn week_totals(&self, week: &WeekKey) -> (f64, f64) {
        (0..self.projects.len())
            .map(|index| self.hours(week, index))
            .fold((0.0, 0.0), |(planned, actual), (p, a)| (planned + p, actual + a))
    }
}

/// Entries without a project are grouped under a synthetic "Unassigned" one.
fn project_identity(entry: &RawTimeEntry) -> (String, String) {
    match &entry.project_id {
        Some(id) => {
            let name = entry.project_name.clone().unwrap_or_else(|| id.clone());
            (id.clone(), name)
        }
        None => (
            UNASSIGNED_PROJECT_ID.to_string(),
            UNASSIGNED_PROJECT_NAME.to_string(),
        ),
    }
}

/// Dense weekly series for `range`: one point per ISO week, ascending.
///
/// The buckets the series was summed from are returned alongside it so the
/// per-project view can be built from the same fold.
pub fn build_series(
    range: &WeekRange,
    records: &RawRecords,
) -> AppResult<(Vec<WeeklyPoint>, ProjectBuckets)> {
    let axis = range.weeks()?;
    let buckets = ProjectBuckets::collect(&axis, &records.entries);
    Ok((series_from_buckets(&records.capacities, &buckets), buckets))
}

/// One point per bucketed week, seeded with the summed capacity, so weeks
/// without entries still appear. Hours are [`ProjectBuckets::week_totals`].
pub fn series_from_buckets(
    capacities: &[RawCapacityRecord],
    buckets: &ProjectBuckets,
) -> Vec<WeeklyPoint> {
    let capacity = weekly_capacity(capacities);

    buckets
        .weeks()
        .map(|week| {
            let (planned, actual) = buckets.week_totals(week);
            WeeklyPoint {
                week: *week,
                capacity,
                planned,
                actual,
            }
        })
        .collect()
}

pub fn weekly_capacity(capacities: &[RawCapacityRecord]) -> f64 {
    capacities
        .iter()
        .map(|record| record.weekly_capacity_hours)
        .sum()
}
