use std::collections::HashSet;

use crate::models::resource_analytics::WeeklyPoint;
use crate::models::settings::OverAllocationRule;
use crate::utils::iso_week::WeekKey;

/// Over-allocated weeks in series order, with constant-time membership checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverAllocation {
    weeks: Vec<WeekKey>,
    lookup: HashSet<WeekKey>,
}

impl OverAllocation {
    pub fn weeks(&self) -> &[WeekKey] {
        &self.weeks
    }

    pub fn contains(&self, week: &WeekKey) -> bool {
        self.lookup.contains(week)
    }

    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }

    pub fn into_weeks(self) -> Vec<WeekKey> {
        self.weeks
    }
}

/// Strict comparison: hours equal to capacity are not over-allocated.
pub fn is_over_allocated(point: &WeeklyPoint, rule: OverAllocationRule) -> bool {
    match rule {
        OverAllocationRule::Actual => point.actual > point.capacity,
        OverAllocationRule::PlannedOrActual => {
            point.planned > point.capacity || point.actual > point.capacity
        }
    }
}

pub fn detect(series: &[WeeklyPoint], rule: OverAllocationRule) -> OverAllocation {
    let weeks: Vec<WeekKey> = series
        .iter()
        .filter(|point| is_over_allocated(point, rule))
        .map(|point| point.week)
        .collect();
    let lookup = weeks.iter().copied().collect();

    OverAllocation { weeks, lookup }
}
