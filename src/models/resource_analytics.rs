use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::iso_week::{WeekKey, WeekRange};

/// Department id that selects every department at once.
pub const ALL_DEPARTMENTS: &str = "__ALL__";

/// Synthetic project that collects entries without a project reference.
pub const UNASSIGNED_PROJECT_ID: &str = "unassigned";
pub const UNASSIGNED_PROJECT_NAME: &str = "Unassigned";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ScopeType {
    Department,
    Project,
}

impl ScopeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeType::Department => "department",
            ScopeType::Project => "project",
        }
    }
}

impl fmt::Display for ScopeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ScopeType {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "department" => Ok(ScopeType::Department),
            "project" => Ok(ScopeType::Project),
            other => Err(format!("unsupported analytics scope: {other}")),
        }
    }
}

/// What an analytics request aggregates over.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnalyticsScope {
    Department { name: String },
    Project { id: Uuid },
}

impl AnalyticsScope {
    pub fn scope_type(&self) -> ScopeType {
        match self {
            AnalyticsScope::Department { .. } => ScopeType::Department,
            AnalyticsScope::Project { .. } => ScopeType::Project,
        }
    }

    pub fn id(&self) -> String {
        match self {
            AnalyticsScope::Department { name } => name.clone(),
            AnalyticsScope::Project { id } => id.to_string(),
        }
    }

    /// Department filter for storage queries; `None` means every department.
    pub fn department_filter(&self) -> Option<&str> {
        match self {
            AnalyticsScope::Department { name } if name == ALL_DEPARTMENTS => None,
            AnalyticsScope::Department { name } => Some(name.as_str()),
            AnalyticsScope::Project { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopeQuery {
    pub scope: AnalyticsScope,
    pub range: WeekRange,
}

/// Request contract as it arrives from a transport, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQueryParams {
    pub scope: String,
    pub scope_id: String,
    pub from_week: String,
    pub to_week: String,
}

impl AnalyticsQueryParams {
    pub fn new(
        scope: impl Into<String>,
        scope_id: impl Into<String>,
        from_week: impl Into<String>,
        to_week: impl Into<String>,
    ) -> Self {
        Self {
            scope: scope.into(),
            scope_id: scope_id.into(),
            from_week: from_week.into(),
            to_week: to_week.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawCapacityRecord {
    pub subject_id: String,
    pub weekly_capacity_hours: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawTimeEntry {
    pub subject_id: String,
    pub project_id: Option<String>,
    pub project_name: Option<String>,
    pub week_key: WeekKey,
    pub planned_hours: f64,
    pub actual_hours: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecords {
    pub capacities: Vec<RawCapacityRecord>,
    pub entries: Vec<RawTimeEntry>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyPoint {
    pub week: WeekKey,
    pub capacity: f64,
    pub planned: f64,
    pub actual: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_capacity: f64,
    pub total_planned: f64,
    pub total_actual: f64,
    pub average_capacity: f64,
    pub average_planned: f64,
    pub average_actual: f64,
    pub weeks: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTotals {
    pub project_id: String,
    pub project_name: String,
    pub planned: f64,
    pub actual: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectHours {
    pub project_id: String,
    pub project_name: String,
    pub hours: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StackedWeek {
    pub week: WeekKey,
    pub baseline: f64,
    pub planned_total: f64,
    pub actual_total: f64,
    pub planned: Vec<ProjectHours>,
    pub actual: Vec<ProjectHours>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct WeekSpan {
    pub start: WeekKey,
    pub end: WeekKey,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StackLegendEntry {
    pub project_id: String,
    pub project_name: String,
    pub color: String,
    pub planned: f64,
    pub actual: f64,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStack {
    pub series: Vec<StackedWeek>,
    pub legend: Vec<StackLegendEntry>,
    pub over_baseline_weeks: Vec<WeekKey>,
    pub over_baseline_ranges: Vec<WeekSpan>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsTotals {
    pub capacity: f64,
    pub planned: f64,
    pub actual: f64,
    pub baseline: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ScopeEcho {
    #[serde(rename = "type")]
    pub scope_type: ScopeType,
    pub id: String,
}

impl From<&AnalyticsScope> for ScopeEcho {
    fn from(scope: &AnalyticsScope) -> Self {
        Self {
            scope_type: scope.scope_type(),
            id: scope.id(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResult {
    pub scope: ScopeEcho,
    pub range: WeekRange,
    pub series: Vec<WeeklyPoint>,
    pub over_allocated_weeks: Vec<WeekKey>,
    pub summary: Summary,
    pub cumulative_series: Vec<WeeklyPoint>,
    pub project_breakdown: Vec<ProjectTotals>,
    pub project_stack: ProjectStack,
    pub totals: AnalyticsTotals,
    pub baseline_hours_week: f64,
    pub baseline_total_hours: f64,
    pub latest_point: Option<WeeklyPoint>,
    pub has_data: bool,
    pub has_over_allocation: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StackVariant {
    Planned,
    Actual,
}

impl StackVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            StackVariant::Planned => "planned",
            StackVariant::Actual => "actual",
        }
    }

    /// Row key holding this variant's hours for `project_id`.
    pub fn data_key(&self, project_id: &str) -> String {
        format!("{}_{}", self.as_str(), project_id)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StackAreaConfig {
    pub data_key: String,
    pub project_id: String,
    pub project_name: String,
    pub color: String,
    pub variant: StackVariant,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChartRow {
    pub week: WeekKey,
    pub planned_total: f64,
    pub actual_total: f64,
    pub over_baseline: bool,
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStackChartConfig {
    pub data: Vec<ChartRow>,
    pub planned_areas: Vec<StackAreaConfig>,
    pub actual_areas: Vec<StackAreaConfig>,
    pub legend_entries: Vec<StackLegendEntry>,
    pub over_baseline_weeks: Vec<WeekKey>,
    pub over_baseline_ranges: Vec<WeekSpan>,
}
