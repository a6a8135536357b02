use std::collections::HashSet;

use tracing::debug;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::resource_analytics::{
    AnalyticsQueryParams, AnalyticsScope, RawCapacityRecord, RawRecords, RawTimeEntry,
    ScopeQuery, ScopeType,
};
use crate::utils::iso_week::WeekRange;

/// Read-only access to the records analytics are computed from.
///
/// A `None` department means every department.
pub trait ResourceDataSource: Send + Sync {
    fn fetch_department_capacities(
        &self,
        department: Option<&str>,
    ) -> AppResult<Vec<RawCapacityRecord>>;

    fn fetch_department_entries(
        &self,
        department: Option<&str>,
        range: &WeekRange,
    ) -> AppResult<Vec<RawTimeEntry>>;

    fn fetch_project_exists(&self, project_id: &Uuid) -> AppResult<bool>;

    fn fetch_project_members(&self, project_id: &Uuid) -> AppResult<Vec<RawCapacityRecord>>;

    fn fetch_project_entries(
        &self,
        project_id: &Uuid,
        range: &WeekRange,
    ) -> AppResult<Vec<RawTimeEntry>>;

    fn fetch_baseline_hours_per_week(&self) -> AppResult<f64>;
}

/// Validates raw request parameters. The range is checked first, then the
/// scope type, then the scope id.
pub fn parse_query(params: &AnalyticsQueryParams) -> AppResult<ScopeQuery> {
    let range = WeekRange::parse(params.from_week.trim(), params.to_week.trim())?;

    let scope_type = ScopeType::try_from(params.scope.trim()).map_err(AppError::invalid_scope)?;

    let scope_id = params.scope_id.trim();
    if scope_id.is_empty() {
        return Err(AppError::invalid_scope("scopeId must be provided."));
    }

    let scope = match scope_type {
        ScopeType::Department => AnalyticsScope::Department {
            name: scope_id.to_string(),
        },
        ScopeType::Project => {
            let id = Uuid::parse_str(scope_id).map_err(|_| {
                AppError::invalid_scope("scopeId must be a valid UUID for project scope.")
            })?;
            AnalyticsScope::Project { id }
        }
    };

    Ok(ScopeQuery { scope, range })
}

/// Loads the capacities and time entries a query covers.
pub fn resolve(source: &dyn ResourceDataSource, query: &ScopeQuery) -> AppResult<RawRecords> {
    let records = match &query.scope {
        AnalyticsScope::Department { .. } => {
            let department = query.scope.department_filter();
            RawRecords {
                capacities: dedupe_subjects(source.fetch_department_capacities(department)?),
                entries: source.fetch_department_entries(department, &query.range)?,
            }
        }
        AnalyticsScope::Project { id } => {
            if !source.fetch_project_exists(id)? {
                return Err(AppError::not_found(format!("Project {id} not found")));
            }
            RawRecords {
                capacities: dedupe_subjects(source.fetch_project_members(id)?),
                entries: source.fetch_project_entries(id, &query.range)?,
            }
        }
    };

    debug!(
        target: "app::analytics",
        scope = %query.scope.scope_type(),
        scope_id = %query.scope.id(),
        range = %query.range,
        capacities = records.capacities.len(),
        entries = records.entries.len(),
        "resolved analytics scope"
    );

    Ok(records)
}

// A subject counts toward capacity once, however many memberships it has.
fn dedupe_subjects(records: Vec<RawCapacityRecord>) -> Vec<RawCapacityRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.subject_id.clone()))
        .collect()
}
