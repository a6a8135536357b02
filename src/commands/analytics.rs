use serde::Serialize;
use serde_json::json;

use crate::error::AppError;
use crate::models::resource_analytics::{
    AnalyticsQueryParams, AnalyticsResult, ProjectStackChartConfig,
};
use crate::services::project_stack;
use crate::services::resource_analytics_service::{ExportFormat, ExportResult};

use super::{AppState, CommandError, CommandResult};

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BaselineResponse {
    pub baseline_hours_week: f64,
}

pub async fn resource_analytics_fetch(
    state: &AppState,
    params: AnalyticsQueryParams,
) -> CommandResult<AnalyticsResult> {
    let app_state = state.clone();
    run_blocking(move || app_state.analytics().fetch(&params)).await
}

pub async fn resource_analytics_export(
    state: &AppState,
    params: AnalyticsQueryParams,
    format: Option<String>,
) -> CommandResult<ExportResult> {
    let format = match format.as_deref() {
        Some(raw) => ExportFormat::try_from(raw.trim()).map_err(|message| {
            let supported = [ExportFormat::Csv.as_str(), ExportFormat::Json.as_str()];
            AppError::validation_with_details(message, json!({ "supported": supported }))
        })?,
        None => ExportFormat::Csv,
    };
    let app_state = state.clone();
    run_blocking(move || app_state.analytics().export(&params, format)).await
}

pub async fn resource_analytics_chart(
    state: &AppState,
    params: AnalyticsQueryParams,
) -> CommandResult<ProjectStackChartConfig> {
    let app_state = state.clone();
    run_blocking(move || {
        let result = app_state.analytics().fetch(&params)?;
        Ok(project_stack::build_chart_config(
            &result.project_stack.series,
            &result.project_breakdown,
            result.baseline_hours_week,
        ))
    })
    .await
}

pub async fn resource_analytics_clear_cache(state: &AppState) -> CommandResult<usize> {
    let app_state = state.clone();
    run_blocking(move || {
        let analytics = app_state.analytics();
        let cleared = analytics.cached_entries();
        analytics.clear_cache();
        Ok(cleared)
    })
    .await
}

pub async fn resource_baseline_get(state: &AppState) -> CommandResult<BaselineResponse> {
    let app_state = state.clone();
    run_blocking(move || {
        let baseline_hours_week = app_state.settings().baseline_hours_per_week()?;
        Ok(BaselineResponse {
            baseline_hours_week,
        })
    })
    .await
}

/// Persists a new baseline and drops cached results computed with the old one.
pub async fn resource_baseline_update(
    state: &AppState,
    hours: f64,
) -> CommandResult<BaselineResponse> {
    let app_state = state.clone();
    run_blocking(move || {
        let baseline_hours_week = app_state.settings().update_baseline_hours_per_week(hours)?;
        app_state.analytics().clear_cache();
        Ok(BaselineResponse {
            baseline_hours_week,
        })
    })
    .await
}

async fn run_blocking<T: Send + 'static>(
    task: impl FnOnce() -> Result<T, AppError> + Send + 'static,
) -> CommandResult<T> {
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| CommandError::new("UNKNOWN", format!("analytics task failed: {err}"), None))?
        .map_err(CommandError::from)
}
