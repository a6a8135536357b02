use std::fmt;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use lru::LruCache;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::models::resource_analytics::{
    AnalyticsQueryParams, AnalyticsResult, RawRecords, ScopeEcho, ScopeQuery, ScopeType,
};
use crate::models::settings::{AnalyticsSettings, OverAllocationRule, MAX_CACHE_TTL_SECONDS};
use crate::services::scope_resolver::ResourceDataSource;
use crate::services::{
    over_allocation, project_stack, scope_resolver, series_summary, weekly_aggregator,
};
use crate::utils::iso_week::WeekKey;

const REPORT_PREFIX: &str = "resource-analytics";
const CSV_HEADER: [&str; 8] = [
    "scope_type",
    "scope_id",
    "from_week",
    "to_week",
    "week",
    "capacity",
    "planned",
    "actual",
];

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    pub fn file_extension(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ExportFormat {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(format!("unsupported export format: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExportResult {
    pub file_path: PathBuf,
    pub format: ExportFormat,
    pub weeks: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    scope_type: ScopeType,
    scope_id: String,
    from_week: WeekKey,
    to_week: WeekKey,
}

impl From<&ScopeQuery> for CacheKey {
    fn from(query: &ScopeQuery) -> Self {
        Self {
            scope_type: query.scope.scope_type(),
            scope_id: query.scope.id(),
            from_week: query.range.from_week,
            to_week: query.range.to_week,
        }
    }
}

#[derive(Clone)]
struct CachedResult {
    result: AnalyticsResult,
    cached_at: DateTime<Utc>,
}

/// Computes the full analytics view for one scope and week range.
///
/// Pure over its inputs: the same query, records and baseline always give the
/// same result.
pub fn analyze(
    query: &ScopeQuery,
    records: &RawRecords,
    baseline_hours_week: f64,
    rule: OverAllocationRule,
) -> AppResult<AnalyticsResult> {
    let (series, buckets) = weekly_aggregator::build_series(&query.range, records)?;
    let over_allocated = over_allocation::detect(&series, rule);
    let summary = series_summary::summarize(&series);
    let cumulative_series = series_summary::cumulative(&series);
    let (project_breakdown, project_stack) =
        project_stack::build_project_stack(&series, &buckets, baseline_hours_week);

    Ok(AnalyticsResult {
        scope: ScopeEcho::from(&query.scope),
        range: query.range,
        summary,
        cumulative_series,
        project_breakdown,
        project_stack,
        totals: series_summary::totals(&series, baseline_hours_week),
        baseline_hours_week,
        baseline_total_hours: series_summary::baseline_total(baseline_hours_week, series.len()),
        latest_point: series_summary::latest_point(&series),
        has_data: series_summary::has_data(&series),
        has_over_allocation: !over_allocated.is_empty(),
        over_allocated_weeks: over_allocated.into_weeks(),
        series,
    })
}

pub struct ResourceAnalyticsService {
    source: Arc<dyn ResourceDataSource>,
    settings: AnalyticsSettings,
    cache: Option<RwLock<LruCache<CacheKey, CachedResult>>>,
    cache_ttl: Duration,
    reports_dir: PathBuf,
}

impl ResourceAnalyticsService {
    pub fn new(source: Arc<dyn ResourceDataSource>, settings: AnalyticsSettings) -> Self {
        let cache = if settings.cache_enabled() {
            NonZeroUsize::new(settings.cache_capacity)
                .map(|capacity| RwLock::new(LruCache::new(capacity)))
        } else {
            None
        };
        let ttl_seconds = settings.cache_ttl_seconds.min(MAX_CACHE_TTL_SECONDS);
        let cache_ttl = Duration::seconds(ttl_seconds as i64);
        let reports_dir = settings
            .reports_dir
            .clone()
            .unwrap_or_else(default_reports_dir);

        Self {
            source,
            settings,
            cache,
            cache_ttl,
            reports_dir,
        }
    }

    pub fn with_reports_dir(mut self, reports_dir: impl Into<PathBuf>) -> Self {
        self.reports_dir = reports_dir.into();
        self
    }

    pub fn settings(&self) -> &AnalyticsSettings {
        &self.settings
    }

    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }

    pub fn fetch(&self, params: &AnalyticsQueryParams) -> AppResult<AnalyticsResult> {
        self.fetch_at(params, Utc::now())
    }

    /// Like [`fetch`](Self::fetch) with an explicit clock for cache expiry.
    pub fn fetch_at(
        &self,
        params: &AnalyticsQueryParams,
        now: DateTime<Utc>,
    ) -> AppResult<AnalyticsResult> {
        if !self.settings.enabled {
            return Err(AppError::feature_disabled());
        }

        let query = scope_resolver::parse_query(params)?;
        let key = CacheKey::from(&query);

        if let Some(cached) = self.try_get_cache(&key, now) {
            debug!(
                target: "app::analytics",
                scope = %key.scope_type,
                scope_id = %key.scope_id,
                "resource analytics cache hit"
            );
            return Ok(cached);
        }

        let result = self.compute(&query)?;
        self.insert_cache(key, result.clone(), now);
        Ok(result)
    }

    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            if let Ok(mut guard) = cache.write() {
                guard.clear();
            }
        }
        debug!(target: "app::analytics", "resource analytics cache cleared");
    }

    pub fn cached_entries(&self) -> usize {
        self.cache
            .as_ref()
            .and_then(|cache| cache.read().ok().map(|guard| guard.len()))
            .unwrap_or(0)
    }

    pub fn export(
        &self,
        params: &AnalyticsQueryParams,
        format: ExportFormat,
    ) -> AppResult<ExportResult> {
        let result = self.fetch(params)?;
        std::fs::create_dir_all(&self.reports_dir)?;

        let path = self.reports_dir.join(export_file_name(&result, format));
        let content = match format {
            ExportFormat::Csv => render_csv(&result)?,
            ExportFormat::Json => serde_json::to_string_pretty(&result)?,
        };
        std::fs::write(&path, content)?;

        info!(
            target: "app::analytics",
            path = %path.display(),
            format = %format,
            "resource analytics report exported"
        );

        Ok(ExportResult {
            file_path: path,
            format,
            weeks: result.series.len(),
        })
    }

    fn compute(&self, query: &ScopeQuery) -> AppResult<AnalyticsResult> {
        let records = scope_resolver::resolve(self.source.as_ref(), query)?;
        let baseline = self.source.fetch_baseline_hours_per_week()?;
        let result = analyze(query, &records, baseline, self.settings.over_allocation_rule)?;

        debug!(
            target: "app::analytics",
            scope = %query.scope.scope_type(),
            scope_id = %query.scope.id(),
            weeks = result.series.len(),
            over_allocated = result.over_allocated_weeks.len(),
            projects = result.project_breakdown.len(),
            "computed resource analytics"
        );

        Ok(result)
    }

    fn try_get_cache(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<AnalyticsResult> {
        let cache = self.cache.as_ref()?;
        let mut guard = cache.write().ok()?;
        let cached = guard.get(key)?.clone();
        if now - cached.cached_at < self.cache_ttl {
            Some(cached.result)
        } else {
            guard.pop(key);
            None
        }
    }

    fn insert_cache(&self, key: CacheKey, result: AnalyticsResult, now: DateTime<Utc>) {
        if let Some(cache) = &self.cache {
            if let Ok(mut guard) = cache.write() {
                guard.put(
                    key,
                    CachedResult {
                        result,
                        cached_at: now,
                    },
                );
            }
        }
    }
}

/// `resource-analytics-<scope>-<id>-<from>-<to>.<ext>`, with characters
/// outside `[A-Za-z0-9_-]` in the id replaced.
pub fn export_file_name(result: &AnalyticsResult, format: ExportFormat) -> String {
    let scope_id: String = result
        .scope
        .id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!(
        "{REPORT_PREFIX}-{}-{}-{}-{}.{}",
        result.scope.scope_type,
        scope_id,
        result.range.from_week,
        result.range.to_week,
        format.file_extension()
    )
}

/// One CSV row per week of the flat series.
pub fn render_csv(result: &AnalyticsResult) -> AppResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    let scope_type = result.scope.scope_type.to_string();
    let from_week = result.range.from_week.to_string();
    let to_week = result.range.to_week.to_string();
    for point in &result.series {
        writer.write_record([
            scope_type.as_str(),
            result.scope.id.as_str(),
            from_week.as_str(),
            to_week.as_str(),
            point.week.to_string().as_str(),
            point.capacity.to_string().as_str(),
            point.planned.to_string().as_str(),
            point.actual.to_string().as_str(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| AppError::other(format!("failed to flush csv export: {err}")))?;
    String::from_utf8(bytes)
        .map_err(|err| AppError::other(format!("csv export is not utf-8: {err}")))
}

fn default_reports_dir() -> PathBuf {
    std::env::temp_dir().join(REPORT_PREFIX).join("reports")
}
