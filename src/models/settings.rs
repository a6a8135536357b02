use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::utils::logger::DEFAULT_LOG_DIRECTIVES;

pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 120;
pub const DEFAULT_CACHE_CAPACITY: usize = 64;
pub const DEFAULT_RANGE_WEEKS: u32 = 12;
pub const MAX_CACHE_TTL_SECONDS: u64 = 86_400;

/// Which hours count against capacity when flagging a week.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OverAllocationRule {
    /// `actual > capacity`
    #[default]
    Actual,
    /// `planned > capacity || actual > capacity`
    PlannedOrActual,
}

impl OverAllocationRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverAllocationRule::Actual => "actual",
            OverAllocationRule::PlannedOrActual => "planned_or_actual",
        }
    }
}

impl fmt::Display for OverAllocationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for OverAllocationRule {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "actual" => Ok(OverAllocationRule::Actual),
            "planned_or_actual" => Ok(OverAllocationRule::PlannedOrActual),
            other => Err(format!("unsupported over-allocation rule: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct AnalyticsSettings {
    /// Feature flag; when off every analytics request fails with `FeatureDisabled`.
    pub enabled: bool,
    /// Zero disables the result cache.
    pub cache_ttl_seconds: u64,
    pub cache_capacity: usize,
    pub over_allocation_rule: OverAllocationRule,
    pub default_range_weeks: u32,
    pub log_directives: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reports_dir: Option<PathBuf>,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            over_allocation_rule: OverAllocationRule::Actual,
            default_range_weeks: DEFAULT_RANGE_WEEKS,
            log_directives: DEFAULT_LOG_DIRECTIVES.to_string(),
            reports_dir: None,
        }
    }
}

impl AnalyticsSettings {
    pub fn cache_enabled(&self) -> bool {
        self.cache_ttl_seconds > 0 && self.cache_capacity > 0
    }
}
