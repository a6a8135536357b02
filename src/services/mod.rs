pub mod over_allocation;
pub mod project_stack;
pub mod resource_analytics_service;
pub mod scope_resolver;
pub mod series_summary;
pub mod settings_service;
pub mod weekly_aggregator;

#[cfg(test)]
pub(crate) mod test_support;
