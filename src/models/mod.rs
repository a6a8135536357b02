pub mod resource_analytics;
pub mod settings;
