pub mod iso_week;
pub mod logger;
