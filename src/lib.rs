//! Weekly resource capacity analytics.
//!
//! Given a department or project and an inclusive ISO week range, computes a
//! dense weekly series of capacity, planned and actual hours, flags
//! over-allocated weeks, and breaks the hours down per project for stacked
//! charts. The computation lives in [`services`]; [`db`] provides the SQLite
//! data source and [`commands`] the transport-neutral entry points.

pub mod commands;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;
