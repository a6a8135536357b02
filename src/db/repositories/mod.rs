pub mod employee_repository;
pub mod project_repository;
pub mod resource_store;
pub mod settings_repository;
pub mod time_entry_repository;
