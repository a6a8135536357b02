//! In-memory data source and fixtures shared by the service unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use uuid::Uuid;

use crate::error::AppResult;
use crate::models::resource_analytics::{RawCapacityRecord, RawTimeEntry};
use crate::services::scope_resolver::ResourceDataSource;
use crate::utils::iso_week::{WeekKey, WeekRange};

pub const PROJECT_ALPHA: &str = "5ac7b3f2-318e-40ff-9c3a-222222222222";
pub const ALPHA: &str = "5ac7b3f2-318e-40ff-9c3a-aaaaaaaaaaaa";
pub const BETA: &str = "5ac7b3f2-318e-40ff-9c3a-bbbbbbbbbbbb";

pub struct Employee {
    pub id: &'static str,
    pub department: &'static str,
    pub active: bool,
    pub capacity: f64,
}

pub struct Entry {
    pub employee: &'static str,
    pub project: Option<(&'static str, &'static str)>,
    pub week: &'static str,
    pub planned: f64,
    pub actual: f64,
}

#[derive(Default)]
pub struct InMemorySource {
    pub employees: Vec<Employee>,
    pub projects: Vec<&'static str>,
    pub members: Vec<(&'static str, &'static str)>,
    pub entries: Vec<Entry>,
    pub baseline: f64,
    pub calls: AtomicUsize,
}

impl InMemorySource {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn employee(&self, id: &str) -> Option<&Employee> {
        self.employees.iter().find(|employee| employee.id == id)
    }

    fn to_raw(entry: &Entry) -> RawTimeEntry {
        RawTimeEntry {
            subject_id: entry.employee.to_string(),
            project_id: entry.project.map(|(id, _)| id.to_string()),
            project_name: entry.project.map(|(_, name)| name.to_string()),
            week_key: WeekKey::parse(entry.week).expect("fixture week"),
            planned_hours: entry.planned,
            actual_hours: entry.actual,
        }
    }
}

impl ResourceDataSource for InMemorySource {
    fn fetch_department_capacities(
        &self,
        department: Option<&str>,
    ) -> AppResult<Vec<RawCapacityRecord>> {
        self.record_call();
        Ok(self
            .employees
            .iter()
            .filter(|employee| employee.active)
            .filter(|employee| department.map_or(true, |name| employee.department == name))
            .map(|employee| RawCapacityRecord {
                subject_id: employee.id.to_string(),
                weekly_capacity_hours: employee.capacity,
            })
            .collect())
    }

    fn fetch_department_entries(
        &self,
        department: Option<&str>,
        range: &WeekRange,
    ) -> AppResult<Vec<RawTimeEntry>> {
        self.record_call();
        Ok(self
            .entries
            .iter()
            .filter(|entry| {
                self.employee(entry.employee).map_or(false, |employee| {
                    employee.active && department.map_or(true, |name| employee.department == name)
                })
            })
            .map(Self::to_raw)
            .filter(|entry| range.contains(&entry.week_key))
            .collect())
    }

    fn fetch_project_exists(&self, project_id: &Uuid) -> AppResult<bool> {
        self.record_call();
        Ok(self
            .projects
            .iter()
            .any(|id| *id == project_id.to_string()))
    }

    fn fetch_project_members(&self, project_id: &Uuid) -> AppResult<Vec<RawCapacityRecord>> {
        self.record_call();
        let project_id = project_id.to_string();
        Ok(self
            .members
            .iter()
            .filter(|(project, _)| *project == project_id)
            .filter_map(|(_, employee)| self.employee(employee))
            .map(|employee| RawCapacityRecord {
                subject_id: employee.id.to_string(),
                weekly_capacity_hours: employee.capacity,
            })
            .collect())
    }

    fn fetch_project_entries(
        &self,
        project_id: &Uuid,
        range: &WeekRange,
    ) -> AppResult<Vec<RawTimeEntry>> {
        self.record_call();
        let project_id = project_id.to_string();
        Ok(self
            .entries
            .iter()
            .filter(|entry| entry.project.map_or(false, |(id, _)| id == project_id))
            .map(Self::to_raw)
            .filter(|entry| range.contains(&entry.week_key))
            .collect())
    }

    fn fetch_baseline_hours_per_week(&self) -> AppResult<f64> {
        self.record_call();
        Ok(self.baseline)
    }
}

fn entry(
    employee: &'static str,
    project: (&'static str, &'static str),
    week: &'static str,
    planned: f64,
    actual: f64,
) -> Entry {
    Entry {
        employee,
        project: Some(project),
        week,
        planned,
        actual,
    }
}

/// Engineering: three active employees (37.5 + 30 + 45 = 112.5 h/week), one of
/// them without entries, plus an inactive engineer and a Sales employee that
/// must stay out of the department totals.
pub fn engineering_source() -> InMemorySource {
    let alpha = (ALPHA, "Alpha");
    let beta = (BETA, "Beta");

    InMemorySource {
        employees: vec![
            Employee { id: "emp-1", department: "Engineering", active: true, capacity: 37.5 },
            Employee { id: "emp-2", department: "Engineering", active: true, capacity: 30.0 },
            Employee { id: "emp-3", department: "Engineering", active: true, capacity: 45.0 },
            Employee { id: "emp-4", department: "Sales", active: true, capacity: 40.0 },
            Employee { id: "emp-5", department: "Engineering", active: false, capacity: 20.0 },
        ],
        projects: vec![ALPHA, BETA],
        members: vec![
            (ALPHA, "emp-1"),
            (ALPHA, "emp-2"),
            (BETA, "emp-2"),
            (ALPHA, "emp-4"),
        ],
        entries: vec![
            entry("emp-1", alpha, "2025-W01", 50.0, 48.0),
            entry("emp-2", beta, "2025-W01", 40.0, 36.0),
            entry("emp-1", alpha, "2025-W02", 50.0, 44.0),
            entry("emp-2", alpha, "2025-W02", 40.0, 40.0),
            entry("emp-2", beta, "2025-W02", 40.0, 36.0),
            entry("emp-4", alpha, "2025-W01", 10.0, 10.0),
            entry("emp-5", beta, "2025-W02", 8.0, 8.0),
        ],
        baseline: 100.0,
        calls: AtomicUsize::new(0),
    }
}

/// Project alpha: two members (37.5 + 32.5 = 70 h/week) booking across the
/// 2025/2026 ISO year boundary. The first member is listed twice.
pub fn project_alpha_source() -> InMemorySource {
    let project = (PROJECT_ALPHA, "Alpha");

    InMemorySource {
        employees: vec![
            Employee { id: "member-1", department: "Engineering", active: true, capacity: 37.5 },
            Employee { id: "member-2", department: "Design", active: true, capacity: 32.5 },
        ],
        projects: vec![PROJECT_ALPHA],
        members: vec![
            (PROJECT_ALPHA, "member-1"),
            (PROJECT_ALPHA, "member-2"),
            (PROJECT_ALPHA, "member-1"),
        ],
        entries: vec![
            entry("member-1", project, "2025-W52", 30.0, 28.0),
            entry("member-2", project, "2025-W52", 30.0, 30.0),
            entry("member-1", project, "2026-W01", 45.0, 50.0),
            entry("member-2", project, "2026-W01", 35.0, 42.0),
            entry("member-1", project, "2026-W02", 20.0, 18.0),
            entry("member-2", project, "2026-W02", 20.0, 18.0),
            entry("member-1", project, "2026-W03", 10.0, 10.0),
        ],
        baseline: 0.0,
        calls: AtomicUsize::new(0),
    }
}
