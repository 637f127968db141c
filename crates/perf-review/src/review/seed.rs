//! Deterministic demo dataset: three departments, their staff, the standard seven-item
//! catalog, one period of relations and assessments, and the aggregated ranking.

use std::net::{IpAddr, Ipv4Addr};

use serde::Serialize;
use tracing::info;

use super::domain::{
    AssessmentStatus, Department, Employee, EmployeeRole, FinalScore, IndicatorDraft,
    IndicatorKind, NewDepartment, NewEmployee, NewProject, Period, Project, RelationRole,
    ScoreSheet,
};
use super::error::ReviewError;
use super::relations::RelationInput;
use super::repository::ReviewRepository;
use super::scoring::{AssessmentSubmission, WriteMode};
use super::service::PerformanceReviewService;

const DEPARTMENTS: [(&str, &str); 3] = [
    ("Engineering", "Builds and ships the product"),
    ("Quality", "Owns test strategy and release gates"),
    ("Operations", "Runs production infrastructure"),
];

const PROJECTS: [(&str, &str); 4] = [
    ("Support Assistant", "Conversational support tooling"),
    ("Insight Platform", "Reporting and analytics"),
    ("Field App", "Mobile client for field staff"),
    ("Control Center", "Internal controls and approvals"),
];

const NAMES: [&str; 18] = [
    "Avery Chen", "Blake Osei", "Casey Lindqvist", "Dana Moreau", "Eli Novak", "Farah Haddad",
    "Gabe Ito", "Hana Kowalski", "Ivan Petrov", "Jun Park", "Kira Sato", "Luis Ortega",
    "Mina Rahimi", "Noor Aziz", "Omar Diallo", "Priya Nair", "Quinn Brady", "Rosa Vega",
];

/// Staff roles per department after the department leader.
const STAFF_ROLES: [EmployeeRole; 5] = [
    EmployeeRole::ProjectLeader,
    EmployeeRole::ProjectMember,
    EmployeeRole::ProjectMember,
    EmployeeRole::FreePerson,
    EmployeeRole::ProjectLeader,
];

const JOB_TYPES: [(&str, &str); 5] = [
    ("development", "tech_dev"),
    ("testing", "test"),
    ("operations", "operation"),
    ("design", "design"),
    ("product", "project_manager"),
];

const POSITIONS: [&str; 4] = ["senior engineer", "engineer", "associate engineer", "intern"];

/// What the generator created.
#[derive(Debug, Clone, Serialize)]
pub struct SyntheticDataset {
    pub period: Period,
    pub departments: Vec<Department>,
    pub employees: Vec<Employee>,
    pub projects: Vec<Project>,
    pub assessment_count: usize,
    pub final_scores: Vec<FinalScore>,
}

/// Three base items, two bonuses and two penalties. Penalties take non-negative magnitudes.
pub fn standard_indicators(department: &Department) -> Vec<IndicatorDraft> {
    let item = |sequence: u32,
                kind: IndicatorKind,
                title: &str,
                content: &str,
                default_value: f64,
                max_score: f64| IndicatorDraft {
        department_id: department.id,
        sequence,
        kind,
        title: title.to_string(),
        content: content.to_string(),
        detail: String::new(),
        default_value,
        min_score: 0.0,
        max_score,
    };

    vec![
        item(1, IndicatorKind::Base, "Work quality", "Accuracy of delivered work", 80.0, 100.0),
        item(2, IndicatorKind::Base, "Efficiency", "Timeliness of delivery", 80.0, 100.0),
        item(3, IndicatorKind::Base, "Collaboration", "Communication with the team", 80.0, 100.0),
        item(4, IndicatorKind::Bonus, "Innovation", "New ideas and solutions", 0.0, 20.0),
        item(5, IndicatorKind::Bonus, "Knowledge sharing", "Mentoring and write-ups", 0.0, 10.0),
        item(6, IndicatorKind::Penalty, "Policy violations", "Breaches of company rules", 0.0, 0.0),
        item(7, IndicatorKind::Penalty, "Major mistakes", "Incidents caused by errors", 0.0, 15.0),
    ]
}

/// Deterministic value in `[low, high]` keyed by `salt`.
fn spread(salt: usize, low: u32, high: u32) -> f64 {
    let width = (high - low + 1) as usize;
    f64::from(low + ((salt * 37 + 11) % width) as u32)
}

#[derive(Clone, Copy)]
enum Rater {
    DepartmentLeader,
    ProjectLeader,
    Myself,
}

fn sheet(indicators: &[IndicatorDraft], rater: Rater, salt: usize) -> ScoreSheet {
    indicators
        .iter()
        .map(|indicator| {
            let key_salt = salt + indicator.sequence as usize;
            let max = indicator.max_score as u32;
            let value = match (indicator.kind, rater) {
                (IndicatorKind::Base, Rater::Myself) => spread(key_salt, 80, 100),
                (IndicatorKind::Base, _) => spread(key_salt, 70, 95),
                (IndicatorKind::Bonus, _) => spread(key_salt, 0, max),
                (IndicatorKind::Penalty, Rater::Myself) => 0.0,
                (IndicatorKind::Penalty, _) => spread(key_salt, 0, max),
            };
            (indicator.sequence.to_string(), value)
        })
        .collect()
}

pub(crate) fn seed<R>(
    service: &PerformanceReviewService<R>,
    period: &Period,
) -> Result<SyntheticDataset, ReviewError>
where
    R: ReviewRepository + 'static,
{
    let directory = service.directory();
    let mut names = NAMES.iter();
    let mut next_name = || {
        names
            .next()
            .map(|name| name.to_string())
            .ok_or_else(|| ReviewError::validation("synthetic name pool exhausted"))
    };

    let projects = PROJECTS
        .iter()
        .map(|(name, description)| {
            directory.create_project(NewProject {
                name: name.to_string(),
                description: Some(description.to_string()),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut departments = Vec::new();
    let mut employees = Vec::new();
    let mut assessment_count = 0;

    for (department_index, (name, description)) in DEPARTMENTS.iter().enumerate() {
        let department = directory.create_department(NewDepartment {
            name: name.to_string(),
            description: Some(description.to_string()),
        })?;
        let indicators = standard_indicators(&department);
        for draft in &indicators {
            service.upsert_indicator(draft.clone())?;
        }

        let leader = directory.create_employee(NewEmployee {
            name: next_name()?,
            department_id: department.id,
            role: EmployeeRole::DepartmentLeader,
            job_type: "management".to_string(),
            position: "department manager".to_string(),
            ip_address: Some(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1))),
        })?;

        let mut staff = Vec::new();
        for (slot, role) in STAFF_ROLES.iter().enumerate() {
            let host = 10 + department_index * STAFF_ROLES.len() + slot;
            staff.push(directory.create_employee(NewEmployee {
                name: next_name()?,
                department_id: department.id,
                role: *role,
                job_type: JOB_TYPES[slot % JOB_TYPES.len()].0.to_string(),
                position: POSITIONS[slot % POSITIONS.len()].to_string(),
                ip_address: Some(IpAddr::V4(Ipv4Addr::new(192, 168, 1, host as u8))),
            })?);
        }

        let project_leaders: Vec<&Employee> = staff
            .iter()
            .filter(|employee| employee.role == EmployeeRole::ProjectLeader)
            .collect();

        for (slot, employee) in staff.iter().enumerate() {
            let Some(role) = employee.role.relation_role() else {
                continue;
            };
            let leader_names = match role {
                RelationRole::FreePerson => Vec::new(),
                RelationRole::ProjectLeader => vec![employee.name.clone()],
                RelationRole::ProjectMember => project_leaders
                    .iter()
                    .cycle()
                    .skip(slot)
                    .take(1 + slot % 2)
                    .map(|leader| leader.name.clone())
                    .collect(),
            };
            let project_names = match role {
                RelationRole::FreePerson => Vec::new(),
                _ => PROJECTS
                    .iter()
                    .cycle()
                    .skip(department_index + slot)
                    .take(1 + slot % 3)
                    .map(|(name, _)| name.to_string())
                    .collect(),
            };
            let attribute = JOB_TYPES[slot % JOB_TYPES.len()].1;
            service.relations().set_relation(RelationInput {
                period: period.clone(),
                employee_id: employee.id,
                role,
                leader_names,
                project_names,
                attributes: vec![attribute.parse()?],
            })?;
        }

        for (slot, employee) in staff.iter().enumerate() {
            let salt = department_index * 100 + slot * 10;
            let mut raters = vec![(leader.id, Rater::DepartmentLeader)];
            if employee.role != EmployeeRole::ProjectLeader && !project_leaders.is_empty() {
                let project_leader = project_leaders[slot % project_leaders.len()];
                raters.push((project_leader.id, Rater::ProjectLeader));
            }
            raters.push((employee.id, Rater::Myself));

            for (offset, (evaluator_id, rater)) in raters.into_iter().enumerate() {
                service.assessments().submit(
                    AssessmentSubmission {
                        employee_id: employee.id,
                        evaluator_id,
                        period: period.clone(),
                        status: AssessmentStatus::Completed,
                        scores: sheet(&indicators, rater, salt + offset),
                        comment: None,
                    },
                    WriteMode::CreateOnly,
                )?;
                assessment_count += 1;
            }
        }

        departments.push(department);
        employees.push(leader);
        employees.extend(staff);
    }

    let final_scores = service.ranking().aggregate_period(period)?;
    info!(
        period = %period,
        departments = departments.len(),
        employees = employees.len(),
        assessments = assessment_count,
        "synthetic dataset seeded"
    );

    Ok(SyntheticDataset {
        period: period.clone(),
        departments,
        employees,
        projects,
        assessment_count,
        final_scores,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spread_stays_in_bounds() {
        for salt in 0..200 {
            let value = spread(salt, 70, 95);
            assert!((70.0..=95.0).contains(&value));
        }
        assert_eq!(spread(5, 0, 0), 0.0);
    }

    #[test]
    fn standard_catalog_is_valid() {
        let department = Department {
            id: crate::review::domain::DepartmentId(1),
            name: "Engineering".to_string(),
            description: None,
        };
        let drafts = standard_indicators(&department);
        assert_eq!(drafts.len(), 7);
        for draft in &drafts {
            draft.validate().expect("valid draft");
        }
    }

    #[test]
    fn self_sheets_never_penalize() {
        let department = Department {
            id: crate::review::domain::DepartmentId(1),
            name: "Engineering".to_string(),
            description: None,
        };
        let drafts = standard_indicators(&department);
        let scores = sheet(&drafts, Rater::Myself, 3);
        assert_eq!(scores["6"], 0.0);
        assert_eq!(scores["7"], 0.0);
        assert!(scores["1"] >= 80.0);
    }
}
