use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::domain::{
    Assessment, DepartmentId, Employee, EmployeeId, EmployeeRole, FinalScore, Period,
};
use super::error::ReviewError;
use super::repository::{AssessmentStore, DirectoryStore, FinalScoreStore, RepositoryError};

pub const DEPARTMENT_LEADER_WEIGHT: f64 = 0.5;
pub const PROJECT_LEADER_WEIGHT: f64 = 0.3;
pub const SELF_WEIGHT: f64 = 0.2;

pub fn weighted_final(department_leader: f64, project_leader: f64, self_score: f64) -> f64 {
    department_leader * DEPARTMENT_LEADER_WEIGHT
        + project_leader * PROJECT_LEADER_WEIGHT
        + self_score * SELF_WEIGHT
}

/// Rater totals per category; a missing category stays at 0.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct CategoryScores {
    pub(crate) department_leader: f64,
    pub(crate) project_leader: f64,
    pub(crate) self_score: f64,
}

/// Picks one row per category. `rows` must be ordered by evaluator id so the lowest id wins;
/// self rows never count as leader rows.
pub(crate) fn pick_categories<F>(
    employee: EmployeeId,
    rows: &[Assessment],
    role_of: F,
) -> CategoryScores
where
    F: Fn(EmployeeId) -> Option<EmployeeRole>,
{
    let mut department_leader = None;
    let mut project_leader = None;
    let mut self_score = None;

    for row in rows {
        if row.employee_id != employee {
            continue;
        }
        if row.is_self_assessment() {
            self_score.get_or_insert(row.total_score());
            continue;
        }
        match role_of(row.evaluator_id) {
            Some(EmployeeRole::DepartmentLeader) => {
                department_leader.get_or_insert(row.total_score());
            }
            Some(EmployeeRole::ProjectLeader) => {
                project_leader.get_or_insert(row.total_score());
            }
            _ => {}
        }
    }

    CategoryScores {
        department_leader: department_leader.unwrap_or(0.0),
        project_leader: project_leader.unwrap_or(0.0),
        self_score: self_score.unwrap_or(0.0),
    }
}

/// Orders by final score, highest first, keeping employee-id order among equal scores.
/// Ranks are 1-based positions with no gaps.
pub(crate) fn assign_ranks(rows: &mut [FinalScore]) {
    rows.sort_by_key(|row| row.employee_id);
    rows.sort_by(|a, b| b.final_score().total_cmp(&a.final_score()));
    for (position, row) in rows.iter_mut().enumerate() {
        row.set_rank(u32::try_from(position + 1).unwrap_or(u32::MAX));
    }
}

pub struct FinalScoreAggregator<R> {
    repository: Arc<R>,
}

impl<R> FinalScoreAggregator<R>
where
    R: DirectoryStore + AssessmentStore + FinalScoreStore + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Recomputes and stores the weighted score. An existing rank is kept until the next
    /// `rerank`.
    pub fn aggregate(
        &self,
        employee_id: EmployeeId,
        period: &Period,
    ) -> Result<FinalScore, ReviewError> {
        let employee = self
            .repository
            .employee(employee_id)?
            .ok_or_else(|| ReviewError::not_found(employee_id.to_string()))?;
        if employee.role == EmployeeRole::DepartmentLeader {
            return Err(ReviewError::validation(format!(
                "{} is a department leader and is not rated",
                employee.name
            )));
        }

        let record = self.compute(&employee, period)?;
        let stored = self
            .repository
            .save_final_scores(vec![record])?
            .into_iter()
            .next()
            .ok_or_else(|| {
                ReviewError::Repository(RepositoryError::Unavailable(
                    "final score batch came back empty".to_string(),
                ))
            })?;
        debug!(
            employee = employee.id.0,
            period = %period,
            final_score = stored.final_score(),
            "final score aggregated"
        );
        Ok(stored)
    }

    /// `aggregate` followed by a rerank of the employee's department, so the returned row
    /// carries a dense rank.
    pub fn aggregate_ranked(
        &self,
        employee_id: EmployeeId,
        period: &Period,
    ) -> Result<FinalScore, ReviewError> {
        let aggregated = self.aggregate(employee_id, period)?;
        self.rerank(aggregated.department_id, period)?
            .into_iter()
            .find(|row| row.employee_id == employee_id)
            .ok_or_else(|| {
                ReviewError::Repository(RepositoryError::Unavailable(
                    "reranked department lost the aggregated row".to_string(),
                ))
            })
    }

    /// Aggregates every rated employee of the period, then reranks each department touched.
    pub fn aggregate_period(&self, period: &Period) -> Result<Vec<FinalScore>, ReviewError> {
        let rated: BTreeSet<EmployeeId> = self
            .repository
            .assessments_in(period)?
            .iter()
            .map(|assessment| assessment.employee_id)
            .collect();

        let mut batch = Vec::new();
        let mut departments = BTreeSet::new();
        for employee_id in rated {
            let Some(employee) = self.repository.employee(employee_id)? else {
                warn!(employee = employee_id.0, "assessment references missing employee");
                continue;
            };
            if employee.role == EmployeeRole::DepartmentLeader {
                continue;
            }
            departments.insert(employee.department_id);
            batch.push(self.compute(&employee, period)?);
        }

        let aggregated = self.repository.save_final_scores(batch)?.len();
        for department in &departments {
            self.rerank(*department, period)?;
        }
        info!(
            period = %period,
            aggregated,
            departments = departments.len(),
            "period aggregated"
        );

        Ok(self.repository.final_scores_for_period(period)?)
    }

    /// Idempotent; touches only `(department, period)`.
    pub fn rerank(
        &self,
        department: DepartmentId,
        period: &Period,
    ) -> Result<Vec<FinalScore>, ReviewError> {
        self.require_department(department)?;
        let mut rows = self.repository.final_scores_in(department, period)?;
        assign_ranks(&mut rows);
        let ranked = self.repository.save_final_scores(rows)?;
        debug!(
            department = department.0,
            period = %period,
            ranked = ranked.len(),
            "department reranked"
        );
        Ok(ranked)
    }

    /// Ordered by rank; rows not yet ranked come last.
    pub fn final_scores(
        &self,
        department: DepartmentId,
        period: &Period,
    ) -> Result<Vec<FinalScore>, ReviewError> {
        self.require_department(department)?;
        let mut rows = self.repository.final_scores_in(department, period)?;
        rows.sort_by_key(|row| (row.rank() == 0, row.rank(), row.employee_id));
        Ok(rows)
    }

    /// Ordered by department then employee id.
    pub fn final_scores_for_period(&self, period: &Period) -> Result<Vec<FinalScore>, ReviewError> {
        Ok(self.repository.final_scores_for_period(period)?)
    }

    fn compute(&self, employee: &Employee, period: &Period) -> Result<FinalScore, ReviewError> {
        let rows = self.repository.assessments_for(employee.id, period)?;
        let mut roles = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(evaluator) = self.repository.employee(row.evaluator_id)? {
                roles.push((evaluator.id, evaluator.role));
            }
        }
        let scores = pick_categories(employee.id, &rows, |evaluator| {
            roles
                .iter()
                .find(|(id, _)| *id == evaluator)
                .map(|(_, role)| *role)
        });

        let mut record = FinalScore::new(
            employee.id,
            employee.department_id,
            period.clone(),
            scores.department_leader,
            scores.project_leader,
            scores.self_score,
            weighted_final(
                scores.department_leader,
                scores.project_leader,
                scores.self_score,
            ),
        );
        if let Some(existing) = self.repository.final_score(employee.id, period)? {
            record.id = existing.id;
            record.set_rank(existing.rank());
        }
        Ok(record)
    }

    fn require_department(&self, department: DepartmentId) -> Result<(), ReviewError> {
        match self.repository.department(department)? {
            Some(_) => Ok(()),
            None => Err(ReviewError::not_found(department.to_string())),
        }
    }
}
