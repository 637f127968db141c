//! Storage seams for the review engine.
//!
//! Each trait method is one unit of atomicity: batch methods must apply every record or
//! none of them, and scoped unique keys are enforced by the store, not by callers.

use super::domain::{
    Assessment, Department, DepartmentId, Employee, EmployeeId, EmployeeRelation, FinalScore,
    Indicator, IndicatorDraft, NewDepartment, NewEmployee, NewProject, Period, Project,
};

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists: {0}")]
    Conflict(String),
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

pub trait DirectoryStore: Send + Sync {
    /// Department names are unique.
    fn insert_department(&self, department: NewDepartment) -> Result<Department, RepositoryError>;
    fn department(&self, id: DepartmentId) -> Result<Option<Department>, RepositoryError>;
    fn departments(&self) -> Result<Vec<Department>, RepositoryError>;
    /// Fails with `NotFound` when the department does not exist.
    fn insert_employee(&self, employee: NewEmployee) -> Result<Employee, RepositoryError>;
    fn employee(&self, id: EmployeeId) -> Result<Option<Employee>, RepositoryError>;
    /// Lowest id wins when several employees share a display name.
    fn employee_by_name(&self, name: &str) -> Result<Option<Employee>, RepositoryError>;
    /// Ordered by id.
    fn employees(&self) -> Result<Vec<Employee>, RepositoryError>;
    fn insert_project(&self, project: NewProject) -> Result<Project, RepositoryError>;
    fn projects(&self) -> Result<Vec<Project>, RepositoryError>;
}

pub trait IndicatorStore: Send + Sync {
    /// Upsert keyed by `(department, sequence)`.
    fn upsert_indicator(&self, draft: IndicatorDraft) -> Result<Indicator, RepositoryError>;
    /// Ordered by sequence.
    fn indicators_for(&self, department: DepartmentId) -> Result<Vec<Indicator>, RepositoryError>;
}

pub trait RelationStore: Send + Sync {
    /// Ordered by employee id.
    fn relations_in(&self, period: &Period) -> Result<Vec<EmployeeRelation>, RepositoryError>;
    fn relation(
        &self,
        employee: EmployeeId,
        period: &Period,
    ) -> Result<Option<EmployeeRelation>, RepositoryError>;
    /// Upserts every relation keyed by `(employee, period)` in one step.
    fn save_relations(
        &self,
        period: &Period,
        relations: Vec<EmployeeRelation>,
    ) -> Result<Vec<EmployeeRelation>, RepositoryError>;
    /// Hands the current period to `plan` and upserts the relations it returns, in one step.
    /// Concurrent writers to the period cannot interleave between the read and the write, and
    /// nothing is stored when `plan` fails.
    fn update_relations<F, E>(&self, period: &Period, plan: F) -> Result<Vec<EmployeeRelation>, E>
    where
        F: FnOnce(&[EmployeeRelation]) -> Result<Vec<EmployeeRelation>, E>,
        E: From<RepositoryError>;
    /// Drops the whole period and stores `relations` in its place, in one step.
    fn replace_relations(
        &self,
        period: &Period,
        relations: Vec<EmployeeRelation>,
    ) -> Result<Vec<EmployeeRelation>, RepositoryError>;
}

pub trait AssessmentStore: Send + Sync {
    fn assessment(
        &self,
        employee: EmployeeId,
        evaluator: EmployeeId,
        period: &Period,
    ) -> Result<Option<Assessment>, RepositoryError>;
    /// Fails with `Conflict` when `(employee, evaluator, period)` already exists.
    fn insert_assessment(&self, assessment: Assessment) -> Result<Assessment, RepositoryError>;
    /// Upserts every assessment in one step.
    fn save_assessments(
        &self,
        assessments: Vec<Assessment>,
    ) -> Result<Vec<Assessment>, RepositoryError>;
    /// Ordered by evaluator id.
    fn assessments_for(
        &self,
        employee: EmployeeId,
        period: &Period,
    ) -> Result<Vec<Assessment>, RepositoryError>;
    /// Every period, ordered by period then evaluator id.
    fn assessments_of(&self, employee: EmployeeId) -> Result<Vec<Assessment>, RepositoryError>;
    fn assessments_in(&self, period: &Period) -> Result<Vec<Assessment>, RepositoryError>;
}

pub trait FinalScoreStore: Send + Sync {
    fn final_score(
        &self,
        employee: EmployeeId,
        period: &Period,
    ) -> Result<Option<FinalScore>, RepositoryError>;
    /// Upserts every record keyed by `(employee, period)` in one step.
    fn save_final_scores(
        &self,
        scores: Vec<FinalScore>,
    ) -> Result<Vec<FinalScore>, RepositoryError>;
    /// Ordered by employee id.
    fn final_scores_in(
        &self,
        department: DepartmentId,
        period: &Period,
    ) -> Result<Vec<FinalScore>, RepositoryError>;
    /// Ordered by department then employee id.
    fn final_scores_for_period(&self, period: &Period)
        -> Result<Vec<FinalScore>, RepositoryError>;
}

/// Everything the review service needs from storage.
pub trait ReviewRepository:
    DirectoryStore + IndicatorStore + RelationStore + AssessmentStore + FinalScoreStore
{
}

impl<T> ReviewRepository for T where
    T: DirectoryStore + IndicatorStore + RelationStore + AssessmentStore + FinalScoreStore
{
}
