use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{
    Assessment, AssessmentId, Department, DepartmentId, Employee, EmployeeId, EmployeeRelation,
    FinalScore, FinalScoreId, Indicator, IndicatorDraft, IndicatorId, NewDepartment, NewEmployee,
    NewProject, Period, Project, ProjectId, RelationId,
};
use super::repository::{
    AssessmentStore, DirectoryStore, FinalScoreStore, IndicatorStore, RelationStore,
    RepositoryError,
};

type AssessmentKey = (Period, EmployeeId, EmployeeId);

#[derive(Debug, Default)]
struct Tables {
    last_id: u64,
    departments: BTreeMap<DepartmentId, Department>,
    employees: BTreeMap<EmployeeId, Employee>,
    projects: BTreeMap<ProjectId, Project>,
    indicators: BTreeMap<(DepartmentId, u32), Indicator>,
    relations: BTreeMap<(Period, EmployeeId), EmployeeRelation>,
    assessments: BTreeMap<AssessmentKey, Assessment>,
    final_scores: BTreeMap<(Period, EmployeeId), FinalScore>,
}

impl Tables {
    fn next_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }

    fn require_employee(&self, id: EmployeeId) -> Result<(), RepositoryError> {
        if self.employees.contains_key(&id) {
            Ok(())
        } else {
            Err(RepositoryError::NotFound(id.to_string()))
        }
    }

    /// Checks a relation batch before anything is written.
    fn check_relation_batch(
        &self,
        period: &Period,
        relations: &[EmployeeRelation],
    ) -> Result<(), RepositoryError> {
        let mut seen = HashSet::new();
        for relation in relations {
            if &relation.period != period {
                return Err(RepositoryError::Conflict(format!(
                    "relation for {} belongs to period {}, not {}",
                    relation.employee_id, relation.period, period
                )));
            }
            self.require_employee(relation.employee_id)?;
            if !seen.insert(relation.employee_id) {
                return Err(RepositoryError::Conflict(format!(
                    "relation for {} in period {} appears twice",
                    relation.employee_id, period
                )));
            }
        }
        Ok(())
    }

    fn period_relations(&self, period: &Period) -> Vec<EmployeeRelation> {
        self.relations
            .values()
            .filter(|relation| &relation.period == period)
            .cloned()
            .collect()
    }

    fn upsert_relations(
        &mut self,
        period: &Period,
        relations: Vec<EmployeeRelation>,
    ) -> Result<Vec<EmployeeRelation>, RepositoryError> {
        self.check_relation_batch(period, &relations)?;

        let mut saved = Vec::with_capacity(relations.len());
        for mut relation in relations {
            let key = (period.clone(), relation.employee_id);
            relation.id = match self.relations.get(&key).and_then(|existing| existing.id) {
                Some(id) => Some(id),
                None => Some(RelationId(self.next_id())),
            };
            self.relations.insert(key, relation.clone());
            saved.push(relation);
        }
        Ok(saved)
    }
}

/// Mutex-guarded store; every trait call is a single critical section, so batch writes are
/// all-or-nothing.
#[derive(Debug, Default, Clone)]
pub struct InMemoryReviewStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryReviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store lock poisoned".to_string()))
    }
}

impl DirectoryStore for InMemoryReviewStore {
    fn insert_department(&self, department: NewDepartment) -> Result<Department, RepositoryError> {
        let mut tables = self.tables()?;
        let name = department.name.trim().to_string();
        if tables.departments.values().any(|existing| existing.name == name) {
            return Err(RepositoryError::Conflict(format!("department '{name}'")));
        }

        let id = DepartmentId(tables.next_id());
        let record = Department {
            id,
            name,
            description: department.description,
        };
        tables.departments.insert(id, record.clone());
        Ok(record)
    }

    fn department(&self, id: DepartmentId) -> Result<Option<Department>, RepositoryError> {
        Ok(self.tables()?.departments.get(&id).cloned())
    }

    fn departments(&self) -> Result<Vec<Department>, RepositoryError> {
        Ok(self.tables()?.departments.values().cloned().collect())
    }

    fn insert_employee(&self, employee: NewEmployee) -> Result<Employee, RepositoryError> {
        let mut tables = self.tables()?;
        if !tables.departments.contains_key(&employee.department_id) {
            return Err(RepositoryError::NotFound(employee.department_id.to_string()));
        }

        let id = EmployeeId(tables.next_id());
        let record = Employee {
            id,
            name: employee.name.trim().to_string(),
            department_id: employee.department_id,
            role: employee.role,
            job_type: employee.job_type,
            position: employee.position,
            ip_address: employee.ip_address,
        };
        tables.employees.insert(id, record.clone());
        Ok(record)
    }

    fn employee(&self, id: EmployeeId) -> Result<Option<Employee>, RepositoryError> {
        Ok(self.tables()?.employees.get(&id).cloned())
    }

    fn employee_by_name(&self, name: &str) -> Result<Option<Employee>, RepositoryError> {
        let name = name.trim();
        Ok(self
            .tables()?
            .employees
            .values()
            .find(|employee| employee.name == name)
            .cloned())
    }

    fn employees(&self) -> Result<Vec<Employee>, RepositoryError> {
        Ok(self.tables()?.employees.values().cloned().collect())
    }

    fn insert_project(&self, project: NewProject) -> Result<Project, RepositoryError> {
        let mut tables = self.tables()?;
        let name = project.name.trim().to_string();
        if tables.projects.values().any(|existing| existing.name == name) {
            return Err(RepositoryError::Conflict(format!("project '{name}'")));
        }

        let id = ProjectId(tables.next_id());
        let record = Project {
            id,
            name,
            description: project.description,
        };
        tables.projects.insert(id, record.clone());
        Ok(record)
    }

    fn projects(&self) -> Result<Vec<Project>, RepositoryError> {
        Ok(self.tables()?.projects.values().cloned().collect())
    }
}

impl IndicatorStore for InMemoryReviewStore {
    fn upsert_indicator(&self, draft: IndicatorDraft) -> Result<Indicator, RepositoryError> {
        let mut tables = self.tables()?;
        if !tables.departments.contains_key(&draft.department_id) {
            return Err(RepositoryError::NotFound(draft.department_id.to_string()));
        }

        let key = (draft.department_id, draft.sequence);
        let id = match tables.indicators.get(&key) {
            Some(existing) => existing.id,
            None => IndicatorId(tables.next_id()),
        };
        let record = Indicator::from_draft(id, draft);
        tables.indicators.insert(key, record.clone());
        Ok(record)
    }

    fn indicators_for(&self, department: DepartmentId) -> Result<Vec<Indicator>, RepositoryError> {
        Ok(self
            .tables()?
            .indicators
            .range((department, u32::MIN)..=(department, u32::MAX))
            .map(|(_, indicator)| indicator.clone())
            .collect())
    }
}

impl RelationStore for InMemoryReviewStore {
    fn relations_in(&self, period: &Period) -> Result<Vec<EmployeeRelation>, RepositoryError> {
        Ok(self.tables()?.period_relations(period))
    }

    fn relation(
        &self,
        employee: EmployeeId,
        period: &Period,
    ) -> Result<Option<EmployeeRelation>, RepositoryError> {
        Ok(self
            .tables()?
            .relations
            .get(&(period.clone(), employee))
            .cloned())
    }

    fn save_relations(
        &self,
        period: &Period,
        relations: Vec<EmployeeRelation>,
    ) -> Result<Vec<EmployeeRelation>, RepositoryError> {
        self.tables()?.upsert_relations(period, relations)
    }

    fn update_relations<F, E>(&self, period: &Period, plan: F) -> Result<Vec<EmployeeRelation>, E>
    where
        F: FnOnce(&[EmployeeRelation]) -> Result<Vec<EmployeeRelation>, E>,
        E: From<RepositoryError>,
    {
        let mut tables = self.tables()?;
        let batch = plan(&tables.period_relations(period))?;
        Ok(tables.upsert_relations(period, batch)?)
    }

    fn replace_relations(
        &self,
        period: &Period,
        relations: Vec<EmployeeRelation>,
    ) -> Result<Vec<EmployeeRelation>, RepositoryError> {
        let mut tables = self.tables()?;
        tables.check_relation_batch(period, &relations)?;

        tables.relations.retain(|(stored, _), _| stored != period);
        let mut saved = Vec::with_capacity(relations.len());
        for mut relation in relations {
            relation.id = Some(RelationId(tables.next_id()));
            tables
                .relations
                .insert((period.clone(), relation.employee_id), relation.clone());
            saved.push(relation);
        }
        Ok(saved)
    }
}

impl AssessmentStore for InMemoryReviewStore {
    fn assessment(
        &self,
        employee: EmployeeId,
        evaluator: EmployeeId,
        period: &Period,
    ) -> Result<Option<Assessment>, RepositoryError> {
        Ok(self
            .tables()?
            .assessments
            .get(&(period.clone(), employee, evaluator))
            .cloned())
    }

    fn insert_assessment(&self, mut assessment: Assessment) -> Result<Assessment, RepositoryError> {
        let mut tables = self.tables()?;
        tables.require_employee(assessment.employee_id)?;
        tables.require_employee(assessment.evaluator_id)?;

        let key = (
            assessment.period.clone(),
            assessment.employee_id,
            assessment.evaluator_id,
        );
        if tables.assessments.contains_key(&key) {
            return Err(RepositoryError::Conflict(format!(
                "assessment of {} by {} in period {}",
                assessment.employee_id, assessment.evaluator_id, assessment.period
            )));
        }

        assessment.id = Some(AssessmentId(tables.next_id()));
        tables.assessments.insert(key, assessment.clone());
        Ok(assessment)
    }

    fn save_assessments(
        &self,
        assessments: Vec<Assessment>,
    ) -> Result<Vec<Assessment>, RepositoryError> {
        let mut tables = self.tables()?;
        let mut seen = HashSet::new();
        for assessment in &assessments {
            tables.require_employee(assessment.employee_id)?;
            tables.require_employee(assessment.evaluator_id)?;
            let key = (
                assessment.period.clone(),
                assessment.employee_id,
                assessment.evaluator_id,
            );
            if !seen.insert(key) {
                return Err(RepositoryError::Conflict(format!(
                    "assessment of {} by {} in period {} appears twice",
                    assessment.employee_id, assessment.evaluator_id, assessment.period
                )));
            }
        }

        let mut saved = Vec::with_capacity(assessments.len());
        for mut assessment in assessments {
            let key = (
                assessment.period.clone(),
                assessment.employee_id,
                assessment.evaluator_id,
            );
            assessment.id = match tables.assessments.get(&key).and_then(|existing| existing.id) {
                Some(id) => Some(id),
                None => Some(AssessmentId(tables.next_id())),
            };
            tables.assessments.insert(key, assessment.clone());
            saved.push(assessment);
        }
        Ok(saved)
    }

    fn assessments_for(
        &self,
        employee: EmployeeId,
        period: &Period,
    ) -> Result<Vec<Assessment>, RepositoryError> {
        Ok(self
            .tables()?
            .assessments
            .values()
            .filter(|assessment| assessment.employee_id == employee && &assessment.period == period)
            .cloned()
            .collect())
    }

    fn assessments_of(&self, employee: EmployeeId) -> Result<Vec<Assessment>, RepositoryError> {
        Ok(self
            .tables()?
            .assessments
            .values()
            .filter(|assessment| assessment.employee_id == employee)
            .cloned()
            .collect())
    }

    fn assessments_in(&self, period: &Period) -> Result<Vec<Assessment>, RepositoryError> {
        Ok(self
            .tables()?
            .assessments
            .values()
            .filter(|assessment| &assessment.period == period)
            .cloned()
            .collect())
    }
}

impl FinalScoreStore for InMemoryReviewStore {
    fn final_score(
        &self,
        employee: EmployeeId,
        period: &Period,
    ) -> Result<Option<FinalScore>, RepositoryError> {
        Ok(self
            .tables()?
            .final_scores
            .get(&(period.clone(), employee))
            .cloned())
    }

    fn save_final_scores(
        &self,
        scores: Vec<FinalScore>,
    ) -> Result<Vec<FinalScore>, RepositoryError> {
        let mut tables = self.tables()?;
        let mut seen = HashSet::new();
        for score in &scores {
            tables.require_employee(score.employee_id)?;
            if !seen.insert((score.period.clone(), score.employee_id)) {
                return Err(RepositoryError::Conflict(format!(
                    "final score of {} in period {} appears twice",
                    score.employee_id, score.period
                )));
            }
        }

        let mut saved = Vec::with_capacity(scores.len());
        for mut score in scores {
            let key = (score.period.clone(), score.employee_id);
            score.id = match tables.final_scores.get(&key).and_then(|existing| existing.id) {
                Some(id) => Some(id),
                None => Some(FinalScoreId(tables.next_id())),
            };
            tables.final_scores.insert(key, score.clone());
            saved.push(score);
        }
        Ok(saved)
    }

    fn final_scores_in(
        &self,
        department: DepartmentId,
        period: &Period,
    ) -> Result<Vec<FinalScore>, RepositoryError> {
        Ok(self
            .tables()?
            .final_scores
            .values()
            .filter(|score| score.department_id == department && &score.period == period)
            .cloned()
            .collect())
    }

    fn final_scores_for_period(
        &self,
        period: &Period,
    ) -> Result<Vec<FinalScore>, RepositoryError> {
        let mut scores: Vec<FinalScore> = self
            .tables()?
            .final_scores
            .values()
            .filter(|score| &score.period == period)
            .cloned()
            .collect();
        scores.sort_by_key(|score| (score.department_id, score.employee_id));
        Ok(scores)
    }
}
