use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::review::domain::{
    Assessment, Department, DepartmentId, Employee, EmployeeId, EmployeeRelation, EmployeeRole,
    FinalScore, Indicator, IndicatorDraft, IndicatorKind, NewDepartment, NewEmployee, NewProject,
    Period, Project, RelationRole, ScoreSheet,
};
use crate::review::relations::RelationInput;
use crate::review::repository::{
    AssessmentStore, DirectoryStore, FinalScoreStore, IndicatorStore, RelationStore,
    RepositoryError,
};
use crate::review::scoring::{AssessmentSubmission, WriteMode};
use crate::review::{review_router, InMemoryReviewStore, PerformanceReviewService};

pub(super) type MemoryService = PerformanceReviewService<InMemoryReviewStore>;

pub(super) fn period() -> Period {
    Period::parse("202403").expect("valid period")
}

pub(super) fn build_service() -> (MemoryService, Arc<InMemoryReviewStore>) {
    let store = Arc::new(InMemoryReviewStore::new());
    let service = PerformanceReviewService::new(store.clone());
    (service, store)
}

pub(super) fn department(service: &MemoryService, name: &str) -> Department {
    service
        .directory()
        .create_department(NewDepartment {
            name: name.to_string(),
            description: None,
        })
        .expect("department created")
}

pub(super) fn hire(
    service: &MemoryService,
    department: &Department,
    name: &str,
    role: EmployeeRole,
) -> Employee {
    service
        .directory()
        .create_employee(NewEmployee {
            name: name.to_string(),
            department_id: department.id,
            role,
            job_type: String::new(),
            position: String::new(),
            ip_address: None,
        })
        .expect("employee created")
}

pub(super) fn indicator(
    department: &Department,
    sequence: u32,
    kind: IndicatorKind,
    max_score: f64,
) -> IndicatorDraft {
    IndicatorDraft {
        department_id: department.id,
        sequence,
        kind,
        title: format!("item {sequence}"),
        content: String::new(),
        detail: String::new(),
        default_value: 0.0,
        min_score: 0.0,
        max_score,
    }
}

/// Base item 1 and penalty item 2.
pub(super) fn install_catalog(service: &MemoryService, department: &Department) {
    service
        .upsert_indicator(indicator(department, 1, IndicatorKind::Base, 100.0))
        .expect("base indicator");
    service
        .upsert_indicator(indicator(department, 2, IndicatorKind::Penalty, 15.0))
        .expect("penalty indicator");
}

pub(super) fn sheet(entries: &[(&str, f64)]) -> ScoreSheet {
    entries
        .iter()
        .map(|(key, value)| (key.to_string(), *value))
        .collect()
}

pub(super) fn submission(
    employee: &Employee,
    evaluator: &Employee,
    entries: &[(&str, f64)],
) -> AssessmentSubmission {
    AssessmentSubmission {
        employee_id: employee.id,
        evaluator_id: evaluator.id,
        period: period(),
        status: Default::default(),
        scores: sheet(entries),
        comment: None,
    }
}

pub(super) fn rate(
    service: &MemoryService,
    employee: &Employee,
    evaluator: &Employee,
    base: f64,
) -> Assessment {
    service
        .assessments()
        .submit(
            submission(employee, evaluator, &[("1", base)]),
            WriteMode::Upsert,
        )
        .expect("assessment stored")
}

pub(super) fn relate(
    service: &MemoryService,
    employee: &Employee,
    role: RelationRole,
    leaders: &[&str],
) -> EmployeeRelation {
    service
        .relations()
        .set_relation(RelationInput {
            period: period(),
            employee_id: employee.id,
            role,
            leader_names: leaders.iter().map(|name| name.to_string()).collect(),
            project_names: vec!["Atlas".to_string()],
            attributes: Vec::new(),
        })
        .expect("relation stored")
}

pub(super) fn stored_relation(store: &InMemoryReviewStore, employee: &Employee) -> EmployeeRelation {
    store
        .relation(employee.id, &period())
        .expect("read relation")
        .expect("relation present")
}

pub(super) fn assert_relation_invariant(relations: &[EmployeeRelation]) {
    for relation in relations {
        let free = relation.role == RelationRole::FreePerson;
        assert_eq!(
            free,
            relation.leaders.is_empty(),
            "{} breaks free_person <=> no leaders",
            relation.employee_id
        );
        assert_eq!(free, relation.leader_count() == 0);
        assert_eq!(relation.leaders.is_empty(), relation.leaders.joined().is_empty());
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn router_with_service(service: MemoryService) -> axum::Router {
    review_router(Arc::new(service))
}

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

pub(super) struct UnavailableRepository;

impl DirectoryStore for UnavailableRepository {
    fn insert_department(&self, _department: NewDepartment) -> Result<Department, RepositoryError> {
        offline()
    }

    fn department(&self, _id: DepartmentId) -> Result<Option<Department>, RepositoryError> {
        offline()
    }

    fn departments(&self) -> Result<Vec<Department>, RepositoryError> {
        offline()
    }

    fn insert_employee(&self, _employee: NewEmployee) -> Result<Employee, RepositoryError> {
        offline()
    }

    fn employee(&self, _id: EmployeeId) -> Result<Option<Employee>, RepositoryError> {
        offline()
    }

    fn employee_by_name(&self, _name: &str) -> Result<Option<Employee>, RepositoryError> {
        offline()
    }

    fn employees(&self) -> Result<Vec<Employee>, RepositoryError> {
        offline()
    }

    fn insert_project(&self, _project: NewProject) -> Result<Project, RepositoryError> {
        offline()
    }

    fn projects(&self) -> Result<Vec<Project>, RepositoryError> {
        offline()
    }
}

impl IndicatorStore for UnavailableRepository {
    fn upsert_indicator(&self, _draft: IndicatorDraft) -> Result<Indicator, RepositoryError> {
        offline()
    }

    fn indicators_for(&self, _department: DepartmentId) -> Result<Vec<Indicator>, RepositoryError> {
        offline()
    }
}

impl RelationStore for UnavailableRepository {
    fn relations_in(&self, _period: &Period) -> Result<Vec<EmployeeRelation>, RepositoryError> {
        offline()
    }

    fn relation(
        &self,
        _employee: EmployeeId,
        _period: &Period,
    ) -> Result<Option<EmployeeRelation>, RepositoryError> {
        offline()
    }

    fn save_relations(
        &self,
        _period: &Period,
        _relations: Vec<EmployeeRelation>,
    ) -> Result<Vec<EmployeeRelation>, RepositoryError> {
        offline()
    }

    fn update_relations<F, E>(&self, _period: &Period, _plan: F) -> Result<Vec<EmployeeRelation>, E>
    where
        F: FnOnce(&[EmployeeRelation]) -> Result<Vec<EmployeeRelation>, E>,
        E: From<RepositoryError>,
    {
        offline().map_err(E::from)
    }

    fn replace_relations(
        &self,
        _period: &Period,
        _relations: Vec<EmployeeRelation>,
    ) -> Result<Vec<EmployeeRelation>, RepositoryError> {
        offline()
    }
}

impl AssessmentStore for UnavailableRepository {
    fn assessment(
        &self,
        _employee: EmployeeId,
        _evaluator: EmployeeId,
        _period: &Period,
    ) -> Result<Option<Assessment>, RepositoryError> {
        offline()
    }

    fn insert_assessment(&self, _assessment: Assessment) -> Result<Assessment, RepositoryError> {
        offline()
    }

    fn save_assessments(
        &self,
        _assessments: Vec<Assessment>,
    ) -> Result<Vec<Assessment>, RepositoryError> {
        offline()
    }

    fn assessments_for(
        &self,
        _employee: EmployeeId,
        _period: &Period,
    ) -> Result<Vec<Assessment>, RepositoryError> {
        offline()
    }

    fn assessments_of(&self, _employee: EmployeeId) -> Result<Vec<Assessment>, RepositoryError> {
        offline()
    }

    fn assessments_in(&self, _period: &Period) -> Result<Vec<Assessment>, RepositoryError> {
        offline()
    }
}

impl FinalScoreStore for UnavailableRepository {
    fn final_score(
        &self,
        _employee: EmployeeId,
        _period: &Period,
    ) -> Result<Option<FinalScore>, RepositoryError> {
        offline()
    }

    fn save_final_scores(
        &self,
        _scores: Vec<FinalScore>,
    ) -> Result<Vec<FinalScore>, RepositoryError> {
        offline()
    }

    fn final_scores_in(
        &self,
        _department: DepartmentId,
        _period: &Period,
    ) -> Result<Vec<FinalScore>, RepositoryError> {
        offline()
    }

    fn final_scores_for_period(
        &self,
        _period: &Period,
    ) -> Result<Vec<FinalScore>, RepositoryError> {
        offline()
    }
}
