use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{
    DepartmentId, EmployeeId, IndicatorDraft, NewDepartment, NewEmployee, NewProject, Period,
};
use super::error::ReviewError;
use super::relations::{ImportRequest, RelationInput, RelationPatch};
use super::repository::ReviewRepository;
use super::scoring::{AssessmentSubmission, WriteMode};
use super::service::PerformanceReviewService;

type SharedService<R> = Arc<PerformanceReviewService<R>>;

/// HTTP endpoints over the review service.
pub fn review_router<R>(service: SharedService<R>) -> Router
where
    R: ReviewRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/departments",
            post(create_department_handler::<R>).get(list_departments_handler::<R>),
        )
        .route(
            "/api/v1/employees",
            post(create_employee_handler::<R>).get(list_employees_handler::<R>),
        )
        .route(
            "/api/v1/projects",
            post(create_project_handler::<R>).get(list_projects_handler::<R>),
        )
        .route("/api/v1/indicators", put(upsert_indicator_handler::<R>))
        .route(
            "/api/v1/indicators/:department_id",
            get(list_indicators_handler::<R>),
        )
        .route(
            "/api/v1/relations",
            get(list_relations_handler::<R>).post(set_relation_handler::<R>),
        )
        .route(
            "/api/v1/relations/import",
            post(import_relations_handler::<R>),
        )
        .route(
            "/api/v1/relations/statistics",
            get(relation_statistics_handler::<R>),
        )
        .route(
            "/api/v1/relations/:period/:employee_id",
            patch(update_relation_handler::<R>),
        )
        .route(
            "/api/v1/assessments",
            post(submit_assessment_handler::<R>).get(list_assessments_handler::<R>),
        )
        .route(
            "/api/v1/final-scores",
            get(list_final_scores_handler::<R>),
        )
        .route(
            "/api/v1/final-scores/distribution",
            get(distribution_handler::<R>),
        )
        .route(
            "/api/v1/final-scores/:period/aggregate",
            post(aggregate_period_handler::<R>),
        )
        .route(
            "/api/v1/final-scores/:period/employees/:employee_id",
            post(aggregate_employee_handler::<R>),
        )
        .route(
            "/api/v1/final-scores/:period/departments/:department_id/rerank",
            post(rerank_handler::<R>),
        )
        .with_state(service)
}

fn respond<T: Serialize>(status: StatusCode, result: Result<T, ReviewError>) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(error) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (error.status_code(), Json(payload)).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PeriodQuery {
    period: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FinalScoreQuery {
    period: String,
    department_id: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssessmentQuery {
    period: String,
    employee_id: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ModeQuery {
    #[serde(default)]
    mode: WriteMode,
}

pub(crate) async fn create_department_handler<R>(
    State(service): State<SharedService<R>>,
    Json(department): Json<NewDepartment>,
) -> Response
where
    R: ReviewRepository + 'static,
{
    respond(
        StatusCode::CREATED,
        service.directory().create_department(department),
    )
}

pub(crate) async fn list_departments_handler<R>(State(service): State<SharedService<R>>) -> Response
where
    R: ReviewRepository + 'static,
{
    respond(StatusCode::OK, service.directory().departments())
}

pub(crate) async fn create_employee_handler<R>(
    State(service): State<SharedService<R>>,
    Json(employee): Json<NewEmployee>,
) -> Response
where
    R: ReviewRepository + 'static,
{
    respond(StatusCode::CREATED, service.directory().create_employee(employee))
}

pub(crate) async fn list_employees_handler<R>(State(service): State<SharedService<R>>) -> Response
where
    R: ReviewRepository + 'static,
{
    respond(StatusCode::OK, service.directory().employees())
}

pub(crate) async fn create_project_handler<R>(
    State(service): State<SharedService<R>>,
    Json(project): Json<NewProject>,
) -> Response
where
    R: ReviewRepository + 'static,
{
    respond(StatusCode::CREATED, service.directory().create_project(project))
}

pub(crate) async fn list_projects_handler<R>(State(service): State<SharedService<R>>) -> Response
where
    R: ReviewRepository + 'static,
{
    respond(StatusCode::OK, service.directory().projects())
}

pub(crate) async fn list_indicators_handler<R>(
    State(service): State<SharedService<R>>,
    Path(department_id): Path<u64>,
) -> Response
where
    R: ReviewRepository + 'static,
{
    respond(
        StatusCode::OK,
        service.catalog().indicators_for(DepartmentId(department_id)),
    )
}

pub(crate) async fn upsert_indicator_handler<R>(
    State(service): State<SharedService<R>>,
    Json(draft): Json<IndicatorDraft>,
) -> Response
where
    R: ReviewRepository + 'static,
{
    respond(StatusCode::OK, service.upsert_indicator(draft))
}

pub(crate) async fn list_relations_handler<R>(
    State(service): State<SharedService<R>>,
    Query(query): Query<PeriodQuery>,
) -> Response
where
    R: ReviewRepository + 'static,
{
    let result =
        Period::parse(&query.period).and_then(|period| service.relations().relations(&period));
    respond(StatusCode::OK, result)
}

pub(crate) async fn set_relation_handler<R>(
    State(service): State<SharedService<R>>,
    Json(input): Json<RelationInput>,
) -> Response
where
    R: ReviewRepository + 'static,
{
    respond(StatusCode::OK, service.relations().set_relation(input))
}

pub(crate) async fn update_relation_handler<R>(
    State(service): State<SharedService<R>>,
    Path((period, employee_id)): Path<(String, u64)>,
    Json(patch): Json<RelationPatch>,
) -> Response
where
    R: ReviewRepository + 'static,
{
    let result = Period::parse(&period).and_then(|period| {
        service
            .relations()
            .update_relation(&period, EmployeeId(employee_id), patch)
    });
    respond(StatusCode::OK, result)
}

pub(crate) async fn import_relations_handler<R>(
    State(service): State<SharedService<R>>,
    Json(request): Json<ImportRequest>,
) -> Response
where
    R: ReviewRepository + 'static,
{
    respond(StatusCode::OK, service.relations().bulk_replace(request))
}

pub(crate) async fn relation_statistics_handler<R>(
    State(service): State<SharedService<R>>,
    Query(query): Query<PeriodQuery>,
) -> Response
where
    R: ReviewRepository + 'static,
{
    let result =
        Period::parse(&query.period).and_then(|period| service.relations().statistics(&period));
    respond(StatusCode::OK, result)
}

pub(crate) async fn submit_assessment_handler<R>(
    State(service): State<SharedService<R>>,
    Query(query): Query<ModeQuery>,
    Json(submission): Json<AssessmentSubmission>,
) -> Response
where
    R: ReviewRepository + 'static,
{
    let status = match query.mode {
        WriteMode::CreateOnly => StatusCode::CREATED,
        WriteMode::Upsert => StatusCode::OK,
    };
    respond(status, service.assessments().submit(submission, query.mode))
}

pub(crate) async fn list_assessments_handler<R>(
    State(service): State<SharedService<R>>,
    Query(query): Query<AssessmentQuery>,
) -> Response
where
    R: ReviewRepository + 'static,
{
    let result = Period::parse(&query.period).and_then(|period| {
        service
            .assessments()
            .assessments_for(EmployeeId(query.employee_id), &period)
    });
    respond(StatusCode::OK, result)
}

pub(crate) async fn list_final_scores_handler<R>(
    State(service): State<SharedService<R>>,
    Query(query): Query<FinalScoreQuery>,
) -> Response
where
    R: ReviewRepository + 'static,
{
    let result = Period::parse(&query.period).and_then(|period| {
        service
            .ranking()
            .final_scores(DepartmentId(query.department_id), &period)
    });
    respond(StatusCode::OK, result)
}

pub(crate) async fn distribution_handler<R>(
    State(service): State<SharedService<R>>,
    Query(query): Query<PeriodQuery>,
) -> Response
where
    R: ReviewRepository + 'static,
{
    let result =
        Period::parse(&query.period).and_then(|period| service.score_distribution(&period));
    respond(StatusCode::OK, result)
}

pub(crate) async fn aggregate_period_handler<R>(
    State(service): State<SharedService<R>>,
    Path(period): Path<String>,
) -> Response
where
    R: ReviewRepository + 'static,
{
    let result =
        Period::parse(&period).and_then(|period| service.ranking().aggregate_period(&period));
    respond(StatusCode::OK, result)
}

pub(crate) async fn aggregate_employee_handler<R>(
    State(service): State<SharedService<R>>,
    Path((period, employee_id)): Path<(String, u64)>,
) -> Response
where
    R: ReviewRepository + 'static,
{
    let result = Period::parse(&period)
        .and_then(|period| {
            service
                .ranking()
                .aggregate_ranked(EmployeeId(employee_id), &period)
        });
    respond(StatusCode::OK, result)
}

pub(crate) async fn rerank_handler<R>(
    State(service): State<SharedService<R>>,
    Path((period, department_id)): Path<(String, u64)>,
) -> Response
where
    R: ReviewRepository + 'static,
{
    let result = Period::parse(&period)
        .and_then(|period| service.ranking().rerank(DepartmentId(department_id), &period));
    respond(StatusCode::OK, result)
}
