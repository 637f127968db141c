use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::review::domain::{EmployeeRole, NewDepartment, RelationRole};
use crate::review::{review_router, PerformanceReviewService};

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("encode body")))
        .expect("request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

#[tokio::test]
async fn create_department_returns_created_then_conflict() {
    let (service, _) = build_service();
    let router = router_with_service(service);
    let payload = json!({"name": "Platform", "description": "core services"});

    let response = router
        .clone()
        .oneshot(json_request(Method::POST, "/api/v1/departments", payload.clone()))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["name"], "Platform");

    let duplicate = router
        .oneshot(json_request(Method::POST, "/api/v1/departments", payload))
        .await
        .expect("route executes");
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn create_department_handler_reports_storage_failure() {
    let service = Arc::new(PerformanceReviewService::new(Arc::new(UnavailableRepository)));

    let response = crate::review::router::create_department_handler::<UnavailableRepository>(
        State(service),
        axum::Json(NewDepartment {
            name: "Platform".to_string(),
            description: None,
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn malformed_period_is_unprocessable() {
    let (service, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(get("/api/v1/relations/statistics?period=2024-3"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert!(body["error"].as_str().expect("message").contains("YYYYMM"));
}

#[tokio::test]
async fn patch_route_cascades_role_changes() {
    let (service, store) = build_service();
    let dept = department(&service, "Platform");
    let lead = hire(&service, &dept, "Lead", EmployeeRole::ProjectLeader);
    let member = hire(&service, &dept, "Member", EmployeeRole::ProjectMember);
    relate(&service, &lead, RelationRole::ProjectLeader, &[]);
    relate(&service, &member, RelationRole::ProjectMember, &["Lead"]);
    let router = router_with_service(service);

    let uri = format!("/api/v1/relations/202403/{}", lead.id.0);
    let response = router
        .oneshot(json_request(
            Method::PATCH,
            &uri,
            json!({"role": "free_person"}),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["relation"]["role"], "free_person");
    assert_eq!(body["relation"]["leaders"], "");
    assert_eq!(body["cascaded"].as_array().map(Vec::len), Some(1));
    assert_eq!(stored_relation(&store, &member).role, RelationRole::FreePerson);
}

#[tokio::test]
async fn patch_route_rejects_promotion() {
    let (service, _) = build_service();
    let dept = department(&service, "Platform");
    let member = hire(&service, &dept, "Member", EmployeeRole::ProjectMember);
    relate(&service, &member, RelationRole::ProjectMember, &["Lead"]);
    let router = router_with_service(service);

    let uri = format!("/api/v1/relations/202403/{}", member.id.0);
    let response = router
        .oneshot(json_request(
            Method::PATCH,
            &uri,
            json!({"role": "project_leader"}),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn patch_route_for_unknown_employee_is_not_found() {
    let (service, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(json_request(
            Method::PATCH,
            "/api/v1/relations/202403/999",
            json!({"role": "free_person"}),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn import_route_returns_report() {
    let (service, _) = build_service();
    let dept = department(&service, "Platform");
    hire(&service, &dept, "Known", EmployeeRole::ProjectMember);
    let router = router_with_service(service);

    let response = router
        .oneshot(json_request(
            Method::POST,
            "/api/v1/relations/import",
            json!({
                "period": "202403",
                "relations": [
                    {"employee_name": "Known", "leader_names": ["Lead"], "role": "project_member"},
                    {"employee_name": "Ghost", "leader_names": [], "role": "free_person"}
                ]
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["created_count"], 1);
    assert_eq!(body["errors"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn assessment_route_scores_and_flags_duplicates() {
    let (service, _) = build_service();
    let dept = department(&service, "Platform");
    install_catalog(&service, &dept);
    let boss = hire(&service, &dept, "Boss", EmployeeRole::DepartmentLeader);
    let dev = hire(&service, &dept, "Dev", EmployeeRole::ProjectMember);
    let router = router_with_service(service);
    let payload = json!({
        "employee_id": dev.id,
        "evaluator_id": boss.id,
        "period": "202403",
        "scores": {"1": 90, "2": 10}
    });

    let created = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/assessments?mode=create",
            payload.clone(),
        ))
        .await
        .expect("route executes");
    assert_eq!(created.status(), StatusCode::CREATED);
    let body = read_json_body(created).await;
    assert_eq!(body["total_score"], 80.0);

    let duplicate = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/assessments?mode=create",
            payload.clone(),
        ))
        .await
        .expect("route executes");
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let upserted = router
        .oneshot(json_request(
            Method::POST,
            "/api/v1/assessments?mode=upsert",
            payload,
        ))
        .await
        .expect("route executes");
    assert_eq!(upserted.status(), StatusCode::OK);
}

#[tokio::test]
async fn final_score_routes_aggregate_and_list() {
    let (service, _) = build_service();
    let dept = department(&service, "Platform");
    install_catalog(&service, &dept);
    let boss = hire(&service, &dept, "Boss", EmployeeRole::DepartmentLeader);
    let dev = hire(&service, &dept, "Dev", EmployeeRole::ProjectMember);
    rate(&service, &dev, &boss, 84.0);
    let router = review_router(Arc::new(service));

    let aggregated = router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/v1/final-scores/202403/aggregate")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("route executes");
    assert_eq!(aggregated.status(), StatusCode::OK);

    let uri = format!("/api/v1/final-scores?period=202403&department_id={}", dept.id.0);
    let listed = router
        .clone()
        .oneshot(get(&uri))
        .await
        .expect("route executes");
    assert_eq!(listed.status(), StatusCode::OK);
    let body = read_json_body(listed).await;
    assert_eq!(body[0]["rank"], 1);
    assert_eq!(body[0]["final_score"], 42.0);

    let distribution = router
        .clone()
        .oneshot(get("/api/v1/final-scores/distribution?period=202403"))
        .await
        .expect("route executes");
    assert_eq!(distribution.status(), StatusCode::OK);
    let body = read_json_body(distribution).await;
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn single_employee_route_returns_a_ranked_row() {
    let (service, _) = build_service();
    let dept = department(&service, "Platform");
    install_catalog(&service, &dept);
    let boss = hire(&service, &dept, "Boss", EmployeeRole::DepartmentLeader);
    let top = hire(&service, &dept, "Top", EmployeeRole::ProjectMember);
    let low = hire(&service, &dept, "Low", EmployeeRole::ProjectMember);
    rate(&service, &top, &boss, 90.0);
    rate(&service, &low, &boss, 60.0);
    let router = review_router(Arc::new(service));

    for employee in [&low, &top] {
        let uri = format!("/api/v1/final-scores/202403/employees/{}", employee.id.0);
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri(uri)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
    }

    let uri = format!("/api/v1/final-scores?period=202403&department_id={}", dept.id.0);
    let listed = router.oneshot(get(&uri)).await.expect("route executes");
    let body = read_json_body(listed).await;
    assert_eq!(body[0]["employee_id"], top.id.0);
    assert_eq!(body[0]["rank"], 1);
    assert_eq!(body[1]["rank"], 2);
}
