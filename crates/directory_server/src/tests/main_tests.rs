use super::*;
use axum::{
    body::{self, Body},
    http::Request,
};
use shared::domain::{Department, EmployeeStatus};
use tower::ServiceExt;

fn test_app() -> (Router, Arc<Directory>) {
    let directory = Arc::new(Directory::new());
    let app = build_router(AppState {
        directory: Arc::clone(&directory),
    });
    (app, directory)
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn ada() -> serde_json::Value {
    serde_json::json!({
        "name": "Ada Lovelace",
        "email": "ada@example.com",
        "department": "Engineering",
        "role": "Analyst"
    })
}

async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

#[tokio::test]
async fn healthz_reports_ok() {
    let (app, _directory) = test_app();
    let response = app
        .oneshot(Request::get("/healthz").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(body.as_ref(), b"ok");
}

#[tokio::test]
async fn create_then_list_returns_created_record() {
    let (app, _directory) = test_app();

    let response = app
        .clone()
        .oneshot(json_request("POST", "/employees", ada()))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Employee = read_json(response).await;
    assert_eq!(created.department, Department::Engineering);
    assert_eq!(created.status, Some(EmployeeStatus::Active));

    let response = app
        .oneshot(Request::get("/employees").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let listed: Vec<Employee> = read_json(response).await;
    assert_eq!(listed, vec![created]);
}

#[tokio::test]
async fn invalid_create_is_a_bad_request_with_error_body() {
    let (app, directory) = test_app();
    let mut body = ada();
    body["email"] = serde_json::json!("not-an-email");

    let response = app
        .oneshot(json_request("POST", "/employees", body))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let err: ApiError = read_json(response).await;
    assert_eq!(err.code, ErrorCode::Validation);
    assert!(directory.list().await.is_empty());
}

#[tokio::test]
async fn duplicate_create_conflicts() {
    let (app, _directory) = test_app();
    let first = app
        .clone()
        .oneshot(json_request("POST", "/employees", ada()))
        .await
        .expect("response");
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app
        .oneshot(json_request("POST", "/employees", ada()))
        .await
        .expect("response");
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let err: ApiError = read_json(second).await;
    assert_eq!(err.code, ErrorCode::Conflict);
}

#[tokio::test]
async fn update_routes_by_percent_encoded_email() {
    let (app, directory) = test_app();
    let mut body = ada();
    body["email"] = serde_json::json!("ada+work@example.com");
    app.clone()
        .oneshot(json_request("POST", "/employees", body.clone()))
        .await
        .expect("response");

    body["role"] = serde_json::json!("Countess");
    let response = app
        .oneshot(json_request(
            "PUT",
            "/employees/ada%2Bwork%40example.com",
            body,
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let updated: Employee = read_json(response).await;
    assert_eq!(updated.role, "Countess");
    assert_eq!(directory.list().await, vec![updated]);
}

#[tokio::test]
async fn delete_returns_no_content_then_not_found() {
    let (app, directory) = test_app();
    app.clone()
        .oneshot(json_request("POST", "/employees", ada()))
        .await
        .expect("response");

    let response = app
        .clone()
        .oneshot(
            Request::delete("/employees/ada@example.com")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(directory.list().await.is_empty());

    let response = app
        .oneshot(
            Request::delete("/employees/ada@example.com")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let err: ApiError = read_json(response).await;
    assert_eq!(err.code, ErrorCode::NotFound);
}
