use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use taskwise_server::{app, config::Settings, state};
use tower::ServiceExt;

fn test_app() -> Router {
    let settings = Settings { dev_mode: true, ..Settings::default() };
    app(state::boot(settings).unwrap())
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn login(app: &Router) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": "dev", "password": "anything" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

async fn create_task(app: &Router, token: &str, body: Value) -> String {
    let (status, body) = send(app, Method::POST, "/api/tasks", Some(token), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["task"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_needs_no_token() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn api_requires_bearer_token() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/api/tasks", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = send(&app, Method::GET, "/api/tasks", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn dev_mode_starts_with_sample_task() {
    let app = test_app();
    let token = login(&app).await;

    let (status, body) = send(&app, Method::GET, "/api/tasks", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["tasks"][0]["title"], "Sample Task");
    assert_eq!(body["tasks"][0]["project_name"], "Sample Project");
}

#[tokio::test]
async fn replayed_client_token_creates_once() {
    let app = test_app();
    let token = login(&app).await;
    let payload = json!({ "title": "Pay invoices", "client_token": "abc-123" });

    let (first_status, first) =
        send(&app, Method::POST, "/api/tasks", Some(&token), Some(payload.clone())).await;
    let (second_status, second) =
        send(&app, Method::POST, "/api/tasks", Some(&token), Some(payload)).await;

    assert_eq!(first_status, StatusCode::CREATED);
    assert_eq!(second_status, StatusCode::OK);
    assert_eq!(first["task"]["id"], second["task"]["id"]);

    let (_, list) = send(&app, Method::GET, "/api/tasks", Some(&token), None).await;
    assert_eq!(list["count"], 2);
}

#[tokio::test]
async fn idempotency_header_is_honored() {
    let app = test_app();
    let token = login(&app).await;

    let request = || {
        Request::builder()
            .method(Method::POST)
            .uri("/api/tasks")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "application/json")
            .header("Idempotency-Key", "hdr-1")
            .body(Body::from(json!({ "title": "Header keyed" }).to_string()))
            .unwrap()
    };
    let first = app.clone().oneshot(request()).await.unwrap();
    let second = app.clone().oneshot(request()).await.unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);
    assert_eq!(second.status(), StatusCode::OK);
}

#[tokio::test]
async fn validation_errors_use_the_envelope() {
    let app = test_app();
    let token = login(&app).await;

    let (status, body) =
        send(&app, Method::POST, "/api/tasks", Some(&token), Some(json!({ "title": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "success": false, "error": "Title is required" }));

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/tasks",
        Some(&token),
        Some(json!({ "title": "Bad", "progress": 150 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let missing = uuid::Uuid::new_v4();
    let (status, body) =
        send(&app, Method::GET, &format!("/api/tasks/{missing}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Task not found");
}

#[tokio::test]
async fn toggling_subtasks_updates_progress() {
    let app = test_app();
    let token = login(&app).await;
    let task_id = create_task(&app, &token, json!({ "title": "Ship release" })).await;

    let subtasks_uri = format!("/api/tasks/{task_id}/subtasks");
    let (status, first) =
        send(&app, Method::POST, &subtasks_uri, Some(&token), Some(json!({ "title": "Tag" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    send(&app, Method::POST, &subtasks_uri, Some(&token), Some(json!({ "title": "Publish" }))).await;

    let subtask_id = first["subtask"]["id"].as_str().unwrap();
    let (status, toggled) = send(
        &app,
        Method::PUT,
        &format!("/api/subtasks/{subtask_id}/toggle"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["subtask"]["completed"], true);
    assert_eq!(toggled["task_progress"], 50);

    let (_, task) = send(&app, Method::GET, &format!("/api/tasks/{task_id}"), Some(&token), None).await;
    assert_eq!(task["task"]["progress"], 50);
    assert_eq!(task["task"]["subtask_count"], 2);
    assert_eq!(task["task"]["completed_subtasks"], 1);
    assert_eq!(task["task"]["subtask_progress"], 50);
    // 0.4 * 50 + 0.3 * 50
    assert_eq!(task["task"]["calculated_progress"], 35);

    let (_, list) = send(&app, Method::GET, &subtasks_uri, Some(&token), None).await;
    assert_eq!(list["subtasks"][0]["title"], "Tag");
    assert_eq!(list["subtasks"][1]["title"], "Publish");
}

#[tokio::test]
async fn deleting_a_project_keeps_its_tasks() {
    let app = test_app();
    let token = login(&app).await;

    let (status, project) = send(
        &app,
        Method::POST,
        "/api/projects",
        Some(&token),
        Some(json!({ "name": "Website", "color": "#123abc" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let project_id = project["project"]["id"].as_str().unwrap().to_string();

    let task_id =
        create_task(&app, &token, json!({ "title": "Landing page", "project_id": project_id })).await;

    let (_, projects) = send(&app, Method::GET, "/api/projects", Some(&token), None).await;
    assert_eq!(projects["count"], 2);

    let (status, deleted) = send(
        &app,
        Method::DELETE,
        &format!("/api/projects/{project_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["detached_tasks"], 1);

    let (status, task) =
        send(&app, Method::GET, &format!("/api/tasks/{task_id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(task["task"]["project_id"], Value::Null);
    assert_eq!(task["task"]["project_color"], "#667eea");
}

#[tokio::test]
async fn completing_a_task_shows_in_stats() {
    let app = test_app();
    let token = login(&app).await;
    let task_id = create_task(&app, &token, json!({ "title": "Done soon", "progress": 20 })).await;

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/api/tasks/{task_id}/status"),
        Some(&token),
        Some(json!({ "status": "completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["task"]["progress"], 100);
    assert_eq!(body["task"]["status_progress"], 100);
    assert!(body["task"]["completed_at"].is_string());

    let (_, stats) = send(&app, Method::GET, "/api/stats", Some(&token), None).await;
    assert_eq!(stats["stats"]["total_tasks"], 2);
    assert_eq!(stats["stats"]["completed_tasks"], 1);
    assert_eq!(stats["stats"]["todo_tasks"], 1);
    assert_eq!(stats["stats"]["completion_rate"], 50.0);
}

#[tokio::test]
async fn timer_and_logged_time() {
    let app = test_app();
    let token = login(&app).await;
    let task_id =
        create_task(&app, &token, json!({ "title": "Tracked", "estimated_hours": 10.0 })).await;

    let start_uri = format!("/api/tasks/{task_id}/timer/start");
    let (status, _) = send(&app, Method::POST, &start_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, Method::POST, &start_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Timer is already running");

    let (status, stopped) = send(
        &app,
        Method::POST,
        &format!("/api/tasks/{task_id}/timer/stop"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stopped["task"]["is_tracking"], false);
    assert!(stopped["time_entry"]["id"].is_string());

    let (status, logged) = send(
        &app,
        Method::POST,
        &format!("/api/tasks/{task_id}/time_entries"),
        Some(&token),
        Some(json!({
            "start_time": "2026-01-05T09:00:00Z",
            "end_time": "2026-01-05T14:00:00Z",
            "description": "deep work",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(logged["time_entry"]["duration"], 5.0);

    let (_, entries) = send(
        &app,
        Method::GET,
        &format!("/api/tasks/{task_id}/time_entries"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(entries["time_entries"].as_array().unwrap().len(), 2);
    assert!(entries["total_time_spent"].as_f64().unwrap() >= 5.0);
}

#[tokio::test]
async fn dependency_cycles_are_rejected() {
    let app = test_app();
    let token = login(&app).await;
    let a = create_task(&app, &token, json!({ "title": "a" })).await;
    let b = create_task(&app, &token, json!({ "title": "b" })).await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/tasks/{b}/dependencies"),
        Some(&token),
        Some(json!({ "depends_on": a })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["task"]["dependencies"][0], a.as_str());

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/tasks/{a}/dependencies"),
        Some(&token),
        Some(json!({ "depends_on": b })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, a_view) = send(&app, Method::GET, &format!("/api/tasks/{a}"), Some(&token), None).await;
    assert_eq!(a_view["task"]["dependent_tasks"][0], b.as_str());

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/tasks/{b}/dependencies/{a}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn notifications_are_per_user() {
    let app = test_app();
    let token = login(&app).await;

    let (_, list) = send(&app, Method::GET, "/api/notifications", Some(&token), None).await;
    assert_eq!(list["notifications"].as_array().unwrap().len(), 2);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/notifications/mark_read",
        Some(&token),
        Some(json!({ "id": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/notifications/mark_read",
        Some(&token),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "id required");

    let (_, list) = send(&app, Method::GET, "/api/notifications", Some(&token), None).await;
    assert_eq!(list["notifications"][0]["read"], true);
}

#[tokio::test]
async fn activity_feed_is_newest_first() {
    let app = test_app();
    let token = login(&app).await;
    let task_id = create_task(&app, &token, json!({ "title": "Watched" })).await;
    send(&app, Method::DELETE, &format!("/api/tasks/{task_id}"), Some(&token), None).await;

    let (status, body) = send(&app, Method::GET, "/api/activity?limit=2", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let feed = body["activity"].as_array().unwrap();
    assert_eq!(feed.len(), 2);
    assert_eq!(feed[0]["kind"], "task_deleted");
    assert_eq!(feed[0]["title"], "Watched");
    assert_eq!(feed[0]["actor_name"], "dev");
    assert_eq!(feed[1]["kind"], "task_created");
}

#[tokio::test]
async fn register_then_login_in_dev_mode() {
    let app = test_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "username": "mira", "email": "mira@example.com", "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["username"], "mira");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "identifier": "mira@example.com", "password": "whatever" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "mira");
    let mira_id = body["user"]["id"].clone();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "username": "mira", "email": "mira@example.com", "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged in successfully");
    assert_eq!(body["user"]["id"], mira_id);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "username": "", "email": "x@y.z", "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "All fields are required");
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = test_app();
    let token = login(&app).await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/tasks")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bad_path_and_query_values_use_the_envelope() {
    let app = test_app();
    let token = login(&app).await;

    for uri in [
        "/api/tasks/not-a-uuid",
        "/api/tasks?status=bogus",
        "/api/tasks/recent?limit=-1",
        "/api/projects/42",
    ] {
        let (status, body) = send(&app, Method::GET, uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["success"], false, "{uri}");
        assert!(body["error"].is_string(), "{uri}");
    }
}
