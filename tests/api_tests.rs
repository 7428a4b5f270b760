//! HTTP tests for the REST API, driving the router in-process.

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use project_tracker::config::CorsConfig;
use project_tracker::db::Database;
use project_tracker::server::{AppState, build_router};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

fn setup_app() -> (Router, Arc<Database>) {
    let db = Arc::new(Database::open_in_memory().expect("Failed to create in-memory database"));
    let app = build_router(AppState::new(Arc::clone(&db)), &CorsConfig::default());
    (app, db)
}

fn seeded_app() -> Router {
    let (app, db) = setup_app();
    db.seed_sample_data().expect("seed failed");
    app
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn create_project(app: &Router, name: &str) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/projects",
        Some(json!({
            "name": name,
            "startDate": "2025-01-01",
            "dueDate": "2025-06-30",
            "teamMembers": ["Ann"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

async fn create_task(app: &Router, project_id: &str, name: &str) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/tasks",
        Some(json!({"projectId": project_id, "name": name})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

async fn create_subtask(app: &Router, task_id: &str, name: &str) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/subtasks",
        Some(json!({"taskId": task_id, "name": name})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn health_reports_ok() {
        let (app, _) = setup_app();
        let (status, body) = send(&app, Method::GET, "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "OK");
        assert!(body["timestamp"].is_string());
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let (app, _) = setup_app();
        let (status, body) = send(&app, Method::GET, "/api/nothing-here", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "API endpoint not found");
        assert_eq!(body["code"], "ROUTE_NOT_FOUND");
    }
}

mod project_api_tests {
    use super::*;

    #[tokio::test]
    async fn create_and_fetch_project() {
        let (app, _) = setup_app();
        let created = create_project(&app, "Mobile App").await;
        assert_eq!(created["status"], "not-started");
        assert_eq!(created["priority"], "medium");
        assert_eq!(created["progress"], 0);
        assert_eq!(created["teamMembers"], json!(["Ann"]));
        assert_eq!(created["startDate"], "2025-01-01");

        let id = created["id"].as_str().unwrap();
        let (status, fetched) = send(&app, Method::GET, &format!("/api/projects/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["name"], "Mobile App");
        assert_eq!(fetched["tasks"], json!([]));

        let (status, list) = send(&app, Method::GET, "/api/projects", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_project_without_dates_is_400() {
        let (app, _) = setup_app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/projects",
            Some(json!({"name": "No dates"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "MISSING_REQUIRED_FIELD");
        assert_eq!(body["field"], "startDate");
    }

    #[tokio::test]
    async fn malformed_values_are_400() {
        let (app, _) = setup_app();

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/projects",
            Some(json!({"name": "X", "startDate": "01/02/2025", "dueDate": "2025-06-30"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_BODY");

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/projects",
            Some(json!({"name": "X", "startDate": "2025-01-01", "dueDate": "2025-06-30", "status": "paused"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_project_ignores_progress_in_payload() {
        let (app, _) = setup_app();
        let created = create_project(&app, "Original").await;
        let id = created["id"].as_str().unwrap();

        let (status, updated) = send(
            &app,
            Method::PUT,
            &format!("/api/projects/{}", id),
            Some(json!({"status": "on-hold", "progress": 90})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["status"], "on-hold");
        assert_eq!(updated["name"], "Original");
        assert_eq!(updated["progress"], 0);
    }

    #[tokio::test]
    async fn missing_project_is_404() {
        let (app, _) = setup_app();
        for method in [Method::GET, Method::DELETE] {
            let (status, body) = send(&app, method, "/api/projects/ghost", None).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body["code"], "PROJECT_NOT_FOUND");
        }
        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/projects/ghost",
            Some(json!({"name": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_project_cascades() {
        let (app, _) = setup_app();
        let project = create_project(&app, "Doomed").await;
        let pid = project["id"].as_str().unwrap();
        let task = create_task(&app, pid, "Task").await;
        let tid = task["id"].as_str().unwrap();
        let subtask = create_subtask(&app, tid, "Sub").await;
        let sid = subtask["id"].as_str().unwrap();

        let (status, body) = send(&app, Method::DELETE, &format!("/api/projects/{}", pid), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Project deleted successfully");

        let (status, _) = send(&app, Method::GET, &format!("/api/tasks/{}", tid), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, Method::GET, &format!("/api/subtasks/{}", sid), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

mod task_api_tests {
    use super::*;

    #[tokio::test]
    async fn create_task_requires_project_and_name() {
        let (app, _) = setup_app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/tasks",
            Some(json!({"name": "No project"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "projectId");

        let project = create_project(&app, "P").await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/tasks",
            Some(json!({"projectId": project["id"]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "name");
    }

    #[tokio::test]
    async fn create_task_for_unknown_project_is_404() {
        let (app, _) = setup_app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/tasks",
            Some(json!({"projectId": "ghost", "name": "Orphan"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "PROJECT_NOT_FOUND");
    }

    #[tokio::test]
    async fn list_tasks_by_project() {
        let app = seeded_app();
        let (status, tasks) = send(&app, Method::GET, "/api/tasks/project/proj-1", None).await;
        assert_eq!(status, StatusCode::OK);
        let tasks = tasks.as_array().unwrap();
        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[0]["id"], "task-1");
        assert_eq!(tasks[0]["subtasks"].as_array().unwrap().len(), 4);
        assert_eq!(tasks[0]["estimatedHours"], 40);

        let (status, tasks) = send(&app, Method::GET, "/api/tasks/project/ghost", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(tasks, json!([]));
    }

    #[tokio::test]
    async fn put_null_unassigns_and_clears_due_date() {
        let app = seeded_app();
        let (status, task) = send(
            &app,
            Method::PUT,
            "/api/tasks/task-3",
            Some(json!({"assignee": null, "dueDate": null})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(task["assignee"], Value::Null);
        assert_eq!(task["dueDate"], Value::Null);
        assert_eq!(task["estimatedHours"], 48);

        let (_, rows) = send(&app, Method::GET, "/api/dashboard/workload", None).await;
        let unassigned = rows
            .as_array()
            .unwrap()
            .iter()
            .find(|row| row["assignee"] == "Unassigned")
            .cloned()
            .unwrap();
        assert_eq!(unassigned["totalTasks"], 1);
    }

    #[tokio::test]
    async fn update_and_delete_task() {
        let app = seeded_app();
        let (status, task) = send(
            &app,
            Method::PUT,
            "/api/tasks/task-3",
            Some(json!({"status": "in-progress", "assignee": "Ann"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(task["status"], "in-progress");
        assert_eq!(task["name"], "Appointment Scheduling");

        let (status, body) = send(&app, Method::DELETE, "/api/tasks/task-2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Task deleted successfully");

        // proj-1 is left with task-1 (4/4) and task-3 (0/4).
        let (_, project) = send(&app, Method::GET, "/api/projects/proj-1", None).await;
        assert_eq!(project["progress"], 50);

        let (status, _) = send(&app, Method::DELETE, "/api/tasks/task-2", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

mod subtask_api_tests {
    use super::*;

    #[tokio::test]
    async fn toggle_returns_new_status_and_rolls_up() {
        let (app, _) = setup_app();
        let project = create_project(&app, "P").await;
        let pid = project["id"].as_str().unwrap();
        let task = create_task(&app, pid, "T").await;
        let tid = task["id"].as_str().unwrap();
        let first = create_subtask(&app, tid, "One").await;
        create_subtask(&app, tid, "Two").await;
        assert_eq!(first["status"], "pending");

        let uri = format!("/api/subtasks/{}/toggle", first["id"].as_str().unwrap());
        let (status, body) = send(&app, Method::PATCH, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["newStatus"], "completed");
        assert_eq!(body["subtask"]["status"], "completed");
        assert!(body["message"].is_string());

        let (_, project) = send(&app, Method::GET, &format!("/api/projects/{}", pid), None).await;
        assert_eq!(project["progress"], 50);

        let (_, body) = send(&app, Method::PATCH, &uri, None).await;
        assert_eq!(body["newStatus"], "pending");
        let (_, project) = send(&app, Method::GET, &format!("/api/projects/{}", pid), None).await;
        assert_eq!(project["progress"], 0);
    }

    #[tokio::test]
    async fn create_subtask_requires_existing_task() {
        let (app, _) = setup_app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/subtasks",
            Some(json!({"taskId": "ghost", "name": "Orphan"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "TASK_NOT_FOUND");

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/subtasks",
            Some(json!({"taskId": "ghost"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_and_delete_subtask() {
        let app = seeded_app();
        let (status, subtask) = send(
            &app,
            Method::PUT,
            "/api/subtasks/sub-6",
            Some(json!({"status": "completed", "notes": "bucket created"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(subtask["status"], "completed");
        assert_eq!(subtask["notes"], "bucket created");
        assert_eq!(subtask["name"], "Cloud storage integration");

        // proj-1: 6 of 12
        let (_, project) = send(&app, Method::GET, "/api/projects/proj-1", None).await;
        assert_eq!(project["progress"], 50);

        let (status, body) = send(&app, Method::DELETE, "/api/subtasks/sub-9", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Subtask deleted successfully");

        // 6 of 11 = 54.5
        let (_, project) = send(&app, Method::GET, "/api/projects/proj-1", None).await;
        assert_eq!(project["progress"], 55);
    }

    #[tokio::test]
    async fn toggle_missing_subtask_is_404() {
        let (app, _) = setup_app();
        let (status, body) = send(&app, Method::PATCH, "/api/subtasks/ghost/toggle", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "SUBTASK_NOT_FOUND");
    }
}

mod dashboard_api_tests {
    use super::*;

    #[tokio::test]
    async fn stats_count_projects() {
        let app = seeded_app();
        let (status, stats) = send(&app, Method::GET, "/api/dashboard/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["totalProjects"], 4);
        assert_eq!(stats["inProgress"], 2);
        assert_eq!(stats["completed"], 1);
        assert!(stats["overdue"].is_number());
    }

    #[tokio::test]
    async fn workload_lists_each_assignee() {
        let app = seeded_app();
        let (status, rows) = send(&app, Method::GET, "/api/dashboard/workload", None).await;
        assert_eq!(status, StatusCode::OK);
        let rows = rows.as_array().unwrap();
        assert_eq!(rows.len(), 8);
        assert_eq!(rows[0]["assignee"], "Alex Thompson");
        assert_eq!(rows[0]["openTasks"], 1);
        assert_eq!(rows[0]["estimatedHours"], 56);
    }

    #[tokio::test]
    async fn board_filters_by_project_query() {
        let app = seeded_app();
        let (status, board) = send(&app, Method::GET, "/api/board?projectId=proj-2", None).await;
        assert_eq!(status, StatusCode::OK);
        let columns = board.as_array().unwrap();
        assert_eq!(columns.len(), 5);
        assert_eq!(columns[0]["status"], "to-do");
        assert_eq!(columns[0]["cards"][0]["id"], "task-5");
        assert_eq!(columns[1]["cards"][0]["id"], "task-4");
        assert_eq!(columns[1]["cards"][0]["subtasksCompleted"], 1);
    }

    #[tokio::test]
    async fn html_report_is_served() {
        let app = seeded_app();
        let request = Request::builder()
            .uri("/api/reports/html")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
        assert!(content_type.starts_with("text/html"));

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("Healthplus Mobile App"));
        assert!(html.contains("Login UI Design"));
    }
}

mod cors_tests {
    use super::*;

    #[tokio::test]
    async fn configured_origin_is_allowed() {
        let (app, _) = setup_app();
        let request = Request::builder()
            .uri("/api/health")
            .header(header::ORIGIN, "http://localhost:5173")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:5173"
        );
    }

    #[tokio::test]
    async fn other_origins_get_no_cors_header() {
        let (app, _) = setup_app();
        let request = Request::builder()
            .uri("/api/health")
            .header(header::ORIGIN, "http://evil.example")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .is_none()
        );
    }
}

mod server_lifecycle_tests {
    use super::*;
    use project_tracker::server::start_server;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    #[tokio::test]
    async fn shutdown_handle_completes_after_serving() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let (shutdown_tx, addr, server) =
            start_server(AppState::new(db), "127.0.0.1:0", &CorsConfig::default())
                .await
                .unwrap();

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /api/health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        let response = String::from_utf8_lossy(&response);
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains("Project Management API is running"));

        shutdown_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("server did not stop")
            .unwrap();
    }
}
