/// Integration tests for task visibility, field restrictions and referential checks

mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;
use uuid::Uuid;

fn id_of(task: &serde_json::Value) -> String {
    task["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_regular_user_sees_only_assigned_tasks() {
    let app = TestApp::new();
    let boss = app.seed_manager("Boss").await;
    let alice = app.seed_member("Alice").await;
    let bob = app.seed_member("Bob").await;

    let t1 = id_of(&app.create_task(&boss, "Write docs", alice.id()).await);
    let t2 = id_of(&app.create_task(&boss, "Fix build", bob.id()).await);
    let t3 = id_of(&app.create_task(&boss, "Review PR", alice.id()).await);

    let mut alice_tasks = app.task_ids(&alice.token).await;
    alice_tasks.sort();
    let mut expected = vec![t1.clone(), t3.clone()];
    expected.sort();
    assert_eq!(alice_tasks, expected);

    assert_eq!(app.task_ids(&bob.token).await, vec![t2.clone()]);

    let (status, body) = app.get("/api/tasks", &boss.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_list_is_empty_for_user_without_tasks() {
    let app = TestApp::new();
    let boss = app.seed_manager("Boss").await;
    let alice = app.seed_member("Alice").await;
    let bob = app.seed_member("Bob").await;
    app.create_task(&boss, "Write docs", alice.id()).await;

    let (status, body) = app.get("/api/tasks", &bob.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 0);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_list_by_status() {
    let app = TestApp::new();
    let boss = app.seed_manager("Boss").await;
    let alice = app.seed_member("Alice").await;
    let bob = app.seed_member("Bob").await;

    let t1 = id_of(&app.create_task(&boss, "Write docs", alice.id()).await);
    let t2 = id_of(&app.create_task(&boss, "Fix build", alice.id()).await);
    let t3 = id_of(&app.create_task(&boss, "Review PR", bob.id()).await);

    let (status, _) = app
        .put(&format!("/api/tasks/{}", t1), &alice.token, json!({ "status": "en cours" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .put(&format!("/api/tasks/{}", t3), &bob.token, json!({ "status": "en cours" }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.get("/api/tasks/status/en%20cours", &alice.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["id"], t1);

    let (_, body) = app.get("/api/tasks/status/%C3%A0%20faire", &alice.token).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["id"], t2);

    let (_, body) = app.get("/api/tasks/status/en%20cours", &boss.token).await;
    assert_eq!(body["count"], 2);

    let (_, body) = app.get("/api/tasks/status/termin%C3%A9e", &boss.token).await;
    assert_eq!(body["count"], 0);

    let (status, body) = app.get("/api/tasks/status/done", &boss.token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid status value");
}

#[tokio::test]
async fn test_get_task() {
    let app = TestApp::new();
    let boss = app.seed_manager("Boss").await;
    let alice = app.seed_member("Alice").await;
    let bob = app.seed_member("Bob").await;

    let task = id_of(&app.create_task(&boss, "Write docs", alice.id()).await);

    let (status, body) = app.get(&format!("/api/tasks/{}", task), &alice.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Write docs");

    let (status, body) = app.get(&format!("/api/tasks/{}", task), &bob.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);

    let (status, _) = app.get(&format!("/api/tasks/{}", task), &boss.token).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .get(&format!("/api/tasks/{}", Uuid::new_v4()), &alice.token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/api/tasks/not-a-uuid", &alice.token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_task_expands_references() {
    let app = TestApp::new();
    let boss = app.seed_manager("Boss").await;
    let alice = app.seed_member("Alice").await;

    let (status, body) = app
        .post(
            "/api/tasks",
            Some(&boss.token),
            json!({
                "title": "Write docs",
                "description": "User guide",
                "assignedTo": alice.id(),
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    let task = &body["data"];
    assert_eq!(task["status"], "à faire");
    assert_eq!(task["description"], "User guide");
    assert_eq!(
        task["assignedTo"],
        json!({ "id": alice.id(), "name": "Alice", "email": "alice@example.com" })
    );
    assert_eq!(
        task["createdBy"],
        json!({ "id": boss.id(), "name": "Boss", "email": "boss@example.com" })
    );
    assert!(task["createdAt"].is_string());
    assert!(task["updatedAt"].is_string());

    let (_, fetched) = app.get(&format!("/api/tasks/{}", id_of(task)), &alice.token).await;
    assert_eq!(fetched["data"], *task);
}

#[tokio::test]
async fn test_create_task_ignores_supplied_creator() {
    let app = TestApp::new();
    let boss = app.seed_manager("Boss").await;
    let alice = app.seed_member("Alice").await;

    let (status, body) = app
        .post(
            "/api/tasks",
            Some(&boss.token),
            json!({ "title": "T", "assignedTo": alice.id(), "createdBy": alice.id() }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["createdBy"]["id"], boss.id().to_string());
}

#[tokio::test]
async fn test_create_task_requires_manager() {
    let app = TestApp::new();
    let alice = app.seed_member("Alice").await;

    let (status, body) = app
        .post(
            "/api/tasks",
            Some(&alice.token),
            json!({ "title": "T", "assignedTo": alice.id() }),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
    assert!(app.task_ids(&alice.token).await.is_empty());
}

#[tokio::test]
async fn test_member_is_refused_before_input_is_parsed() {
    let app = TestApp::new();
    let alice = app.seed_member("Alice").await;

    let (status, body) = app
        .post(
            "/api/tasks",
            Some(&alice.token),
            json!({ "title": 5, "assignedTo": "x" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);

    let (status, _) = app.delete("/api/tasks/not-a-uuid", &alice.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_task_accepts_long_title() {
    let app = TestApp::new();
    let boss = app.seed_manager("Boss").await;
    let alice = app.seed_member("Alice").await;
    let title = "t".repeat(300);

    let (status, body) = app
        .post(
            "/api/tasks",
            Some(&boss.token),
            json!({ "title": &title, "assignedTo": alice.id() }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["title"], title.as_str());
}

#[tokio::test]
async fn test_create_task_with_missing_assignee() {
    let app = TestApp::new();
    let boss = app.seed_manager("Boss").await;

    let (status, body) = app
        .post(
            "/api/tasks",
            Some(&boss.token),
            json!({ "title": "T", "assignedTo": Uuid::new_v4() }),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
    assert!(app.task_ids(&boss.token).await.is_empty());
}

#[tokio::test]
async fn test_create_task_validation() {
    let app = TestApp::new();
    let boss = app.seed_manager("Boss").await;
    let alice = app.seed_member("Alice").await;

    let (status, _) = app
        .post("/api/tasks", Some(&boss.token), json!({ "assignedTo": alice.id() }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/api/tasks", Some(&boss.token), json!({ "title": "T" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            "/api/tasks",
            Some(&boss.token),
            json!({ "title": "T", "assignedTo": alice.id(), "status": "done" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(app.task_ids(&boss.token).await.is_empty());
}

#[tokio::test]
async fn test_assignee_updates_status_only() {
    let app = TestApp::new();
    let boss = app.seed_manager("Boss").await;
    let alice = app.seed_member("Alice").await;
    let task = id_of(&app.create_task(&boss, "Write docs", alice.id()).await);
    let uri = format!("/api/tasks/{}", task);

    let (status, body) = app.put(&uri, &alice.token, json!({ "status": "terminée" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "terminée");

    let (status, _) = app
        .put(&uri, &alice.token, json!({ "status": "en cours", "title": "Hijacked" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .put(&uri, &alice.token, json!({ "createdBy": alice.id() }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = app.get(&uri, &alice.token).await;
    assert_eq!(body["data"]["title"], "Write docs");
    assert_eq!(body["data"]["status"], "terminée");

    let (status, _) = app.put(&uri, &alice.token, json!({ "status": "bogus" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_non_assignee_cannot_update() {
    let app = TestApp::new();
    let boss = app.seed_manager("Boss").await;
    let alice = app.seed_member("Alice").await;
    let bob = app.seed_member("Bob").await;
    let task = id_of(&app.create_task(&boss, "Write docs", alice.id()).await);

    let (status, _) = app
        .put(&format!("/api/tasks/{}", task), &bob.token, json!({ "status": "en cours" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .put(
            &format!("/api/tasks/{}", Uuid::new_v4()),
            &bob.token,
            json!({ "status": "en cours" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_manager_updates_any_field() {
    let app = TestApp::new();
    let boss = app.seed_manager("Boss").await;
    let alice = app.seed_member("Alice").await;
    let bob = app.seed_member("Bob").await;
    let task = id_of(&app.create_task(&boss, "Write docs", alice.id()).await);
    let uri = format!("/api/tasks/{}", task);

    let (status, body) = app
        .put(
            &uri,
            &boss.token,
            json!({ "title": "Write guide", "description": null, "assignedTo": bob.id() }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Write guide");
    assert_eq!(body["data"]["assignedTo"]["id"], bob.id().to_string());

    assert!(app.task_ids(&alice.token).await.is_empty());
    assert_eq!(app.task_ids(&bob.token).await, vec![task]);
}

#[tokio::test]
async fn test_reassign_to_missing_user_leaves_task_unchanged() {
    let app = TestApp::new();
    let boss = app.seed_manager("Boss").await;
    let alice = app.seed_member("Alice").await;
    let task = id_of(&app.create_task(&boss, "Write docs", alice.id()).await);
    let uri = format!("/api/tasks/{}", task);

    let (status, body) = app
        .put(&uri, &boss.token, json!({ "title": "New", "assignedTo": Uuid::new_v4() }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Assigned user not found");

    let (_, body) = app.get(&uri, &boss.token).await;
    assert_eq!(body["data"]["title"], "Write docs");
    assert_eq!(body["data"]["assignedTo"]["id"], alice.id().to_string());
}

#[tokio::test]
async fn test_manager_update_rejects_bad_fields() {
    let app = TestApp::new();
    let boss = app.seed_manager("Boss").await;
    let alice = app.seed_member("Alice").await;
    let task = id_of(&app.create_task(&boss, "Write docs", alice.id()).await);
    let uri = format!("/api/tasks/{}", task);

    let (status, _) = app.put(&uri, &boss.token, json!({ "priority": "high" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.put(&uri, &boss.token, json!({ "status": "done" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.put(&uri, &boss.token, json!({ "title": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.get(&uri, &boss.token).await;
    assert_eq!(body["data"]["title"], "Write docs");
    assert_eq!(body["data"]["status"], "à faire");
}

#[tokio::test]
async fn test_delete_task() {
    let app = TestApp::new();
    let boss = app.seed_manager("Boss").await;
    let alice = app.seed_member("Alice").await;
    let task = id_of(&app.create_task(&boss, "Write docs", alice.id()).await);
    let uri = format!("/api/tasks/{}", task);

    let (status, _) = app.delete(&uri, &alice.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(app.task_ids(&alice.token).await, vec![task]);

    let (status, body) = app.delete(&uri, &boss.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "data": {} }));

    let (status, _) = app.delete(&uri, &boss.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get(&uri, &boss.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_demotion_takes_effect_immediately() {
    let app = TestApp::new();
    let boss = app.seed_manager("Boss").await;
    let deputy = app.seed_manager("Deputy").await;

    let (status, _) = app
        .put(
            &format!("/api/users/{}", deputy.id()),
            &boss.token,
            json!({ "role": "user" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(
            "/api/tasks",
            Some(&deputy.token),
            json!({ "title": "T", "assignedTo": deputy.id() }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_task_routes_require_token() {
    let app = TestApp::new();

    let (status, body) = app
        .request(axum::http::Method::GET, "/api/tasks", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}
