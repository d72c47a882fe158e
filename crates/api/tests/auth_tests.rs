use axum::{Router, http::StatusCode};
use serde_json::json;
use sqlx::SqlitePool;
use testware::setup::TestSetup;
use testware::{
    TEST_PASSWORD, body_json, create_settings, create_test_token, create_test_user, json_request,
};
use tower::ServiceExt;
use tower_http::trace::TraceLayer;

use api::routes::routes;
use api::state::AppState;
use repos::Repo;
use repos::user::UserRepo;

async fn setup(pool: &SqlitePool) -> Router {
    TestSetup::init();

    let state = AppState {
        repo: Repo::new(pool.clone()),
        settings: create_settings(),
    };

    Router::new()
        .nest("/api", routes(state.clone()).await)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_login_returns_usable_token(pool: SqlitePool) {
    let app = setup(&pool).await;
    let alice = create_test_user(&pool, "alice", false).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "username": "alice", "password": TEST_PASSWORD })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let token = body["token"].as_str().unwrap().to_string();

    let response = app
        .oneshot(json_request("GET", "/api/projects", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let user = UserRepo::get_by_id(&pool, alice.id).await.unwrap().unwrap();
    assert!(user.last_login_at.is_some());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_login_wrong_password(pool: SqlitePool) {
    let app = setup(&pool).await;
    create_test_user(&pool, "alice", false).await;

    for (username, password) in [("alice", "wrong"), ("nobody", TEST_PASSWORD)] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({ "username": username, "password": password })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["result"], "failed");
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_requests_without_token_are_rejected(pool: SqlitePool) {
    let app = setup(&pool).await;

    for token in [None, Some("garbage")] {
        let response = app
            .clone()
            .oneshot(json_request("GET", "/api/projects", token, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_logout_revokes_token(pool: SqlitePool) {
    let app = setup(&pool).await;
    let alice = create_test_user(&pool, "alice", false).await;
    let token = create_test_token(&pool, alice.id).await;

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/auth/logout", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(json_request("GET", "/api/projects", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_users_are_admin_only(pool: SqlitePool) {
    let app = setup(&pool).await;
    let alice = create_test_user(&pool, "alice", false).await;
    let token = create_test_token(&pool, alice.id).await;

    let response = app
        .clone()
        .oneshot(json_request("GET", "/api/users", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/users",
            Some(&token),
            Some(json!({ "username": "mallory", "password": "secret" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_admin_creates_user(pool: SqlitePool) {
    let app = setup(&pool).await;
    let admin = create_test_user(&pool, "admin", true).await;
    let token = create_test_token(&pool, admin.id).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/users",
            Some(&token),
            Some(json!({ "username": "bob", "password": "s3cret" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["username"], "bob");
    assert_eq!(body["is_admin"], false);
    assert!(body.get("password_hash").is_none());

    // Duplicate names are rejected
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/users",
            Some(&token),
            Some(json!({ "username": "bob", "password": "other" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "username": "bob", "password": "s3cret" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(json_request("GET", "/api/users", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}
