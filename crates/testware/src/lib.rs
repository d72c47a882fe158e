pub mod setup;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, header};
use axum::response::Response;
use chrono::Utc;
use sqlx::SqlitePool;

use common::settings::Settings;
use common::token::{generate_api_token, hash_password};
use data::annotation::{Annotation, AnnotationBody, NewAnnotation};
use data::api_token::NewApiToken;
use data::document::{Document, NewDocument};
use data::label::{DEFAULT_BACKGROUND_COLOR, DEFAULT_TEXT_COLOR, Label, NewLabel};
use data::project::{NewProject, Project, ProjectType};
use data::user::{NewUser, User};
use repos::annotation::AnnotationRepo;
use repos::api_token::ApiTokenRepo;
use repos::document::DocumentRepo;
use repos::label::LabelRepo;
use repos::project::ProjectRepo;
use repos::user::UserRepo;

pub const TEST_PASSWORD: &str = "correct horse battery staple";

pub async fn create_test_user(pool: &SqlitePool, username: &str, is_admin: bool) -> User {
    let new_user = NewUser {
        username: username.to_string(),
        password_hash: hash_password(TEST_PASSWORD).expect("Failed to hash password"),
        is_admin,
    };

    let user_id = UserRepo::create(pool, new_user)
        .await
        .expect("Failed to insert test user");

    UserRepo::get_by_id(pool, user_id)
        .await
        .expect("Failed to retrieve created user")
        .expect("Created user not found")
}

/// Create a project with `members` as its users
pub async fn create_test_project(
    pool: &SqlitePool,
    name: &str,
    project_type: ProjectType,
    members: &[i64],
) -> Project {
    let new_project = NewProject {
        name: name.to_string(),
        description: format!("{name} description"),
        guideline: "Annotate carefully".to_string(),
        project_type,
        users: members.to_vec(),
    };

    let mut tx = pool.begin().await.expect("Failed to begin transaction");
    let project_id = ProjectRepo::create(&mut *tx, &new_project)
        .await
        .expect("Failed to insert test project");
    ProjectRepo::set_users(&mut *tx, project_id, members)
        .await
        .expect("Failed to add project members");
    tx.commit().await.expect("Failed to commit transaction");

    ProjectRepo::get_by_id(pool, project_id)
        .await
        .expect("Failed to retrieve created project")
        .expect("Created project not found")
}

pub async fn create_test_label(
    pool: &SqlitePool,
    project_id: i64,
    text: &str,
    shortcut: Option<&str>,
) -> Label {
    let new_label = NewLabel {
        text: text.to_string(),
        shortcut: shortcut.map(str::to_string),
        background_color: DEFAULT_BACKGROUND_COLOR.to_string(),
        text_color: DEFAULT_TEXT_COLOR.to_string(),
        project_id,
    };

    let label_id = LabelRepo::create(pool, new_label)
        .await
        .expect("Failed to insert test label");

    LabelRepo::get_by_id(pool, label_id)
        .await
        .expect("Failed to retrieve created label")
        .expect("Created label not found")
}

pub async fn create_test_document(pool: &SqlitePool, project_id: i64, text: &str) -> Document {
    let document_id = DocumentRepo::create(
        pool,
        NewDocument {
            text: text.to_string(),
            project_id,
        },
    )
    .await
    .expect("Failed to insert test document");

    DocumentRepo::get_by_id(pool, document_id)
        .await
        .expect("Failed to retrieve created document")
        .expect("Created document not found")
}

pub async fn create_test_annotation(
    pool: &SqlitePool,
    document_id: i64,
    user_id: i64,
    body: AnnotationBody,
) -> Annotation {
    let project_type = body.project_type();
    let annotation_id = AnnotationRepo::create(
        pool,
        NewAnnotation {
            document_id,
            user_id,
            prob: 0.0,
            manual: false,
            body,
        },
    )
    .await
    .expect("Failed to insert test annotation");

    AnnotationRepo::get_by_id(pool, project_type, annotation_id)
        .await
        .expect("Failed to retrieve created annotation")
        .expect("Created annotation not found")
}

/// Issue an API token for `user_id` and return the string clients send.
pub async fn create_test_token(pool: &SqlitePool, user_id: i64) -> String {
    let (token_id, token, token_hash) = generate_api_token().expect("Failed to generate token");

    let new_token = NewApiToken {
        description: "Test API token".to_string(),
        token_id: token_id.to_string(),
        token_hash,
        user_id,
        expires_at: Some(Utc::now().naive_utc() + chrono::Duration::days(1)),
    };

    ApiTokenRepo::create(pool, new_token)
        .await
        .expect("Failed to insert test API token");

    token
}

pub fn create_settings() -> Arc<Settings> {
    let mut settings = Settings::default();
    settings.auth.token_validity_in_minutes = Some(60);
    Arc::new(settings)
}

/// Build a request with an optional token and JSON body.
pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Token {token}"));
    }

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("Failed to build request"),
        None => builder.body(Body::empty()).expect("Failed to build request"),
    }
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body")
        .to_vec()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).expect("Response body is not JSON")
}
