use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::json;
use sqlx::SqlitePool;
use testware::setup::TestSetup;
use testware::{
    body_bytes, body_json, create_settings, create_test_annotation, create_test_document,
    create_test_label, create_test_project, create_test_token, create_test_user, json_request,
};
use tower::ServiceExt;
use tower_http::trace::TraceLayer;

use api::routes::routes;
use api::state::AppState;
use data::annotation::AnnotationBody;
use data::project::ProjectType;
use repos::Repo;
use repos::document::DocumentRepo;

const BOUNDARY: &str = "annotator-test-boundary";

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

fn upload_request(project_id: i64, token: &str, field: &str, content: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"data.csv\"\r\n\
             Content-Type: text/csv\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(format!("/api/projects/{project_id}/docs/upload"))
        .header(header::AUTHORIZATION, format!("Token {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_upload_csv(pool: SqlitePool) {
    let app = setup(&pool).await;
    let admin = create_test_user(&pool, "admin", true).await;
    let project = create_test_project(&pool, "Import", ProjectType::Seq2seq, &[admin.id]).await;
    let token = create_test_token(&pool, admin.id).await;

    let csv = "first document\n\"second, with comma\",ignored\n\nthird\n";
    let response = app
        .oneshot(upload_request(project.id, &token, "csv_file", csv.as_bytes()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await, json!({ "result": "ok", "count": 3 }));

    let texts: Vec<String> = DocumentRepo::get_by_project(
        &pool,
        project.id,
        project.project_type,
        Default::default(),
        None,
    )
    .await
    .unwrap()
    .into_iter()
    .map(|doc| doc.text)
    .collect();
    assert_eq!(texts, vec!["first document", "second, with comma", "third"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_upload_rejects_bad_input(pool: SqlitePool) {
    let app = setup(&pool).await;
    let admin = create_test_user(&pool, "admin", true).await;
    let alice = create_test_user(&pool, "alice", false).await;
    let project =
        create_test_project(&pool, "Import", ProjectType::Seq2seq, &[admin.id, alice.id]).await;
    let admin_token = create_test_token(&pool, admin.id).await;
    let alice_token = create_test_token(&pool, alice.id).await;

    // Invalid UTF-8 in the second row stores nothing
    let response = app
        .clone()
        .oneshot(upload_request(project.id, &admin_token, "csv_file", b"ok\n\xff\xfe\n"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["result"], "failed");

    let response = app
        .clone()
        .oneshot(upload_request(project.id, &admin_token, "file", b"text\n"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(upload_request(project.id, &alice_token, "csv_file", b"text\n"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    assert_eq!(DocumentRepo::count_for_project(&pool, project.id).await.unwrap(), 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_download_classification(pool: SqlitePool) {
    let app = setup(&pool).await;
    let alice = create_test_user(&pool, "alice", false).await;
    let project = create_test_project(
        &pool,
        "Movie Reviews",
        ProjectType::DocumentClassification,
        &[alice.id],
    )
    .await;
    let label = create_test_label(&pool, project.id, "positive", None).await;
    let document = create_test_document(&pool, project.id, "great, fun").await;
    create_test_document(&pool, project.id, "not annotated").await;
    create_test_annotation(
        &pool,
        document.id,
        alice.id,
        AnnotationBody::Label { label_id: label.id },
    )
    .await;
    let token = create_test_token(&pool, alice.id).await;

    let response = app
        .oneshot(json_request(
            "GET",
            &format!("/api/projects/{}/docs/download", project.id),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"movie_reviews.csv\""
    );

    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert_eq!(body, format!("{},\"great, fun\",positive,alice\n", document.id));
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_download_sequence_labeling(pool: SqlitePool) {
    let app = setup(&pool).await;
    let alice = create_test_user(&pool, "alice", false).await;
    let project = create_test_project(&pool, "NER", ProjectType::SequenceLabeling, &[alice.id]).await;
    let label = create_test_label(&pool, project.id, "PER", None).await;
    let document = create_test_document(&pool, project.id, "Bob ok").await;
    create_test_annotation(
        &pool,
        document.id,
        alice.id,
        AnnotationBody::Span {
            label_id: label.id,
            start_offset: 0,
            end_offset: 3,
        },
    )
    .await;
    let token = create_test_token(&pool, alice.id).await;

    let response = app
        .oneshot(json_request(
            "GET",
            &format!("/api/projects/{}/docs/download", project.id),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = String::from_utf8(body_bytes(response).await).unwrap();
    let tags: Vec<String> = body
        .lines()
        .map(|line| line.rsplit(',').next().unwrap().to_string())
        .collect();
    assert_eq!(tags, vec!["B-PER", "I-PER", "I-PER", "O", "O", "O"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_download_seq2seq(pool: SqlitePool) {
    let app = setup(&pool).await;
    let alice = create_test_user(&pool, "alice", false).await;
    let project = create_test_project(&pool, "En Fr", ProjectType::Seq2seq, &[alice.id]).await;
    let document = create_test_document(&pool, project.id, "Hello").await;
    create_test_document(&pool, project.id, "Goodbye").await;
    create_test_annotation(
        &pool,
        document.id,
        alice.id,
        AnnotationBody::Text {
            text: "Bonjour".to_string(),
        },
    )
    .await;
    let token = create_test_token(&pool, alice.id).await;

    let response = app
        .oneshot(json_request(
            "GET",
            &format!("/api/projects/{}/docs/download", project.id),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"en_fr.csv\""
    );

    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert_eq!(body, format!("{},Hello,Bonjour,alice\n", document.id));
}
