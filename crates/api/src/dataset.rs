use axum::extract::{Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use common::AuthenticatedUser;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{error, info};

use crate::error::ApiError;
use crate::permissions::{is_admin_user, is_project_user};
use crate::state::AppState;
use data::annotation::AnnotationDetail;
use data::dataset::make_dataset;
use repos::annotation::AnnotationRepo;
use repos::document::DocumentRepo;

const CSV_FIELD: &str = "csv_file";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub result: String,
    pub count: usize,
}

// Headerless, rows may have any number of columns.
pub fn parse_csv(content: &[u8]) -> Result<Vec<String>, ApiError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content);

    let mut texts = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|err| {
            error!("Malformed CSV at row {}: {}", line + 1, err);
            match err.kind() {
                csv::ErrorKind::Utf8 { .. } => {
                    ApiError::BadRequest(format!("row {} is not valid UTF-8", line + 1))
                }
                _ => ApiError::BadRequest(format!("malformed CSV at row {}: {err}", line + 1)),
            }
        })?;

        if record.iter().all(str::is_empty) {
            continue;
        }
        texts.push(record.get(0).unwrap_or_default().to_string());
    }

    Ok(texts)
}

fn to_csv(rows: Vec<Vec<String>>) -> Result<Vec<u8>, ApiError> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(Vec::new());
    for row in rows {
        writer.write_record(&row).map_err(|err| {
            error!("Failed to write CSV row: {}", err);
            ApiError::InternalFailure()
        })?;
    }
    writer.into_inner().map_err(|err| {
        error!("Failed to flush CSV: {}", err);
        ApiError::InternalFailure()
    })
}

pub struct DatasetApi;

impl DatasetApi {
    pub async fn upload(
        State(state): State<AppState>,
        Extension(user): Extension<AuthenticatedUser>,
        Path(project_id): Path<i64>,
        mut multipart: Multipart,
    ) -> Result<impl IntoResponse, ApiError> {
        let project = {
            let mut conn = state.repo.acquire().await?;
            is_project_user(&mut *conn, project_id, &user).await?
        };
        is_admin_user(&user)?;

        let mut content = None;
        while let Some(field) = multipart.next_field().await.map_err(|err| {
            error!("Failed to read multipart field: {}", err);
            ApiError::BadRequest(format!("invalid multipart body: {}", err.body_text()))
        })? {
            if field.name() != Some(CSV_FIELD) {
                continue;
            }
            let bytes = field.bytes().await.map_err(|err| {
                error!("Failed to read {} field: {}", CSV_FIELD, err);
                ApiError::BadRequest(format!("failed to read {CSV_FIELD}: {}", err.body_text()))
            })?;
            content = Some(bytes);
        }

        let content = content
            .ok_or_else(|| ApiError::BadRequest(format!("missing field `{CSV_FIELD}`")))?;
        let texts = parse_csv(&content)?;
        if texts.is_empty() {
            return Err(ApiError::BadRequest("CSV file contains no rows".to_string()));
        }

        let mut tx = state.repo.begin().await?;
        let count = DocumentRepo::create_many(&mut *tx, project.id, texts)
            .await
            .map_err(|err| {
                error!("Failed to import documents into project {}: {}", project.id, err);
                ApiError::BadRequest(format!("failed to store documents: {err}"))
            })?;
        state.repo.end(tx).await?;

        info!(
            "User {} uploaded {} documents to project {}",
            user.username, count, project.id
        );
        Ok((
            StatusCode::CREATED,
            Json(UploadResponse {
                result: "ok".to_string(),
                count,
            }),
        ))
    }

    pub async fn download(
        State(state): State<AppState>,
        Extension(user): Extension<AuthenticatedUser>,
        Path(project_id): Path<i64>,
    ) -> Result<impl IntoResponse, ApiError> {
        let mut conn = state.repo.acquire().await?;
        let project = is_project_user(&mut *conn, project_id, &user).await?;

        let documents =
            DocumentRepo::get_annotated(&mut *conn, project.id, project.project_type).await?;
        let details =
            AnnotationRepo::get_details_by_project(&mut *conn, project.project_type, project.id)
                .await?;

        let mut by_document: HashMap<i64, Vec<&AnnotationDetail>> = HashMap::new();
        for detail in &details {
            by_document
                .entry(detail.annotation.document_id)
                .or_default()
                .push(detail);
        }

        let rows = documents
            .iter()
            .flat_map(|document| {
                let annotations = by_document
                    .get(&document.id)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                make_dataset(project.project_type, document, annotations)
            })
            .collect();
        let body = to_csv(rows)?;

        info!("User {} downloaded dataset of project {}", user.username, project.id);
        Ok((
            [
                (header::CONTENT_TYPE, "text/csv".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}.csv\"", project.export_filename()),
                ),
            ],
            body,
        ))
    }
}
