use axum::extract::{Path, State};
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use common::{AuthenticatedUser, QueryParams};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

use crate::error::{ApiError, ApiJson, ApiQuery};
use crate::permissions::{is_admin_user_and_write_only, is_project_user};
use crate::state::AppState;
use crate::utils::get_document;
use data::annotation::AnnotationView;
use data::document::{Document, NewDocument};
use repos::annotation::AnnotationRepo;
use repos::document::DocumentRepo;
use repos::label::LabelRepo;

#[derive(Debug, Default, Deserialize)]
pub struct DocumentsQuery {
    pub q: Option<String>,
    pub ordering: Option<String>,
    pub is_checked: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl DocumentsQuery {
    // `is_checked=true` selects documents nobody annotated yet.
    pub fn annotated(&self) -> Option<bool> {
        self.is_checked
            .as_deref()
            .filter(|value| !value.is_empty())
            .map(|value| value != "true")
    }

    pub fn params(&self) -> Result<QueryParams, ApiError> {
        QueryParams::default()
            .with_filter(self.q.clone())
            .with_ordering(self.ordering.as_deref().unwrap_or_default())
            .with_page(self.offset, self.limit)
            .ok_or_else(|| ApiError::BadRequest("offset and limit are out of range".to_string()))
    }
}

#[derive(Debug, Deserialize)]
pub struct DocumentRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct DocumentView {
    pub id: i64,
    pub text: String,
    pub annotations: Vec<AnnotationView>,
}

#[derive(Debug, Serialize)]
pub struct DocumentPage {
    pub count: i64,
    pub results: Vec<DocumentView>,
}

pub struct DocumentsApi;

impl DocumentsApi {
    pub async fn list(
        State(state): State<AppState>,
        Extension(user): Extension<AuthenticatedUser>,
        method: Method,
        Path(project_id): Path<i64>,
        ApiQuery(query): ApiQuery<DocumentsQuery>,
    ) -> Result<impl IntoResponse, ApiError> {
        let mut conn = state.repo.acquire().await?;
        let project = is_project_user(&mut *conn, project_id, &user).await?;
        is_admin_user_and_write_only(&method, &user)?;

        let params = query.params()?;
        let annotated = query.annotated();

        let count =
            DocumentRepo::count_by_project(&mut *conn, project.id, project.project_type, &params, annotated)
                .await?;
        let documents =
            DocumentRepo::get_by_project(&mut *conn, project.id, project.project_type, params, annotated)
                .await?;

        let document_ids: Vec<i64> = documents.iter().map(|d| d.id).collect();
        let labels = LabelRepo::get_by_project(&mut *conn, project.id).await?;
        let annotations = AnnotationRepo::get_by_documents_and_user(
            &mut *conn,
            project.project_type,
            &document_ids,
            user.id,
        )
        .await?;

        let mut by_document: HashMap<i64, Vec<AnnotationView>> = HashMap::new();
        for annotation in &annotations {
            by_document
                .entry(annotation.document_id)
                .or_default()
                .push(AnnotationView::new(annotation, &labels));
        }

        let results = documents
            .into_iter()
            .map(|document: Document| DocumentView {
                annotations: by_document.remove(&document.id).unwrap_or_default(),
                id: document.id,
                text: document.text,
            })
            .collect();

        Ok(Json(DocumentPage { count, results }))
    }

    pub async fn create(
        State(state): State<AppState>,
        Extension(user): Extension<AuthenticatedUser>,
        method: Method,
        Path(project_id): Path<i64>,
        ApiJson(request): ApiJson<DocumentRequest>,
    ) -> Result<impl IntoResponse, ApiError> {
        let mut conn = state.repo.acquire().await?;
        let project = is_project_user(&mut *conn, project_id, &user).await?;
        is_admin_user_and_write_only(&method, &user)?;

        let document_id = DocumentRepo::create(
            &mut *conn,
            NewDocument {
                text: request.text,
                project_id: project.id,
            },
        )
        .await?;
        let document = get_document(&mut *conn, project.id, document_id).await?;

        info!("User {} added document {} to project {}", user.username, document.id, project.id);
        Ok((
            StatusCode::CREATED,
            Json(DocumentView {
                id: document.id,
                text: document.text,
                annotations: Vec::new(),
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::SortOrder;

    #[test]
    fn test_is_checked_selects_annotation_state() {
        let query = |value: Option<&str>| DocumentsQuery {
            is_checked: value.map(str::to_string),
            ..Default::default()
        };

        assert_eq!(query(None).annotated(), None);
        assert_eq!(query(Some("")).annotated(), None);
        assert_eq!(query(Some("true")).annotated(), Some(false));
        assert_eq!(query(Some("false")).annotated(), Some(true));
        assert_eq!(query(Some("yes")).annotated(), Some(true));
    }

    #[test]
    fn test_query_params() {
        let query = DocumentsQuery {
            q: Some("cat".to_string()),
            ordering: Some("-created_at".to_string()),
            limit: Some(10),
            offset: Some(20),
            ..Default::default()
        };

        let params = query.params().unwrap();
        assert_eq!(params.filter.as_deref(), Some("cat"));
        assert_eq!(
            params.sorting.front(),
            Some(&("created_at".to_string(), SortOrder::Descending))
        );
        assert_eq!(params.range, Some(20..30));
    }
}
