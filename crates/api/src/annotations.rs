use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use common::AuthenticatedUser;
use sqlx::SqliteConnection;
use tracing::info;

use crate::error::{ApiError, ApiJson};
use crate::permissions::{is_own_annotation, is_project_user};
use crate::state::AppState;
use crate::utils::{get_document, get_label};
use data::annotation::{
    Annotation, AnnotationBody, AnnotationFields, AnnotationView, NewAnnotation,
};
use data::document::Document;
use data::project::Project;
use repos::annotation::AnnotationRepo;
use repos::label::LabelRepo;

pub struct AnnotationsApi;

impl AnnotationsApi {
    async fn validate(
        conn: &mut SqliteConnection,
        project: &Project,
        document: &Document,
        body: &AnnotationBody,
    ) -> Result<(), ApiError> {
        if let Some(label_id) = body.label_id() {
            get_label(&mut *conn, project.id, label_id).await?;
        }
        body.validate(document.char_len())?;
        Ok(())
    }

    async fn view(
        conn: &mut SqliteConnection,
        project: &Project,
        annotation: &Annotation,
    ) -> Result<AnnotationView, ApiError> {
        let labels = LabelRepo::get_by_project(&mut *conn, project.id).await?;
        Ok(AnnotationView::new(annotation, &labels))
    }

    async fn get_own(
        conn: &mut SqliteConnection,
        project: &Project,
        document: &Document,
        annotation_id: i64,
        user: &AuthenticatedUser,
    ) -> Result<Annotation, ApiError> {
        let annotation = AnnotationRepo::get_by_id(&mut *conn, project.project_type, annotation_id)
            .await?
            .filter(|annotation| annotation.document_id == document.id)
            .ok_or_else(|| ApiError::NotFound(format!("annotation {annotation_id}")))?;
        is_own_annotation(&annotation, user)?;
        Ok(annotation)
    }

    pub async fn list(
        State(state): State<AppState>,
        Extension(user): Extension<AuthenticatedUser>,
        Path((project_id, document_id)): Path<(i64, i64)>,
    ) -> Result<impl IntoResponse, ApiError> {
        let mut conn = state.repo.acquire().await?;
        let project = is_project_user(&mut *conn, project_id, &user).await?;
        let document = get_document(&mut *conn, project.id, document_id).await?;

        let annotations =
            AnnotationRepo::get_by_document(&mut *conn, project.project_type, document.id, None)
                .await?;
        let labels = LabelRepo::get_by_project(&mut *conn, project.id).await?;

        let views: Vec<AnnotationView> = annotations
            .iter()
            .map(|annotation| AnnotationView::new(annotation, &labels))
            .collect();
        Ok(Json(views))
    }

    pub async fn create(
        State(state): State<AppState>,
        Extension(user): Extension<AuthenticatedUser>,
        Path((project_id, document_id)): Path<(i64, i64)>,
        ApiJson(fields): ApiJson<AnnotationFields>,
    ) -> Result<impl IntoResponse, ApiError> {
        let mut conn = state.repo.acquire().await?;
        let project = is_project_user(&mut *conn, project_id, &user).await?;
        let document = get_document(&mut *conn, project.id, document_id).await?;

        let body = AnnotationBody::build(project.project_type, &fields)?;
        Self::validate(&mut conn, &project, &document, &body).await?;

        let annotation_id = AnnotationRepo::create(
            &mut *conn,
            NewAnnotation {
                document_id: document.id,
                user_id: user.id,
                prob: 0.0,
                manual: true,
                body,
            },
        )
        .await?;
        let annotation = Self::get_own(&mut conn, &project, &document, annotation_id, &user).await?;

        info!(
            "User {} annotated document {} in project {}",
            user.username, document.id, project.id
        );
        Ok((
            StatusCode::CREATED,
            Json(Self::view(&mut conn, &project, &annotation).await?),
        ))
    }

    pub async fn get(
        State(state): State<AppState>,
        Extension(user): Extension<AuthenticatedUser>,
        Path((project_id, document_id, annotation_id)): Path<(i64, i64, i64)>,
    ) -> Result<impl IntoResponse, ApiError> {
        let mut conn = state.repo.acquire().await?;
        let project = is_project_user(&mut *conn, project_id, &user).await?;
        let document = get_document(&mut *conn, project.id, document_id).await?;
        let annotation = Self::get_own(&mut conn, &project, &document, annotation_id, &user).await?;

        Ok(Json(Self::view(&mut conn, &project, &annotation).await?))
    }

    pub async fn update(
        State(state): State<AppState>,
        Extension(user): Extension<AuthenticatedUser>,
        Path((project_id, document_id, annotation_id)): Path<(i64, i64, i64)>,
        ApiJson(fields): ApiJson<AnnotationFields>,
    ) -> Result<impl IntoResponse, ApiError> {
        let mut conn = state.repo.acquire().await?;
        let project = is_project_user(&mut *conn, project_id, &user).await?;
        let document = get_document(&mut *conn, project.id, document_id).await?;
        let mut annotation =
            Self::get_own(&mut conn, &project, &document, annotation_id, &user).await?;

        annotation.body = annotation.body.merge(&fields);
        annotation.manual = true;
        Self::validate(&mut conn, &project, &document, &annotation.body).await?;

        AnnotationRepo::update(&mut *conn, &annotation)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("annotation {annotation_id}")))?;
        let annotation = Self::get_own(&mut conn, &project, &document, annotation_id, &user).await?;

        Ok(Json(Self::view(&mut conn, &project, &annotation).await?))
    }

    pub async fn remove(
        State(state): State<AppState>,
        Extension(user): Extension<AuthenticatedUser>,
        Path((project_id, document_id, annotation_id)): Path<(i64, i64, i64)>,
    ) -> Result<impl IntoResponse, ApiError> {
        let mut conn = state.repo.acquire().await?;
        let project = is_project_user(&mut *conn, project_id, &user).await?;
        let document = get_document(&mut *conn, project.id, document_id).await?;
        let annotation = Self::get_own(&mut conn, &project, &document, annotation_id, &user).await?;

        AnnotationRepo::remove(&mut *conn, project.project_type, annotation.id).await?;

        info!(
            "User {} deleted annotation {} on document {}",
            user.username, annotation.id, document.id
        );
        Ok(StatusCode::NO_CONTENT)
    }
}
