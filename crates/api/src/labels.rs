use axum::extract::{Path, State};
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use common::AuthenticatedUser;
use tracing::info;

use crate::error::{ApiError, ApiJson};
use crate::permissions::{is_admin_user, is_admin_user_and_write_only, is_project_user};
use crate::state::AppState;
use crate::utils::get_label;
use data::label::LabelFields;
use repos::label::LabelRepo;

pub struct LabelsApi;

impl LabelsApi {
    pub async fn list(
        State(state): State<AppState>,
        Extension(user): Extension<AuthenticatedUser>,
        method: Method,
        Path(project_id): Path<i64>,
    ) -> Result<impl IntoResponse, ApiError> {
        let mut conn = state.repo.acquire().await?;
        let project = is_project_user(&mut *conn, project_id, &user).await?;
        is_admin_user_and_write_only(&method, &user)?;

        let labels = LabelRepo::get_by_project(&mut *conn, project.id).await?;
        Ok(Json(labels))
    }

    pub async fn create(
        State(state): State<AppState>,
        Extension(user): Extension<AuthenticatedUser>,
        method: Method,
        Path(project_id): Path<i64>,
        ApiJson(fields): ApiJson<LabelFields>,
    ) -> Result<impl IntoResponse, ApiError> {
        let mut conn = state.repo.acquire().await?;
        let project = is_project_user(&mut *conn, project_id, &user).await?;
        is_admin_user_and_write_only(&method, &user)?;

        let new_label = fields
            .into_new_label(project.id)
            .map_err(ApiError::BadRequest)?;
        let label_id = LabelRepo::create(&mut *conn, new_label).await?;
        let label = get_label(&mut *conn, project.id, label_id).await?;

        info!("User {} created label {} in project {}", user.username, label.text, project.id);
        Ok((StatusCode::CREATED, Json(label)))
    }

    pub async fn get(
        State(state): State<AppState>,
        Extension(user): Extension<AuthenticatedUser>,
        Path((project_id, label_id)): Path<(i64, i64)>,
    ) -> Result<impl IntoResponse, ApiError> {
        let mut conn = state.repo.acquire().await?;
        is_project_user(&mut *conn, project_id, &user).await?;
        is_admin_user(&user)?;

        Ok(Json(get_label(&mut *conn, project_id, label_id).await?))
    }

    pub async fn update(
        State(state): State<AppState>,
        Extension(user): Extension<AuthenticatedUser>,
        Path((project_id, label_id)): Path<(i64, i64)>,
        ApiJson(fields): ApiJson<LabelFields>,
    ) -> Result<impl IntoResponse, ApiError> {
        let mut conn = state.repo.acquire().await?;
        is_project_user(&mut *conn, project_id, &user).await?;
        is_admin_user(&user)?;

        let mut label = get_label(&mut *conn, project_id, label_id).await?;
        fields.apply(&mut label).map_err(ApiError::BadRequest)?;
        LabelRepo::update(&mut *conn, &label)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("label {label_id}")))?;

        Ok(Json(get_label(&mut *conn, project_id, label_id).await?))
    }

    pub async fn remove(
        State(state): State<AppState>,
        Extension(user): Extension<AuthenticatedUser>,
        Path((project_id, label_id)): Path<(i64, i64)>,
    ) -> Result<impl IntoResponse, ApiError> {
        let mut conn = state.repo.acquire().await?;
        is_project_user(&mut *conn, project_id, &user).await?;
        is_admin_user(&user)?;

        let label = get_label(&mut *conn, project_id, label_id).await?;
        LabelRepo::remove(&mut *conn, label.id).await?;

        info!("User {} deleted label {} in project {}", user.username, label.text, project_id);
        Ok(StatusCode::NO_CONTENT)
    }
}
