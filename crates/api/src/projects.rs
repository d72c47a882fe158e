use axum::extract::{Path, State};
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use common::AuthenticatedUser;
use serde::Serialize;
use tracing::{error, info};

use crate::error::{ApiError, ApiJson};
use crate::permissions::is_admin_user_and_write_only;
use crate::state::AppState;
use crate::utils::validate_user_ids;
use data::project::{NewProject, Project, ProjectUpdate, ProjectWithUsers};
use repos::document::DocumentRepo;
use repos::project::ProjectRepo;

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub total: i64,
    pub remaining: i64,
}

pub struct ProjectsApi;

impl ProjectsApi {
    async fn with_users(state: &AppState, project: Project) -> Result<ProjectWithUsers, ApiError> {
        let users = ProjectRepo::get_user_ids(&state.repo.pool, project.id).await?;
        Ok(ProjectWithUsers { project, users })
    }

    // Non-members get a 404.
    async fn get_visible(
        state: &AppState,
        project_id: i64,
        user: &AuthenticatedUser,
    ) -> Result<Project, ApiError> {
        ProjectRepo::get_by_id_for_user(&state.repo.pool, project_id, user.id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("project {project_id}")))
    }

    pub async fn list(
        State(state): State<AppState>,
        Extension(user): Extension<AuthenticatedUser>,
    ) -> Result<impl IntoResponse, ApiError> {
        let projects = ProjectRepo::get_all_for_user(&state.repo.pool, user.id).await?;

        let mut response = Vec::with_capacity(projects.len());
        for project in projects {
            response.push(Self::with_users(&state, project).await?);
        }

        Ok(Json(response))
    }

    pub async fn create(
        State(state): State<AppState>,
        Extension(user): Extension<AuthenticatedUser>,
        method: Method,
        ApiJson(new_project): ApiJson<NewProject>,
    ) -> Result<impl IntoResponse, ApiError> {
        is_admin_user_and_write_only(&method, &user)?;

        if new_project.name.trim().is_empty() {
            return Err(ApiError::BadRequest("project name cannot be empty".to_string()));
        }

        let mut tx = state.repo.begin().await?;
        validate_user_ids(&mut *tx, &new_project.users).await?;
        let project_id = ProjectRepo::create(&mut *tx, &new_project).await?;
        ProjectRepo::set_users(&mut *tx, project_id, &new_project.users).await?;
        state.repo.end(tx).await?;

        let project = ProjectRepo::get_by_id(&state.repo.pool, project_id)
            .await?
            .ok_or_else(|| {
                error!("Project {} vanished after creation", project_id);
                ApiError::InternalFailure()
            })?;

        info!(
            "User {} created {} project {} ({})",
            user.username, project.project_type, project.id, project.name
        );

        Ok((StatusCode::CREATED, Json(Self::with_users(&state, project).await?)))
    }

    pub async fn get(
        State(state): State<AppState>,
        Extension(user): Extension<AuthenticatedUser>,
        Path(project_id): Path<i64>,
    ) -> Result<impl IntoResponse, ApiError> {
        let project = Self::get_visible(&state, project_id, &user).await?;
        Ok(Json(Self::with_users(&state, project).await?))
    }

    pub async fn update(
        State(state): State<AppState>,
        Extension(user): Extension<AuthenticatedUser>,
        method: Method,
        Path(project_id): Path<i64>,
        ApiJson(update): ApiJson<ProjectUpdate>,
    ) -> Result<impl IntoResponse, ApiError> {
        is_admin_user_and_write_only(&method, &user)?;

        let mut project = Self::get_visible(&state, project_id, &user).await?;
        update.apply(&mut project);
        if project.name.trim().is_empty() {
            return Err(ApiError::BadRequest("project name cannot be empty".to_string()));
        }

        let mut tx = state.repo.begin().await?;
        ProjectRepo::update(&mut *tx, &project)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("project {project_id}")))?;
        if let Some(users) = &update.users {
            validate_user_ids(&mut *tx, users).await?;
            ProjectRepo::set_users(&mut *tx, project_id, users).await?;
        }
        state.repo.end(tx).await?;

        // Not member-scoped: the update may have removed the requesting admin.
        let project = ProjectRepo::get_by_id(&state.repo.pool, project_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("project {project_id}")))?;

        info!("User {} updated project {}", user.username, project_id);
        Ok(Json(Self::with_users(&state, project).await?))
    }

    pub async fn remove(
        State(state): State<AppState>,
        Extension(user): Extension<AuthenticatedUser>,
        method: Method,
        Path(project_id): Path<i64>,
    ) -> Result<impl IntoResponse, ApiError> {
        is_admin_user_and_write_only(&method, &user)?;

        let project = Self::get_visible(&state, project_id, &user).await?;
        ProjectRepo::remove(&state.repo.pool, project.id).await?;

        info!("User {} deleted project {} ({})", user.username, project.id, project.name);
        Ok(StatusCode::NO_CONTENT)
    }

    pub async fn progress(
        State(state): State<AppState>,
        Extension(user): Extension<AuthenticatedUser>,
        Path(project_id): Path<i64>,
    ) -> Result<impl IntoResponse, ApiError> {
        let project = Self::get_visible(&state, project_id, &user).await?;

        let total = DocumentRepo::count_for_project(&state.repo.pool, project.id).await?;
        let remaining =
            DocumentRepo::count_unannotated(&state.repo.pool, project.id, project.project_type)
                .await?;

        Ok(Json(ProgressResponse { total, remaining }))
    }
}
