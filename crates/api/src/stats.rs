use axum::extract::{Path, State};
use axum::http::Method;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use common::AuthenticatedUser;

use crate::error::ApiError;
use crate::permissions::{is_admin_user_and_write_only, is_project_user};
use crate::state::AppState;
use data::stats::ProjectStats;
use repos::annotation::AnnotationRepo;
use repos::label::LabelRepo;
use repos::project::ProjectRepo;

pub struct StatsApi;

impl StatsApi {
    pub async fn get(
        State(state): State<AppState>,
        Extension(user): Extension<AuthenticatedUser>,
        method: Method,
        Path(project_id): Path<i64>,
    ) -> Result<impl IntoResponse, ApiError> {
        let mut conn = state.repo.acquire().await?;
        let project = is_project_user(&mut *conn, project_id, &user).await?;
        is_admin_user_and_write_only(&method, &user)?;

        let labels = LabelRepo::get_by_project(&mut *conn, project.id)
            .await?
            .into_iter()
            .map(|label| label.text)
            .collect();
        let users = ProjectRepo::get_users(&mut *conn, project.id)
            .await?
            .into_iter()
            .map(|user| user.username)
            .collect();
        let annotations =
            AnnotationRepo::get_details_by_project(&mut *conn, project.project_type, project.id)
                .await?;

        Ok(Json(ProjectStats::compute(labels, users, &annotations)))
    }
}
