use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use common::token::hash_password;
use common::{AuthenticatedUser, QueryParams};
use serde::Deserialize;
use tracing::{error, info};

use crate::error::{ApiError, ApiJson};
use crate::permissions::is_admin_user;
use crate::state::AppState;
use data::user::NewUser;
use repos::user::UserRepo;

#[derive(Debug, Deserialize)]
pub struct UserRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
}

pub struct UsersApi;

impl UsersApi {
    pub async fn list(
        State(state): State<AppState>,
        Extension(user): Extension<AuthenticatedUser>,
    ) -> Result<impl IntoResponse, ApiError> {
        is_admin_user(&user)?;

        let users = UserRepo::get_all(&state.repo.pool, QueryParams::default()).await?;
        Ok(Json(users))
    }

    pub async fn create(
        State(state): State<AppState>,
        Extension(user): Extension<AuthenticatedUser>,
        ApiJson(request): ApiJson<UserRequest>,
    ) -> Result<impl IntoResponse, ApiError> {
        is_admin_user(&user)?;

        let username = request.username.trim();
        if username.is_empty() {
            return Err(ApiError::BadRequest("username cannot be empty".to_string()));
        }
        if request.password.is_empty() {
            return Err(ApiError::BadRequest("password cannot be empty".to_string()));
        }

        let password_hash = hash_password(&request.password).map_err(|err| {
            error!("Failed to hash password: {}", err);
            ApiError::InternalFailure()
        })?;

        let user_id = UserRepo::create(
            &state.repo.pool,
            NewUser {
                username: username.to_string(),
                password_hash,
                is_admin: request.is_admin,
            },
        )
        .await?;
        let created = UserRepo::get_by_id(&state.repo.pool, user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("user {user_id}")))?;

        info!("User {} created user {}", user.username, created.username);
        Ok((StatusCode::CREATED, Json(created)))
    }
}
