use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::{Duration, Utc};
use common::AuthenticatedUser;
use common::token::{generate_api_token, verify_password};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::{ApiError, ApiJson};
use crate::state::AppState;
use data::api_token::{ApiToken, NewApiToken};
use repos::api_token::ApiTokenRepo;
use repos::user::UserRepo;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("invalid username or password".to_string())
}

pub struct AuthApi;

impl AuthApi {
    pub async fn login(
        State(state): State<AppState>,
        ApiJson(request): ApiJson<LoginRequest>,
    ) -> Result<impl IntoResponse, ApiError> {
        let user = UserRepo::get_by_name(&state.repo.pool, &request.username)
            .await?
            .ok_or_else(|| {
                info!("Login failed: unknown user {}", request.username);
                invalid_credentials()
            })?;

        match verify_password(&request.password, &user.password_hash) {
            Ok(true) => {}
            Ok(false) => {
                info!("Login failed: wrong password for {}", user.username);
                return Err(invalid_credentials());
            }
            Err(err) => {
                error!("Failed to verify password of {}: {}", user.username, err);
                return Err(invalid_credentials());
            }
        }

        let (token_id, token, token_hash) = generate_api_token().map_err(|err| {
            error!("Failed to generate API token: {}", err);
            ApiError::InternalFailure()
        })?;

        let expires_at = state
            .settings
            .auth
            .token_validity_in_minutes
            .map(|minutes| Utc::now().naive_utc() + Duration::minutes(minutes));

        let mut tx = state.repo.begin().await?;
        ApiTokenRepo::create(
            &mut *tx,
            NewApiToken {
                description: "Login token".to_string(),
                token_id: token_id.to_string(),
                token_hash,
                user_id: user.id,
                expires_at,
            },
        )
        .await?;
        UserRepo::update_last_login(&mut *tx, user.id).await?;
        state.repo.end(tx).await?;

        info!("User {} logged in", user.username);
        Ok(Json(LoginResponse { token }))
    }

    pub async fn logout(
        State(state): State<AppState>,
        Extension(user): Extension<AuthenticatedUser>,
        Extension(api_token): Extension<ApiToken>,
    ) -> Result<impl IntoResponse, ApiError> {
        ApiTokenRepo::deactivate(&state.repo.pool, api_token.id).await?;

        info!("User {} logged out", user.username);
        Ok(StatusCode::NO_CONTENT)
    }
}
