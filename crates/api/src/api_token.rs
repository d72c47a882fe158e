use axum::{
    extract::Request,
    http::header,
    response::{IntoResponse, Response},
};
use common::AuthenticatedUser;
use common::token::{decode_api_token, verify_api_secret};
use futures::future::BoxFuture;
use repos::api_token::ApiTokenRepo;
use repos::user::UserRepo;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::{debug, error};

use crate::error::ApiError;
use crate::state::AppState;

fn extract_api_token<B>(request: &Request<B>) -> Option<String> {
    let auth_header = request.headers().get(header::AUTHORIZATION)?;
    let auth_value = auth_header.to_str().ok()?;

    if let Some(token) = auth_value.strip_prefix("Bearer ") {
        Some(token.trim().to_string())
    } else if let Some(token) = auth_value.strip_prefix("Token ") {
        Some(token.trim().to_string())
    } else {
        Some(auth_value.trim().to_string())
    }
}

async fn authenticate(
    app_state: &AppState,
    token: &str,
) -> Result<(data::api_token::ApiToken, AuthenticatedUser), ApiError> {
    let (token_id, token_secret) = decode_api_token(token).map_err(|err| {
        debug!("Failed to decode api token: {}", err);
        ApiError::Unauthorized("invalid API token".to_string())
    })?;

    let api_token = ApiTokenRepo::get_by_token_id(&app_state.repo.pool, &token_id.to_string())
        .await?
        .ok_or_else(|| ApiError::Unauthorized("invalid API token".to_string()))?;

    match verify_api_secret(&token_secret, &api_token.token_hash) {
        Ok(true) => {}
        Ok(false) => return Err(ApiError::Unauthorized("invalid API token".to_string())),
        Err(err) => {
            error!("Failed to verify API token: {}", err);
            return Err(ApiError::Unauthorized("invalid API token".to_string()));
        }
    }

    if !api_token.is_valid() {
        return Err(ApiError::Unauthorized(
            "API token is expired or inactive".to_string(),
        ));
    }

    let user = UserRepo::get_by_id(&app_state.repo.pool, api_token.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("invalid API token".to_string()))?;

    if let Err(err) = ApiTokenRepo::update_last_used(&app_state.repo.pool, api_token.id).await {
        error!("Failed to update last_used_at: {}", err);
    }

    debug!(
        "API token validated - user_id: {}, token_id: {}",
        user.id, api_token.id
    );

    let user = AuthenticatedUser::new(user.id, user.username, user.is_admin);
    Ok((api_token, user))
}

#[derive(Clone)]
pub struct ApiTokenLayer {
    app_state: AppState,
}

impl ApiTokenLayer {
    pub fn new(app_state: AppState) -> Self {
        Self { app_state }
    }
}

impl<S> Layer<S> for ApiTokenLayer {
    type Service = ApiTokenService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ApiTokenService {
            inner,
            app_state: self.app_state.clone(),
        }
    }
}

#[derive(Clone)]
pub struct ApiTokenService<S> {
    inner: S,
    app_state: AppState,
}

impl<S, B> Service<Request<B>> for ApiTokenService<S>
where
    S: Service<Request<B>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<B>) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let app_state = self.app_state.clone();

        Box::pin(async move {
            let Some(token) = extract_api_token(&request) else {
                return Ok(
                    ApiError::Unauthorized("missing API token".to_string()).into_response()
                );
            };

            match authenticate(&app_state, &token).await {
                Ok((api_token, user)) => {
                    request.extensions_mut().insert(api_token);
                    request.extensions_mut().insert(user);
                    inner.call(request).await
                }
                Err(err) => Ok(err.into_response()),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(authorization: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/api/projects");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_extract_api_token_schemes() {
        assert_eq!(extract_api_token(&request(Some("Token abc"))).as_deref(), Some("abc"));
        assert_eq!(extract_api_token(&request(Some("Bearer abc"))).as_deref(), Some("abc"));
        assert_eq!(extract_api_token(&request(Some("abc"))).as_deref(), Some("abc"));
        assert_eq!(extract_api_token(&request(None)), None);
    }
}
