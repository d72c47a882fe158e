use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use data::annotation::AnnotationError;
use repos::error::RepoError;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("internal failure")]
    InternalFailure(),

    #[error("{0}")]
    BadRequest(String),

    #[error("authentication failed: {0}")]
    Unauthorized(String),

    #[error("permission denied: {0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("database error: `{0}`")]
    RepoError(#[from] RepoError),
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::InternalFailure() => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal failure".to_string())
            }
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            ApiError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message.clone()),
            ApiError::Forbidden(message) => (StatusCode::FORBIDDEN, message.clone()),
            ApiError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found")),
            ApiError::RepoError(err) => match err {
                RepoError::NotFound() => (StatusCode::NOT_FOUND, "not found".to_string()),
                RepoError::UniqueViolation(_) => {
                    (StatusCode::BAD_REQUEST, "object already exists".to_string())
                }
                RepoError::ForeignKeyViolation(_) => {
                    (StatusCode::BAD_REQUEST, "referenced object does not exist".to_string())
                }
                RepoError::CheckViolation(_) => {
                    (StatusCode::BAD_REQUEST, "invalid field value".to_string())
                }
                RepoError::InvalidColumn(column) => {
                    (StatusCode::BAD_REQUEST, format!("invalid field `{column}`"))
                }
                RepoError::InvalidRange(range) => {
                    (StatusCode::BAD_REQUEST, format!("page {range} is out of range"))
                }
                _ => {
                    error!("Unhandled database error: {}", err);
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal failure".to_string())
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = self.status_and_message();

        let body = Json(serde_json::json!({
            "result": "failed",
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<AnnotationError> for ApiError {
    fn from(err: AnnotationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);
