use axum::http::Method;
use common::AuthenticatedUser;
use data::annotation::Annotation;
use data::project::Project;
use repos::project::ProjectRepo;
use sqlx::Sqlite;
use tracing::info;

use crate::error::ApiError;

pub fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

pub fn is_admin_user(user: &AuthenticatedUser) -> Result<(), ApiError> {
    if user.is_admin {
        return Ok(());
    }

    info!("User {} denied: admin required", user.username);
    Err(ApiError::Forbidden("admin privileges required".to_string()))
}

pub fn is_admin_user_and_write_only(
    method: &Method,
    user: &AuthenticatedUser,
) -> Result<(), ApiError> {
    if is_safe_method(method) {
        return Ok(());
    }

    is_admin_user(user)
}

// Missing project is a 404, non-member a 403.
pub async fn is_project_user<E>(
    executor: &mut E,
    project_id: i64,
    user: &AuthenticatedUser,
) -> Result<Project, ApiError>
where
    for<'a> &'a mut E: sqlx::Executor<'a, Database = Sqlite>,
{
    let project = ProjectRepo::get_by_id(&mut *executor, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("project {project_id}")))?;

    if !ProjectRepo::is_member(&mut *executor, project_id, user.id).await? {
        info!("User {} denied: not a member of project {}", user.username, project_id);
        return Err(ApiError::Forbidden("not a member of this project".to_string()));
    }

    Ok(project)
}

pub fn is_own_annotation(
    annotation: &Annotation,
    user: &AuthenticatedUser,
) -> Result<(), ApiError> {
    if annotation.user_id == user.id {
        return Ok(());
    }

    info!(
        "User {} denied: annotation {} belongs to user {}",
        user.username, annotation.id, annotation.user_id
    );
    Err(ApiError::Forbidden("not your annotation".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use data::annotation::AnnotationBody;

    fn user(id: i64, is_admin: bool) -> AuthenticatedUser {
        AuthenticatedUser::new(id, format!("user{id}"), is_admin)
    }

    #[test]
    fn test_admin_and_write_only() {
        let member = user(1, false);
        let admin = user(2, true);

        assert!(is_admin_user_and_write_only(&Method::GET, &member).is_ok());
        assert!(is_admin_user_and_write_only(&Method::HEAD, &member).is_ok());
        assert!(is_admin_user_and_write_only(&Method::OPTIONS, &member).is_ok());
        assert!(is_admin_user_and_write_only(&Method::POST, &member).is_err());
        assert!(is_admin_user_and_write_only(&Method::DELETE, &member).is_err());
        assert!(is_admin_user_and_write_only(&Method::PATCH, &admin).is_ok());
    }

    #[test]
    fn test_admin_user() {
        assert!(is_admin_user(&user(1, false)).is_err());
        assert!(is_admin_user(&user(1, true)).is_ok());
    }

    #[test]
    fn test_own_annotation() {
        let now = Utc::now().naive_utc();
        let annotation = Annotation {
            id: 1,
            document_id: 1,
            user_id: 7,
            prob: 0.0,
            manual: true,
            created_at: now,
            updated_at: now,
            body: AnnotationBody::Text {
                text: "hi".to_string(),
            },
        };

        assert!(is_own_annotation(&annotation, &user(7, false)).is_ok());
        assert!(matches!(
            is_own_annotation(&annotation, &user(8, true)),
            Err(ApiError::Forbidden(_))
        ));
    }
}
