use sqlx::Sqlite;
use tracing::error;

use crate::error::ApiError;
use data::document::Document;
use data::label::Label;
use repos::document::DocumentRepo;
use repos::label::LabelRepo;
use repos::user::UserRepo;

pub async fn get_document<E>(
    executor: &mut E,
    project_id: i64,
    document_id: i64,
) -> Result<Document, ApiError>
where
    for<'a> &'a mut E: sqlx::Executor<'a, Database = Sqlite>,
{
    DocumentRepo::get_by_project_and_id(executor, project_id, document_id)
        .await?
        .ok_or_else(|| {
            error!("No document {} in project {}", document_id, project_id);
            ApiError::NotFound(format!("document {document_id}"))
        })
}

pub async fn get_label<E>(executor: &mut E, project_id: i64, label_id: i64) -> Result<Label, ApiError>
where
    for<'a> &'a mut E: sqlx::Executor<'a, Database = Sqlite>,
{
    LabelRepo::get_by_project_and_id(executor, project_id, label_id)
        .await?
        .ok_or_else(|| {
            error!("No label {} in project {}", label_id, project_id);
            ApiError::NotFound(format!("label {label_id}"))
        })
}

pub async fn validate_user_ids<E>(executor: &mut E, user_ids: &[i64]) -> Result<(), ApiError>
where
    for<'a> &'a mut E: sqlx::Executor<'a, Database = Sqlite>,
{
    for user_id in user_ids {
        if UserRepo::get_by_id(&mut *executor, *user_id)
            .await?
            .is_none()
        {
            return Err(ApiError::BadRequest(format!("user {user_id} does not exist")));
        }
    }
    Ok(())
}
