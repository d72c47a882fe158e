use sqlx::Sqlite;

use crate::error::{RepoError, handle_sql_error};
use data::label::{Label, NewLabel};

pub struct LabelRepo {}

impl LabelRepo {
    pub async fn get_by_id(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        id: i64,
    ) -> Result<Option<Label>, RepoError> {
        sqlx::query_as::<_, Label>(
            r#"
                SELECT *
                FROM labels
                WHERE labels.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn get_by_project_and_id(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        project_id: i64,
        id: i64,
    ) -> Result<Option<Label>, RepoError> {
        sqlx::query_as::<_, Label>(
            r#"
                SELECT *
                FROM labels
                WHERE labels.id = ? AND labels.project_id = ?
            "#,
        )
        .bind(id)
        .bind(project_id)
        .fetch_optional(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn get_by_project(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        project_id: i64,
    ) -> Result<Vec<Label>, RepoError> {
        sqlx::query_as::<_, Label>(
            r#"
                SELECT *
                FROM labels
                WHERE labels.project_id = ?
                ORDER BY labels.id
            "#,
        )
        .bind(project_id)
        .fetch_all(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn create(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        label: NewLabel,
    ) -> Result<i64, RepoError> {
        sqlx::query_scalar(
            r#"
                INSERT INTO labels
                  (
                    text,
                    shortcut,
                    background_color,
                    text_color,
                    project_id
                  )
                VALUES (?, ?, ?, ?, ?)
                RETURNING
                  id
            "#,
        )
        .bind(label.text)
        .bind(label.shortcut)
        .bind(label.background_color)
        .bind(label.text_color)
        .bind(label.project_id)
        .fetch_one(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn update(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        label: &Label,
    ) -> Result<Option<i64>, RepoError> {
        sqlx::query_scalar(
            r#"
                UPDATE labels
                SET text = ?, shortcut = ?, background_color = ?, text_color = ?,
                    updated_at = CURRENT_TIMESTAMP
                WHERE id = ?
                RETURNING id
            "#,
        )
        .bind(&label.text)
        .bind(&label.shortcut)
        .bind(&label.background_color)
        .bind(&label.text_color)
        .bind(label.id)
        .fetch_optional(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn remove(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        id: i64,
    ) -> Result<(), RepoError> {
        sqlx::query(
            r#"
                DELETE FROM labels
                WHERE id = ?
            "#,
        )
        .bind(id)
        .execute(executor)
        .await
        .map_err(handle_sql_error)
        .map(|_| ())
    }
}
