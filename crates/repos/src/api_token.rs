use sqlx::Sqlite;

use crate::error::{RepoError, handle_sql_error};
use data::api_token::{ApiToken, NewApiToken};

pub struct ApiTokenRepo {}

impl ApiTokenRepo {
    pub async fn get_by_id(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        id: i64,
    ) -> Result<Option<ApiToken>, RepoError> {
        sqlx::query_as::<_, ApiToken>(
            r#"
                SELECT *
                FROM api_tokens
                WHERE api_tokens.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn get_by_token_id(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        token_id: &str,
    ) -> Result<Option<ApiToken>, RepoError> {
        sqlx::query_as::<_, ApiToken>(
            r#"
                SELECT *
                FROM api_tokens
                WHERE api_tokens.token_id = ?
            "#,
        )
        .bind(token_id)
        .fetch_optional(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn get_by_user_id(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        user_id: i64,
    ) -> Result<Vec<ApiToken>, RepoError> {
        sqlx::query_as::<_, ApiToken>(
            r#"
                SELECT *
                FROM api_tokens
                WHERE api_tokens.user_id = ?
                ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn create(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        token: NewApiToken,
    ) -> Result<i64, RepoError> {
        sqlx::query_scalar(
            r#"
                INSERT INTO api_tokens
                  (
                    description,
                    token_id,
                    token_hash,
                    user_id,
                    expires_at
                  )
                VALUES (?, ?, ?, ?, ?)
                RETURNING
                  id
            "#,
        )
        .bind(token.description)
        .bind(token.token_id)
        .bind(token.token_hash)
        .bind(token.user_id)
        .bind(token.expires_at)
        .fetch_one(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn update_last_used(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        id: i64,
    ) -> Result<(), RepoError> {
        sqlx::query(
            r#"
                UPDATE api_tokens
                SET last_used_at = CURRENT_TIMESTAMP
                WHERE id = ?
            "#,
        )
        .bind(id)
        .execute(executor)
        .await
        .map_err(handle_sql_error)
        .map(|_| ())
    }

    pub async fn deactivate(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        id: i64,
    ) -> Result<(), RepoError> {
        sqlx::query(
            r#"
                UPDATE api_tokens
                SET is_active = 0, updated_at = CURRENT_TIMESTAMP
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
