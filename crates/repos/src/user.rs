use sqlx::{QueryBuilder, Sqlite};

use crate::{
    QueryParams, Repo,
    error::{RepoError, handle_sql_error},
};
use data::user::{NewUser, User};

pub struct UserRepo {}

impl UserRepo {
    pub async fn get_by_id(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        id: i64,
    ) -> Result<Option<User>, RepoError> {
        sqlx::query_as::<_, User>(
            r#"
                SELECT *
                FROM users
                WHERE users.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn get_by_name(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        username: &str,
    ) -> Result<Option<User>, RepoError> {
        sqlx::query_as::<_, User>(
            r#"
                SELECT *
                FROM users
                WHERE users.username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn get_all(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        params: QueryParams,
    ) -> Result<Vec<User>, RepoError> {
        let mut builder = QueryBuilder::new("SELECT * FROM users WHERE 1 = 1");
        Repo::build_query(
            &mut builder,
            &params,
            &["id", "username", "created_at", "updated_at"],
            &["username"],
        )?;

        let query = builder.build_query_as();

        query.fetch_all(executor).await.map_err(handle_sql_error)
    }

    pub async fn create(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        user: NewUser,
    ) -> Result<i64, RepoError> {
        sqlx::query_scalar(
            r#"
                INSERT INTO users
                  (
                    username,
                    password_hash,
                    is_admin
                  )
                VALUES (?, ?, ?)
                RETURNING
                  id
            "#,
        )
        .bind(user.username)
        .bind(user.password_hash)
        .bind(user.is_admin)
        .fetch_one(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn update(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        user: User,
    ) -> Result<Option<i64>, RepoError> {
        sqlx::query_scalar(
            r#"
                UPDATE users
                SET username = ?, password_hash = ?, is_admin = ?, updated_at = CURRENT_TIMESTAMP
                WHERE id = ?
                RETURNING id
            "#,
        )
        .bind(user.username)
        .bind(user.password_hash)
        .bind(user.is_admin)
        .bind(user.id)
        .fetch_optional(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn update_last_login(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        id: i64,
    ) -> Result<(), RepoError> {
        sqlx::query(
            r#"
                UPDATE users
                SET last_login_at = CURRENT_TIMESTAMP
                WHERE id = ?
            "#,
        )
        .bind(id)
        .execute(executor)
        .await
        .map_err(handle_sql_error)
        .map(|_| ())
    }

    pub async fn remove(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        id: i64,
    ) -> Result<(), RepoError> {
        sqlx::query(
            r#"
                DELETE FROM users
                WHERE id = ?
            "#,
        )
        .bind(id)
        .execute(executor)
        .await
        .map_err(handle_sql_error)
        .map(|_| ())
    }

    pub async fn count(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
    ) -> Result<i64, RepoError> {
        sqlx::query_scalar(
            r#"
                SELECT COUNT(*)
                FROM users
            "#,
        )
        .fetch_one(executor)
        .await
        .map_err(handle_sql_error)
    }
}
