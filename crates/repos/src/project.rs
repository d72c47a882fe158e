use sqlx::{Sqlite, SqliteConnection};

use crate::error::{RepoError, handle_sql_error};
use data::project::{NewProject, Project};
use data::user::User;

pub struct ProjectRepo {}

impl ProjectRepo {
    pub async fn get_by_id(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        id: i64,
    ) -> Result<Option<Project>, RepoError> {
        sqlx::query_as::<_, Project>(
            r#"
                SELECT *
                FROM projects
                WHERE projects.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(handle_sql_error)
    }

    /// Looks a project up among the projects `user_id` is a member of.
    pub async fn get_by_id_for_user(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        id: i64,
        user_id: i64,
    ) -> Result<Option<Project>, RepoError> {
        sqlx::query_as::<_, Project>(
            r#"
                SELECT projects.*
                FROM projects
                JOIN project_users ON project_users.project_id = projects.id
                WHERE projects.id = ? AND project_users.user_id = ?
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn get_all_for_user(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        user_id: i64,
    ) -> Result<Vec<Project>, RepoError> {
        sqlx::query_as::<_, Project>(
            r#"
                SELECT projects.*
                FROM projects
                JOIN project_users ON project_users.project_id = projects.id
                WHERE project_users.user_id = ?
                ORDER BY projects.id
            "#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn create(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        project: &NewProject,
    ) -> Result<i64, RepoError> {
        sqlx::query_scalar(
            r#"
                INSERT INTO projects
                  (
                    name,
                    description,
                    guideline,
                    project_type
                  )
                VALUES (?, ?, ?, ?)
                RETURNING
                  id
            "#,
        )
        .bind(&project.name)
        .bind(&project.description)
        .bind(&project.guideline)
        .bind(project.project_type.as_ref())
        .fetch_one(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn update(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        project: &Project,
    ) -> Result<Option<i64>, RepoError> {
        sqlx::query_scalar(
            r#"
                UPDATE projects
                SET name = ?, description = ?, guideline = ?, updated_at = CURRENT_TIMESTAMP
                WHERE id = ?
                RETURNING id
            "#,
        )
        .bind(&project.name)
        .bind(&project.description)
        .bind(&project.guideline)
        .bind(project.id)
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
                DELETE FROM projects
                WHERE id = ?
            "#,
        )
        .bind(id)
        .execute(executor)
        .await
        .map_err(handle_sql_error)
        .map(|_| ())
    }

    pub async fn is_member(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        project_id: i64,
        user_id: i64,
    ) -> Result<bool, RepoError> {
        sqlx::query_scalar::<_, i64>(
            r#"
                SELECT EXISTS (
                    SELECT 1
                    FROM project_users
                    WHERE project_id = ? AND user_id = ?
                )
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(executor)
        .await
        .map_err(handle_sql_error)
        .map(|found| found != 0)
    }

    pub async fn get_user_ids(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        project_id: i64,
    ) -> Result<Vec<i64>, RepoError> {
        sqlx::query_scalar(
            r#"
                SELECT user_id
                FROM project_users
                WHERE project_id = ?
                ORDER BY user_id
            "#,
        )
        .bind(project_id)
        .fetch_all(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn get_users(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        project_id: i64,
    ) -> Result<Vec<User>, RepoError> {
        sqlx::query_as::<_, User>(
            r#"
                SELECT users.*
                FROM users
                JOIN project_users ON project_users.user_id = users.id
                WHERE project_users.project_id = ?
                ORDER BY users.id
            "#,
        )
        .bind(project_id)
        .fetch_all(executor)
        .await
        .map_err(handle_sql_error)
    }

    /// Replaces the member set of a project. Runs several statements, so pass
    /// a transaction.
    pub async fn set_users(
        conn: &mut SqliteConnection,
        project_id: i64,
        user_ids: &[i64],
    ) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM project_users WHERE project_id = ?")
            .bind(project_id)
            .execute(&mut *conn)
            .await
            .map_err(handle_sql_error)?;

        for user_id in user_ids {
            sqlx::query(
                r#"
                    INSERT INTO project_users (project_id, user_id)
                    VALUES (?, ?)
                    ON CONFLICT DO NOTHING
                "#,
            )
            .bind(project_id)
            .bind(*user_id)
            .execute(&mut *conn)
            .await
            .map_err(handle_sql_error)?;
        }

        Ok(())
    }

    pub async fn count(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
    ) -> Result<i64, RepoError> {
        sqlx::query_scalar(
            r#"
                SELECT COUNT(*)
                FROM projects
            "#,
        )
        .fetch_one(executor)
        .await
        .map_err(handle_sql_error)
    }
}
