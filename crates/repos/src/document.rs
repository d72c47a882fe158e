use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    QueryParams, Repo, SortOrder,
    annotation::table,
    error::{RepoError, handle_sql_error},
};
use data::document::{Document, NewDocument};
use data::project::ProjectType;

const SORT_COLUMNS: &[&str] = &["id", "text", "created_at", "updated_at"];
const FILTER_COLUMNS: &[&str] = &["text"];

pub struct DocumentRepo {}

impl DocumentRepo {
    pub async fn get_by_id(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        id: i64,
    ) -> Result<Option<Document>, RepoError> {
        sqlx::query_as::<_, Document>(
            r#"
                SELECT *
                FROM documents
                WHERE documents.id = ?
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
    ) -> Result<Option<Document>, RepoError> {
        sqlx::query_as::<_, Document>(
            r#"
                SELECT *
                FROM documents
                WHERE documents.id = ? AND documents.project_id = ?
            "#,
        )
        .bind(id)
        .bind(project_id)
        .fetch_optional(executor)
        .await
        .map_err(handle_sql_error)
    }

    /// Documents of a project, filtered on text, sorted and paged per `params`.
    /// `annotated` keeps only documents that do (`true`) or do not (`false`) carry
    /// an annotation.
    pub async fn get_by_project(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        project_id: i64,
        project_type: ProjectType,
        params: QueryParams,
        annotated: Option<bool>,
    ) -> Result<Vec<Document>, RepoError> {
        let mut params = params;
        if params.sorting.is_empty() {
            params.sorting.push_back(("id".to_string(), SortOrder::Ascending));
        }

        let mut builder = QueryBuilder::new("SELECT * FROM documents WHERE project_id = ");
        builder.push_bind(project_id);
        Self::push_annotated(&mut builder, project_type, annotated);
        Repo::build_query(&mut builder, &params, SORT_COLUMNS, FILTER_COLUMNS)?;

        builder
            .build_query_as()
            .fetch_all(executor)
            .await
            .map_err(handle_sql_error)
    }

    /// Number of documents `get_by_project` would return without paging.
    pub async fn count_by_project(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        project_id: i64,
        project_type: ProjectType,
        params: &QueryParams,
        annotated: Option<bool>,
    ) -> Result<i64, RepoError> {
        let params = QueryParams {
            filter: params.filter.clone(),
            ..QueryParams::default()
        };

        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM documents WHERE project_id = ");
        builder.push_bind(project_id);
        Self::push_annotated(&mut builder, project_type, annotated);
        Repo::build_query(&mut builder, &params, SORT_COLUMNS, FILTER_COLUMNS)?;

        builder
            .build_query_scalar()
            .fetch_one(executor)
            .await
            .map_err(handle_sql_error)
    }

    fn push_annotated(
        builder: &mut QueryBuilder<Sqlite>,
        project_type: ProjectType,
        annotated: Option<bool>,
    ) {
        if let Some(annotated) = annotated {
            builder.push(if annotated { " AND EXISTS" } else { " AND NOT EXISTS" });
            builder.push(format!(
                " (SELECT 1 FROM {} a WHERE a.document_id = documents.id)",
                table(project_type)
            ));
        }
    }

    /// Documents of a project that carry at least one annotation, by id.
    pub async fn get_annotated(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        project_id: i64,
        project_type: ProjectType,
    ) -> Result<Vec<Document>, RepoError> {
        let sql = format!(
            "SELECT * FROM documents WHERE project_id = ? \
             AND EXISTS (SELECT 1 FROM {} a WHERE a.document_id = documents.id) \
             ORDER BY id",
            table(project_type)
        );
        sqlx::query_as::<_, Document>(&sql)
            .bind(project_id)
            .fetch_all(executor)
            .await
            .map_err(handle_sql_error)
    }

    pub async fn count_for_project(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        project_id: i64,
    ) -> Result<i64, RepoError> {
        sqlx::query_scalar(
            r#"
                SELECT COUNT(*)
                FROM documents
                WHERE project_id = ?
            "#,
        )
        .bind(project_id)
        .fetch_one(executor)
        .await
        .map_err(handle_sql_error)
    }

    /// Documents of a project without any annotation, from any user.
    pub async fn count_unannotated(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        project_id: i64,
        project_type: ProjectType,
    ) -> Result<i64, RepoError> {
        let sql = format!(
            "SELECT COUNT(*) FROM documents WHERE project_id = ? \
             AND NOT EXISTS (SELECT 1 FROM {} a WHERE a.document_id = documents.id)",
            table(project_type)
        );
        sqlx::query_scalar(&sql)
            .bind(project_id)
            .fetch_one(executor)
            .await
            .map_err(handle_sql_error)
    }

    pub async fn create(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        document: NewDocument,
    ) -> Result<i64, RepoError> {
        sqlx::query_scalar(
            r#"
                INSERT INTO documents
                  (
                    text,
                    project_id
                  )
                VALUES (?, ?)
                RETURNING
                  id
            "#,
        )
        .bind(document.text)
        .bind(document.project_id)
        .fetch_one(executor)
        .await
        .map_err(handle_sql_error)
    }

    /// Inserts one document per text. Pass a transaction to make the batch
    /// all-or-nothing.
    pub async fn create_many(
        conn: &mut SqliteConnection,
        project_id: i64,
        texts: Vec<String>,
    ) -> Result<usize, RepoError> {
        let mut count = 0;
        for text in texts {
            Self::create(&mut *conn, NewDocument { text, project_id }).await?;
            count += 1;
        }
        Ok(count)
    }

    pub async fn remove(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        id: i64,
    ) -> Result<(), RepoError> {
        sqlx::query(
            r#"
                DELETE FROM documents
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
