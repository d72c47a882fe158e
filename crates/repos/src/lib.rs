pub mod annotation;
pub mod api_token;
pub mod document;
pub mod error;
pub mod label;
pub mod project;
pub mod user;

use sqlx::migrate::Migrator;
use sqlx::pool::PoolConnection;
use sqlx::{QueryBuilder, Sqlite, SqlitePool, Transaction};
use tracing::error;

use crate::error::RepoError;
pub use common::{QueryParams, SortOrder};

pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Clone)]
pub struct Repo {
    pub pool: SqlitePool,
}

impl Repo {
    pub fn new(pool: SqlitePool) -> Repo {
        Repo { pool }
    }

    pub async fn migrate(&self) -> Result<(), RepoError> {
        MIGRATOR.run(&self.pool).await.map_err(|err| {
            error!("Failed to run migrations: {}", err);
            RepoError::DatabaseError(err.to_string())
        })
    }

    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>, RepoError> {
        self.pool.acquire().await.map_err(|err| {
            error!("Failed to acquire connection: {}", err);
            RepoError::TransactionError()
        })
    }

    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, RepoError> {
        self.pool.begin().await.map_err(|err| {
            error!("Failed to begin transaction: {}", err);
            RepoError::TransactionError()
        })
    }

    pub async fn end(&self, transaction: Transaction<'static, Sqlite>) -> Result<(), RepoError> {
        transaction.commit().await.map_err(|err| {
            error!("Failed to commit transaction: {}", err);
            RepoError::TransactionError()
        })
    }

    /// Appends filtering, sorting and paging to `builder`. The builder must
    /// already end in a `WHERE` clause; the filter is added with `AND`.
    pub fn build_query(
        builder: &mut QueryBuilder<Sqlite>,
        params: &QueryParams,
        allowed_columns: &[&str],
        filter_columns: &[&str],
    ) -> Result<(), RepoError> {
        if let Some(filter) = &params.filter {
            let pattern = format!("%{}%", escape_like(filter));
            if filter_columns.is_empty() {
                error!("No filter columns specified but filter was provided");
                return Err(RepoError::InvalidColumn("No filter columns specified".to_string()));
            }

            builder.push(" AND (");
            let mut separated = builder.separated(" OR ");
            for &col in filter_columns {
                if !allowed_columns.contains(&col) {
                    error!("Invalid column specified for filtering: {col}");
                    return Err(RepoError::InvalidColumn(col.to_string()));
                }
                separated.push(col);
                separated.push_unseparated(" LIKE ");
                separated.push_bind_unseparated(pattern.clone());
                separated.push_unseparated(" ESCAPE '\\'");
            }
            builder.push(")");
        }

        if !params.sorting.is_empty() {
            builder.push(" ORDER BY ");
            let mut separated = builder.separated(", ");

            for (col, col_sort) in &params.sorting {
                if !allowed_columns.contains(&col.as_str()) {
                    error!("Invalid column specified for sorting: {col}");
                    return Err(RepoError::InvalidColumn(col.clone()));
                }

                separated.push(format!("{col} {}", col_sort.to_sql()));
            }
        }

        if let Some(range) = &params.range {
            let (Ok(limit), Ok(offset)) = (i64::try_from(range.len()), i64::try_from(range.start))
            else {
                error!("Page out of range: {:?}", range);
                return Err(RepoError::InvalidRange(format!("{}..{}", range.start, range.end)));
            };
            builder.push(" LIMIT ");
            builder.push_bind(limit);
            builder.push(" OFFSET ");
            builder.push_bind(offset);
        }

        Ok(())
    }
}

/// Escapes the LIKE wildcards so the filter matches literally.
fn escape_like(filter: &str) -> String {
    let mut escaped = String::with_capacity(filter.len());
    for ch in filter.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
