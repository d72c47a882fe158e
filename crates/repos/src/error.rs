use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum RepoError {
    #[error("database failure: {0}")]
    DatabaseError(String),

    #[error("database invalid column: {0}")]
    InvalidColumn(String),

    #[error("page out of range: {0}")]
    InvalidRange(String),

    #[error("not found")]
    NotFound(),

    #[error("database uniqueness violation on {0}")]
    UniqueViolation(String),

    #[error("database foreign key violation")]
    ForeignKeyViolation(String),

    #[error("database integrity check failed")]
    CheckViolation(String),

    #[error("database transaction error")]
    TransactionError(),

    #[error("corrupt row: {0}")]
    CorruptRow(String),

    #[error("database error")]
    Other(),
}

pub fn handle_sql_error(err: sqlx::Error) -> RepoError {
    use sqlx::Error as E;

    error!("SQL error: {}", err);
    match err {
        E::RowNotFound => RepoError::NotFound(),
        E::ColumnDecode { ref index, .. } => RepoError::CorruptRow(index.clone()),
        E::Database(ref e) => {
            let message = e.message().to_string();

            if e.is_unique_violation() {
                return RepoError::UniqueViolation(message);
            }

            if e.is_foreign_key_violation() {
                return RepoError::ForeignKeyViolation(message);
            }

            if e.is_check_violation() {
                return RepoError::CheckViolation(message);
            }

            RepoError::DatabaseError(message)
        }
        E::PoolClosed | E::PoolTimedOut => RepoError::TransactionError(),
        _ => RepoError::Other(),
    }
}
