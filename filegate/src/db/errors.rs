use thiserror::Error;

/// Errors from talking to the database. Both variants are upstream failures from the point of
/// view of the API; they are kept apart so logs show which step failed.
#[derive(Error, Debug)]
pub enum DbError {
    /// Could not open a connection (unreachable host, bad credentials, unknown database)
    #[error("failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),

    /// Connected, but the query itself failed
    #[error("database query failed: {0}")]
    Query(#[source] sqlx::Error),
}

/// Type alias for database operation results
pub type Result<T> = std::result::Result<T, DbError>;
