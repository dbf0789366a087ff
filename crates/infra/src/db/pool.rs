use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub type DbPool = PgPool;

#[derive(Debug, Error)]
pub enum DbPoolError {
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

pub fn connect_lazy(database_url: &str, max_connections: u32) -> Result<DbPool, DbPoolError> {
    Ok(PgPoolOptions::new()
        .max_connections(max_connections)
        .connect_lazy(database_url)?)
}
