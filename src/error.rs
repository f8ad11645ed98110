use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    MissingVar(String),
    #[error("DB_PORT is not a valid port number: {0}")]
    InvalidPort(String),
}

#[derive(Debug, Error)]
pub enum DBError {
    #[error(transparent)]
    SQLError(#[from] sqlx::Error),
    #[error("Refusing to interpolate sql identifier: {0:?}")]
    InvalidIdentifier(String),
}
