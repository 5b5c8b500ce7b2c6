pub mod context;
pub mod registry;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema name {0:?} is not a valid identifier")]
    InvalidName(String),
    #[error("schema {0:?} already exists")]
    AlreadyExists(String),
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
}

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("failed to migrate schema {schema:?}: {message}")]
    Failed { schema: String, message: String },
}
