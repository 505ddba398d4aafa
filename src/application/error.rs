use crate::ports::{ConfigError, StoreError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Backend not configured")]
    BackendNotConfigured,
}

pub type AppResult<T> = Result<T, AppError>;
