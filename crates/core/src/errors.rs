use thiserror::Error;

#[derive(Error, Debug)]
pub enum CasetaError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication failed: {0}")]
    AuthFailure(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] eyre::Report),
}

pub type CasetaResult<T> = Result<T, CasetaError>;
