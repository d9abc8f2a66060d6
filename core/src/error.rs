use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid document: {0}")]
    InvalidDocument(String),
    #[error("invalid program: {0}")]
    InvalidProgram(String),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
