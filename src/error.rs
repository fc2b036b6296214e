use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("invalid stored json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("not found")]
    NotFound,

    #[error("already exists")]
    AlreadyExists,

    /// Uniform outcome for unknown, expired, and orphaned delegation tokens.
    /// The precise cause is logged server-side, never returned to the caller.
    #[error("link invalid or expired")]
    LinkInvalid,

    #[error("validation failed: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
