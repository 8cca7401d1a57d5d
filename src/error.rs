use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DriveMcpError>;

#[derive(Debug, Error)]
pub enum DriveMcpError {
    #[error("credentials.json not found at {}. Please download it from Google Cloud Console.", .path.display())]
    MissingClientSecret { path: PathBuf },

    #[error("consent flow denied or abandoned: {0}")]
    ConsentDenied(String),

    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("drive api call failed (status {status}): {message}")]
    RemoteCallFailed { status: u16, message: String },

    #[error("token store error: {} - {reason}", .path.display())]
    TokenStore { path: PathBuf, reason: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
