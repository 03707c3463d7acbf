/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Upstream rejected the request credentials (HTTP 401).
    ///
    /// Carries the upstream body only; the configured token never appears here.
    #[error("Upstream authentication failed (401): {0}")]
    Unauthorized(String),

    #[error("Upstream returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Builds the error for a non-2xx upstream response.
    pub fn from_status(status: u16, body: String) -> Self {
        if status == 401 {
            AppError::Unauthorized(body)
        } else {
            AppError::Upstream { status, body }
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
