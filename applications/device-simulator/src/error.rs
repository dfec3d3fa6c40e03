use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend returned {status}: {message}")]
    Backend { status: u16, message: String },
    #[error("unexpected response: {0}")]
    Response(String),
}

pub type Result<T> = std::result::Result<T, SimError>;
