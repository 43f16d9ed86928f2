use thiserror::Error;

use crate::utils::truncate;

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Got HTTP status {status}, expected 200: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

impl FetchError {
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        FetchError::Status {
            status,
            body: truncate(body, MAX_ERROR_BODY_LENGTH),
        }
    }
}
