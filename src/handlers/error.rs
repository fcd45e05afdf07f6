// src/handlers/error.rs
use std::fmt;
use warp::http::StatusCode;
use warp::reject::Reject;

use crate::errors::ImportError;

#[derive(Debug, Clone)]
pub struct ApiError {
    pub message: String,
    pub status: StatusCode,
}

impl ApiError {
    pub fn with_status(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError {
            message: message.into(),
            status,
        }
    }
}

impl From<&ImportError> for ApiError {
    fn from(err: &ImportError) -> Self {
        let status = match err {
            ImportError::EmptyUsername => StatusCode::BAD_REQUEST,
            ImportError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ImportError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_GATEWAY,
        };
        ApiError::with_status(status, err.to_string())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}
impl Reject for ApiError {}
