use thiserror::Error;

/// Failure talking to the catalog API or the rates endpoint.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("resource not found")]
    NotFound,

    #[error("server error: HTTP {0}")]
    Server(u16),

    #[error("unexpected response: HTTP {0}")]
    Status(u16),

    #[error("connectivity error: {0}")]
    Connectivity(String),

    #[error("could not decode response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => ApiError::NotFound,
            500..=599 => ApiError::Server(status),
            _ => ApiError::Status(status),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ApiError::NotFound => ErrorCategory::NotFound,
            ApiError::Server(_) => ErrorCategory::ServerError,
            ApiError::Connectivity(_) => ErrorCategory::Connectivity,
            ApiError::Status(_) | ApiError::Decode(_) => ErrorCategory::Generic,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return ApiError::from_status(status.as_u16());
        }
        if err.is_decode() {
            return ApiError::Decode(err.to_string());
        }
        ApiError::Connectivity(err.to_string())
    }
}

/// User-facing bucket an [`ApiError`] is reported under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    NotFound,
    ServerError,
    Connectivity,
    Generic,
}

impl ErrorCategory {
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCategory::NotFound => "The requested catalog could not be found.",
            ErrorCategory::ServerError => "The server had a problem. Please try again later.",
            ErrorCategory::Connectivity => "Could not reach the server. Check your connection.",
            ErrorCategory::Generic => "Something went wrong. Please try again.",
        }
    }
}
