// Request-level error taxonomy for the URL check API
// Every variant renders as {"error", "details"} JSON

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::url_validator::ValidationError;

// =============================================================================
// ERROR TYPES
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    #[error("Invalid or missing URL.")]
    MissingUrl,

    #[error("Invalid request body.")]
    MalformedBody,

    #[error("Invalid URL provided.")]
    DisallowedCharacters,

    #[error("Invalid URL format.")]
    MalformedHostname,

    #[error("Invalid URL format.")]
    NoValidVariant,

    #[error("Method not allowed.")]
    MethodNotAllowed,

    #[error("Not found")]
    NotFound,

    #[error("Service configuration error.")]
    MissingApiKey,

    #[error("Google Safe Browsing quota exceeded")]
    QuotaExceeded,

    #[error("Google Safe Browsing API unavailable")]
    UpstreamUnavailable,

    #[error("Unknown error")]
    Exhausted,

    #[error("Internal server error")]
    Internal,
}

// =============================================================================
// ERROR CONVERSIONS
// =============================================================================

impl From<ValidationError> for CheckError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::MissingInput => CheckError::MissingUrl,
            ValidationError::DisallowedCharacters => CheckError::DisallowedCharacters,
            ValidationError::InvalidFormat(_) | ValidationError::MalformedHostname(_) => {
                CheckError::MalformedHostname
            },
            ValidationError::NoValidVariant => CheckError::NoValidVariant,
        }
    }
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckErrorResponse {
    pub error: String,
    pub details: String,
}

impl CheckError {
    /// Get HTTP status code for error
    pub fn status_code(&self) -> StatusCode {
        match self {
            CheckError::MissingUrl
            | CheckError::MalformedBody
            | CheckError::DisallowedCharacters
            | CheckError::MalformedHostname
            | CheckError::NoValidVariant => StatusCode::BAD_REQUEST,

            CheckError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,

            CheckError::NotFound => StatusCode::NOT_FOUND,

            CheckError::QuotaExceeded | CheckError::UpstreamUnavailable => {
                StatusCode::SERVICE_UNAVAILABLE
            },

            CheckError::MissingApiKey | CheckError::Exhausted | CheckError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }

    /// Actionable sentence shown to the caller
    pub fn details(&self) -> &'static str {
        match self {
            CheckError::MissingUrl => "Please provide a valid URL string.",
            CheckError::MalformedBody => {
                "Request body must be a JSON object with a \"url\" string."
            },
            CheckError::DisallowedCharacters => {
                "URL cannot be empty or contain spaces, quotes, or control characters."
            },
            CheckError::MalformedHostname | CheckError::NoValidVariant => {
                "Please provide a properly formatted URL."
            },
            CheckError::MethodNotAllowed => "Use POST to submit a URL for checking.",
            CheckError::NotFound => "The requested endpoint does not exist.",
            CheckError::MissingApiKey => "Google Safe Browsing API key not configured.",
            CheckError::QuotaExceeded => {
                "The service is temporarily unavailable due to quota limits. Please try again later."
            },
            CheckError::UpstreamUnavailable => {
                "The service is temporarily unavailable. Please try again later."
            },
            CheckError::Exhausted => "Unable to determine URL safety. Please try again.",
            CheckError::Internal => "Something went wrong while processing your request.",
        }
    }

    pub fn to_response(&self) -> CheckErrorResponse {
        CheckErrorResponse {
            error: self.to_string(),
            details: self.details().to_string(),
        }
    }
}

impl IntoResponse for CheckError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = self.to_response();

        (status, Json(body)).into_response()
    }
}

// =============================================================================
// RESULT TYPE
// =============================================================================

pub type CheckResult<T> = Result<T, CheckError>;

// =============================================================================
// TESTS
// =============================================================================
