// URL safety check endpoint
// POST /check-url (also under the API base path)

use axum::{
    body::Bytes,
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use std::any::Any;
use tracing::{error, info};

use crate::{app::AppState, models::Verdict, utils::check_errors::CheckError};

// =============================================================================
// CHECK HANDLER
// =============================================================================

/// Check a URL and return its safety verdict
/// POST /check-url  {"url": "example.com"}
pub async fn check_url(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Verdict>, CheckError> {
    info!("--- Incoming /check-url request ---");

    let raw = extract_url(&body)?;
    let verdict = state.url_check.check(&raw).await?;

    Ok(Json(verdict))
}

/// Pull the `url` string out of the request body.
/// An empty body is a missing URL; unparseable JSON is a malformed body.
fn extract_url(body: &[u8]) -> Result<String, CheckError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(CheckError::MissingUrl);
    }

    let payload: Value = serde_json::from_slice(body).map_err(|_| CheckError::MalformedBody)?;

    match payload.get("url").and_then(Value::as_str) {
        Some(url) if !url.is_empty() => Ok(url.to_string()),
        _ => Err(CheckError::MissingUrl),
    }
}

/// Any method other than POST/OPTIONS on /check-url
pub async fn method_not_allowed() -> CheckError {
    CheckError::MethodNotAllowed
}

/// Unknown route
pub async fn not_found() -> CheckError {
    CheckError::NotFound
}

/// JSON 500 for a request whose handler panicked
pub fn internal_error(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");
    error!("Request handler panicked: {}", message);

    CheckError::Internal.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_url() {
        assert_eq!(
            extract_url(br#"{"url": "example.com"}"#).unwrap(),
            "example.com"
        );
        assert_eq!(extract_url(b""), Err(CheckError::MissingUrl));
        assert_eq!(extract_url(br#"{}"#), Err(CheckError::MissingUrl));
        assert_eq!(extract_url(br#"{"url": ""}"#), Err(CheckError::MissingUrl));
        assert_eq!(extract_url(br#"{"url": 42}"#), Err(CheckError::MissingUrl));
        assert_eq!(extract_url(br#"["example.com"]"#), Err(CheckError::MissingUrl));
        assert_eq!(extract_url(b"{not json"), Err(CheckError::MalformedBody));
    }
}
