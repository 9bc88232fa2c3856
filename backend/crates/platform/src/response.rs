//! Error response normalization
//!
//! Handlers answer errors with the JSON problem document from
//! [`kernel::error::app_error::AppError`]. Extractor rejections and fallback
//! responses produced by axum itself are plain text; this middleware rewrites
//! them so every error the client sees has the same shape.

use std::any::Any;

use axum::body::{Body, to_bytes};
use axum::extract::Request;
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use kernel::error::app_error::AppError;
use kernel::error::kind::ErrorKind;

/// Plain-text rejection bodies are short; anything larger is not inspected.
const MAX_INSPECTED_BODY: usize = 64 * 1024;

/// Rewrite non-JSON error responses into problem documents
///
/// Extractor rejections (400, 415, 422) become `VALIDATION_ERROR` with
/// status 400.
pub async fn normalize_error_response(req: Request, next: Next) -> Response {
    let response = next.run(req).await;
    let status = response.status();

    if !(status.is_client_error() || status.is_server_error()) || is_json(&response) {
        return response;
    }

    let (parts, body) = response.into_parts();
    let message = match to_bytes(body, MAX_INSPECTED_BODY).await {
        Ok(bytes) if !bytes.is_empty() => String::from_utf8_lossy(&bytes).trim().to_string(),
        _ => status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string(),
    };

    let error = problem_for(status, message);
    tracing::debug!(
        status = status.as_u16(),
        code = error.code(),
        "Normalized non-JSON error response"
    );

    let mut normalized = error.into_response();
    for (name, value) in parts.headers.iter() {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            normalized.headers_mut().append(name.clone(), value.clone());
        }
    }
    normalized
}

/// Problem document for a handler that panicked
///
/// Passed to `CatchPanicLayer::custom`; the payload is logged, never sent.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload");
    tracing::error!(panic = %message, "Handler panicked");

    AppError::internal("Handler panicked").into_response()
}

fn is_json(response: &Response<Body>) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json") || ct.contains("+json"))
}

fn problem_for(status: StatusCode, message: String) -> AppError {
    match status {
        StatusCode::BAD_REQUEST
        | StatusCode::UNSUPPORTED_MEDIA_TYPE
        | StatusCode::UNPROCESSABLE_ENTITY => AppError::bad_request(message)
            .with_code("VALIDATION_ERROR")
            .with_action("Check the request body and parameters"),
        other => AppError::new(ErrorKind::from_status(other.as_u16()), message),
    }
}
