//! Pre-shared key guard for the API and legacy routes.

use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use subtle::ConstantTimeEq;

use crate::errors::{AppError, ErrorResponse};

/// Header carrying the key. `Authorization: Bearer <key>` is accepted too.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Reject requests that do not present `expected`. With no key configured
/// every request passes.
pub async fn require_psk(expected: Option<String>, request: Request, next: Next) -> Response {
    let Some(expected) = expected else {
        return next.run(request).await;
    };

    let accepted = presented_key(request.headers()).map(|key| keys_match(key, &expected));
    match accepted {
        Some(true) => next.run(request).await,
        Some(false) => reject("Invalid API key"),
        None => reject("Missing API key"),
    }
}

fn presented_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
        })
}

fn keys_match(provided: &str, expected: &str) -> bool {
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

fn reject(message: &str) -> Response {
    let error = AppError::Unauthorized(message.to_string());
    tracing::debug!(%error, "Rejected request");
    (error.status_code(), Json(ErrorResponse::new(&error, 0))).into_response()
}
