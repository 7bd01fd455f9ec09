//! REST API module.
//!
//! Thin handlers over the roster controller plus the legacy pass-through proxy.

mod divisions;
mod legacy;
mod roster;

pub use divisions::*;
pub use legacy::*;
pub use roster::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::{ApiError, AppError};
use crate::roster::RosterController;

/// Success response envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    /// Roster load generation the data was produced under.
    pub generation: u64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T, generation: u64) -> Self {
        Self {
            success: true,
            data,
            generation,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T, generation: u64) -> ApiResult<T> {
    Ok(ApiResponse::new(data, generation))
}

/// Create an error API response.
pub fn error<T: Serialize>(err: AppError, generation: u64) -> ApiResult<T> {
    Err(ApiError {
        error: err,
        generation,
    })
}

/// Wrap a controller result, stamped with the generation after the call.
pub async fn reply<T: Serialize>(
    roster: &RosterController,
    result: Result<T, AppError>,
) -> ApiResult<T> {
    let generation = roster.generation().await;
    match result {
        Ok(data) => success(data, generation),
        Err(e) => error(e, generation),
    }
}
