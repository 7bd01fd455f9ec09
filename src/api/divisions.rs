//! Division catalog endpoints.

use axum::extract::{Path, State};

use super::{reply, ApiResult};
use crate::errors::AppError;
use crate::models::{find_division, Division, DIVISIONS};
use crate::AppState;

/// GET /api/divisions - List the division catalog.
pub async fn list_divisions(State(state): State<AppState>) -> ApiResult<&'static [Division]> {
    reply(&state.roster, Ok(&DIVISIONS[..])).await
}

/// GET /api/divisions/:id - Get a single division.
pub async fn get_division(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Division> {
    let result = find_division(&id)
        .copied()
        .ok_or_else(|| AppError::NotFound(format!("Division {} not found", id)));
    reply(&state.roster, result).await
}
