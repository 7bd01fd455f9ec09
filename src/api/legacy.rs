//! Pass-through endpoints for older clients.
//!
//! These answer with the remote's JSON as-is, without the API envelope.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::store::RawResponse;
use crate::AppState;

const TEAM_SELECT: &str = "id,name,sales_logs(sales_point),lead_measures(kunjungan,telepon,chat)";
const SALES_FIELDS: &[&str] = &["user_id", "sales_point", "log_date"];
const LEAD_FIELDS: &[&str] = &["user_id", "kunjungan", "telepon", "chat", "log_date"];

#[derive(Debug, Deserialize)]
pub struct TeamQuery {
    pub division_id: Option<String>,
}

/// GET /legacy/get_team?division_id= - Users of a division with their logs.
pub async fn get_team(State(state): State<AppState>, Query(query): Query<TeamQuery>) -> Response {
    let Some(division_id) = query.division_id.filter(|id| !id.is_empty()) else {
        return legacy_error(StatusCode::BAD_REQUEST, "division_id is required");
    };

    let params = [
        ("select".to_string(), TEAM_SELECT.to_string()),
        ("division_id".to_string(), format!("eq.{}", division_id)),
    ];
    forward(state.roster.service().store().fetch_raw("users", &params).await)
}

/// POST /legacy/post_sales - Record a sales log entry.
pub async fn post_sales(State(state): State<AppState>, body: Bytes) -> Response {
    insert_checked(&state, "sales_logs", SALES_FIELDS, &body).await
}

/// POST /legacy/post_lead - Record a lead measure entry.
pub async fn post_lead(State(state): State<AppState>, body: Bytes) -> Response {
    insert_checked(&state, "lead_measures", LEAD_FIELDS, &body).await
}

async fn insert_checked(state: &AppState, table: &str, required: &[&str], body: &[u8]) -> Response {
    // A body that is not JSON counts as having no fields.
    let payload: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
    if missing_fields(&payload, required) {
        return legacy_error(StatusCode::BAD_REQUEST, "Missing fields");
    }

    forward(state.roster.service().store().insert_raw(table, &payload).await)
}

/// True unless every field is present and non-null.
fn missing_fields(payload: &Value, required: &[&str]) -> bool {
    required
        .iter()
        .any(|field| payload.get(field).map_or(true, Value::is_null))
}

fn forward(result: Result<RawResponse, AppError>) -> Response {
    match result {
        Ok(raw) => {
            let status = StatusCode::from_u16(raw.status).unwrap_or(StatusCode::BAD_GATEWAY);
            (status, Json(raw.body)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Legacy proxy request failed");
            legacy_error(StatusCode::BAD_GATEWAY, e.message())
        }
    }
}

fn legacy_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
