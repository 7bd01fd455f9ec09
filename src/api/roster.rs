//! Roster endpoints. Every mutation goes through the roster controller.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{reply, ApiResult};
use crate::models::{ActivityKind, MemberField, MemberPatch, NewMember, StatsPatch, TeamMember};
use crate::roster::{LeaderboardEntry, LoadOutcome, RosterSnapshot, RosterSummary};
use crate::AppState;

/// Request body for selecting a division.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectDivisionRequest {
    pub division_id: String,
}

/// Request body for a single field update.
#[derive(Debug, Deserialize)]
pub struct FieldValueRequest {
    #[serde(default)]
    pub value: Value,
}

/// Request body for increments and decrements.
#[derive(Debug, Deserialize)]
pub struct DeltaRequest {
    pub delta: i64,
}

/// Query parameters for deletion.
#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub id: String,
    pub deleted: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsResponse {
    pub member: TeamMember,
    pub previous_points: i64,
    pub checkpoint: i64,
    pub checkpoint_crossed: bool,
    pub celebrating: Option<String>,
}

/// GET /api/roster - Current roster snapshot.
pub async fn get_roster(State(state): State<AppState>) -> ApiResult<RosterSnapshot> {
    let snapshot = state.roster.snapshot().await;
    reply(&state.roster, Ok(snapshot)).await
}

/// PUT /api/roster/division - Select a division and load its members.
pub async fn select_division(
    State(state): State<AppState>,
    Json(request): Json<SelectDivisionRequest>,
) -> ApiResult<LoadOutcome> {
    let result = state.roster.select_division(&request.division_id).await;
    reply(&state.roster, result).await
}

/// DELETE /api/roster/division - Leave the current division.
pub async fn clear_division(State(state): State<AppState>) -> ApiResult<()> {
    state.roster.clear_division().await;
    reply(&state.roster, Ok(())).await
}

/// POST /api/roster/refresh - Reload the current division.
pub async fn refresh_roster(State(state): State<AppState>) -> ApiResult<LoadOutcome> {
    let result = state.roster.refresh().await;
    reply(&state.roster, result).await
}

/// GET /api/roster/summary - Dashboard aggregates.
pub async fn get_summary(State(state): State<AppState>) -> ApiResult<RosterSummary> {
    let summary = state.roster.summary().await;
    reply(&state.roster, Ok(summary)).await
}

/// GET /api/roster/leaderboard - Members ranked by sales points.
pub async fn get_leaderboard(State(state): State<AppState>) -> ApiResult<Vec<LeaderboardEntry>> {
    let board = state.roster.leaderboard().await;
    reply(&state.roster, Ok(board)).await
}

/// POST /api/roster/members - Add a member to the selected division.
pub async fn add_member(
    State(state): State<AppState>,
    Json(request): Json<NewMember>,
) -> ApiResult<TeamMember> {
    let result = state.roster.add_member(request).await;
    reply(&state.roster, result).await
}

/// PUT /api/roster/members/:id - Update a member with the server's merge.
pub async fn edit_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<MemberPatch>,
) -> ApiResult<TeamMember> {
    let result = state.roster.edit_member(&id, request).await;
    reply(&state.roster, result).await
}

/// DELETE /api/roster/members/:id?confirm=true - Delete a member.
pub async fn delete_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> ApiResult<DeleteResponse> {
    let result = state
        .roster
        .delete_member(&id, |_| query.confirm)
        .await
        .map(|deleted| DeleteResponse {
            id: id.clone(),
            deleted,
        });
    reply(&state.roster, result).await
}

/// PATCH /api/roster/members/:id/fields/:field - Optimistic single-field update.
pub async fn update_field(
    State(state): State<AppState>,
    Path((id, field)): Path<(String, String)>,
    Json(request): Json<FieldValueRequest>,
) -> ApiResult<TeamMember> {
    let result = match MemberField::parse(&field, &request.value) {
        Ok(field) => state
            .roster
            .update_field(&id, field)
            .await
            .map(|edit| edit.member),
        Err(e) => Err(e),
    };
    reply(&state.roster, result).await
}

/// POST /api/roster/members/:id/stats - Update numeric stats and wait for the store.
pub async fn update_stats(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<StatsPatch>,
) -> ApiResult<TeamMember> {
    let result = state.roster.update_stats(&id, request).await;
    reply(&state.roster, result).await
}

/// POST /api/roster/members/:id/points - Move a member along the track.
pub async fn adjust_points(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<DeltaRequest>,
) -> ApiResult<PointsResponse> {
    let result = match state.roster.adjust_points(&id, request.delta).await {
        Ok(update) => Ok(PointsResponse {
            member: update.edit.member,
            previous_points: update.previous_points,
            checkpoint: update.checkpoint,
            checkpoint_crossed: update.checkpoint_crossed,
            celebrating: state.roster.celebrating().await,
        }),
        Err(e) => Err(e),
    };
    reply(&state.roster, result).await
}

/// POST /api/roster/members/:id/activities/:kind - Bump an activity counter.
pub async fn adjust_activity(
    State(state): State<AppState>,
    Path((id, kind)): Path<(String, ActivityKind)>,
    Json(request): Json<DeltaRequest>,
) -> ApiResult<TeamMember> {
    let result = state
        .roster
        .adjust_activity(&id, kind, request.delta)
        .await
        .map(|edit| edit.member);
    reply(&state.roster, result).await
}
