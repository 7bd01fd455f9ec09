//! Remote store access.
//!
//! [`RemoteStore`] is the raw table API (Supabase in production, an in-process
//! table in development). [`TeamService`] sits on top of it and turns every
//! failure into a logged, uniform failure signal so nothing above this module
//! handles transport errors.

mod memory;
mod supabase;
#[cfg(test)]
pub mod testing;

pub use memory::MemoryStore;
pub use supabase::SupabaseStore;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::AppError;
use crate::models::{MemberPatch, NewMemberRow, StatsPatch, TeamMember, TeamMemberRow};

/// Raw JSON answer from the remote, passed through untouched by the legacy proxy.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Value,
}

/// Table-level operations against the remote store.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Members of one division, newest first.
    async fn select_members(&self, division_id: &str) -> Result<Vec<TeamMemberRow>, AppError>;

    /// Insert one member and return the stored row.
    async fn insert_member(&self, row: &NewMemberRow) -> Result<TeamMemberRow, AppError>;

    /// Merge the provided fields into the row with `id`.
    async fn update_member(
        &self,
        id: &str,
        patch: &MemberPatch,
    ) -> Result<TeamMemberRow, AppError>;

    /// Delete by id, returning the rows the remote reports as removed.
    async fn delete_member(&self, id: &str) -> Result<Vec<TeamMemberRow>, AppError>;

    /// Filtered read of an arbitrary table (PostgREST query parameters).
    async fn fetch_raw(
        &self,
        table: &str,
        params: &[(String, String)],
    ) -> Result<RawResponse, AppError>;

    /// Insert an arbitrary JSON payload into a table.
    async fn insert_raw(&self, table: &str, payload: &Value) -> Result<RawResponse, AppError>;
}

/// Team member client with best-effort, single-attempt semantics.
#[derive(Clone)]
pub struct TeamService {
    store: Arc<dyn RemoteStore>,
}

impl TeamService {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn RemoteStore> {
        &self.store
    }

    /// Members of a division, newest first. Empty on any failure.
    pub async fn list_members(&self, division_id: &str) -> Vec<TeamMember> {
        if division_id.trim().is_empty() {
            tracing::warn!("Refusing to list team members without a division id");
            return Vec::new();
        }

        match self.store.select_members(division_id).await {
            Ok(rows) => rows.into_iter().map(TeamMember::from).collect(),
            Err(err) => {
                tracing::error!(division_id, error = %err, "Error fetching team members");
                Vec::new()
            }
        }
    }

    pub async fn create_member(&self, row: &NewMemberRow) -> Option<TeamMember> {
        match self.store.insert_member(row).await {
            Ok(created) => Some(created.into()),
            Err(err) => {
                tracing::error!(division_id = %row.division_id, error = %err, "Error adding team member");
                None
            }
        }
    }

    pub async fn update_member(&self, id: &str, patch: &MemberPatch) -> Option<TeamMember> {
        if patch.is_empty() {
            tracing::warn!(member_id = id, "Skipping team member update with no fields");
            return None;
        }

        match self.store.update_member(id, patch).await {
            Ok(updated) => Some(updated.into()),
            Err(err) => {
                tracing::error!(member_id = id, error = %err, "Error updating team member");
                None
            }
        }
    }

    /// True only when the remote confirms removal of exactly this row.
    pub async fn delete_member(&self, id: &str) -> bool {
        match self.store.delete_member(id).await {
            Ok(rows) => match rows.as_slice() {
                [row] if row.id == id => true,
                other => {
                    tracing::warn!(
                        member_id = id,
                        deleted = other.len(),
                        "Remote did not confirm deletion of exactly one row"
                    );
                    false
                }
            },
            Err(err) => {
                tracing::error!(member_id = id, error = %err, "Error deleting team member");
                false
            }
        }
    }

    pub async fn update_stats(&self, id: &str, stats: StatsPatch) -> Option<TeamMember> {
        self.update_member(id, &stats.into()).await
    }
}
