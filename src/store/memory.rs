//! In-process store used when no Supabase project is configured.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::Mutex;

use super::{RawResponse, RemoteStore};
use crate::errors::AppError;
use crate::models::{MemberPatch, NewMemberRow, TeamMemberRow};

/// Volatile tables with the same observable behavior as the remote ones.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    members: Vec<StoredRow>,
    next_seq: u64,
    raw: HashMap<String, Vec<Value>>,
}

struct StoredRow {
    // Creation order; timestamps alone can collide.
    seq: u64,
    row: TeamMemberRow,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn select_members(&self, division_id: &str) -> Result<Vec<TeamMemberRow>, AppError> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<&StoredRow> = tables
            .members
            .iter()
            .filter(|stored| stored.row.division_id == division_id)
            .collect();
        rows.sort_by(|a, b| b.seq.cmp(&a.seq));
        Ok(rows.into_iter().map(|stored| stored.row.clone()).collect())
    }

    async fn insert_member(&self, row: &NewMemberRow) -> Result<TeamMemberRow, AppError> {
        let now = Utc::now().to_rfc3339();
        let created = TeamMemberRow {
            id: uuid::Uuid::new_v4().to_string(),
            name: row.name.clone(),
            sales_points: row.sales_points,
            visits: row.visits,
            calls: row.calls,
            chats: row.chats,
            color: row.color.clone(),
            avatar: row.avatar.clone(),
            division_id: row.division_id.clone(),
            created_at: Some(now.clone()),
            updated_at: Some(now),
        };

        let mut tables = self.tables.lock().await;
        tables.next_seq += 1;
        let seq = tables.next_seq;
        tables.members.push(StoredRow {
            seq,
            row: created.clone(),
        });
        Ok(created)
    }

    async fn update_member(
        &self,
        id: &str,
        patch: &MemberPatch,
    ) -> Result<TeamMemberRow, AppError> {
        let mut tables = self.tables.lock().await;
        let stored = tables
            .members
            .iter_mut()
            .find(|stored| stored.row.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Member {} not found", id)))?;

        patch.apply_to_row(&mut stored.row);
        stored.row.updated_at = Some(Utc::now().to_rfc3339());
        Ok(stored.row.clone())
    }

    async fn delete_member(&self, id: &str) -> Result<Vec<TeamMemberRow>, AppError> {
        let mut tables = self.tables.lock().await;
        let removed = match tables.members.iter().position(|stored| stored.row.id == id) {
            Some(index) => vec![tables.members.remove(index).row],
            None => Vec::new(),
        };
        Ok(removed)
    }

    async fn fetch_raw(
        &self,
        table: &str,
        params: &[(String, String)],
    ) -> Result<RawResponse, AppError> {
        // Only `column=eq.value` filters are honored; select/order are ignored.
        let filters: Vec<(&str, &str)> = params
            .iter()
            .filter_map(|(column, value)| {
                value
                    .strip_prefix("eq.")
                    .map(|expected| (column.as_str(), expected))
            })
            .collect();

        let tables = self.tables.lock().await;
        let rows: Vec<Value> = tables
            .raw
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| filters.iter().all(|(column, expected)| matches_eq(row, column, expected)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        Ok(RawResponse {
            status: 200,
            body: Value::Array(rows),
        })
    }

    async fn insert_raw(&self, table: &str, payload: &Value) -> Result<RawResponse, AppError> {
        let inserted = match payload {
            Value::Array(rows) => rows.clone(),
            other => vec![other.clone()],
        };

        let mut tables = self.tables.lock().await;
        tables
            .raw
            .entry(table.to_string())
            .or_default()
            .extend(inserted.iter().cloned());

        Ok(RawResponse {
            status: 201,
            body: Value::Array(inserted),
        })
    }
}

fn matches_eq(row: &Value, column: &str, expected: &str) -> bool {
    match row.get(column) {
        Some(Value::String(s)) => s == expected,
        Some(Value::Null) | None => false,
        Some(other) => other.to_string() == expected,
    }
}
