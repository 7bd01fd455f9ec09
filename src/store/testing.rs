//! Test double around [`MemoryStore`] with failure and latency injection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{MemoryStore, RawResponse, RemoteStore};
use crate::errors::AppError;
use crate::models::{MemberPatch, NewMember, NewMemberRow, TeamMemberRow};

#[derive(Default)]
pub struct FakeStore {
    inner: MemoryStore,
    calls: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    select_delays: Mutex<HashMap<String, Duration>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of calls that reached the store through the trait.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn delay_division(&self, division_id: &str, delay: Duration) {
        self.select_delays
            .lock()
            .unwrap()
            .insert(division_id.to_string(), delay);
    }

    /// Insert directly, bypassing call counting and failure injection.
    pub async fn seed(&self, division_id: &str, name: &str, points: i64) -> TeamMemberRow {
        let mut member = NewMember::named(name);
        member.sales_points = points;
        self.inner
            .insert_member(&member.into_row(division_id))
            .await
            .unwrap()
    }

    fn enter(&self, write: bool) -> Result<(), AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failing = if write {
            &self.fail_writes
        } else {
            &self.fail_reads
        };
        if failing.load(Ordering::SeqCst) {
            return Err(AppError::Remote("injected failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for FakeStore {
    async fn select_members(&self, division_id: &str) -> Result<Vec<TeamMemberRow>, AppError> {
        self.enter(false)?;
        let delay = self.select_delays.lock().unwrap().get(division_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.select_members(division_id).await
    }

    async fn insert_member(&self, row: &NewMemberRow) -> Result<TeamMemberRow, AppError> {
        self.enter(true)?;
        self.inner.insert_member(row).await
    }

    async fn update_member(
        &self,
        id: &str,
        patch: &MemberPatch,
    ) -> Result<TeamMemberRow, AppError> {
        self.enter(true)?;
        self.inner.update_member(id, patch).await
    }

    async fn delete_member(&self, id: &str) -> Result<Vec<TeamMemberRow>, AppError> {
        self.enter(true)?;
        self.inner.delete_member(id).await
    }

    async fn fetch_raw(
        &self,
        table: &str,
        params: &[(String, String)],
    ) -> Result<RawResponse, AppError> {
        self.enter(false)?;
        self.inner.fetch_raw(table, params).await
    }

    async fn insert_raw(&self, table: &str, payload: &Value) -> Result<RawResponse, AppError> {
        self.enter(true)?;
        self.inner.insert_raw(table, payload).await
    }
}
