//! Roster state controller.
//!
//! Owns the member list of the selected division and funnels every mutation
//! through [`TeamService`]. Division loads carry a generation number; a load
//! whose generation is no longer current when it resolves is dropped, so a
//! slow response for an old selection never overwrites a newer one.
//!
//! Field edits and point adjustments are optimistic: the local entry changes
//! first and the remote update runs in the background. A failed background
//! update is logged and not rolled back.

mod checkpoint;
mod stats;

pub use stats::{LeaderboardEntry, RosterSummary};

use checkpoint::{checkpoint_of, clamp_points, crossed_upward, Celebration};
use stats::{leaderboard, summarize};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::errors::AppError;
use crate::models::{
    find_division, ActivityKind, Division, MemberField, MemberPatch, NewMember, StatsPatch,
    TeamMember,
};
use crate::store::TeamService;

#[derive(Debug, Default)]
struct RosterState {
    division: Option<&'static Division>,
    members: Vec<TeamMember>,
    generation: u64,
    celebration: Option<Celebration>,
}

impl RosterState {
    fn member(&self, id: &str) -> Result<&TeamMember, AppError> {
        self.members
            .iter()
            .find(|m| m.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Member {} not found", id)))
    }

    fn member_mut(&mut self, id: &str) -> Result<&mut TeamMember, AppError> {
        self.members
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Member {} not found", id)))
    }

    fn replace(&mut self, updated: &TeamMember) {
        if let Some(slot) = self.members.iter_mut().find(|m| m.id == updated.id) {
            *slot = updated.clone();
        }
    }
}

/// Point-in-time view of the roster for the presentation layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterSnapshot {
    pub division: Option<Division>,
    pub members: Vec<TeamMember>,
    pub generation: u64,
    pub loading: bool,
    pub celebrating: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum LoadOutcome {
    Applied { members: usize },
    /// A newer selection or refresh started before this load resolved.
    Superseded,
}

/// A local change whose remote write is still in flight.
#[derive(Debug)]
pub struct LocalEdit {
    pub member: TeamMember,
    /// Resolves to whether the store accepted the change.
    pub sync: JoinHandle<bool>,
}

#[derive(Debug)]
pub struct PointsUpdate {
    pub edit: LocalEdit,
    pub previous_points: i64,
    pub checkpoint: i64,
    pub checkpoint_crossed: bool,
}

pub struct RosterController {
    service: TeamService,
    state: RwLock<RosterState>,
    in_flight: AtomicUsize,
    celebration_window: Duration,
}

/// Marks an operation as in flight for the advisory loading flag.
struct Busy<'a>(&'a AtomicUsize);

impl<'a> Busy<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Busy(counter)
    }
}

impl Drop for Busy<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RosterController {
    pub fn new(service: TeamService, celebration_window: Duration) -> Self {
        Self {
            service,
            state: RwLock::new(RosterState::default()),
            in_flight: AtomicUsize::new(0),
            celebration_window,
        }
    }

    pub fn service(&self) -> &TeamService {
        &self.service
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub async fn generation(&self) -> u64 {
        self.state.read().await.generation
    }

    pub async fn members(&self) -> Vec<TeamMember> {
        self.state.read().await.members.clone()
    }

    pub async fn snapshot(&self) -> RosterSnapshot {
        let state = self.state.read().await;
        RosterSnapshot {
            division: state.division.copied(),
            members: state.members.clone(),
            generation: state.generation,
            loading: self.is_loading(),
            celebrating: self.active_celebration(&state),
        }
    }

    pub async fn summary(&self) -> RosterSummary {
        summarize(&self.state.read().await.members)
    }

    pub async fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        leaderboard(&self.state.read().await.members)
    }

    /// Member id currently celebrating a checkpoint, if the window is still open.
    pub async fn celebrating(&self) -> Option<String> {
        let state = self.state.read().await;
        self.active_celebration(&state)
    }

    fn active_celebration(&self, state: &RosterState) -> Option<String> {
        state
            .celebration
            .as_ref()
            .filter(|c| c.is_active(self.celebration_window))
            .map(|c| c.member_id.clone())
    }

    /// Select a division and load its roster.
    pub async fn select_division(&self, division_id: &str) -> Result<LoadOutcome, AppError> {
        let division = find_division(division_id)
            .ok_or_else(|| AppError::NotFound(format!("Division {} not found", division_id)))?;

        let generation = {
            let mut state = self.state.write().await;
            if state.division.map(|d| d.id) != Some(division.id) {
                state.members.clear();
                state.celebration = None;
            }
            state.division = Some(division);
            state.generation += 1;
            state.generation
        };

        Ok(self.load(division, generation).await)
    }

    /// Reload the currently selected division.
    pub async fn refresh(&self) -> Result<LoadOutcome, AppError> {
        let (division, generation) = {
            let mut state = self.state.write().await;
            let division = state
                .division
                .ok_or_else(|| AppError::BadRequest("No division selected".to_string()))?;
            state.generation += 1;
            (division, state.generation)
        };

        Ok(self.load(division, generation).await)
    }

    pub async fn clear_division(&self) {
        let mut state = self.state.write().await;
        state.division = None;
        state.members.clear();
        state.celebration = None;
        state.generation += 1;
    }

    async fn load(&self, division: &'static Division, generation: u64) -> LoadOutcome {
        let _busy = Busy::enter(&self.in_flight);
        let members = self.service.list_members(division.id).await;

        let mut state = self.state.write().await;
        if state.generation != generation {
            tracing::debug!(
                division_id = division.id,
                generation,
                current = state.generation,
                "Discarding superseded roster load"
            );
            return LoadOutcome::Superseded;
        }

        let count = members.len();
        state.members = members;
        tracing::info!(division_id = division.id, members = count, "Roster loaded");
        LoadOutcome::Applied { members: count }
    }

    pub async fn add_member(&self, fields: NewMember) -> Result<TeamMember, AppError> {
        if fields.name.trim().is_empty() {
            return Err(AppError::Validation("Name is required".to_string()));
        }

        let division = self
            .state
            .read()
            .await
            .division
            .ok_or_else(|| AppError::BadRequest("No division selected".to_string()))?;

        let _busy = Busy::enter(&self.in_flight);
        let created = self
            .service
            .create_member(&fields.into_row(division.id))
            .await
            .ok_or_else(|| AppError::Remote("Failed to add team member".to_string()))?;

        let mut state = self.state.write().await;
        let same_division = state.division.map(|d| d.id) == Some(division.id);
        // A refresh that resolved after the insert may already list the member.
        if same_division && !state.members.iter().any(|m| m.id == created.id) {
            state.members.push(created.clone());
        }
        tracing::info!(member_id = %created.id, division_id = division.id, "Team member added");
        Ok(created)
    }

    /// Update a member and adopt the server's representation.
    pub async fn edit_member(&self, id: &str, patch: MemberPatch) -> Result<TeamMember, AppError> {
        if patch.is_empty() {
            return Err(AppError::Validation("No fields to update".to_string()));
        }
        self.state.read().await.member(id)?;

        let _busy = Busy::enter(&self.in_flight);
        let updated = self
            .service
            .update_member(id, &patch)
            .await
            .ok_or_else(|| AppError::Remote("Failed to update team member".to_string()))?;

        self.state.write().await.replace(&updated);
        Ok(updated)
    }

    pub async fn update_stats(&self, id: &str, stats: StatsPatch) -> Result<TeamMember, AppError> {
        if MemberPatch::from(stats).is_empty() {
            return Err(AppError::Validation("No stats to update".to_string()));
        }
        self.state.read().await.member(id)?;

        let _busy = Busy::enter(&self.in_flight);
        let updated = self
            .service
            .update_stats(id, stats)
            .await
            .ok_or_else(|| AppError::Remote("Failed to update member stats".to_string()))?;

        self.state.write().await.replace(&updated);
        Ok(updated)
    }

    /// Delete after `confirm` approves. Returns `false` when it declines.
    pub async fn delete_member<F>(&self, id: &str, confirm: F) -> Result<bool, AppError>
    where
        F: FnOnce(&TeamMember) -> bool,
    {
        let member = self.state.read().await.member(id)?.clone();

        if !confirm(&member) {
            tracing::debug!(member_id = id, "Deletion not confirmed");
            return Ok(false);
        }

        let _busy = Busy::enter(&self.in_flight);
        if !self.service.delete_member(id).await {
            return Err(AppError::Remote("Failed to delete team member".to_string()));
        }

        let mut state = self.state.write().await;
        state.members.retain(|m| m.id != id);
        if state.celebration.as_ref().is_some_and(|c| c.member_id == id) {
            state.celebration = None;
        }
        tracing::info!(member_id = id, "Team member deleted");
        Ok(true)
    }

    /// Apply a field locally now and write it to the store in the background.
    pub async fn update_field(&self, id: &str, field: MemberField) -> Result<LocalEdit, AppError> {
        let member = {
            let mut state = self.state.write().await;
            let member = state.member_mut(id)?;
            field.apply(member);
            member.clone()
        };

        Ok(LocalEdit {
            member,
            sync: self.sync_in_background(id, field.into_patch()),
        })
    }

    /// Move a member along the track. The score is clamped to the track and
    /// entering a higher checkpoint starts a celebration.
    pub async fn adjust_points(&self, id: &str, delta: i64) -> Result<PointsUpdate, AppError> {
        let (member, previous_points) = {
            let mut state = self.state.write().await;
            let member = state.member_mut(id)?;
            let previous = member.sales_points;
            member.sales_points = clamp_points(previous.saturating_add(delta));
            let member = member.clone();

            if crossed_upward(previous, member.sales_points) {
                // Replaces any running celebration and restarts the window.
                state.celebration = Some(Celebration::new(id));
                tracing::info!(
                    member_id = id,
                    checkpoint = checkpoint_of(member.sales_points),
                    "Checkpoint reached"
                );
            }
            (member, previous)
        };

        let points = member.sales_points;
        Ok(PointsUpdate {
            previous_points,
            checkpoint: checkpoint_of(points),
            checkpoint_crossed: crossed_upward(previous_points, points),
            edit: LocalEdit {
                member,
                sync: self.sync_in_background(id, MemberField::SalesPoints(points).into_patch()),
            },
        })
    }

    /// Bump an activity counter, never below zero.
    pub async fn adjust_activity(
        &self,
        id: &str,
        kind: ActivityKind,
        delta: i64,
    ) -> Result<LocalEdit, AppError> {
        let (member, field) = {
            let mut state = self.state.write().await;
            let member = state.member_mut(id)?;
            let field = kind.field(kind.count(member).saturating_add(delta).max(0));
            field.apply(member);
            (member.clone(), field)
        };

        Ok(LocalEdit {
            member,
            sync: self.sync_in_background(id, field.into_patch()),
        })
    }

    fn sync_in_background(&self, id: &str, patch: MemberPatch) -> JoinHandle<bool> {
        let service = self.service.clone();
        let id = id.to_string();
        tokio::spawn(async move {
            let synced = service.update_member(&id, &patch).await.is_some();
            if !synced {
                tracing::warn!(member_id = %id, "Remote update failed; local roster diverges from the store");
            }
            synced
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::testing::FakeStore;

    fn controller(store: &Arc<FakeStore>) -> Arc<RosterController> {
        Arc::new(RosterController::new(
            TeamService::new(store.clone()),
            Duration::from_secs(60),
        ))
    }

    async fn seeded() -> (Arc<FakeStore>, Arc<RosterController>) {
        let store = Arc::new(FakeStore::new());
        store.seed("sales-project", "John Doe", 350).await;
        store.seed("sales-project", "Jane Smith", 720).await;
        store.seed("sales-project", "Mike Johnson", 890).await;
        store.seed("marketing", "Rina", 95).await;
        let roster = controller(&store);
        roster.select_division("sales-project").await.unwrap();
        (store, roster)
    }

    async fn id_of(roster: &RosterController, name: &str) -> String {
        roster
            .members()
            .await
            .into_iter()
            .find(|m| m.name == name)
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn loading_a_division_only_yields_its_members() {
        let (_store, roster) = seeded().await;
        let members = roster.members().await;
        assert_eq!(members.len(), 3);
        assert!(members.iter().all(|m| m.division_id == "sales-project"));
        // Newest first
        assert_eq!(members[0].name, "Mike Johnson");

        roster.select_division("marketing").await.unwrap();
        let members = roster.members().await;
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].division_id, "marketing");
    }

    #[tokio::test]
    async fn unknown_division_is_rejected() {
        let store = Arc::new(FakeStore::new());
        let roster = controller(&store);
        let err = roster.select_division("pirates").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn superseded_load_is_discarded() {
        let (store, roster) = seeded().await;
        store.delay_division("sales-project", Duration::from_millis(200));

        let slow = {
            let roster = roster.clone();
            tokio::spawn(async move { roster.refresh().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        let fast = roster.select_division("marketing").await.unwrap();

        assert_eq!(fast, LoadOutcome::Applied { members: 1 });
        assert_eq!(slow.await.unwrap().unwrap(), LoadOutcome::Superseded);

        let snapshot = roster.snapshot().await;
        assert_eq!(snapshot.division.unwrap().id, "marketing");
        assert!(snapshot.members.iter().all(|m| m.division_id == "marketing"));
    }

    #[tokio::test]
    async fn add_with_blank_name_makes_no_remote_call() {
        let (store, roster) = seeded().await;
        let calls = store.calls();

        let err = roster.add_member(NewMember::named("   ")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(store.calls(), calls);
        assert_eq!(roster.members().await.len(), 3);
    }

    #[tokio::test]
    async fn add_requires_a_division() {
        let store = Arc::new(FakeStore::new());
        let roster = controller(&store);
        let err = roster.add_member(NewMember::named("Budi")).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn add_appends_server_member() {
        let (_store, roster) = seeded().await;
        let created = roster.add_member(NewMember::named("Budi")).await.unwrap();

        let members = roster.members().await;
        assert_eq!(members.len(), 4);
        assert_eq!(members.last().unwrap().id, created.id);
        assert_eq!(created.division_id, "sales-project");
    }

    #[tokio::test]
    async fn failed_add_leaves_roster_untouched() {
        let (store, roster) = seeded().await;
        store.fail_writes(true);

        let err = roster.add_member(NewMember::named("Budi")).await.unwrap_err();
        assert!(matches!(err, AppError::Remote(_)));
        assert_eq!(roster.members().await.len(), 3);
    }

    #[tokio::test]
    async fn edit_adopts_server_representation() {
        let (_store, roster) = seeded().await;
        let id = id_of(&roster, "Jane Smith").await;

        let patch = MemberPatch {
            name: Some("Jane S.".to_string()),
            ..MemberPatch::default()
        };
        let updated = roster.edit_member(&id, patch).await.unwrap();
        assert_eq!(updated.sales_points, 720);

        let local = roster.members().await.into_iter().find(|m| m.id == id).unwrap();
        assert_eq!(local, updated);
    }

    #[tokio::test]
    async fn delete_asks_for_confirmation() {
        let (store, roster) = seeded().await;
        let id = id_of(&roster, "John Doe").await;
        let calls = store.calls();

        assert!(!roster.delete_member(&id, |_| false).await.unwrap());
        assert_eq!(store.calls(), calls);
        assert_eq!(roster.members().await.len(), 3);

        assert!(roster
            .delete_member(&id, |m| m.name == "John Doe")
            .await
            .unwrap());
        assert!(roster.members().await.iter().all(|m| m.id != id));
    }

    #[tokio::test]
    async fn failed_delete_keeps_member() {
        let (store, roster) = seeded().await;
        let id = id_of(&roster, "John Doe").await;
        store.fail_writes(true);

        let err = roster.delete_member(&id, |_| true).await.unwrap_err();
        assert!(matches!(err, AppError::Remote(_)));
        assert!(roster.members().await.iter().any(|m| m.id == id));
    }

    #[tokio::test]
    async fn field_update_is_optimistic_even_when_remote_fails() {
        let (store, roster) = seeded().await;
        let id = id_of(&roster, "John Doe").await;
        store.fail_writes(true);

        let edit = roster
            .update_field(&id, MemberField::SalesPoints(-20))
            .await
            .unwrap();
        assert_eq!(edit.member.sales_points, -20);
        assert!(!edit.sync.await.unwrap());

        let local = roster.members().await.into_iter().find(|m| m.id == id).unwrap();
        assert_eq!(local.sales_points, -20);
    }

    #[tokio::test]
    async fn field_update_reaches_the_store() {
        let (store, roster) = seeded().await;
        let id = id_of(&roster, "John Doe").await;

        let edit = roster
            .update_field(&id, MemberField::Visits(31))
            .await
            .unwrap();
        assert!(edit.sync.await.unwrap());

        let remote = TeamService::new(store.clone())
            .list_members("sales-project")
            .await;
        assert_eq!(remote.iter().find(|m| m.id == id).unwrap().visits, 31);
    }

    #[tokio::test]
    async fn points_clamp_and_celebrate_on_checkpoint() {
        let (_store, roster) = seeded().await;
        let id = id_of(&roster, "Mike Johnson").await;

        let update = roster.adjust_points(&id, 5).await.unwrap();
        assert!(!update.checkpoint_crossed);
        assert!(roster.celebrating().await.is_none());

        let update = roster.adjust_points(&id, 500).await.unwrap();
        assert_eq!(update.previous_points, 895);
        assert_eq!(update.edit.member.sales_points, 1000);
        assert_eq!(update.checkpoint, 10);
        assert!(update.checkpoint_crossed);
        assert!(update.edit.sync.await.unwrap());
        assert_eq!(roster.celebrating().await, Some(id.clone()));

        let update = roster.adjust_points(&id, -2000).await.unwrap();
        assert_eq!(update.edit.member.sales_points, 0);
        assert!(!update.checkpoint_crossed);
    }

    #[tokio::test]
    async fn second_crossing_takes_over_celebration() {
        let (_store, roster) = seeded().await;
        let john = id_of(&roster, "John Doe").await;
        let jane = id_of(&roster, "Jane Smith").await;

        roster.adjust_points(&john, 60).await.unwrap();
        assert_eq!(roster.celebrating().await, Some(john));
        roster.adjust_points(&jane, 100).await.unwrap();
        assert_eq!(roster.celebrating().await, Some(jane));
    }

    #[tokio::test]
    async fn celebration_clears_after_window() {
        let store = Arc::new(FakeStore::new());
        store.seed("hr", "Ayu", 95).await;
        let roster = RosterController::new(TeamService::new(store.clone()), Duration::from_millis(30));
        roster.select_division("hr").await.unwrap();
        let id = roster.members().await[0].id.clone();

        roster.adjust_points(&id, 10).await.unwrap();
        assert_eq!(roster.celebrating().await, Some(id));
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(roster.celebrating().await.is_none());
    }

    #[tokio::test]
    async fn activity_counters_do_not_go_negative() {
        let (_store, roster) = seeded().await;
        let id = id_of(&roster, "Jane Smith").await;

        let edit = roster
            .adjust_activity(&id, ActivityKind::Calls, 4)
            .await
            .unwrap();
        assert_eq!(edit.member.calls, 4);

        let edit = roster
            .adjust_activity(&id, ActivityKind::Calls, -10)
            .await
            .unwrap();
        assert_eq!(edit.member.calls, 0);
    }

    #[tokio::test]
    async fn edits_outside_the_selected_division_are_rejected() {
        let store = Arc::new(FakeStore::new());
        let outsider = store.seed("marketing", "Rina", 95).await;
        store.seed("hr", "Ayu", 120).await;
        let roster = controller(&store);
        roster.select_division("hr").await.unwrap();
        let calls = store.calls();

        let patch = MemberPatch {
            sales_points: Some(999),
            ..MemberPatch::default()
        };
        let err = roster.edit_member(&outsider.id, patch).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let stats = StatsPatch {
            visits: Some(5),
            ..StatsPatch::default()
        };
        let err = roster.update_stats(&outsider.id, stats).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(store.calls(), calls);

        let remote = TeamService::new(store.clone()).list_members("marketing").await;
        assert_eq!(remote[0].sales_points, 95);
        assert_eq!(remote[0].visits, 0);
    }

    #[tokio::test]
    async fn negative_score_still_celebrates_on_recovery() {
        let (_store, roster) = seeded().await;
        let id = id_of(&roster, "John Doe").await;
        roster
            .update_field(&id, MemberField::SalesPoints(-250))
            .await
            .unwrap();

        let update = roster.adjust_points(&id, 300).await.unwrap();
        assert_eq!(update.edit.member.sales_points, 50);
        assert!(update.checkpoint_crossed);
        assert_eq!(roster.celebrating().await, Some(id));
    }

    #[tokio::test]
    async fn summary_survives_oversized_scores() {
        let (_store, roster) = seeded().await;
        for name in ["John Doe", "Jane Smith"] {
            let id = id_of(&roster, name).await;
            roster
                .update_field(&id, MemberField::SalesPoints(i64::MAX))
                .await
                .unwrap();
        }

        let summary = roster.summary().await;
        assert_eq!(summary.total_sales_points, i64::MAX);
        assert_eq!(summary.member_count, 3);
    }

    #[tokio::test]
    async fn concurrent_activity_bumps_are_not_lost() {
        let (_store, roster) = seeded().await;
        let id = id_of(&roster, "Mike Johnson").await;

        let bumps: Vec<_> = (0..20)
            .map(|_| {
                let roster = roster.clone();
                let id = id.clone();
                tokio::spawn(async move {
                    roster.adjust_activity(&id, ActivityKind::Visits, 1).await
                })
            })
            .collect();
        for bump in bumps {
            bump.await.unwrap().unwrap();
        }

        let local = roster.members().await.into_iter().find(|m| m.id == id).unwrap();
        assert_eq!(local.visits, 20);
    }

    #[tokio::test]
    async fn aggregates_follow_the_roster() {
        let (_store, roster) = seeded().await;
        let summary = roster.summary().await;
        assert_eq!(summary.total_sales_points, 1960);
        assert_eq!(summary.average_performance, 65);
        assert_eq!(summary.top_performer.unwrap().name, "Mike Johnson");

        roster.clear_division().await;
        let snapshot = roster.snapshot().await;
        assert!(snapshot.division.is_none());
        assert!(snapshot.members.is_empty());
        assert!(!snapshot.loading);
    }
}
