//! Dashboard aggregates and the leaderboard, saturating on oversized counters.

use serde::Serialize;

use super::checkpoint::checkpoint_of;
use crate::models::{TeamMember, TARGET_POINTS};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TopPerformer {
    pub id: String,
    pub name: String,
    pub sales_points: i64,
}

/// Dashboard aggregates for one roster.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RosterSummary {
    pub member_count: usize,
    pub total_sales_points: i64,
    pub team_target: i64,
    pub remaining_points: i64,
    /// Whole percent of the team target reached.
    pub average_performance: i64,
    pub top_performer: Option<TopPerformer>,
    pub total_activities: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: usize,
    #[serde(flatten)]
    pub member: TeamMember,
    pub progress: f64,
    pub checkpoint: i64,
}

pub fn summarize(members: &[TeamMember]) -> RosterSummary {
    let total_sales_points = total_sales_points(members);
    let team_target = TARGET_POINTS.saturating_mul(members.len() as i64);

    RosterSummary {
        member_count: members.len(),
        total_sales_points,
        team_target,
        remaining_points: team_target.saturating_sub(total_sales_points),
        average_performance: average_performance(members),
        top_performer: top_performer(members).map(|m| TopPerformer {
            id: m.id.clone(),
            name: m.name.clone(),
            sales_points: m.sales_points,
        }),
        total_activities: members
            .iter()
            .map(TeamMember::total_activities)
            .fold(0, i64::saturating_add),
    }
}

pub fn total_sales_points(members: &[TeamMember]) -> i64 {
    members
        .iter()
        .map(|m| m.sales_points)
        .fold(0, i64::saturating_add)
}

/// `round(sum / (count * TARGET_POINTS) * 100)`; 0 for an empty roster.
pub fn average_performance(members: &[TeamMember]) -> i64 {
    if members.is_empty() {
        return 0;
    }
    let ratio = total_sales_points(members) as f64 / (members.len() as f64 * TARGET_POINTS as f64);
    (ratio * 100.0).round() as i64
}

/// Highest score; on a tie the earlier member wins.
pub fn top_performer(members: &[TeamMember]) -> Option<&TeamMember> {
    members.iter().fold(None, |best: Option<&TeamMember>, m| match best {
        Some(b) if b.sales_points >= m.sales_points => Some(b),
        _ => Some(m),
    })
}

pub fn progress_percent(points: i64) -> f64 {
    points as f64 * 100.0 / TARGET_POINTS as f64
}

/// Members by score, highest first. Ties keep roster order.
pub fn leaderboard(members: &[TeamMember]) -> Vec<LeaderboardEntry> {
    let mut ranked: Vec<&TeamMember> = members.iter().collect();
    ranked.sort_by(|a, b| b.sales_points.cmp(&a.sales_points));
    ranked
        .into_iter()
        .enumerate()
        .map(|(index, member)| LeaderboardEntry {
            rank: index + 1,
            progress: progress_percent(member.sales_points),
            checkpoint: checkpoint_of(member.sales_points),
            member: member.clone(),
        })
        .collect()
}
