//! Team member models.
//!
//! The HTTP API speaks camelCase; the remote table speaks snake_case. Rows are
//! converted at the store boundary so nothing above it sees wire names.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::errors::AppError;

/// Points needed for 100% progress.
pub const TARGET_POINTS: i64 = 1000;
/// Point interval between checkpoints on the track.
pub const CHECKPOINT_INTERVAL: i64 = 100;

pub const DEFAULT_COLOR: &str = "#ff6b35";
pub const DEFAULT_AVATAR: &str = "🏎️";

/// A tracked salesperson.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: String,
    pub name: String,
    pub sales_points: i64,
    pub visits: i64,
    pub calls: i64,
    pub chats: i64,
    pub color: String,
    pub avatar: String,
    pub division_id: String,
}

impl TeamMember {
    pub fn total_activities(&self) -> i64 {
        self.visits.saturating_add(self.calls).saturating_add(self.chats)
    }
}

/// One row of the remote `team_members` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamMemberRow {
    #[serde(deserialize_with = "id_from_json")]
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sales_points: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub visits: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub calls: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub chats: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub color: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub avatar: String,
    pub division_id: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl From<TeamMemberRow> for TeamMember {
    fn from(row: TeamMemberRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            sales_points: row.sales_points,
            visits: row.visits,
            calls: row.calls,
            chats: row.chats,
            color: row.color,
            avatar: row.avatar,
            division_id: row.division_id,
        }
    }
}

/// Insert payload for the remote table. The store assigns `id` and timestamps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewMemberRow {
    pub name: String,
    pub sales_points: i64,
    pub visits: i64,
    pub calls: i64,
    pub chats: i64,
    pub color: String,
    pub avatar: String,
    pub division_id: String,
}

/// Request body for adding a member to the selected division.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMember {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "coerced_count")]
    pub sales_points: i64,
    #[serde(default, deserialize_with = "coerced_count")]
    pub visits: i64,
    #[serde(default, deserialize_with = "coerced_count")]
    pub calls: i64,
    #[serde(default, deserialize_with = "coerced_count")]
    pub chats: i64,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_avatar")]
    pub avatar: String,
}

impl NewMember {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sales_points: 0,
            visits: 0,
            calls: 0,
            chats: 0,
            color: default_color(),
            avatar: default_avatar(),
        }
    }

    pub fn into_row(self, division_id: &str) -> NewMemberRow {
        NewMemberRow {
            name: self.name.trim().to_string(),
            sales_points: self.sales_points,
            visits: self.visits,
            calls: self.calls,
            chats: self.chats,
            color: self.color,
            avatar: self.avatar,
            division_id: division_id.to_string(),
        }
    }
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn default_avatar() -> String {
    DEFAULT_AVATAR.to_string()
}

/// Partial update: only the fields that are `Some` change server-side.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MemberPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "coerced_optional_count"
    )]
    pub sales_points: Option<i64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "coerced_optional_count"
    )]
    pub visits: Option<i64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "coerced_optional_count"
    )]
    pub calls: Option<i64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "coerced_optional_count"
    )]
    pub chats: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl MemberPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.sales_points.is_none()
            && self.visits.is_none()
            && self.calls.is_none()
            && self.chats.is_none()
            && self.color.is_none()
            && self.avatar.is_none()
    }

    /// Wire form of the patch, snake_case and without absent fields.
    pub fn to_row(&self) -> MemberPatchRow<'_> {
        MemberPatchRow {
            name: self.name.as_deref(),
            sales_points: self.sales_points,
            visits: self.visits,
            calls: self.calls,
            chats: self.chats,
            color: self.color.as_deref(),
            avatar: self.avatar.as_deref(),
        }
    }

    /// Merge the patch into a row the way the remote table does.
    pub fn apply_to_row(&self, row: &mut TeamMemberRow) {
        if let Some(name) = &self.name {
            row.name = name.clone();
        }
        if let Some(points) = self.sales_points {
            row.sales_points = points;
        }
        if let Some(visits) = self.visits {
            row.visits = visits;
        }
        if let Some(calls) = self.calls {
            row.calls = calls;
        }
        if let Some(chats) = self.chats {
            row.chats = chats;
        }
        if let Some(color) = &self.color {
            row.color = color.clone();
        }
        if let Some(avatar) = &self.avatar {
            row.avatar = avatar.clone();
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct MemberPatchRow<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sales_points: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visits: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calls: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chats: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<&'a str>,
}

/// Numeric subset of [`MemberPatch`].
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatsPatch {
    #[serde(default, deserialize_with = "coerced_optional_count")]
    pub sales_points: Option<i64>,
    #[serde(default, deserialize_with = "coerced_optional_count")]
    pub visits: Option<i64>,
    #[serde(default, deserialize_with = "coerced_optional_count")]
    pub calls: Option<i64>,
    #[serde(default, deserialize_with = "coerced_optional_count")]
    pub chats: Option<i64>,
}

impl From<StatsPatch> for MemberPatch {
    fn from(stats: StatsPatch) -> Self {
        Self {
            sales_points: stats.sales_points,
            visits: stats.visits,
            calls: stats.calls,
            chats: stats.chats,
            ..Self::default()
        }
    }
}

/// A single editable field with its new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberField {
    Name(String),
    SalesPoints(i64),
    Visits(i64),
    Calls(i64),
    Chats(i64),
    Color(String),
    Avatar(String),
}

impl MemberField {
    /// Build a field update from its API name. Numeric fields coerce
    /// unusable input to zero.
    pub fn parse(field: &str, value: &Value) -> Result<Self, AppError> {
        let field = match field {
            "name" => MemberField::Name(text(value)),
            "salesPoints" => MemberField::SalesPoints(coerce_count(value)),
            "visits" => MemberField::Visits(coerce_count(value)),
            "calls" => MemberField::Calls(coerce_count(value)),
            "chats" => MemberField::Chats(coerce_count(value)),
            "color" => MemberField::Color(text(value)),
            "avatar" => MemberField::Avatar(text(value)),
            other => {
                return Err(AppError::Validation(format!(
                    "Unknown member field '{}'",
                    other
                )))
            }
        };
        Ok(field)
    }

    pub fn apply(&self, member: &mut TeamMember) {
        match self {
            MemberField::Name(name) => member.name = name.clone(),
            MemberField::SalesPoints(points) => member.sales_points = *points,
            MemberField::Visits(visits) => member.visits = *visits,
            MemberField::Calls(calls) => member.calls = *calls,
            MemberField::Chats(chats) => member.chats = *chats,
            MemberField::Color(color) => member.color = color.clone(),
            MemberField::Avatar(avatar) => member.avatar = avatar.clone(),
        }
    }

    pub fn into_patch(self) -> MemberPatch {
        let mut patch = MemberPatch::default();
        match self {
            MemberField::Name(name) => patch.name = Some(name),
            MemberField::SalesPoints(points) => patch.sales_points = Some(points),
            MemberField::Visits(visits) => patch.visits = Some(visits),
            MemberField::Calls(calls) => patch.calls = Some(calls),
            MemberField::Chats(chats) => patch.chats = Some(chats),
            MemberField::Color(color) => patch.color = Some(color),
            MemberField::Avatar(avatar) => patch.avatar = Some(avatar),
        }
        patch
    }
}

/// Lead-measure activity counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Visits,
    Calls,
    Chats,
}

impl ActivityKind {
    pub fn count(self, member: &TeamMember) -> i64 {
        match self {
            ActivityKind::Visits => member.visits,
            ActivityKind::Calls => member.calls,
            ActivityKind::Chats => member.chats,
        }
    }

    pub fn field(self, value: i64) -> MemberField {
        match self {
            ActivityKind::Visits => MemberField::Visits(value),
            ActivityKind::Calls => MemberField::Calls(value),
            ActivityKind::Chats => MemberField::Chats(value),
        }
    }
}

/// Interpret loosely typed input as a counter: numbers pass through
/// (truncated), strings use their leading integer, anything else is 0.
pub fn coerce_count(value: &Value) -> i64 {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => leading_integer(s),
        _ => 0,
    }
}

fn leading_integer(s: &str) -> i64 {
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().map(|n| sign * n).unwrap_or(0)
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn coerced_count<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|value| coerce_count(&value))
}

fn coerced_optional_count<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        other => Some(coerce_count(&other)),
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

// Supabase tables may use bigint or uuid keys.
fn id_from_json<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "unsupported id value: {}",
            other
        ))),
    }
}
