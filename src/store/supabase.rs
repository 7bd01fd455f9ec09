//! Supabase (PostgREST) client.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{RawResponse, RemoteStore};
use crate::errors::AppError;
use crate::models::{MemberPatch, NewMemberRow, TeamMemberRow};

const PREFER_REPRESENTATION: &str = "return=representation";

pub struct SupabaseStore {
    base_url: String,
    api_key: String,
    members_table: String,
    client: reqwest::Client,
}

impl SupabaseStore {
    pub fn new(base_url: &str, api_key: &str, members_table: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            members_table: members_table.to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/rest/v1/{}", self.base_url, table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header(ACCEPT, "application/json")
    }

    fn write(&self, method: Method, table: &str) -> RequestBuilder {
        self.request(method, table)
            .header(CONTENT_TYPE, "application/json")
            .header("Prefer", PREFER_REPRESENTATION)
    }

    fn by_id(id: &str) -> [(&'static str, String); 1] {
        [("id", format!("eq.{}", id))]
    }
}

#[async_trait]
impl RemoteStore for SupabaseStore {
    async fn select_members(&self, division_id: &str) -> Result<Vec<TeamMemberRow>, AppError> {
        tracing::debug!(division_id, "Selecting team members");
        let response = self
            .request(Method::GET, &self.members_table)
            .query(&[
                ("select", "*".to_string()),
                ("division_id", format!("eq.{}", division_id)),
                ("order", "created_at.desc".to_string()),
            ])
            .send()
            .await?;
        decode(response).await
    }

    async fn insert_member(&self, row: &NewMemberRow) -> Result<TeamMemberRow, AppError> {
        let response = self
            .write(Method::POST, &self.members_table)
            .json(&[row])
            .send()
            .await?;
        single(decode(response).await?)
    }

    async fn update_member(
        &self,
        id: &str,
        patch: &MemberPatch,
    ) -> Result<TeamMemberRow, AppError> {
        let response = self
            .write(Method::PATCH, &self.members_table)
            .query(&Self::by_id(id))
            .json(&patch.to_row())
            .send()
            .await?;
        single(decode(response).await?)
    }

    async fn delete_member(&self, id: &str) -> Result<Vec<TeamMemberRow>, AppError> {
        let response = self
            .write(Method::DELETE, &self.members_table)
            .query(&Self::by_id(id))
            .send()
            .await?;
        decode(response).await
    }

    async fn fetch_raw(
        &self,
        table: &str,
        params: &[(String, String)],
    ) -> Result<RawResponse, AppError> {
        let response = self.request(Method::GET, table).query(params).send().await?;
        passthrough(response).await
    }

    async fn insert_raw(&self, table: &str, payload: &Value) -> Result<RawResponse, AppError> {
        let response = self
            .write(Method::POST, table)
            .json(payload)
            .send()
            .await?;
        passthrough(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::Remote(format!("{}: {}", status, body)));
    }
    Ok(response.json::<T>().await?)
}

/// Mirrors PostgREST `.single()`: exactly one row or an error.
fn single(rows: Vec<TeamMemberRow>) -> Result<TeamMemberRow, AppError> {
    let mut rows = rows.into_iter();
    match (rows.next(), rows.next()) {
        (Some(row), None) => Ok(row),
        (None, _) => Err(AppError::NotFound("No matching row".to_string())),
        (Some(_), Some(_)) => Err(AppError::Remote(
            "Expected a single row, got several".to_string(),
        )),
    }
}

async fn passthrough(response: Response) -> Result<RawResponse, AppError> {
    let status = response.status().as_u16();
    let bytes = response.bytes().await?;
    // Undecodable bodies come back as JSON null rather than failing.
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    Ok(RawResponse { status, body })
}
