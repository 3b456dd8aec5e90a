use crate::config::StoreConfig;
use crate::embedding::FeatureVector;
use crate::error::{MatchError, Result};
use crate::models::{CandidateMatch, CandidateRow, RunEnrichment, User};
use crate::store::{MatchRanker, ProfileStore};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

const MATCH_PROCEDURE: &str = "get_run_matches_by_embedding";

/// PostgREST client for the hosted store.
pub struct SupabaseStore {
    base_url: String,
    api_key: String,
    bearer: String,
    client: Client,
}

impl SupabaseStore {
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MatchError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Self::with_client(config, client)
    }

    pub fn with_client(config: &StoreConfig, client: Client) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            bearer: config
                .access_token
                .clone()
                .unwrap_or_else(|| config.api_key.clone()),
            client,
        })
    }

    fn rest_url(&self, path: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.bearer))
    }

    async fn get_rows<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let response = self
            .authorized(self.client.get(self.rest_url(path)))
            .header("Accept", "application/json")
            .send()
            .await?;

        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }
}

/// Turn a non-2xx response into `RemoteFailure`, keeping the store's message.
async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(MatchError::remote(Some(status.as_u16()), error_message(&body)))
}

/// PostgREST errors are `{"code", "message", "details", "hint"}`; anything else
/// is passed through as-is.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["message"].as_str().map(|s| s.to_string()))
        .unwrap_or_else(|| body.to_string())
}

fn user_path(user_id: i64) -> String {
    format!("user?select=id,bio,display_name&id=eq.{}", user_id)
}

fn latest_run_path(user_id: i64) -> String {
    format!(
        "run?select=location,target_meters,target_seconds_per_km&user=eq.{}&order=created_at.desc&limit=1",
        user_id
    )
}

#[async_trait]
impl ProfileStore for SupabaseStore {
    async fn fetch_user(&self, user_id: i64) -> Result<User> {
        let rows: Vec<User> = self.get_rows(&user_path(user_id)).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| MatchError::NotFound(format!("User {} not found", user_id)))
    }

    async fn latest_run(&self, user_id: i64) -> Result<Option<RunEnrichment>> {
        let rows: Vec<RunEnrichment> = self.get_rows(&latest_run_path(user_id)).await?;
        Ok(rows.into_iter().next())
    }

    async fn write_embedding(&self, user_id: i64, embedding: &FeatureVector) -> Result<()> {
        let body = serde_json::json!({ "embedding": embedding });

        let response = self
            .authorized(self.client.patch(self.rest_url(&format!("user?id=eq.{}", user_id))))
            .header("Content-Type", "application/json")
            .header("Prefer", "return=minimal")
            .json(&body)
            .send()
            .await?;

        ensure_success(response).await?;
        debug!(user_id, "Embedding written");
        Ok(())
    }
}

#[async_trait]
impl MatchRanker for SupabaseStore {
    async fn rank_by_embedding(&self, user_id: i64, run_id: i64) -> Result<Vec<CandidateMatch>> {
        let body = serde_json::json!({
            "p_current_user_id": user_id,
            "p_current_idea_id": run_id,
        });

        let response = self
            .authorized(self.client.post(self.rest_url(&format!("rpc/{}", MATCH_PROCEDURE))))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let response = ensure_success(response).await?;
        // a procedure returning no rows may answer with `null`
        let rows: Option<Vec<CandidateRow>> = response.json().await?;

        Ok(rows
            .unwrap_or_default()
            .into_iter()
            .map(CandidateMatch::from)
            .collect())
    }
}
