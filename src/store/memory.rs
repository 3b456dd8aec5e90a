//! In-memory store used by tests in place of the hosted backend.

use crate::embedding::FeatureVector;
use crate::error::{MatchError, Result};
use crate::models::{CandidateMatch, RunEnrichment, User};
use crate::store::{MatchRanker, ProfileStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct InMemoryStore {
    users: Mutex<HashMap<i64, User>>,
    runs: Mutex<HashMap<i64, RunEnrichment>>,
    embeddings: Mutex<HashMap<i64, FeatureVector>>,
    candidates: Mutex<Vec<CandidateMatch>>,
    /// Error message returned by `latest_run` when set.
    pub fail_run_lookup: Mutex<Option<String>>,
    /// Error message returned by `write_embedding` when set.
    pub fail_write: Mutex<Option<String>>,
    /// Error message returned by `rank_by_embedding` when set.
    pub fail_rank: Mutex<Option<String>>,
    pub writes: Mutex<usize>,
    pub rank_calls: Mutex<Vec<(i64, i64)>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, id: i64, bio: Option<&str>) -> Self {
        self.users.lock().unwrap().insert(
            id,
            User {
                id,
                bio: bio.map(|b| b.to_string()),
                display_name: None,
            },
        );
        self
    }

    pub fn set_bio(&self, user_id: i64, bio: Option<&str>) {
        if let Some(user) = self.users.lock().unwrap().get_mut(&user_id) {
            user.bio = bio.map(|b| b.to_string());
        }
    }

    pub fn with_run(self, user_id: i64, run: RunEnrichment) -> Self {
        self.runs.lock().unwrap().insert(user_id, run);
        self
    }

    pub fn with_candidates(self, candidates: Vec<CandidateMatch>) -> Self {
        *self.candidates.lock().unwrap() = candidates;
        self
    }

    pub fn embedding(&self, user_id: i64) -> Option<FeatureVector> {
        self.embeddings.lock().unwrap().get(&user_id).cloned()
    }

    pub fn write_count(&self) -> usize {
        *self.writes.lock().unwrap()
    }
}

#[async_trait]
impl ProfileStore for InMemoryStore {
    async fn fetch_user(&self, user_id: i64) -> Result<User> {
        self.users
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .ok_or_else(|| MatchError::NotFound(format!("User {} not found", user_id)))
    }

    async fn latest_run(&self, user_id: i64) -> Result<Option<RunEnrichment>> {
        if let Some(msg) = self.fail_run_lookup.lock().unwrap().clone() {
            return Err(MatchError::remote(Some(500), msg));
        }
        Ok(self.runs.lock().unwrap().get(&user_id).cloned())
    }

    async fn write_embedding(&self, user_id: i64, embedding: &FeatureVector) -> Result<()> {
        if let Some(msg) = self.fail_write.lock().unwrap().clone() {
            return Err(MatchError::remote(Some(403), msg));
        }
        self.embeddings
            .lock()
            .unwrap()
            .insert(user_id, embedding.clone());
        *self.writes.lock().unwrap() += 1;
        Ok(())
    }
}

#[async_trait]
impl MatchRanker for InMemoryStore {
    async fn rank_by_embedding(&self, user_id: i64, run_id: i64) -> Result<Vec<CandidateMatch>> {
        self.rank_calls.lock().unwrap().push((user_id, run_id));
        if let Some(msg) = self.fail_rank.lock().unwrap().clone() {
            return Err(MatchError::remote(Some(400), msg));
        }
        Ok(self.candidates.lock().unwrap().clone())
    }
}
