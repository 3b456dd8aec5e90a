use crate::embedding::FeatureVector;
use crate::error::Result;
use crate::models::{CandidateMatch, RunEnrichment, User};
use async_trait::async_trait;

#[cfg(test)]
pub mod memory;
pub mod supabase;

pub use supabase::SupabaseStore;

/// Reads and writes the user-side data the embedding is derived from.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch a user row. Fails with `NotFound` when no such user exists.
    async fn fetch_user(&self, user_id: i64) -> Result<User>;

    /// The user's most recently created run, if any.
    async fn latest_run(&self, user_id: i64) -> Result<Option<RunEnrichment>>;

    /// Replace the user's stored feature vector.
    async fn write_embedding(&self, user_id: i64, embedding: &FeatureVector) -> Result<()>;
}

/// Nearest-neighbor ranking over stored feature vectors, done by the store.
#[async_trait]
pub trait MatchRanker: Send + Sync {
    async fn rank_by_embedding(&self, user_id: i64, run_id: i64) -> Result<Vec<CandidateMatch>>;
}
