//! Runner matching client: deterministic profile embeddings and store-ranked
//! run matches.

pub mod config;
pub mod embedding;
pub mod error;
pub mod matching;
pub mod models;
pub mod store;

pub use embedding::{generate_embedding, FeatureVector, EMBEDDING_DIM};
pub use error::{MatchError, Result};
pub use matching::{MatchingService, ProfileEvent};
pub use models::{CandidateMatch, RunEnrichment, User};
pub use store::{MatchRanker, ProfileStore, SupabaseStore};
