use crate::embedding::{generate_embedding, FeatureVector};
use crate::error::Result;
use crate::models::{describe_profile, CandidateMatch};
use crate::store::{MatchRanker, ProfileStore};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Events after which a user's stored embedding is out of date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileEvent {
    SignedUp { user_id: i64 },
    ProfileEdited { user_id: i64 },
    RunCreated { user_id: i64 },
    RunUpdated { user_id: i64 },
}

impl ProfileEvent {
    pub fn user_id(&self) -> i64 {
        match *self {
            ProfileEvent::SignedUp { user_id }
            | ProfileEvent::ProfileEdited { user_id }
            | ProfileEvent::RunCreated { user_id }
            | ProfileEvent::RunUpdated { user_id } => user_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProfileEvent::SignedUp { .. } => "signed_up",
            ProfileEvent::ProfileEdited { .. } => "profile_edited",
            ProfileEvent::RunCreated { .. } => "run_created",
            ProfileEvent::RunUpdated { .. } => "run_updated",
        }
    }
}

/// Keeps user embeddings current and fetches ranked run matches.
pub struct MatchingService {
    profiles: Arc<dyn ProfileStore>,
    ranker: Arc<dyn MatchRanker>,
    refresh_on_events: bool,
}

impl MatchingService {
    pub fn new(profiles: Arc<dyn ProfileStore>, ranker: Arc<dyn MatchRanker>) -> Self {
        Self {
            profiles,
            ranker,
            refresh_on_events: true,
        }
    }

    pub fn with_refresh_on_events(mut self, enabled: bool) -> Self {
        self.refresh_on_events = enabled;
        self
    }

    /// The text a user's embedding is computed from.
    ///
    /// The user lookup is mandatory. The latest-run lookup is best-effort: a
    /// failure there is logged and the text is built without run details.
    pub async fn describe_user(&self, user_id: i64) -> Result<String> {
        let user = self.profiles.fetch_user(user_id).await?;

        let run = match self.profiles.latest_run(user_id).await {
            Ok(run) => run,
            Err(e) => {
                warn!(user_id, error = %e, "Latest run lookup failed, embedding without run details");
                None
            }
        };

        Ok(describe_profile(user.bio.as_deref(), run.as_ref()))
    }

    /// Recompute the user's embedding and overwrite the stored one.
    pub async fn update_user_embedding(&self, user_id: i64) -> Result<FeatureVector> {
        let text = self.describe_user(user_id).await?;
        let embedding = generate_embedding(&text);

        self.profiles.write_embedding(user_id, &embedding).await?;
        info!(user_id, zero = embedding.is_zero(), "User embedding updated");

        Ok(embedding)
    }

    /// Candidates for `run_id`, in the order the store ranked them.
    pub async fn get_run_matches(&self, user_id: i64, run_id: i64) -> Result<Vec<CandidateMatch>> {
        let matches = self.ranker.rank_by_embedding(user_id, run_id).await?;
        debug!(user_id, run_id, count = matches.len(), "Run matches fetched");
        Ok(matches)
    }

    /// Refresh the embedding affected by `event`.
    ///
    /// Returns `Ok(None)` when refreshing is disabled. Failures are logged and
    /// returned; callers finishing a sign-up or edit may ignore them.
    pub async fn on_profile_event(&self, event: ProfileEvent) -> Result<Option<FeatureVector>> {
        if !self.refresh_on_events {
            debug!(event = event.name(), user_id = event.user_id(), "Embedding refresh disabled");
            return Ok(None);
        }

        match self.update_user_embedding(event.user_id()).await {
            Ok(embedding) => Ok(Some(embedding)),
            Err(e) => {
                warn!(event = event.name(), user_id = event.user_id(), error = %e, "Embedding refresh failed");
                Err(e)
            }
        }
    }
}
