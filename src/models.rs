use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder for a missing run field in profile text.
const UNKNOWN: &str = "?";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: i64,
    pub user: Option<i64>,
    pub target_meters: Option<i64>,
    pub target_seconds_per_km: Option<i64>,
    pub location: Option<String>,
    pub datetime: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// The fields of a user's latest run that feed into their embedding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunEnrichment {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub target_meters: Option<i64>,
    #[serde(default)]
    pub target_seconds_per_km: Option<i64>,
}

impl From<&Run> for RunEnrichment {
    fn from(run: &Run) -> Self {
        Self {
            location: run.location.clone(),
            target_meters: run.target_meters,
            target_seconds_per_km: run.target_seconds_per_km,
        }
    }
}

/// A ranked candidate as returned by the store's matching procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMatch {
    pub user_id: i64,
    pub run_id: i64,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub target_pace: Option<f64>,
    pub target_distance: Option<f64>,
    pub location: Option<String>,
    pub similarity: f64,
}

/// Raw row shape of `get_run_matches_by_embedding`.
#[derive(Debug, Clone, Deserialize)]
pub struct CandidateRow {
    pub user_id: i64,
    pub idea_id: i64,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub target_pace: Option<f64>,
    #[serde(default)]
    pub target_distance: Option<f64>,
    #[serde(default)]
    pub location: Option<String>,
    pub vector_similarity: f64,
}

impl From<CandidateRow> for CandidateMatch {
    fn from(row: CandidateRow) -> Self {
        Self {
            user_id: row.user_id,
            run_id: row.idea_id,
            display_name: row.display_name,
            bio: row.bio,
            target_pace: row.target_pace,
            target_distance: row.target_distance,
            location: row.location,
            similarity: row.vector_similarity,
        }
    }
}

/// Build the text a user's embedding is computed from.
///
/// Format: `Bio: <bio>. ` followed, when a run exists, by
/// `Idea => loc: <location>, dist: <km>km, pace: <sec/km>`. Missing values
/// become `(empty)` for the bio and `?` for run fields.
pub fn describe_profile(bio: Option<&str>, run: Option<&RunEnrichment>) -> String {
    let bio = bio.filter(|b| !b.is_empty()).unwrap_or("(empty)");
    let mut text = format!("Bio: {}. ", bio);

    if let Some(run) = run {
        let location = run.location.as_deref().unwrap_or(UNKNOWN);
        // zero meters is treated as unset
        let km = run
            .target_meters
            .filter(|m| *m != 0)
            .map(|m| (m as f64 / 1000.0).to_string())
            .unwrap_or_else(|| UNKNOWN.to_string());
        let pace = run
            .target_seconds_per_km
            .map(|p| p.to_string())
            .unwrap_or_else(|| UNKNOWN.to_string());

        text.push_str(&format!(
            "Idea => loc: {}, dist: {}km, pace: {}",
            location, km, pace
        ));
    }

    text
}

/// `5000` -> `"5.0 km"`
pub fn format_distance(meters: f64) -> String {
    format!("{:.1} km", meters / 1000.0)
}

/// `330` -> `"5:30 /km"`
pub fn format_pace(seconds_per_km: f64) -> String {
    let total = seconds_per_km.max(0.0).round() as u64;
    format!("{}:{:02} /km", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_bio_only() {
        assert_eq!(
            describe_profile(Some("5k runner, mornings only"), None),
            "Bio: 5k runner, mornings only. "
        );
        assert_eq!(describe_profile(None, None), "Bio: (empty). ");
        assert_eq!(describe_profile(Some(""), None), "Bio: (empty). ");
    }

    #[test]
    fn test_describe_with_run() {
        let run = RunEnrichment {
            location: Some("Central Park".into()),
            target_meters: Some(5500),
            target_seconds_per_km: Some(330),
        };
        assert_eq!(
            describe_profile(Some("tempo lover"), Some(&run)),
            "Bio: tempo lover. Idea => loc: Central Park, dist: 5.5km, pace: 330"
        );

        let whole = RunEnrichment {
            target_meters: Some(10000),
            ..run
        };
        assert!(describe_profile(None, Some(&whole)).contains("dist: 10km"));
    }

    #[test]
    fn test_describe_run_placeholders() {
        let empty = RunEnrichment::default();
        assert_eq!(
            describe_profile(Some("hi"), Some(&empty)),
            "Bio: hi. Idea => loc: ?, dist: ?km, pace: ?"
        );

        let zero = RunEnrichment {
            target_meters: Some(0),
            target_seconds_per_km: Some(0),
            location: None,
        };
        assert_eq!(
            describe_profile(Some("hi"), Some(&zero)),
            "Bio: hi. Idea => loc: ?, dist: ?km, pace: 0"
        );
    }

    #[test]
    fn test_candidate_row_renames_fields() {
        let row: CandidateRow = serde_json::from_value(serde_json::json!({
            "user_id": 7,
            "idea_id": 31,
            "display_name": "Sam",
            "bio": "hills",
            "target_pace": 300,
            "target_distance": 8000,
            "location": "Riverside",
            "vector_similarity": 0.87,
        }))
        .unwrap();

        let candidate = CandidateMatch::from(row);
        assert_eq!(candidate.user_id, 7);
        assert_eq!(candidate.run_id, 31);
        assert_eq!(candidate.display_name.as_deref(), Some("Sam"));
        assert_eq!(candidate.target_pace, Some(300.0));
        assert_eq!(candidate.target_distance, Some(8000.0));
        assert_eq!(candidate.similarity, 0.87);
    }

    #[test]
    fn test_candidate_row_tolerates_nulls() {
        let row: CandidateRow = serde_json::from_value(serde_json::json!({
            "user_id": 1,
            "idea_id": 2,
            "display_name": null,
            "vector_similarity": 0.1,
        }))
        .unwrap();
        let candidate = CandidateMatch::from(row);
        assert!(candidate.display_name.is_none());
        assert!(candidate.location.is_none());
    }

    #[test]
    fn test_format_helpers() {
        assert_eq!(format_distance(5000.0), "5.0 km");
        assert_eq!(format_distance(21097.0), "21.1 km");
        assert_eq!(format_pace(330.0), "5:30 /km");
        assert_eq!(format_pace(245.0), "4:05 /km");
    }

    #[test]
    fn test_enrichment_from_run() {
        let run: Run = serde_json::from_value(serde_json::json!({
            "id": 3,
            "user": 42,
            "target_meters": 5000,
            "target_seconds_per_km": 360,
            "location": "Track",
            "datetime": null,
            "created_at": "2025-04-23T10:00:00Z",
        }))
        .unwrap();
        let enrichment = RunEnrichment::from(&run);
        assert_eq!(enrichment.target_meters, Some(5000));
        assert_eq!(enrichment.location.as_deref(), Some("Track"));
    }
}
