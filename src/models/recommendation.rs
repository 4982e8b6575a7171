use serde::{Deserialize, Serialize};

use super::{ActivityRecord, ContentRecord, RecordId};

/// A single ranked recommendation returned to the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub content_id: String,
    /// Relevance in [0, 1]
    pub score: f64,
    pub reason: String,
}

/// Body of `POST /api/v1/recommendations`
///
/// Carries full catalog and activity snapshots; the caller owns fetching them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub user_id: RecordId,
    #[serde(default)]
    pub catalog: Vec<ContentRecord>,
    #[serde(default)]
    pub activity: Vec<ActivityRecord>,
    #[serde(default)]
    pub top_n: Option<usize>,
}
