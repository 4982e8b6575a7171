use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ContentType, RecordId};

/// What a user did with a catalog item
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    View,
    Like,
    Bookmark,
    Share,
    Complete,
}

/// One entry from the user activity log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityRecord {
    pub user_id: RecordId,
    pub content_id: RecordId,
    pub action: Action,
    pub timestamp: DateTime<Utc>,
    /// Content type captured when the activity was logged, if any
    #[serde(default)]
    pub content_type: Option<ContentType>,
    /// Percentage completed for videos and books
    #[serde(default)]
    pub progress: f64,
}

impl ActivityRecord {
    pub fn new(user_id: impl Into<RecordId>, content_id: impl Into<RecordId>, action: Action) -> Self {
        Self {
            user_id: user_id.into(),
            content_id: content_id.into(),
            action,
            timestamp: Utc::now(),
            content_type: None,
            progress: 0.0,
        }
    }

    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = Some(content_type);
        self
    }
}
