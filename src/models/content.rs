use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;

use super::RecordId;

/// Kind of catalog item
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Video,
    Book,
    Article,
    Artifact,
}

impl Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ContentType::Video => "video",
            ContentType::Book => "book",
            ContentType::Article => "article",
            ContentType::Artifact => "artifact",
        };
        write!(f, "{}", name)
    }
}

/// A catalog item as supplied by the content service
///
/// Text fields that are missing or null deserialize to empty values so a
/// sparse record never fails a recommendation request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentRecord {
    pub id: RecordId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    pub content_type: ContentType,
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub view_count: u64,
}

impl ContentRecord {
    /// Creates a record with no tags and no views
    pub fn new(
        id: impl Into<RecordId>,
        title: impl Into<String>,
        description: impl Into<String>,
        content_type: ContentType,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            content_type,
            tags: Vec::new(),
            view_count: 0,
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_view_count(mut self, view_count: u64) -> Self {
        self.view_count = view_count;
        self
    }

    /// Text used for similarity scoring: title, description and tags
    pub fn document(&self) -> String {
        format!("{} {} {}", self.title, self.description, self.tags.join(" "))
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts a tag array, null, or a string holding a JSON array of tags
fn deserialize_tags<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTags {
        List(Vec<String>),
        Encoded(String),
    }

    let tags = match Option::<RawTags>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(RawTags::List(tags)) => tags,
        Some(RawTags::Encoded(raw)) if raw.trim().is_empty() => Vec::new(),
        Some(RawTags::Encoded(raw)) => serde_json::from_str(&raw).unwrap_or_else(|_| vec![raw]),
    };

    Ok(tags)
}
