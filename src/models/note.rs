use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Tags that mark a note as a wellness signal for insights.
pub const WELLNESS_TAGS: [&str; 9] = [
    "mood",
    "energy",
    "sleep",
    "stress",
    "productivity",
    "focus",
    "motivation",
    "social",
    "health",
];

pub fn is_wellness_tag(tag: &str) -> bool {
    let tag = tag.trim().to_lowercase();
    WELLNESS_TAGS.iter().any(|t| *t == tag)
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Note {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Note {
    pub fn wellness_tags(&self) -> Vec<&str> {
        self.tags
            .iter()
            .map(String::as_str)
            .filter(|t| is_wellness_tag(t))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct NewNote {
    pub content: String,
    pub summary: String,
    pub tags: Vec<String>,
}

/// Trim tags, drop empties and duplicates while keeping first-seen order.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim();
        if tag.is_empty() || out.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            continue;
        }
        out.push(tag.to_string());
    }
    out
}
