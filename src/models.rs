use serde::{Deserialize, Serialize};

/// Publication status, derived from free-text upstream status fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentStatus {
    Ongoing,
    Completed,
    Hiatus,
    Unknown,
}

impl ContentStatus {
    /// Substring match over whatever status text the upstream exposes
    /// ("Completed", "COMPLETED ✓", "On Hiatus", ...).
    pub fn from_upstream(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("complet") || lower.contains("finished") {
            ContentStatus::Completed
        } else if lower.contains("hiatus") {
            ContentStatus::Hiatus
        } else if lower.contains("ongoing") || lower.contains("releasing") {
            ContentStatus::Ongoing
        } else {
            ContentStatus::Unknown
        }
    }
}

impl Default for ContentStatus {
    fn default() -> Self {
        ContentStatus::Unknown
    }
}

/// What kind of content a source serves; decides whether chapters carry
/// HTML text or page image URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Novel,
    Manga,
}

/// Unified entity every adapter normalizes its results into.
///
/// `id` is source-local and only unique within the `source_id` namespace.
/// `author`, `description` and `cover_url` may be empty when the upstream
/// omits them (search-result rows usually do). `rating`/`views` keep the
/// upstream's own scale and must not be compared across sources.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    pub title: String,
    pub author: String,
    pub description: String,
    pub cover_url: String,
    pub status: ContentStatus,
    pub source_id: String,
    pub url: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapters: Option<Vec<Chapter>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
}

/// A single chapter. Exactly one of `content` (text sources) or `images`
/// (image sources) is meaningful, per the owning source's type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    pub novel_id: String,
    pub title: String,
    pub chapter_number: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub content: String,
    pub images: Vec<String>,
}

/// Registry descriptor for a source. Built once at startup, immutable for
/// the process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInfo {
    pub id: String,
    pub name: String,
    pub version: String,
    pub base_url: String,
    pub source_type: SourceType,
    #[serde(default)]
    pub nsfw: bool,
}
