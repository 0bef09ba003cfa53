//! AniList GraphQL client.
//!
//! Metadata source only: rich titles (english/romaji/native), scores and
//! popularity, but no chapter capability. The aggregation layer uses it as
//! a bridge, resolving a numeric external id to a title record before
//! re-searching the chapter-capable sources.

use crate::error::{SourceError, SourceResult};
use crate::http_client::HttpClient;
use crate::models::{ContentItem, ContentStatus};
use serde_json::{json, Value};

pub const SOURCE_ID: &str = "anilist";

const SEARCH_QUERY: &str = r#"
query ($search: String, $type: MediaType, $page: Int, $perPage: Int) {
  Page (page: $page, perPage: $perPage) {
    media (search: $search, type: $type, sort: POPULARITY_DESC) {
      id
      title { romaji english native }
      coverImage { extraLarge large medium }
      description
      status
      genres
      averageScore
      popularity
      isAdult
    }
  }
}
"#;

const GET_BY_ID_QUERY: &str = r#"
query ($id: Int) {
  Media (id: $id) {
    id
    title { romaji english native }
    coverImage { extraLarge large medium }
    description
    status
    genres
    averageScore
    popularity
    isAdult
  }
}
"#;

/// Titles in the scripts AniList tracks; any subset may be missing.
#[derive(Debug, Clone, Default)]
pub struct MetadataTitles {
    pub english: Option<String>,
    pub romaji: Option<String>,
    pub native: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MetadataRecord {
    pub id: i64,
    pub titles: MetadataTitles,
    pub description: String,
    pub cover_url: String,
    pub genres: Vec<String>,
    pub status: ContentStatus,
    /// AniList's own 0-100 scale, not comparable across sources.
    pub average_score: Option<f32>,
    pub popularity: Option<u64>,
    pub is_adult: bool,
}

impl MetadataRecord {
    pub fn display_title(&self) -> String {
        self.titles
            .english
            .clone()
            .or_else(|| self.titles.romaji.clone())
            .or_else(|| self.titles.native.clone())
            .unwrap_or_else(|| "Unknown Title".to_string())
    }

    /// Normalize into the unified entity so metadata search results share
    /// the shape every other source produces.
    pub fn to_content_item(&self) -> ContentItem {
        ContentItem {
            id: self.id.to_string(),
            title: self.display_title(),
            author: String::new(),
            description: self.description.clone(),
            cover_url: self.cover_url.clone(),
            status: self.status,
            source_id: SOURCE_ID.to_string(),
            url: format!("https://anilist.co/manga/{}", self.id),
            tags: self.genres.clone(),
            chapters: None,
            rating: self.average_score,
            views: self.popularity,
        }
    }
}

pub struct AniListClient {
    http: HttpClient,
    api_url: String,
}

impl AniListClient {
    pub fn new(http: HttpClient) -> Self {
        Self::with_api_url(http, "https://graphql.anilist.co".to_string())
    }

    pub fn with_api_url(http: HttpClient, api_url: String) -> Self {
        Self { http, api_url }
    }

    pub async fn search(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
    ) -> SourceResult<Vec<MetadataRecord>> {
        let body = json!({
            "query": SEARCH_QUERY,
            "variables": {
                "search": query,
                "type": "MANGA",
                "page": page,
                "perPage": per_page,
            }
        });
        let response: Value = self.http.post_json(&self.api_url, &body).await?;
        let media = response
            .pointer("/data/Page/media")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();
        Ok(media.iter().filter_map(map_media).collect())
    }

    pub async fn get_by_id(&self, id: i64) -> SourceResult<MetadataRecord> {
        let body = json!({
            "query": GET_BY_ID_QUERY,
            "variables": { "id": id }
        });
        let response: Value = self.http.post_json(&self.api_url, &body).await?;
        let media = response.pointer("/data/Media").cloned().unwrap_or(Value::Null);
        if media.is_null() {
            return Err(SourceError::NotFound);
        }
        map_media(&media)
            .ok_or_else(|| SourceError::Upstream("unexpected AniList media shape".to_string()))
    }
}

fn map_media(media: &Value) -> Option<MetadataRecord> {
    let id = media.get("id").and_then(|v| v.as_i64())?;

    let title_at = |field: &str| {
        media
            .pointer(&format!("/title/{}", field))
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };

    let cover_url = ["extraLarge", "large", "medium"]
        .iter()
        .find_map(|size| {
            media
                .pointer(&format!("/coverImage/{}", size))
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
        })
        .unwrap_or_default();

    let genres = media
        .get("genres")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|g| g.as_str().map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default();

    let status_text = media.get("status").and_then(|v| v.as_str()).unwrap_or("");

    Some(MetadataRecord {
        id,
        titles: MetadataTitles {
            english: title_at("english"),
            romaji: title_at("romaji"),
            native: title_at("native"),
        },
        description: media
            .get("description")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
        cover_url,
        genres,
        status: ContentStatus::from_upstream(status_text),
        average_score: media
            .get("averageScore")
            .and_then(|v| v.as_f64())
            .map(|s| s as f32),
        popularity: media.get("popularity").and_then(|v| v.as_u64()),
        is_adult: media.get("isAdult").and_then(|v| v.as_bool()).unwrap_or(false),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media_fixture() -> Value {
        json!({
            "id": 30013,
            "title": {
                "english": "One Piece",
                "romaji": "One Piece",
                "native": "ワンピース"
            },
            "coverImage": {
                "extraLarge": "https://img.anili.st/xl.jpg",
                "large": "https://img.anili.st/l.jpg"
            },
            "description": "Pirates.",
            "status": "RELEASING",
            "genres": ["Action", "Adventure"],
            "averageScore": 88,
            "popularity": 123456,
            "isAdult": false
        })
    }

    #[test]
    fn media_mapping() {
        let record = map_media(&media_fixture()).unwrap();
        assert_eq!(record.id, 30013);
        assert_eq!(record.titles.english.as_deref(), Some("One Piece"));
        assert_eq!(record.titles.native.as_deref(), Some("ワンピース"));
        assert_eq!(record.cover_url, "https://img.anili.st/xl.jpg");
        assert_eq!(record.status, ContentStatus::Ongoing);
        assert_eq!(record.average_score, Some(88.0));
        assert_eq!(record.popularity, Some(123456));
        assert_eq!(record.genres, vec!["Action", "Adventure"]);
    }

    #[test]
    fn media_without_id_is_rejected() {
        assert!(map_media(&json!({"title": {"english": "x"}})).is_none());
    }

    #[test]
    fn display_title_prefers_english_then_romaji_then_native() {
        let mut record = map_media(&media_fixture()).unwrap();
        assert_eq!(record.display_title(), "One Piece");
        record.titles.english = None;
        record.titles.romaji = Some("Wan Pisu".to_string());
        assert_eq!(record.display_title(), "Wan Pisu");
        record.titles.romaji = None;
        assert_eq!(record.display_title(), "ワンピース");
        record.titles.native = None;
        assert_eq!(record.display_title(), "Unknown Title");
    }

    #[test]
    fn record_normalizes_to_content_item() {
        let item = map_media(&media_fixture()).unwrap().to_content_item();
        assert_eq!(item.id, "30013");
        assert_eq!(item.source_id, SOURCE_ID);
        assert_eq!(item.url, "https://anilist.co/manga/30013");
        assert_eq!(item.rating, Some(88.0));
        assert_eq!(item.views, Some(123456));
        assert!(item.chapters.is_none());
    }

    #[test]
    fn empty_title_fields_become_none() {
        let media = json!({"id": 1, "title": {"english": "  ", "romaji": "Berserk"}});
        let record = map_media(&media).unwrap();
        assert!(record.titles.english.is_none());
        assert_eq!(record.titles.romaji.as_deref(), Some("Berserk"));
    }
}
