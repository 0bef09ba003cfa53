//! MangaDex adapter: a pure REST API source, no scraping involved.
//!
//! Covers and authors arrive as entries of a polymorphic `relationships`
//! array and are located by `type`; a missing relationship degrades to an
//! empty cover / "Unknown" author, never an error. Chapter pages are not
//! addressable directly: content resolution asks the at-home endpoint for a
//! delivery server descriptor and builds every page URL from its base URL,
//! chapter hash and filename list.

use crate::error::SourceResult;
use crate::http_client::HttpClient;
use crate::models::{Chapter, ContentItem, ContentStatus, SourceInfo, SourceType};
use crate::normalize;
use crate::sources::{ContentSource, SearchQuery};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

pub const SOURCE_ID: &str = "mangadex";

const FEED_PAGE_SIZE: u32 = 100;

pub struct MangaDexSource {
    info: SourceInfo,
    http: HttpClient,
    uploads_url: String,
}

#[derive(Deserialize)]
struct MangaList {
    #[serde(default)]
    data: Vec<MangaData>,
}

#[derive(Deserialize)]
struct MangaEntity {
    data: MangaData,
}

#[derive(Deserialize)]
struct MangaData {
    id: String,
    attributes: MangaAttributes,
    #[serde(default)]
    relationships: Vec<Relationship>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MangaAttributes {
    #[serde(default)]
    title: HashMap<String, String>,
    #[serde(default)]
    description: HashMap<String, String>,
    #[serde(default)]
    status: String,
    #[serde(default)]
    tags: Vec<Tag>,
}

#[derive(Deserialize)]
struct Relationship {
    #[serde(rename = "type")]
    rel_type: String,
    #[serde(default)]
    attributes: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct Tag {
    attributes: TagAttributes,
}

#[derive(Deserialize)]
struct TagAttributes {
    #[serde(default)]
    name: HashMap<String, String>,
}

#[derive(Deserialize)]
struct ChapterFeed {
    #[serde(default)]
    data: Vec<ChapterData>,
}

#[derive(Deserialize)]
struct ChapterData {
    id: String,
    attributes: ChapterAttributes,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChapterAttributes {
    #[serde(default)]
    chapter: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    publish_at: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AtHome {
    base_url: String,
    chapter: AtHomeChapter,
}

#[derive(Deserialize)]
struct AtHomeChapter {
    hash: String,
    #[serde(default)]
    data: Vec<String>,
}

impl MangaDexSource {
    pub fn new(http: HttpClient) -> Self {
        Self::with_base_urls(
            http,
            "https://api.mangadex.org".to_string(),
            "https://uploads.mangadex.org".to_string(),
        )
    }

    pub fn with_base_urls(http: HttpClient, api_url: String, uploads_url: String) -> Self {
        let info = SourceInfo {
            id: SOURCE_ID.to_string(),
            name: "MangaDex".to_string(),
            version: "1.0.0".to_string(),
            base_url: api_url,
            source_type: SourceType::Manga,
            nsfw: false,
        };
        Self { info, http, uploads_url }
    }

    fn map_manga(&self, data: MangaData) -> ContentItem {
        map_manga(data, &self.uploads_url)
    }
}

#[async_trait]
impl ContentSource for MangaDexSource {
    fn info(&self) -> &SourceInfo {
        &self.info
    }

    async fn search(&self, query: &SearchQuery) -> SourceResult<Vec<ContentItem>> {
        let url = format!("{}/manga", self.info.base_url);
        let limit = query.limit.to_string();
        let offset = (query.page.saturating_sub(1) * query.limit).to_string();
        let list: MangaList = self
            .http
            .get_json(
                &url,
                &[
                    ("title", query.query.as_str()),
                    ("limit", limit.as_str()),
                    ("offset", offset.as_str()),
                    ("includes[]", "cover_art"),
                    ("includes[]", "author"),
                    ("contentRating[]", "safe"),
                    ("contentRating[]", "suggestive"),
                    ("contentRating[]", "erotica"),
                    ("contentRating[]", "pornographic"),
                    ("order[relevance]", "desc"),
                ],
            )
            .await?;
        Ok(list.data.into_iter().map(|m| self.map_manga(m)).collect())
    }

    async fn get_details(&self, id: &str) -> SourceResult<ContentItem> {
        let url = format!("{}/manga/{}", self.info.base_url, id);
        let entity: MangaEntity = self
            .http
            .get_json(&url, &[("includes[]", "cover_art"), ("includes[]", "author")])
            .await?;
        Ok(self.map_manga(entity.data))
    }

    async fn list_chapters(&self, id: &str) -> SourceResult<Vec<Chapter>> {
        let url = format!("{}/manga/{}/feed", self.info.base_url, id);
        let mut chapters = Vec::new();
        let mut offset = 0u32;

        loop {
            let limit = FEED_PAGE_SIZE.to_string();
            let offset_str = offset.to_string();
            let feed: ChapterFeed = self
                .http
                .get_json(
                    &url,
                    &[
                        ("limit", limit.as_str()),
                        ("offset", offset_str.as_str()),
                        ("translatedLanguage[]", "en"),
                        ("order[chapter]", "asc"),
                        ("includes[]", "scanlation_group"),
                    ],
                )
                .await?;
            if feed.data.is_empty() {
                break;
            }
            let batch = feed.data.len() as u32;
            for ch in feed.data {
                chapters.push(map_chapter(ch, id, &self.info.base_url));
            }
            if batch < FEED_PAGE_SIZE {
                break;
            }
            offset += FEED_PAGE_SIZE;
        }

        normalize::canonical_order(&mut chapters);
        Ok(chapters)
    }

    async fn get_chapter_content(
        &self,
        novel_id: &str,
        chapter_id: &str,
    ) -> SourceResult<Chapter> {
        // Two-step resolution: delivery-server descriptor first, then page
        // URLs built from its hash and filename list.
        let url = format!("{}/at-home/server/{}", self.info.base_url, chapter_id);
        let at_home: AtHome = self.http.get_json(&url, &[]).await?;
        log::info!(
            "mangadex: resolved {} pages for chapter {}",
            at_home.chapter.data.len(),
            chapter_id
        );

        Ok(Chapter {
            id: chapter_id.to_string(),
            novel_id: novel_id.to_string(),
            title: String::new(),
            chapter_number: 0.0,
            release_date: None,
            url: None,
            content: String::new(),
            images: page_urls(&at_home),
        })
    }
}

fn page_urls(at_home: &AtHome) -> Vec<String> {
    at_home
        .chapter
        .data
        .iter()
        .map(|file| format!("{}/data/{}/{}", at_home.base_url, at_home.chapter.hash, file))
        .collect()
}

fn relationship_attr<'a>(
    relationships: &'a [Relationship],
    rel_type: &str,
    field: &str,
) -> Option<&'a str> {
    relationships
        .iter()
        .find(|r| r.rel_type == rel_type)
        .and_then(|r| r.attributes.as_ref())
        .and_then(|attrs| attrs.get(field))
        .and_then(|v| v.as_str())
}

fn map_manga(data: MangaData, uploads_url: &str) -> ContentItem {
    let title = data
        .attributes
        .title
        .get("en")
        .cloned()
        .or_else(|| data.attributes.title.values().next().cloned())
        .unwrap_or_default();

    let cover_url = relationship_attr(&data.relationships, "cover_art", "fileName")
        .map(|file| format!("{}/covers/{}/{}", uploads_url, data.id, file))
        .unwrap_or_default();
    let author = relationship_attr(&data.relationships, "author", "name")
        .unwrap_or("Unknown")
        .to_string();

    let tags = data
        .attributes
        .tags
        .into_iter()
        .filter_map(|tag| tag.attributes.name.get("en").cloned())
        .collect();

    ContentItem {
        url: format!("https://mangadex.org/title/{}", data.id),
        title,
        author,
        description: data.attributes.description.get("en").cloned().unwrap_or_default(),
        cover_url,
        status: ContentStatus::from_upstream(&data.attributes.status),
        source_id: SOURCE_ID.to_string(),
        tags,
        chapters: None,
        rating: None,
        views: None,
        id: data.id,
    }
}

fn map_chapter(ch: ChapterData, novel_id: &str, base_url: &str) -> Chapter {
    let number = ch
        .attributes
        .chapter
        .as_deref()
        .and_then(|n| n.parse::<f32>().ok())
        .unwrap_or(0.0);
    let title = match ch.attributes.title.as_deref() {
        Some(t) if !t.trim().is_empty() => t.to_string(),
        _ => format!("Chapter {}", number),
    };
    Chapter {
        url: Some(format!("{}/chapter/{}", base_url, ch.id)),
        id: ch.id,
        novel_id: novel_id.to_string(),
        title,
        chapter_number: number,
        release_date: ch.attributes.publish_at,
        content: String::new(),
        images: Vec::new(),
    }
}
