//! Archive of Our Own adapter.
//!
//! AO3 gates age-restricted works behind an interstitial: without the
//! `view_adult=true` cookie they 404, so every request carries it. The work
//! page never enumerates chapters; the count is derived from the
//! "current/total" stats string (a `?` total means the work is ongoing) and
//! sequential chapter descriptors are synthesized by index. Reading one
//! chapter loads the whole work in full-view mode and picks the indexed
//! sub-section.

use crate::error::SourceResult;
use crate::extract;
use crate::http_client::HttpClient;
use crate::models::{Chapter, ContentItem, ContentStatus, SourceInfo, SourceType};
use crate::normalize;
use crate::sources::{ContentSource, SearchQuery, CONTENT_NOT_FOUND};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use scraper::{Html, Selector};

pub const SOURCE_ID: &str = "ao3";

pub struct Ao3Source {
    info: SourceInfo,
    http: HttpClient,
}

impl Ao3Source {
    pub fn new(http: HttpClient) -> Self {
        Self::with_base_url(http, "https://archiveofourown.org".to_string())
    }

    pub fn with_base_url(http: HttpClient, base_url: String) -> Self {
        let info = SourceInfo {
            id: SOURCE_ID.to_string(),
            name: "Archive of Our Own".to_string(),
            version: "1.0.0".to_string(),
            base_url,
            source_type: SourceType::Novel,
            nsfw: true,
        };
        Self { info, http }
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("view_adult=true"));
        headers
    }
}

#[async_trait]
impl ContentSource for Ao3Source {
    fn info(&self) -> &SourceInfo {
        &self.info
    }

    async fn search(&self, query: &SearchQuery) -> SourceResult<Vec<ContentItem>> {
        let url = format!(
            "{}/works/search?work_search%5Bquery%5D={}&page={}",
            self.info.base_url,
            urlencoding::encode(&query.query),
            query.page
        );
        let html = self.http.get_text_with_headers(&url, self.headers()).await?;
        Ok(parse_search(&html, &self.info.base_url))
    }

    async fn get_details(&self, id: &str) -> SourceResult<ContentItem> {
        let url = format!("{}/works/{}?view_adult=true", self.info.base_url, id);
        let html = self.http.get_text_with_headers(&url, self.headers()).await?;
        Ok(parse_details(&html, id, &self.info.base_url))
    }

    async fn list_chapters(&self, id: &str) -> SourceResult<Vec<Chapter>> {
        let details = self.get_details(id).await?;
        Ok(details.chapters.unwrap_or_default())
    }

    async fn get_chapter_content(
        &self,
        novel_id: &str,
        chapter_id: &str,
    ) -> SourceResult<Chapter> {
        let url = format!(
            "{}/works/{}?view_full_work=true&view_adult=true",
            self.info.base_url, novel_id
        );
        log::info!("ao3: fetching full work view for {}", novel_id);
        let html = self.http.get_text_with_headers(&url, self.headers()).await?;
        Ok(parse_chapter_content(&html, novel_id, chapter_id))
    }
}

/// "current/total" stats text -> (published chapter count, ongoing flag).
/// A non-numeric total ("10/?") means the work is still updating.
pub(crate) fn parse_work_stats(text: &str) -> (u32, bool) {
    let mut parts = text.trim().splitn(2, '/');
    let current = parts
        .next()
        .and_then(|p| normalize::parse_count(p))
        .unwrap_or(1) as u32;
    let ongoing = match parts.next() {
        Some(total) => total.trim().parse::<u32>().is_err(),
        None => false,
    };
    (current.max(1), ongoing)
}

pub(crate) fn parse_search(html: &str, base_url: &str) -> Vec<ContentItem> {
    let document = Html::parse_document(html);
    let row_sel = match Selector::parse("li.work.blurb") {
        Ok(sel) => sel,
        Err(_) => return Vec::new(),
    };

    let mut results = Vec::new();
    for row in document.select(&row_sel) {
        let id = match row.value().attr("id").and_then(|v| v.strip_prefix("work_")) {
            Some(raw) if !raw.is_empty() => raw.to_string(),
            _ => continue,
        };
        let title = extract::first_text(row, "h4.heading a");
        if title.is_empty() {
            continue;
        }

        let author = extract::first_text(row, r#"h4.heading a[rel="author"]"#);
        let chapters_text = extract::first_text(row, "dl.stats dd.chapters");
        let (_, ongoing) = parse_work_stats(&chapters_text);
        let hits = extract::first_text(row, "dl.stats dd.hits");

        results.push(ContentItem {
            url: format!("{}/works/{}", base_url, id),
            id,
            title,
            author: if author.is_empty() { "Anonymous".to_string() } else { author },
            description: extract::first_text(row, "blockquote.userstuff"),
            cover_url: String::new(),
            status: if ongoing { ContentStatus::Ongoing } else { ContentStatus::Completed },
            source_id: SOURCE_ID.to_string(),
            tags: extract::all_texts(row, "h5.fandoms a"),
            chapters: None,
            rating: None,
            views: normalize::parse_count(&hits),
        });
    }
    results
}

pub(crate) fn parse_details(html: &str, id: &str, base_url: &str) -> ContentItem {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let title = extract::first_text(root, "h2.title");
    let author = extract::first_text(root, "h3.byline a");
    let chapters_text = extract::first_text(root, "dl.stats dd.chapters");
    let (current, ongoing) = parse_work_stats(&chapters_text);
    let hits = extract::first_text(root, "dl.stats dd.hits");

    // The work page does not link individual chapters; synthesize
    // sequential descriptors from the published count.
    let chapters: Vec<Chapter> = (1..=current)
        .map(|n| Chapter {
            id: n.to_string(),
            novel_id: id.to_string(),
            title: format!("Chapter {}", n),
            chapter_number: n as f32,
            release_date: None,
            url: Some(format!("{}/works/{}/chapters/{}", base_url, id, n)),
            content: String::new(),
            images: Vec::new(),
        })
        .collect();

    ContentItem {
        id: id.to_string(),
        title,
        author: if author.is_empty() { "Anonymous".to_string() } else { author },
        description: extract::first_text(root, ".summary blockquote.userstuff"),
        cover_url: String::new(),
        status: if ongoing { ContentStatus::Ongoing } else { ContentStatus::Completed },
        source_id: SOURCE_ID.to_string(),
        url: format!("{}/works/{}", base_url, id),
        tags: extract::all_texts(root, "dd.fandom a"),
        chapters: Some(chapters),
        rating: None,
        views: normalize::parse_count(&hits),
    }
}

pub(crate) fn parse_chapter_content(html: &str, novel_id: &str, chapter_id: &str) -> Chapter {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let index = chapter_id.parse::<u32>().unwrap_or(1);

    let mut title = String::new();
    let mut content = String::new();

    // Multi-chapter works expose indexed sub-sections in full-view mode.
    if let Ok(sel) = Selector::parse(&format!("#chapter_{}", index)) {
        if let Some(section) = document.select(&sel).next() {
            title = extract::first_text(section, ".title");
            content = extract::first_inner_html(section, &[".userstuff"]).unwrap_or_default();
        }
    }

    // Single-chapter works have no indexed sub-section; the whole body is
    // the chapter.
    if content.trim().is_empty() {
        content = extract::first_inner_html(root, &["div.userstuff"]).unwrap_or_default();
        title = extract::first_text(root, "h2.title");
    }

    if content.trim().is_empty() {
        log::warn!("ao3: no chapter body found for work {} chapter {}", novel_id, chapter_id);
        content = CONTENT_NOT_FOUND.to_string();
    }

    Chapter {
        id: chapter_id.to_string(),
        novel_id: novel_id.to_string(),
        title: if title.is_empty() { format!("Chapter {}", chapter_id) } else { title },
        chapter_number: index as f32,
        release_date: None,
        url: None,
        content,
        images: Vec::new(),
    }
}
