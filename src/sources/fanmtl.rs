//! FanMTL adapter: a WordPress/Madara-theme novel site.
//!
//! Chapter listings are served two ways depending on the theme settings:
//! inline on the novel page, or behind a form-encoded POST to the
//! admin-ajax endpoint keyed by the numeric post id hidden in the
//! `shortlink` tag. Both paths normalize through the same row parser.

use crate::error::SourceResult;
use crate::extract;
use crate::http_client::HttpClient;
use crate::models::{Chapter, ContentItem, ContentStatus, SourceInfo, SourceType};
use crate::normalize;
use crate::sources::{ContentSource, SearchQuery, CONTENT_NOT_FOUND};
use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use scraper::{ElementRef, Html, Selector};

pub const SOURCE_ID: &str = "fanmtl";

/// Ordered fallback list of chapter-body containers seen across the
/// theme's layout variants.
const CONTENT_SELECTORS: &[&str] = &[".reading-content", ".text-left", ".entry-content"];

/// Sub-elements stripped from extracted chapter bodies.
const STRIP_SELECTORS: &[&str] = &["script", ".adsbygoogle", r#"div[class*="ad"]"#];

pub struct FanMtlSource {
    info: SourceInfo,
    http: HttpClient,
}

impl FanMtlSource {
    pub fn new(http: HttpClient) -> Self {
        Self::with_base_url(http, "https://fanmtl.com".to_string())
    }

    pub fn with_base_url(http: HttpClient, base_url: String) -> Self {
        let info = SourceInfo {
            id: SOURCE_ID.to_string(),
            name: "FanMTL".to_string(),
            version: "1.0.0".to_string(),
            base_url,
            source_type: SourceType::Novel,
            nsfw: false,
        };
        Self { info, http }
    }

    // The site rejects requests without a same-origin referer.
    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&self.info.base_url) {
            headers.insert(REFERER, value);
        }
        headers
    }

    async fn fetch_chapter_rows(&self, id: &str, html: &str) -> SourceResult<Vec<Chapter>> {
        // Parsed documents are kept out of scope across awaits: scraper's
        // Html is not Send.
        let mut rows = {
            let document = Html::parse_document(html);
            parse_chapter_rows(document.root_element(), id)
        };

        // Some theme configurations only expose the listing via admin-ajax.
        if rows.is_empty() {
            if let Some(post_id) = find_shortlink_id(html) {
                log::debug!("fanmtl: inline chapter list empty, trying admin-ajax for post {}", post_id);
                let ajax_url = format!("{}/wp-admin/admin-ajax.php", self.info.base_url);
                let body = self
                    .http
                    .post_form(
                        &ajax_url,
                        &[("action", "manga_get_chapters"), ("manga", post_id.as_str())],
                        self.headers(),
                    )
                    .await?;
                let fragment = Html::parse_fragment(&body);
                rows = parse_chapter_rows(fragment.root_element(), id);
            }
        }

        Ok(finalize_chapters(rows))
    }
}

#[async_trait]
impl ContentSource for FanMtlSource {
    fn info(&self) -> &SourceInfo {
        &self.info
    }

    async fn search(&self, query: &SearchQuery) -> SourceResult<Vec<ContentItem>> {
        let url = format!(
            "{}/?s={}&post_type=wp-manga",
            self.info.base_url,
            urlencoding::encode(&query.query)
        );
        let html = self.http.get_text_with_headers(&url, self.headers()).await?;
        Ok(parse_search(&html))
    }

    async fn get_details(&self, id: &str) -> SourceResult<ContentItem> {
        let url = format!("{}/novel/{}", self.info.base_url, id);
        let html = self.http.get_text_with_headers(&url, self.headers()).await?;
        let mut item = parse_details(&html, id, &self.info.base_url);
        item.chapters = Some(self.fetch_chapter_rows(id, &html).await?);
        Ok(item)
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
        let url = format!("{}/novel/{}/{}", self.info.base_url, novel_id, chapter_id);
        log::info!("fanmtl: fetching chapter content from {}", url);
        let html = self.http.get_text_with_headers(&url, self.headers()).await?;
        Ok(parse_chapter_content(&html, novel_id, chapter_id, &url))
    }
}

pub(crate) fn parse_search(html: &str) -> Vec<ContentItem> {
    let document = Html::parse_document(html);
    let row_sel = match Selector::parse(".c-tabs-item__content") {
        Ok(sel) => sel,
        Err(_) => return Vec::new(),
    };

    let mut results = Vec::new();
    for row in document.select(&row_sel) {
        let title = extract::first_text(row, ".post-title h3 a");
        let url = extract::first_attr(row, ".post-title h3 a", &["href"]);
        let id = match novel_id_from_url(&url) {
            Some(id) => id,
            None => continue,
        };
        if title.is_empty() {
            continue;
        }

        let author = extract::first_text(row, ".mg_author .summary-content");
        let status_text = extract::first_text(row, ".mg_status .summary-content");
        let status = if status_text.is_empty() {
            // Search rows rarely carry a status cell; the listing only shows
            // works still being published.
            ContentStatus::Ongoing
        } else {
            ContentStatus::from_upstream(&status_text)
        };

        results.push(ContentItem {
            id,
            title,
            author: if author.is_empty() { "Unknown".to_string() } else { author },
            description: String::new(),
            cover_url: extract::first_attr(row, ".tab-thumb img", &["src", "data-src"]),
            status,
            source_id: SOURCE_ID.to_string(),
            url,
            tags: extract::all_texts(row, ".mg_genres .summary-content a"),
            chapters: None,
            rating: extract::first_text(row, ".score").parse::<f32>().ok(),
            views: None,
        });
    }
    results
}

pub(crate) fn parse_details(html: &str, id: &str, base_url: &str) -> ContentItem {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let status_text = extract::first_text(root, ".post-status .summary-content");
    ContentItem {
        id: id.to_string(),
        title: extract::first_text(root, ".post-title h1"),
        author: extract::first_text(root, ".author-content a"),
        description: extract::first_text(root, ".summary__content"),
        cover_url: extract::first_attr(root, ".summary_image img", &["src", "data-src"]),
        status: ContentStatus::from_upstream(&status_text),
        source_id: SOURCE_ID.to_string(),
        url: format!("{}/novel/{}", base_url, id),
        tags: extract::all_texts(root, ".genres-content a"),
        chapters: None,
        rating: extract::first_text(root, ".post-total-rating .score").parse::<f32>().ok(),
        views: None,
    }
}

/// Parse `.wp-manga-chapter` rows from a novel page or an admin-ajax
/// fragment; both markups share this structure. Rows come back in upstream
/// order (newest first).
pub(crate) fn parse_chapter_rows(scope: ElementRef<'_>, novel_id: &str) -> Vec<Chapter> {
    let mut out = Vec::new();
    let row_sel = match Selector::parse(".wp-manga-chapter") {
        Ok(sel) => sel,
        Err(_) => return out,
    };
    for row in scope.select(&row_sel) {
        let href = extract::first_attr(row, "a", &["href", "data-href"]);
        if href.is_empty() {
            continue;
        }
        let slug = chapter_slug_from_url(&href);
        if slug.is_empty() {
            continue;
        }
        let release = extract::first_text(row, ".chapter-release-date");
        out.push(Chapter {
            id: slug,
            novel_id: novel_id.to_string(),
            title: extract::first_text(row, "a"),
            chapter_number: 0.0,
            release_date: if release.is_empty() { None } else { Some(release) },
            url: Some(href),
            content: String::new(),
            images: Vec::new(),
        });
    }
    out
}

/// Newest-first upstream rows -> canonical ascending order, numbered from
/// the slug where possible and positionally otherwise.
pub(crate) fn finalize_chapters(mut rows: Vec<Chapter>) -> Vec<Chapter> {
    rows.reverse();
    for (idx, chapter) in rows.iter_mut().enumerate() {
        chapter.chapter_number =
            normalize::extract_chapter_number(&chapter.id).unwrap_or((idx + 1) as f32);
    }
    normalize::canonical_order(&mut rows);
    rows
}

/// Numeric post id from `<link rel="shortlink" href=".../?p=12345">`.
pub(crate) fn find_shortlink_id(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let sel = Selector::parse(r#"link[rel="shortlink"]"#).ok()?;
    let href = document.select(&sel).next()?.value().attr("href")?;
    let re = Regex::new(r"[?&]p=(\d+)").ok()?;
    re.captures(href).map(|cap| cap[1].to_string())
}

pub(crate) fn parse_chapter_content(
    html: &str,
    novel_id: &str,
    chapter_id: &str,
    url: &str,
) -> Chapter {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let mut title = extract::first_text(root, "#chapter-heading");
    if title.is_empty() {
        title = extract::first_text(root, ".breadcrumb li.active");
    }

    let content = match extract::first_inner_html(root, CONTENT_SELECTORS) {
        Some(body) => extract::strip_elements(&body, STRIP_SELECTORS),
        None => {
            log::warn!("fanmtl: no content container matched for {}", url);
            CONTENT_NOT_FOUND.to_string()
        }
    };

    Chapter {
        id: chapter_id.to_string(),
        novel_id: novel_id.to_string(),
        title,
        chapter_number: normalize::extract_chapter_number(chapter_id).unwrap_or(0.0),
        release_date: None,
        url: Some(url.to_string()),
        content,
        images: Vec::new(),
    }
}

fn novel_id_from_url(url: &str) -> Option<String> {
    url.split("/novel/")
        .nth(1)
        .map(|tail| tail.trim_end_matches('/').to_string())
        .filter(|id| !id.is_empty())
}

fn chapter_slug_from_url(url: &str) -> String {
    url.split('/')
        .filter(|part| !part.is_empty())
        .next_back()
        .unwrap_or("")
        .to_string()
}
