//! Registry and aggregation behavior over mock adapters: fan-out fault
//! isolation, fallback chains, id routing, and title bridging.

use async_trait::async_trait;
use fiction_aggregator::http_client::HttpClient;
use fiction_aggregator::metadata::anilist::{AniListClient, MetadataRecord, MetadataTitles};
use fiction_aggregator::sources::{ContentSource, SearchQuery};
use fiction_aggregator::{
    Aggregator, Chapter, ContentItem, ContentStatus, SourceError, SourceInfo, SourceRegistry,
    SourceType,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct MockSource {
    info: SourceInfo,
    items: Vec<ContentItem>,
    fail: bool,
    search_calls: AtomicUsize,
}

impl MockSource {
    fn new(id: &str, source_type: SourceType) -> Self {
        Self {
            info: SourceInfo {
                id: id.to_string(),
                name: id.to_string(),
                version: "1.0.0".to_string(),
                base_url: format!("https://{}.example", id),
                source_type,
                nsfw: false,
            },
            items: Vec::new(),
            fail: false,
            search_calls: AtomicUsize::new(0),
        }
    }

    fn with_items(mut self, titles: &[&str]) -> Self {
        self.items = titles
            .iter()
            .enumerate()
            .map(|(idx, title)| ContentItem {
                id: format!("{}-{}", self.info.id, idx + 1),
                title: title.to_string(),
                source_id: self.info.id.clone(),
                status: ContentStatus::Ongoing,
                ..Default::default()
            })
            .collect();
        self
    }

    fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentSource for MockSource {
    fn info(&self) -> &SourceInfo {
        &self.info
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<ContentItem>, SourceError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SourceError::Upstream("connection refused".to_string()));
        }
        let needle = query.query.to_lowercase();
        Ok(self
            .items
            .iter()
            .filter(|item| item.title.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn get_details(&self, id: &str) -> Result<ContentItem, SourceError> {
        if self.fail {
            return Err(SourceError::Upstream("connection refused".to_string()));
        }
        self.items
            .iter()
            .find(|item| item.id == id)
            .cloned()
            .ok_or(SourceError::NotFound)
    }

    async fn list_chapters(&self, id: &str) -> Result<Vec<Chapter>, SourceError> {
        let details = self.get_details(id).await?;
        Ok(vec![Chapter {
            id: "1".to_string(),
            novel_id: details.id,
            title: "Chapter 1".to_string(),
            chapter_number: 1.0,
            ..Default::default()
        }])
    }

    async fn get_chapter_content(
        &self,
        novel_id: &str,
        chapter_id: &str,
    ) -> Result<Chapter, SourceError> {
        Ok(Chapter {
            id: chapter_id.to_string(),
            novel_id: novel_id.to_string(),
            content: format!("<p>{}/{}</p>", novel_id, chapter_id),
            chapter_number: 1.0,
            ..Default::default()
        })
    }
}

fn aggregator_with(sources: Vec<Arc<MockSource>>) -> Aggregator {
    let mut registry = SourceRegistry::new();
    for source in sources {
        registry.register(source);
    }
    let metadata = AniListClient::new(HttpClient::new().expect("http client"));
    Aggregator::new(Arc::new(registry), metadata)
}

#[tokio::test]
async fn registry_lookup_and_type_partition() {
    let fanmtl = Arc::new(MockSource::new("fanmtl", SourceType::Novel));
    let mangadex = Arc::new(MockSource::new("mangadex", SourceType::Manga));
    let ao3 = Arc::new(MockSource::new("ao3", SourceType::Novel));

    let mut registry = SourceRegistry::new();
    registry.register(fanmtl);
    registry.register(mangadex);
    registry.register(ao3);

    assert!(registry.get("fanmtl").is_some());
    assert!(registry.get("nope").is_none());
    assert_eq!(registry.all().len(), 3);

    let novels: Vec<String> = registry
        .by_type(SourceType::Novel)
        .iter()
        .map(|s| s.info().id.clone())
        .collect();
    assert_eq!(novels, vec!["fanmtl", "ao3"]);

    let infos = registry.infos();
    assert_eq!(infos[0].id, "fanmtl");
    assert_eq!(infos[1].id, "mangadex");
}

#[tokio::test]
async fn fan_out_concatenates_in_registration_order() {
    let a = Arc::new(MockSource::new("fanmtl", SourceType::Novel).with_items(&["Alpha", "Beta"]));
    let b = Arc::new(MockSource::new("ao3", SourceType::Novel).with_items(&["Gamma"]));
    let aggregator = aggregator_with(vec![a, b]);

    let results = aggregator.search(&SearchQuery::new(""), None).await.unwrap();
    let titles: Vec<&str> = results.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Alpha", "Beta", "Gamma"]);
}

#[tokio::test]
async fn fan_out_swallows_single_source_failure() {
    let ok = Arc::new(MockSource::new("fanmtl", SourceType::Novel).with_items(&["Alpha"]));
    let broken = Arc::new(MockSource::new("ao3", SourceType::Novel).failing());
    let aggregator = aggregator_with(vec![broken, ok]);

    let results = aggregator.search(&SearchQuery::new(""), None).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].title, "Alpha");
}

#[tokio::test]
async fn direct_search_propagates_failure() {
    let broken = Arc::new(MockSource::new("fanmtl", SourceType::Novel).failing());
    let aggregator = aggregator_with(vec![broken]);

    let err = aggregator
        .search(&SearchQuery::new("x"), Some("fanmtl"))
        .await
        .unwrap_err();
    assert!(matches!(err, SourceError::Upstream(_)));
}

#[tokio::test]
async fn unknown_source_is_not_found() {
    let aggregator = aggregator_with(vec![]);
    let err = aggregator
        .search(&SearchQuery::new("x"), Some("nope"))
        .await
        .unwrap_err();
    assert!(matches!(err, SourceError::NotFound));

    let err = aggregator.get_details("nope", "1").await.unwrap_err();
    assert!(matches!(err, SourceError::NotFound));
}

#[tokio::test]
async fn typed_fan_out_only_hits_matching_sources() {
    let novel = Arc::new(MockSource::new("fanmtl", SourceType::Novel).with_items(&["Alpha"]));
    let manga = Arc::new(MockSource::new("mangadex", SourceType::Manga).with_items(&["Beta"]));
    let aggregator = aggregator_with(vec![novel.clone(), manga.clone()]);

    let results = aggregator.search_by_type(&SearchQuery::new(""), SourceType::Manga).await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].source_id, "mangadex");
    assert_eq!(novel.search_calls(), 0);
    assert_eq!(manga.search_calls(), 1);
}

#[tokio::test]
async fn fallback_chain_stops_at_primary_hit() {
    let primary = Arc::new(MockSource::new("fanmtl", SourceType::Novel).with_items(&["Alpha"]));
    let secondary = Arc::new(MockSource::new("ao3", SourceType::Novel).with_items(&["Beta"]));
    let aggregator = aggregator_with(vec![primary.clone(), secondary.clone()]);

    let results = aggregator.search_novels_with_fallback(&SearchQuery::new("alpha")).await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].source_id, "fanmtl");
    // The archive source must not be consulted when the primary hits.
    assert_eq!(secondary.search_calls(), 0);
}

#[tokio::test]
async fn fallback_chain_advances_on_empty_primary() {
    let primary = Arc::new(MockSource::new("fanmtl", SourceType::Novel).with_items(&["Alpha"]));
    let secondary = Arc::new(MockSource::new("ao3", SourceType::Novel).with_items(&["Beta"]));
    let aggregator = aggregator_with(vec![primary, secondary]);

    let results = aggregator.search_novels_with_fallback(&SearchQuery::new("beta")).await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].source_id, "ao3");
}

#[tokio::test]
async fn fallback_chain_survives_primary_failure() {
    let primary = Arc::new(MockSource::new("fanmtl", SourceType::Novel).failing());
    let secondary = Arc::new(MockSource::new("ao3", SourceType::Novel).with_items(&["Beta"]));
    let aggregator = aggregator_with(vec![primary, secondary]);

    let results = aggregator.search_novels_with_fallback(&SearchQuery::new("beta")).await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].source_id, "ao3");
}

#[tokio::test]
async fn fallback_chain_exhaustion_is_empty_not_error() {
    let primary = Arc::new(MockSource::new("fanmtl", SourceType::Novel).failing());
    let secondary = Arc::new(MockSource::new("ao3", SourceType::Novel).failing());
    let aggregator = aggregator_with(vec![primary, secondary]);

    let results = aggregator.search_novels_with_fallback(&SearchQuery::new("x")).await;
    assert!(results.is_empty());
}

#[tokio::test]
async fn resolve_routes_prefixed_ids() {
    let ao3 = Arc::new(MockSource::new("ao3", SourceType::Novel).with_items(&["The Long Watch"]));
    let aggregator = aggregator_with(vec![ao3]);

    // Mock item ids are "<source>-<n>"; the prefixed form carries the
    // source-local id after the underscore.
    let item = aggregator.resolve("ao3_ao3-1").await.unwrap();
    assert_eq!(item.source_id, "ao3");
    assert_eq!(item.title, "The Long Watch");
}

#[tokio::test]
async fn resolve_routes_uuid_to_manga_source() {
    let mangadex = Arc::new(MockSource::new("mangadex", SourceType::Manga));
    let aggregator = aggregator_with(vec![mangadex.clone()]);

    // Details miss is fine; the point is which adapter got the call.
    let err = aggregator
        .resolve("550e8400-e29b-41d4-a716-446655440000")
        .await
        .unwrap_err();
    assert!(matches!(err, SourceError::NotFound));
}

#[tokio::test]
async fn resolve_routes_slug_to_default_text_source() {
    let fanmtl = Arc::new(MockSource::new("fanmtl", SourceType::Novel).with_items(&["Alpha"]));
    let aggregator = aggregator_with(vec![fanmtl]);

    let item = aggregator.resolve("fanmtl-1").await.unwrap();
    assert_eq!(item.source_id, "fanmtl");
}

fn record_with_titles(english: Option<&str>, romaji: Option<&str>, native: Option<&str>) -> MetadataRecord {
    MetadataRecord {
        id: 42,
        titles: MetadataTitles {
            english: english.map(str::to_string),
            romaji: romaji.map(str::to_string),
            native: native.map(str::to_string),
        },
        description: String::new(),
        cover_url: String::new(),
        genres: Vec::new(),
        status: ContentStatus::Unknown,
        average_score: None,
        popularity: None,
        is_adult: false,
    }
}

#[tokio::test]
async fn bridging_falls_back_to_romaji_title() {
    // The primary source only knows the romaji title; english must miss and
    // romaji must win without an error escaping.
    let fanmtl =
        Arc::new(MockSource::new("fanmtl", SourceType::Novel).with_items(&["Shadou Sureibu"]));
    let ao3 = Arc::new(MockSource::new("ao3", SourceType::Novel));
    let aggregator = aggregator_with(vec![fanmtl, ao3]);

    let record = record_with_titles(Some("Shadow Slave (Novel)"), Some("Shadou Sureibu"), None);
    let item = aggregator.bridge_to_source(&record).await.unwrap();
    assert_eq!(item.source_id, "fanmtl");
    assert_eq!(item.title, "Shadou Sureibu");
}

#[tokio::test]
async fn bridging_reaches_archive_source() {
    let fanmtl = Arc::new(MockSource::new("fanmtl", SourceType::Novel));
    let ao3 = Arc::new(MockSource::new("ao3", SourceType::Novel).with_items(&["Shadow Slave"]));
    let aggregator = aggregator_with(vec![fanmtl, ao3]);

    let record = record_with_titles(Some("Shadow Slave (Novel)"), None, None);
    let item = aggregator.bridge_to_source(&record).await.unwrap();
    assert_eq!(item.source_id, "ao3");
    assert_eq!(item.title, "Shadow Slave");
}

#[tokio::test]
async fn bridging_exhaustion_is_not_found() {
    let fanmtl = Arc::new(MockSource::new("fanmtl", SourceType::Novel));
    let ao3 = Arc::new(MockSource::new("ao3", SourceType::Novel));
    let aggregator = aggregator_with(vec![fanmtl, ao3]);

    let record = record_with_titles(Some("Completely Unknown"), None, None);
    let err = aggregator.bridge_to_source(&record).await.unwrap_err();
    assert!(matches!(err, SourceError::NotFound));
}

#[tokio::test]
async fn bridging_survives_primary_source_failure() {
    let fanmtl = Arc::new(MockSource::new("fanmtl", SourceType::Novel).failing());
    let ao3 = Arc::new(MockSource::new("ao3", SourceType::Novel).with_items(&["Shadow Slave"]));
    let aggregator = aggregator_with(vec![fanmtl, ao3]);

    let record = record_with_titles(Some("Shadow Slave"), None, None);
    let item = aggregator.bridge_to_source(&record).await.unwrap();
    assert_eq!(item.source_id, "ao3");
}

#[tokio::test]
async fn chapter_ops_dispatch_to_the_right_source() {
    let fanmtl = Arc::new(MockSource::new("fanmtl", SourceType::Novel).with_items(&["Alpha"]));
    let aggregator = aggregator_with(vec![fanmtl]);

    let chapters = aggregator.get_chapters("fanmtl", "fanmtl-1").await.unwrap();
    assert_eq!(chapters.len(), 1);
    assert_eq!(chapters[0].chapter_number, 1.0);

    let chapter = aggregator
        .get_chapter_content("fanmtl", "fanmtl-1", "chapter-1")
        .await
        .unwrap();
    assert_eq!(chapter.content, "<p>fanmtl-1/chapter-1</p>");
}
