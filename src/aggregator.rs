//! Aggregation and resolution layer on top of the source registry.
//!
//! Implements cross-source fan-out search, the novel fallback chain,
//! identifier-namespace dispatch for opaque ids, and title-bridging from
//! the metadata database to the chapter-capable sources.

use crate::config::Config;
use crate::error::{SourceError, SourceResult};
use crate::metadata::anilist::{AniListClient, MetadataRecord, MetadataTitles};
use crate::models::{Chapter, ContentItem, SourceInfo, SourceType};
use crate::normalize;
use crate::registry::SourceRegistry;
use crate::sources::{ao3, fanmtl, mangadex, ContentSource, SearchQuery};
use futures::future::join_all;
use std::sync::Arc;

/// Structural classification of an opaque content id.
///
/// This is a deliberate heuristic, not a lookup: the metadata database uses
/// plain integers (never hyphenated), the manga REST source uses hyphenated
/// UUIDs, so a hyphenated numeric-looking id is treated as non-numeric to
/// keep the two namespaces apart. Everything unclassified belongs to the
/// default text source's slug namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdNamespace {
    /// `<source>_<local>` with a registered source id prefix.
    Prefixed { source_id: String, local_id: String },
    /// Bare digits, no hyphen: a metadata-database integer id.
    Metadata(i64),
    /// Hyphenated UUID shape: the manga REST source.
    MangaUuid,
    /// Anything else: the default text source.
    Opaque,
}

pub fn classify_id(source_ids: &[&str], id: &str) -> IdNamespace {
    for sid in source_ids {
        let prefix = format!("{}_", sid);
        if let Some(local) = id.strip_prefix(prefix.as_str()) {
            if !local.is_empty() {
                return IdNamespace::Prefixed {
                    source_id: sid.to_string(),
                    local_id: local.to_string(),
                };
            }
        }
    }
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(n) = id.parse::<i64>() {
            return IdNamespace::Metadata(n);
        }
    }
    if looks_like_uuid(id) {
        return IdNamespace::MangaUuid;
    }
    IdNamespace::Opaque
}

fn looks_like_uuid(id: &str) -> bool {
    id.len() >= 32
        && id.contains('-')
        && id.chars().all(|c| c.is_ascii_hexdigit() || c == '-')
}

/// Ordered (source, title) pairs for title-bridging: the primary text
/// source with english, romaji, then native; the archive source with
/// english then romaji. Title qualifiers like "(Novel)" are stripped.
pub fn bridge_candidates(titles: &MetadataTitles) -> Vec<(&'static str, String)> {
    let cleaned = |t: &Option<String>| {
        t.as_deref()
            .map(normalize::strip_title_qualifier)
            .filter(|s| !s.is_empty())
    };

    let mut out = Vec::new();
    for title in [cleaned(&titles.english), cleaned(&titles.romaji), cleaned(&titles.native)]
        .into_iter()
        .flatten()
    {
        out.push((fanmtl::SOURCE_ID, title));
    }
    for title in [cleaned(&titles.english), cleaned(&titles.romaji)]
        .into_iter()
        .flatten()
    {
        out.push((ao3::SOURCE_ID, title));
    }
    out
}

/// The operation set exposed to the (external) web layer.
pub struct Aggregator {
    registry: Arc<SourceRegistry>,
    metadata: AniListClient,
}

impl Aggregator {
    pub fn new(registry: Arc<SourceRegistry>, metadata: AniListClient) -> Self {
        Self { registry, metadata }
    }

    /// Wire up the default source set and metadata client from config.
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let registry = Arc::new(SourceRegistry::with_default_sources(config)?);
        let metadata = AniListClient::with_api_url(
            config.create_http_client()?,
            config.sources.anilist_api_url.clone(),
        );
        Ok(Self::new(registry, metadata))
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn list_sources(&self) -> Vec<SourceInfo> {
        self.registry.infos()
    }

    /// Search one source (errors propagate untouched) or, with no source
    /// given, fan out to all of them.
    pub async fn search(
        &self,
        query: &SearchQuery,
        source_id: Option<&str>,
    ) -> SourceResult<Vec<ContentItem>> {
        match source_id {
            Some(id) => self.source(id)?.search(query).await,
            None => Ok(self.fan_out(self.registry.all().to_vec(), query).await),
        }
    }

    /// Concurrent fan-out restricted to sources of one type.
    pub async fn search_by_type(
        &self,
        query: &SearchQuery,
        source_type: SourceType,
    ) -> Vec<ContentItem> {
        self.fan_out(self.registry.by_type(source_type), query).await
    }

    /// All adapters are queried concurrently; a failing adapter contributes
    /// an empty set instead of failing the aggregate. Results concatenate
    /// in registration order, intra-source order as the upstream returned.
    async fn fan_out(
        &self,
        sources: Vec<Arc<dyn ContentSource>>,
        query: &SearchQuery,
    ) -> Vec<ContentItem> {
        let searches = sources.iter().map(|source| async move {
            match source.search(query).await {
                Ok(items) => items,
                Err(err) => {
                    log::warn!("search failed for {}: {}", source.info().id, err);
                    Vec::new()
                }
            }
        });
        join_all(searches).await.into_iter().flatten().collect()
    }

    /// Sequential fallback chain for the novel category: the archive source
    /// is only consulted when the primary source has zero results, so the
    /// common case costs a single upstream call.
    pub async fn search_novels_with_fallback(&self, query: &SearchQuery) -> Vec<ContentItem> {
        for source_id in [fanmtl::SOURCE_ID, ao3::SOURCE_ID] {
            let source = match self.registry.get(source_id) {
                Some(source) => source,
                None => continue,
            };
            match source.search(query).await {
                Ok(items) if !items.is_empty() => return items,
                Ok(_) => {
                    log::info!("{}: no results for '{}', trying next source", source_id, query.query)
                }
                Err(err) => {
                    log::warn!("{}: search failed, trying next source: {}", source_id, err)
                }
            }
        }
        Vec::new()
    }

    /// Metadata-database search, normalized to the unified entity.
    pub async fn search_metadata(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
    ) -> SourceResult<Vec<ContentItem>> {
        let records = self.metadata.search(query, page, per_page).await?;
        Ok(records.iter().map(|r| r.to_content_item()).collect())
    }

    /// Front-page listings: the manga source's popular feed (empty-title
    /// search), or the novel fallback chain with a seed query.
    pub async fn trending(&self, source_type: SourceType) -> Vec<ContentItem> {
        match source_type {
            SourceType::Manga => {
                let source = match self.registry.get(mangadex::SOURCE_ID) {
                    Some(source) => source,
                    None => return Vec::new(),
                };
                match source.search(&SearchQuery::new("").limit(10)).await {
                    Ok(items) => items,
                    Err(err) => {
                        log::warn!("trending manga fetch failed: {}", err);
                        Vec::new()
                    }
                }
            }
            SourceType::Novel => {
                self.search_novels_with_fallback(&SearchQuery::new("system")).await
            }
        }
    }

    pub async fn get_details(&self, source_id: &str, id: &str) -> SourceResult<ContentItem> {
        self.source(source_id)?.get_details(id).await
    }

    pub async fn get_chapters(&self, source_id: &str, id: &str) -> SourceResult<Vec<Chapter>> {
        self.source(source_id)?.list_chapters(id).await
    }

    pub async fn get_chapter_content(
        &self,
        source_id: &str,
        novel_id: &str,
        chapter_id: &str,
    ) -> SourceResult<Chapter> {
        self.source(source_id)?
            .get_chapter_content(novel_id, chapter_id)
            .await
    }

    pub fn classify(&self, id: &str) -> IdNamespace {
        let ids: Vec<&str> = self
            .registry
            .all()
            .iter()
            .map(|s| s.info().id.as_str())
            .collect();
        classify_id(&ids, id)
    }

    /// Resolve an opaque id to a content item by namespace shape.
    pub async fn resolve(&self, id: &str) -> SourceResult<ContentItem> {
        match self.classify(id) {
            IdNamespace::Prefixed { source_id, local_id } => {
                self.get_details(&source_id, &local_id).await
            }
            IdNamespace::Metadata(metadata_id) => self.resolve_metadata(metadata_id).await,
            IdNamespace::MangaUuid => self.get_details(mangadex::SOURCE_ID, id).await,
            IdNamespace::Opaque => self.get_details(fanmtl::SOURCE_ID, id).await,
        }
    }

    /// Title-bridging entry point: metadata id -> title record -> first
    /// chapter-capable source with a hit.
    pub async fn resolve_metadata(&self, metadata_id: i64) -> SourceResult<ContentItem> {
        let record = self.metadata.get_by_id(metadata_id).await?;
        self.bridge_to_source(&record).await
    }

    /// Try each (source, title) candidate in fixed order; the first search
    /// yielding at least one result wins and its first hit is returned for
    /// the subsequent chapter/content fetch. Exhaustion is `NotFound`.
    pub async fn bridge_to_source(&self, record: &MetadataRecord) -> SourceResult<ContentItem> {
        for (source_id, title) in bridge_candidates(&record.titles) {
            let source = match self.registry.get(source_id) {
                Some(source) => source,
                None => continue,
            };
            match source.search(&SearchQuery::new(title.clone())).await {
                Ok(results) => {
                    if let Some(first) = results.into_iter().next() {
                        log::info!(
                            "bridged metadata id {} to {}:{} via title '{}'",
                            record.id,
                            source_id,
                            first.id,
                            title
                        );
                        return Ok(first);
                    }
                }
                Err(err) => {
                    log::warn!("bridge search failed on {} for '{}': {}", source_id, title, err)
                }
            }
        }
        log::info!("no chapter source matched metadata id {}", record.id);
        Err(SourceError::NotFound)
    }

    fn source(&self, id: &str) -> SourceResult<Arc<dyn ContentSource>> {
        self.registry.get(id).ok_or_else(|| {
            log::warn!("unknown source id: {}", id);
            SourceError::NotFound
        })
    }
}
