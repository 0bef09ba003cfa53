//! Source registry: the single place adapters are wired in.

use crate::config::Config;
use crate::models::{SourceInfo, SourceType};
use crate::sources::{ao3::Ao3Source, fanmtl::FanMtlSource, mangadex::MangaDexSource};
use crate::sources::ContentSource;
use std::sync::Arc;

/// Holds the registered adapters in registration order (fan-out results are
/// concatenated in this order). Built once at process start and treated as
/// read-only afterwards; pass it by reference or behind an `Arc`.
#[derive(Default)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn ContentSource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self { sources: Vec::new() }
    }

    /// Construct the registry with the default source set. Adding a source
    /// to the system means adding one line here.
    pub fn with_default_sources(config: &Config) -> Result<Self, reqwest::Error> {
        let http = config.create_http_client()?;
        let mut registry = Self::new();
        registry.register(Arc::new(FanMtlSource::with_base_url(
            http.clone(),
            config.sources.fanmtl_base_url.clone(),
        )));
        registry.register(Arc::new(MangaDexSource::with_base_urls(
            http.clone(),
            config.sources.mangadex_api_url.clone(),
            config.sources.mangadex_uploads_url.clone(),
        )));
        registry.register(Arc::new(Ao3Source::with_base_url(
            http,
            config.sources.ao3_base_url.clone(),
        )));
        Ok(registry)
    }

    pub fn register(&mut self, source: Arc<dyn ContentSource>) {
        let info = source.info();
        log::info!("registered source: {} ({})", info.name, info.id);
        self.sources.push(source);
    }

    /// Lookup by id. A miss is `None`; callers must check.
    pub fn get(&self, id: &str) -> Option<Arc<dyn ContentSource>> {
        self.sources.iter().find(|s| s.info().id == id).cloned()
    }

    pub fn all(&self) -> &[Arc<dyn ContentSource>] {
        &self.sources
    }

    pub fn by_type(&self, source_type: SourceType) -> Vec<Arc<dyn ContentSource>> {
        self.sources
            .iter()
            .filter(|s| s.info().source_type == source_type)
            .cloned()
            .collect()
    }

    pub fn infos(&self) -> Vec<SourceInfo> {
        self.sources.iter().map(|s| s.info().clone()).collect()
    }
}
