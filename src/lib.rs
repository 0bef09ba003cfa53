//! Source adapter and aggregation layer for serialized fiction.
//!
//! Normalizes heterogeneous upstreams (a WordPress/Madara-scraped novel
//! site, the AO3 archive, the MangaDex REST API, and the AniList GraphQL
//! metadata database) behind one capability contract, and routes between
//! them: concurrent fan-out search, sequential fallback chains,
//! identifier-namespace dispatch, and title-bridging from metadata ids to
//! chapter-capable sources.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod extract;
pub mod http_client;
pub mod metadata;
pub mod models;
pub mod normalize;
pub mod registry;
pub mod sources;
pub mod translation;

pub use aggregator::{Aggregator, IdNamespace};
pub use config::Config;
pub use error::{SourceError, SourceResult};
pub use models::{Chapter, ContentItem, ContentStatus, SourceInfo, SourceType};
pub use registry::SourceRegistry;
pub use sources::{ContentSource, SearchQuery};
