use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// Timeout for upstream requests in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Enable cookie support
    #[serde(default = "default_true")]
    pub enable_cookies: bool,

    /// Enable gzip/brotli compression
    #[serde(default = "default_true")]
    pub enable_compression: bool,
}

/// Base-URL overrides, mainly for mirrors and local test servers.
#[derive(Debug, Deserialize, Clone)]
pub struct SourcesConfig {
    #[serde(default = "default_fanmtl_base")]
    pub fanmtl_base_url: String,
    #[serde(default = "default_ao3_base")]
    pub ao3_base_url: String,
    #[serde(default = "default_mangadex_api")]
    pub mangadex_api_url: String,
    #[serde(default = "default_mangadex_uploads")]
    pub mangadex_uploads_url: String,
    #[serde(default = "default_anilist_api")]
    pub anilist_api_url: String,
}

fn default_true() -> bool {
    true
}
fn default_timeout() -> u64 {
    15
}
fn default_fanmtl_base() -> String {
    "https://fanmtl.com".to_string()
}
fn default_ao3_base() -> String {
    "https://archiveofourown.org".to_string()
}
fn default_mangadex_api() -> String {
    "https://api.mangadex.org".to_string()
}
fn default_mangadex_uploads() -> String {
    "https://uploads.mangadex.org".to_string()
}
fn default_anilist_api() -> String {
    "https://graphql.anilist.co".to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            enable_cookies: true,
            enable_compression: true,
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            fanmtl_base_url: default_fanmtl_base(),
            ao3_base_url: default_ao3_base(),
            mangadex_api_url: default_mangadex_api(),
            mangadex_uploads_url: default_mangadex_uploads(),
            anilist_api_url: default_anilist_api(),
        }
    }
}

impl Config {
    pub fn load() -> Self {
        let path = Path::new("config.toml");
        if path.exists() {
            if let Ok(content) = fs::read_to_string(path) {
                if let Ok(cfg) = toml::from_str::<Config>(&content) {
                    return cfg;
                }
            }
        }
        Self::default()
    }

    /// Create the shared HTTP client from this configuration
    pub fn create_http_client(&self) -> Result<crate::http_client::HttpClient, reqwest::Error> {
        use crate::http_client::{HttpClient, HttpClientConfig};
        use std::time::Duration;

        let config = HttpClientConfig {
            timeout: Duration::from_secs(self.http.timeout_secs),
            enable_cookies: self.http.enable_cookies,
            enable_compression: self.http.enable_compression,
        };
        HttpClient::with_config(config)
    }
}
