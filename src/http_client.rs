use crate::error::{SourceError, SourceResult};
use rand::Rng;
use reqwest::header::HeaderMap;
use reqwest::{Client, ClientBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// User agents to rotate through to avoid bot detection
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:124.0) Gecko/20100101 Firefox/124.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
];

#[derive(Clone)]
pub struct HttpClientConfig {
    /// Single bounded deadline per outbound request. There is no retry:
    /// a failed call surfaces immediately as an Upstream error.
    pub timeout: Duration,
    pub enable_cookies: bool,
    pub enable_compression: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            enable_cookies: true,
            enable_compression: true,
        }
    }
}

/// Thin wrapper over `reqwest::Client` shared by every adapter: browser-like
/// default headers, rotating User-Agent, bounded timeout, and uniform
/// mapping of HTTP 404 to `NotFound` / everything else to `Upstream`.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_config(HttpClientConfig::default())
    }

    pub fn with_config(config: HttpClientConfig) -> Result<Self, reqwest::Error> {
        let mut builder = ClientBuilder::new()
            .timeout(config.timeout)
            .user_agent(Self::random_user_agent())
            .cookie_store(config.enable_cookies)
            .gzip(config.enable_compression)
            .brotli(config.enable_compression)
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .pool_idle_timeout(Some(Duration::from_secs(90)));

        // Default headers that mimic a real browser; scraped sites reject
        // bare clients.
        let mut headers = HeaderMap::new();
        headers.insert("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8".parse().unwrap());
        headers.insert("Accept-Language", "en-US,en;q=0.9".parse().unwrap());
        headers.insert("Referer", "https://google.com".parse().unwrap());
        headers.insert("Cache-Control", "no-cache".parse().unwrap());
        headers.insert("Pragma", "no-cache".parse().unwrap());
        builder = builder.default_headers(headers);

        let client = builder.build()?;
        Ok(Self { client })
    }

    /// Get a random user agent from the pool
    fn random_user_agent() -> &'static str {
        let mut rng = rand::thread_rng();
        let index = rng.gen_range(0..USER_AGENTS.len());
        USER_AGENTS[index]
    }

    async fn read_text(response: Response) -> SourceResult<String> {
        if response.status() == StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound);
        }
        let response = response.error_for_status()?;
        Ok(response.text().await?)
    }

    /// Fetch a URL and return the response body.
    pub async fn get_text(&self, url: &str) -> SourceResult<String> {
        self.get_text_with_headers(url, HeaderMap::new()).await
    }

    /// Fetch a URL with per-source extra headers (referer, cookie flags).
    pub async fn get_text_with_headers(
        &self,
        url: &str,
        extra_headers: HeaderMap,
    ) -> SourceResult<String> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", Self::random_user_agent())
            .headers(extra_headers)
            .send()
            .await?;
        Self::read_text(response).await
    }

    /// Fetch a URL with query parameters and deserialize the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> SourceResult<T> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", Self::random_user_agent())
            .query(query)
            .send()
            .await?;
        let text = Self::read_text(response).await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Form-encoded POST, used by the admin-ajax chapter discovery fallback.
    pub async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
        extra_headers: HeaderMap,
    ) -> SourceResult<String> {
        let response = self
            .client
            .post(url)
            .header("User-Agent", Self::random_user_agent())
            .header("X-Requested-With", "XMLHttpRequest")
            .headers(extra_headers)
            .form(form)
            .send()
            .await?;
        Self::read_text(response).await
    }

    /// JSON POST, used by the GraphQL metadata client.
    pub async fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> SourceResult<T> {
        let response = self
            .client
            .post(url)
            .header("User-Agent", Self::random_user_agent())
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await?;
        let text = Self::read_text(response).await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Get the underlying reqwest client for direct access
    pub fn client(&self) -> &Client {
        &self.client
    }
}
