//! Page fetching against the search API

use anyhow::{Context, Result};
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::config::SearchConfig;
use super::error::FetchError;
use super::query::{build_search_url, QueryKind};

/// One page of search results
///
/// Only the fields the collector needs are decoded; hits are kept as raw
/// JSON so their metadata is persisted exactly as the API sent it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageResult {
    #[serde(default)]
    pub hits: Option<Vec<Value>>,
    #[serde(default)]
    pub page_count: Option<u64>,
}

impl PageResult {
    pub fn hits(&self) -> &[Value] {
        self.hits.as_deref().unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.hits().is_empty()
    }
}

/// Decode a response body into a page
pub fn decode_page(body: &str) -> std::result::Result<PageResult, serde_json::Error> {
    serde_json::from_str(body)
}

/// Anything that can serve result pages for a pattern
pub trait PageSource {
    fn fetch_page(&mut self, pattern: &str, page: u32) -> std::result::Result<PageResult, FetchError>;
}

/// Blocking HTTP source for the ipfs-search API
pub struct HttpPageSource {
    client: reqwest::blocking::Client,
    api_base: String,
}

impl HttpPageSource {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_base: config.api_base.clone(),
        })
    }

    fn request(&self, url: &str) -> std::result::Result<PageResult, FetchError> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;

        decode_page(&body).map_err(|e| FetchError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

impl PageSource for HttpPageSource {
    fn fetch_page(&mut self, pattern: &str, page: u32) -> std::result::Result<PageResult, FetchError> {
        let url = build_search_url(&self.api_base, pattern, page);
        debug!(
            pattern,
            page,
            kind = QueryKind::for_pattern(pattern).label(),
            "fetching page"
        );

        let result = self.request(&url);
        if let Err(e) = &result {
            warn!(pattern, page, error = %e, "page fetch failed");
        }
        result
    }
}
