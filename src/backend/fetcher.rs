//! Custom filter list download and header parsing
//!
//! Fetches the raw list (http(s) or file URL) and reads the `! Key: value`
//! header block with regex patterns.

use crate::error::FetchError;
use crate::models::{parse_date_time, CustomFilterInfo};
use futures::future::{BoxFuture, FutureExt};
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;

static HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^!\s*(Title|Description|Version|Homepage|TimeUpdated|Last modified)\s*:\s*(.+?)\s*$")
        .expect("header regex is valid")
});

/// Abstraction over fetching list content, swapped out in tests.
pub trait FilterFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> BoxFuture<'static, Result<String, FetchError>>;
}

/// reqwest-backed fetcher with a request timeout.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> BoxFuture<'static, Result<String, FetchError>> {
        let url = url.trim().to_string();
        let client = self.client.clone();
        async move {
            if let Some(path) = url.strip_prefix("file://") {
                return Ok(tokio::fs::read_to_string(path).await?);
            }
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(FetchError::UnsupportedUrl(url));
            }

            log::debug!("[FETCH] Downloading filter list: {}", url);
            let response = client
                .get(&url)
                .send()
                .await
                .map_err(|e| FetchError::Http(e.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status(status.as_u16()));
            }
            let content = response
                .text()
                .await
                .map_err(|e| FetchError::Http(e.to_string()))?;
            log::debug!("[FETCH] Received {} bytes from {}", content.len(), url);
            Ok(content)
        }
        .boxed()
    }
}

/// Count rule lines: non-empty and not a `!` or `[Adblock` comment.
pub fn count_rules(content: &str) -> u64 {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('!') && !l.starts_with('['))
        .count() as u64
}

/// Build list metadata from the header block; the URL stands in for a
/// missing title.
pub fn parse_filter_header(url: &str, content: &str) -> Result<CustomFilterInfo, FetchError> {
    let rules_count = count_rules(content);
    if rules_count == 0 {
        return Err(FetchError::EmptyList);
    }

    let mut info = CustomFilterInfo {
        url: url.to_string(),
        rules_count,
        ..Default::default()
    };

    for caps in HEADER_RE.captures_iter(content) {
        let value = caps[2].to_string();
        match &caps[1] {
            "Title" => info.name = value,
            "Description" => info.description = value,
            "Version" => info.version = value,
            "Homepage" => info.homepage = value,
            _ => info.time_updated = parse_date_time(&value).or(info.time_updated),
        }
    }

    if info.name.is_empty() {
        info.name = url.to_string();
    }
    Ok(info)
}
