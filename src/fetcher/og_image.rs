use crate::fetcher::ThumbnailFetcher;
use crate::model::FetchError;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, warn};

/// Reads the `og:image` meta tag of an item page.
pub struct OgImageFetcher {
    client: Client,
}

impl OgImageFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) BoothCatalog/0.1")
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::HttpError(e.to_string()))?;

        Ok(Self { client })
    }
}

/// Extracts the `og:image` content from an HTML page.
pub fn og_image(html: &str) -> Option<String> {
    let selector = Selector::parse(r#"meta[property="og:image"]"#).ok()?;
    let document = Html::parse_document(html);
    document
        .select(&selector)
        .filter_map(|meta| meta.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty())
        .map(str::to_string)
}

#[async_trait::async_trait]
impl ThumbnailFetcher for OgImageFetcher {
    async fn fetch_thumbnail(&self, item_url: &str) -> Result<String, FetchError> {
        debug!("Fetching thumbnail for {}", item_url);
        let response = self
            .client
            .get(item_url)
            .send()
            .await
            .map_err(|e| FetchError::HttpError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Item page {} responded [{}]", item_url, status);
            return Err(FetchError::InvalidResponse(status.as_u16()));
        }

        let html = response
            .text()
            .await
            .map_err(|e| FetchError::HttpError(e.to_string()))?;

        og_image(&html).ok_or_else(|| FetchError::MissingThumbnail(item_url.to_string()))
    }
}
