use crate::model::FetchError;

/// Resolves the thumbnail image URL of a marketplace item page.
#[async_trait::async_trait]
pub trait ThumbnailFetcher: Send + Sync {
    async fn fetch_thumbnail(&self, item_url: &str) -> Result<String, FetchError>;
}
