// Fetcher module: thumbnail retrieval for accepted matches.

pub mod og_image;
pub mod traits;

pub use og_image::OgImageFetcher;
pub use traits::ThumbnailFetcher;
