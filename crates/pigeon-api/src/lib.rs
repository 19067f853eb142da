// HTTP clients for the feed service and the image-search service
pub mod error;
pub mod feed;
pub mod images;
pub mod schema;

// Re-export common types
pub use error::{ApiError, Result};
pub use feed::{FeedClient, DEFAULT_BASE_URL};
pub use images::{ImageSearchClient, DEFAULT_IMAGE_ENDPOINT};
pub use schema::{FeedArticle, RecommendRequest, Recommendations, TrendingPage};
