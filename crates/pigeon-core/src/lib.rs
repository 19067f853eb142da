// Feed orchestration and local personalization state
pub mod config;
pub mod dashboard;
pub mod error;
pub mod gateway;
pub mod history;
pub mod interests;
pub mod models;
pub mod profile_store;
pub mod search;
pub mod session;
pub mod trending;

pub use config::Config;
pub use dashboard::{ActiveView, Dashboard};
pub use error::Error;
pub use gateway::{FeedGateway, HttpFeedGateway, HttpImageSearch, ImageSearch, RecommendResponse};
pub use history::{HistoryLedger, HISTORY_CAPACITY};
pub use interests::{InterestProfileManager, ProfileState, AVAILABLE_INTERESTS};
pub use models::{
    Article, Category, FeedQuery, FeedResult, HistoryEntry, RequestState, SearchResult, Session,
};
pub use profile_store::ProfileStore;
pub use search::{SearchController, SearchSettings};
pub use session::SessionManager;
pub use trending::TrendingController;

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;
