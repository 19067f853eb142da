// Seams between the controllers and the remote services.
// The HTTP implementations bridge pigeon-api clients into these traits.
use async_trait::async_trait;
use pigeon_api::{FeedClient, ImageSearchClient, RecommendRequest};

use crate::models::{Article, Category};
use crate::{Error, Result};

/// What `recommend` hands back: live results in ranked order, and how many
/// dataset-derived results the service also sent (never displayed).
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendResponse {
    pub live_recommendations: Vec<Article>,
    pub mind_recommendation_count: usize,
}

/// Transport to the trending/recommendation service.
///
/// Implementations do no retries and no caching; any failure comes back as
/// `Error::Transport`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedGateway: Send + Sync {
    async fn trending(&self, category: Category, page: u32) -> Result<Vec<Article>>;

    async fn recommend(
        &self,
        query_text: &str,
        top_k: u32,
        include_live: bool,
        include_mind: bool,
    ) -> Result<RecommendResponse>;
}

/// Best-effort picture lookup for a search query
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageSearch: Send + Sync {
    async fn first_image(&self, query_text: &str) -> Result<Option<String>>;
}

pub struct HttpFeedGateway {
    client: FeedClient,
}

impl HttpFeedGateway {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: FeedClient::new(base_url)?,
        })
    }
}

#[async_trait]
impl FeedGateway for HttpFeedGateway {
    async fn trending(&self, category: Category, page: u32) -> Result<Vec<Article>> {
        let page = self
            .client
            .trending(category.as_str(), page)
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        Ok(page.articles.into_iter().map(Article::from).collect())
    }

    async fn recommend(
        &self,
        query_text: &str,
        top_k: u32,
        include_live: bool,
        include_mind: bool,
    ) -> Result<RecommendResponse> {
        let request = RecommendRequest {
            query: query_text.to_string(),
            top_k,
            include_live,
            include_mind,
        };

        let recs = self
            .client
            .recommend(&request)
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        Ok(RecommendResponse {
            live_recommendations: recs.live.into_iter().map(Article::from).collect(),
            mind_recommendation_count: recs.mind_count,
        })
    }
}

pub struct HttpImageSearch {
    client: ImageSearchClient,
}

impl HttpImageSearch {
    pub fn new(endpoint: impl Into<String>, access_key: Option<String>, per_page: u32) -> Result<Self> {
        Ok(Self {
            client: ImageSearchClient::new(endpoint, access_key)?.with_per_page(per_page),
        })
    }
}

#[async_trait]
impl ImageSearch for HttpImageSearch {
    async fn first_image(&self, query_text: &str) -> Result<Option<String>> {
        self.client
            .search(query_text)
            .await
            .map_err(|e| Error::Transport(e.to_string()))
    }
}
