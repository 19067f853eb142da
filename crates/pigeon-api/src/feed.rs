use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use tracing::debug;

use crate::error::read_body;
use crate::schema::{RecommendRequest, Recommendations, TrendingPage};
use crate::Result;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Client for the recommendation/trending service.
///
/// Pure transport: no retries, no caching. Every trending request carries a
/// fresh `_` parameter so intermediate caches never serve a stale page.
pub struct FeedClient {
    client: reqwest::Client,
    base_url: String,
    last_cache_buster: AtomicU64,
}

impl FeedClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("Pigeon/0.1.0"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            last_cache_buster: AtomicU64::new(0),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /trending?category=..&page=..&_=..`
    pub async fn trending(&self, category: &str, page: u32) -> Result<TrendingPage> {
        let request = self.trending_request(category, page)?;
        debug!("GET {}", request.url());

        let response = self.client.execute(request).await?;

        let body = read_body(response).await?;
        TrendingPage::from_body(&body)
    }

    fn trending_request(&self, category: &str, page: u32) -> Result<reqwest::Request> {
        let url = format!("{}/trending", self.base_url);
        let buster = self.next_cache_buster();

        Ok(self
            .client
            .get(&url)
            .query(&[
                ("category", category.to_string()),
                ("page", page.to_string()),
                ("_", buster.to_string()),
            ])
            .build()?)
    }

    /// `POST /recommend`
    pub async fn recommend(&self, request: &RecommendRequest) -> Result<Recommendations> {
        let url = format!("{}/recommend", self.base_url);
        debug!("POST {} query={:?} top_k={}", url, request.query, request.top_k);

        let response = self.client.post(&url).json(request).send().await?;

        let body = read_body(response).await?;
        Recommendations::from_body(&body)
    }

    /// Wall-clock millis, bumped past the previous value when the clock
    /// hasn't moved (or moved backwards) so each value is strictly greater.
    fn next_cache_buster(&self) -> u64 {
        let now = Utc::now().timestamp_millis().max(0) as u64;
        let mut previous = self.last_cache_buster.load(Ordering::Relaxed);
        loop {
            let next = now.max(previous + 1);
            match self.last_cache_buster.compare_exchange_weak(
                previous,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return next,
                Err(actual) => previous = actual,
            }
        }
    }
}
