// Wire schemas for the feed service, plus the validation boundary that turns
// loosely shaped JSON into articles the rest of the app can trust.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{ApiError, Result};

/// Article as it arrives over the wire. Everything is optional here on
/// purpose; `into_article` decides what is acceptable.
#[derive(Debug, Clone, Deserialize)]
struct WireArticle {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    source: Option<WireSource>,
    #[serde(default, rename = "publishedAt")]
    published_at: Option<String>,
    #[serde(default, rename = "urlToImage")]
    url_to_image: Option<String>,
    #[serde(default)]
    similarity_score: Option<f64>,
}

/// The service flattens `source` to a name, NewsAPI passthroughs don't.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum WireSource {
    Name(String),
    Object { name: Option<String> },
}

impl WireSource {
    fn into_name(self) -> Option<String> {
        match self {
            WireSource::Name(name) => Some(name),
            WireSource::Object { name } => name,
        }
    }
}

/// A validated article: has a title and a url, everything else normalized
#[derive(Debug, Clone, PartialEq)]
pub struct FeedArticle {
    pub title: String,
    pub description: String,
    pub url: String,
    pub source: String,
    pub published_at: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
    pub similarity_score: Option<f64>,
}

impl WireArticle {
    fn into_article(self) -> Option<FeedArticle> {
        let title = non_blank(self.title)?;
        let url = non_blank(self.url)?;

        let published_at = self.published_at.as_deref().and_then(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
        });

        Some(FeedArticle {
            title,
            description: self.description.unwrap_or_default(),
            url,
            source: self
                .source
                .and_then(WireSource::into_name)
                .unwrap_or_default(),
            published_at,
            image_url: non_blank(self.url_to_image),
            similarity_score: self.similarity_score,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn validate_all(items: Vec<WireArticle>) -> Vec<FeedArticle> {
    let received = items.len();
    let articles: Vec<FeedArticle> = items
        .into_iter()
        .filter_map(WireArticle::into_article)
        .collect();

    if articles.len() < received {
        debug!(
            "Dropped {} malformed articles out of {}",
            received - articles.len(),
            received
        );
    }
    articles
}

#[derive(Debug, Deserialize)]
struct TrendingResponse {
    articles: Option<Vec<WireArticle>>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    page: Option<u32>,
}

/// One page of the trending feed
#[derive(Debug, Clone)]
pub struct TrendingPage {
    pub category: Option<String>,
    pub page: Option<u32>,
    pub articles: Vec<FeedArticle>,
}

impl TrendingPage {
    /// Parse a `/trending` response body. A payload without an `articles`
    /// array is rejected outright.
    pub fn from_body(body: &str) -> Result<Self> {
        let raw: TrendingResponse = serde_json::from_str(body)?;
        let articles = raw
            .articles
            .ok_or_else(|| ApiError::InvalidPayload("missing `articles` array".into()))?;

        Ok(Self {
            category: raw.category,
            page: raw.page,
            articles: validate_all(articles),
        })
    }
}

/// Body of `POST /recommend`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RecommendRequest {
    pub query: String,
    pub top_k: u32,
    pub include_live: bool,
    pub include_mind: bool,
}

#[derive(Debug, Deserialize)]
struct RecommendResponse {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    live_recommendations: Option<Vec<WireArticle>>,
    #[serde(default)]
    mind_recommendations: Option<Vec<serde_json::Value>>,
}

/// Recommendations for a query. Dataset-derived results are only counted,
/// never parsed, since nothing downstream displays them.
#[derive(Debug, Clone)]
pub struct Recommendations {
    pub query: Option<String>,
    pub live: Vec<FeedArticle>,
    pub mind_count: usize,
}

impl Recommendations {
    pub fn from_body(body: &str) -> Result<Self> {
        let raw: RecommendResponse = serde_json::from_str(body)?;

        Ok(Self {
            query: raw.query,
            live: validate_all(raw.live_recommendations.unwrap_or_default()),
            mind_count: raw.mind_recommendations.map(|m| m.len()).unwrap_or(0),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImageSearchResponse {
    #[serde(default)]
    pub results: Vec<ImageResult>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImageResult {
    pub urls: ImageUrls,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImageUrls {
    pub regular: String,
}
