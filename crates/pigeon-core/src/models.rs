use chrono::{DateTime, Utc};
use pigeon_api::FeedArticle;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Trending categories understood by the feed service
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    General,
    Business,
    Entertainment,
    Health,
    Science,
    Sports,
    Technology,
    Politics,
    Geography,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::General,
        Category::Business,
        Category::Entertainment,
        Category::Health,
        Category::Science,
        Category::Sports,
        Category::Technology,
        Category::Politics,
        Category::Geography,
    ];

    /// Wire name, as sent in `?category=`
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::General => "general",
            Category::Business => "business",
            Category::Entertainment => "entertainment",
            Category::Health => "health",
            Category::Science => "science",
            Category::Sports => "sports",
            Category::Technology => "technology",
            Category::Politics => "politics",
            Category::Geography => "geography",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Category::General => "General",
            Category::Business => "Business",
            Category::Entertainment => "Entertainment",
            Category::Health => "Health",
            Category::Science => "Science",
            Category::Sports => "Sports",
            Category::Technology => "Technology",
            Category::Politics => "Politics",
            Category::Geography => "Geography",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = Error;

    /// Case-insensitive; surrounding whitespace is ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded = s.trim().to_lowercase();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == folded)
            .ok_or_else(|| Error::Validation(format!("Unknown category: {}", s.trim())))
    }
}

/// Which page of which category the trending feed shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeedQuery {
    pub category: Category,
    pub page: u32,
}

impl Default for FeedQuery {
    fn default() -> Self {
        Self {
            category: Category::General,
            page: 1,
        }
    }
}

/// A news article. Never modified after it's received.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    pub title: String,
    pub description: String,
    pub url: String,
    pub source: String,
    pub published_at: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
    pub similarity_score: Option<f64>,
}

impl From<FeedArticle> for Article {
    fn from(a: FeedArticle) -> Self {
        Self {
            title: a.title,
            description: a.description,
            url: a.url,
            source: a.source,
            published_at: a.published_at,
            image_url: a.image_url,
            similarity_score: a.similarity_score,
        }
    }
}

/// A successful trending fetch, echoing the query it answers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedResult {
    pub articles: Vec<Article>,
    pub query: FeedQuery,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub query_text: String,
    pub live_recommendations: Vec<Article>,
    pub representative_image_url: String,
}

/// One past search. Field names on disk match what earlier versions of the
/// client wrote, so existing histories keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    #[serde(rename = "query")]
    pub query_text: String,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "resultsCount")]
    pub result_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub authenticated: bool,
    pub display_name: String,
    pub email: String,
}

impl Session {
    /// Name to greet the user with: display name, else email, else "User"
    pub fn greeting_name(&self) -> &str {
        if !self.display_name.trim().is_empty() {
            &self.display_name
        } else if !self.email.trim().is_empty() {
            &self.email
        } else {
            "User"
        }
    }
}

/// Observable state of one controller's fetch
#[derive(Debug, Clone, PartialEq)]
pub enum RequestState<T> {
    Idle,
    Loading,
    Success(T),
    Failed(String),
}

impl<T> Default for RequestState<T> {
    fn default() -> Self {
        RequestState::Idle
    }
}

impl<T> RequestState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, RequestState::Loading)
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            RequestState::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            RequestState::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}
