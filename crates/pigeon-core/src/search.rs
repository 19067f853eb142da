// Query-driven recommendations, with a best-effort picture on top
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::gateway::{FeedGateway, ImageSearch};
use crate::history::HistoryLedger;
use crate::models::{RequestState, SearchResult};
use crate::{Error, Result};

const SEARCH_FAILED: &str = "Failed to fetch recommendations. Is the backend running?";

pub const DEFAULT_TOP_K: u32 = 5;
pub const DEFAULT_FALLBACK_IMAGE_URL: &str =
    "https://images.unsplash.com/photo-1504711434969-e33886168f5c?w=1200";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSettings {
    pub top_k: u32,
    pub fallback_image_url: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            fallback_image_url: DEFAULT_FALLBACK_IMAGE_URL.to_string(),
        }
    }
}

impl From<&Config> for SearchSettings {
    fn from(config: &Config) -> Self {
        Self {
            top_k: config.api.top_k.max(1),
            fallback_image_url: config.images.fallback_url.clone(),
        }
    }
}

struct Pending {
    query_text: String,
    generation: u64,
}

/// Owns query submission and the search result state.
///
/// Only live recommendations are shown; dataset-derived ones are requested
/// off and ignored if the service sends them anyway.
pub struct SearchController {
    gateway: Arc<dyn FeedGateway>,
    images: Arc<dyn ImageSearch>,
    history: Arc<HistoryLedger>,
    settings: SearchSettings,
    pending: Mutex<Pending>,
    state: watch::Sender<RequestState<SearchResult>>,
}

impl SearchController {
    pub fn new(
        gateway: Arc<dyn FeedGateway>,
        images: Arc<dyn ImageSearch>,
        history: Arc<HistoryLedger>,
        settings: SearchSettings,
    ) -> Self {
        let (state, _) = watch::channel(RequestState::Idle);
        Self {
            gateway,
            images,
            history,
            settings,
            pending: Mutex::new(Pending {
                query_text: String::new(),
                generation: 0,
            }),
            state,
        }
    }

    pub fn state(&self) -> RequestState<SearchResult> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState<SearchResult>> {
        self.state.subscribe()
    }

    /// Text in the search box; not submitted until `submit_pending`
    pub fn pending_query(&self) -> String {
        self.pending.lock().query_text.clone()
    }

    pub fn set_pending_query(&self, text: &str) {
        self.pending.lock().query_text = text.to_string();
    }

    pub async fn submit_pending(&self) -> Result<RequestState<SearchResult>> {
        let text = self.pending_query();
        self.submit(&text).await
    }

    /// Run a search.
    ///
    /// Blank input is rejected before anything else happens: no request, no
    /// `Loading`. Otherwise the previous result is cleared, the live
    /// recommendations are published as soon as they arrive (with the
    /// fallback image), the search goes into history, and the image is
    /// swapped in if the lookup succeeds.
    pub async fn submit(&self, query_text: &str) -> Result<RequestState<SearchResult>> {
        let query_text = query_text.trim();
        if query_text.is_empty() {
            return Err(Error::Validation("Please enter something to search for".into()));
        }

        let generation = {
            let mut pending = self.pending.lock();
            pending.generation += 1;
            pending.query_text = query_text.to_string();
            self.state.send_replace(RequestState::Loading);
            pending.generation
        };

        debug!("Searching {:?} (generation {})", query_text, generation);
        let response = self
            .gateway
            .recommend(query_text, self.settings.top_k, true, false)
            .await;

        let result = {
            let pending = self.pending.lock();
            if pending.generation != generation {
                debug!("Dropping stale search response for {:?}", query_text);
                return Ok(self.state.borrow().clone());
            }

            match response {
                Ok(response) => {
                    if response.mind_recommendation_count > 0 {
                        debug!(
                            "Ignoring {} dataset recommendations",
                            response.mind_recommendation_count
                        );
                    }
                    let result = SearchResult {
                        query_text: query_text.to_string(),
                        live_recommendations: response.live_recommendations,
                        representative_image_url: self.settings.fallback_image_url.clone(),
                    };
                    self.state
                        .send_replace(RequestState::Success(result.clone()));
                    result
                }
                Err(e) => {
                    warn!("Search for {:?} failed: {}", query_text, e);
                    let failed = RequestState::Failed(SEARCH_FAILED.to_string());
                    self.state.send_replace(failed.clone());
                    return Ok(failed);
                }
            }
        };

        info!(
            "Search {:?}: {} live recommendations",
            query_text,
            result.live_recommendations.len()
        );
        self.history
            .record(query_text, result.live_recommendations.len());

        let image_url = self.enrichment_image(query_text).await;

        let pending = self.pending.lock();
        if pending.generation != generation {
            return Ok(self.state.borrow().clone());
        }
        let enriched = RequestState::Success(SearchResult {
            representative_image_url: image_url,
            ..result
        });
        self.state.send_replace(enriched.clone());
        Ok(enriched)
    }

    /// Back to trending: forget the query and the result. Any search still
    /// in flight is dropped when it lands.
    pub fn reset(&self) {
        let mut pending = self.pending.lock();
        pending.generation += 1;
        pending.query_text.clear();
        self.state.send_replace(RequestState::Idle);
    }

    /// Never fails; anything short of a usable url means the fallback
    async fn enrichment_image(&self, query_text: &str) -> String {
        match self.images.first_image(query_text).await {
            Ok(Some(url)) => url,
            Ok(None) => {
                debug!("No image found for {:?}", query_text);
                self.settings.fallback_image_url.clone()
            }
            Err(e) => {
                debug!("Image lookup for {:?} failed, using fallback: {}", query_text, e);
                self.settings.fallback_image_url.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{MockFeedGateway, MockImageSearch, RecommendResponse};
    use crate::models::Article;
    use crate::profile_store::ProfileStore;
    use pigeon_store::MemoryStore;

    fn article(n: usize) -> Article {
        Article {
            title: format!("Result {}", n),
            description: "desc".into(),
            url: format!("https://news.example/r/{}", n),
            source: "Herald".into(),
            published_at: None,
            image_url: None,
            similarity_score: Some(0.9 - n as f64 * 0.1),
        }
    }

    fn controller(
        gateway: MockFeedGateway,
        images: MockImageSearch,
    ) -> (Arc<HistoryLedger>, SearchController) {
        let store = ProfileStore::new(Arc::new(MemoryStore::new()));
        let history = Arc::new(HistoryLedger::load(store));
        let controller = SearchController::new(
            Arc::new(gateway),
            Arc::new(images),
            history.clone(),
            SearchSettings::default(),
        );
        (history, controller)
    }

    #[tokio::test]
    async fn test_success_records_history_and_uses_image() {
        let mut gateway = MockFeedGateway::new();
        gateway
            .expect_recommend()
            .withf(|q, top_k, live, mind| q == "election results" && *top_k == 5 && *live && !*mind)
            .times(1)
            .returning(|_, _, _, _| {
                Ok(RecommendResponse {
                    live_recommendations: (0..3).map(article).collect(),
                    mind_recommendation_count: 4,
                })
            });
        let mut images = MockImageSearch::new();
        images
            .expect_first_image()
            .withf(|q| q == "election results")
            .returning(|_| Ok(Some("https://img.example/ballot.jpg".into())));

        let (history, controller) = controller(gateway, images);
        let state = controller.submit("  election results ").await.unwrap();

        let result = state.success().unwrap();
        assert_eq!(result.live_recommendations.len(), 3);
        assert_eq!(result.representative_image_url, "https://img.example/ballot.jpg");

        let head = &history.entries()[0];
        assert_eq!(head.query_text, "election results");
        assert_eq!(head.result_count, 3);
    }

    #[tokio::test]
    async fn test_image_failure_keeps_success() {
        let mut gateway = MockFeedGateway::new();
        gateway.expect_recommend().returning(|_, _, _, _| {
            Ok(RecommendResponse {
                live_recommendations: vec![article(0)],
                mind_recommendation_count: 0,
            })
        });
        let mut images = MockImageSearch::new();
        images
            .expect_first_image()
            .returning(|_| Err(Error::Transport("401 Unauthorized".into())));

        let (_, controller) = controller(gateway, images);
        let state = controller.submit("harbor").await.unwrap();

        assert_eq!(
            state.success().unwrap().representative_image_url,
            DEFAULT_FALLBACK_IMAGE_URL
        );
        assert_eq!(controller.state(), state);
    }

    #[tokio::test]
    async fn test_empty_image_results_use_fallback() {
        let mut gateway = MockFeedGateway::new();
        gateway.expect_recommend().returning(|_, _, _, _| {
            Ok(RecommendResponse {
                live_recommendations: vec![],
                mind_recommendation_count: 0,
            })
        });
        let mut images = MockImageSearch::new();
        images.expect_first_image().returning(|_| Ok(None));

        let (history, controller) = controller(gateway, images);
        let state = controller.submit("nothing matches").await.unwrap();

        assert_eq!(
            state.success().unwrap().representative_image_url,
            DEFAULT_FALLBACK_IMAGE_URL
        );
        // Zero results still count as a completed search
        assert_eq!(history.entries()[0].result_count, 0);
    }

    #[tokio::test]
    async fn test_blank_query_is_rejected_locally() {
        let mut gateway = MockFeedGateway::new();
        gateway.expect_recommend().never();
        let mut images = MockImageSearch::new();
        images.expect_first_image().never();

        let (history, controller) = controller(gateway, images);
        let states = controller.subscribe();

        let result = controller.submit("   ").await;
        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(controller.state(), RequestState::Idle);
        assert!(!states.has_changed().unwrap());
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_primary_failure_is_failed_without_history() {
        let mut gateway = MockFeedGateway::new();
        gateway
            .expect_recommend()
            .returning(|_, _, _, _| Err(Error::Transport("connection refused".into())));
        let mut images = MockImageSearch::new();
        images.expect_first_image().never();

        let (history, controller) = controller(gateway, images);
        let state = controller.submit("markets").await.unwrap();

        assert_eq!(state.error(), Some(SEARCH_FAILED));
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_reset_clears_query_and_result() {
        let mut gateway = MockFeedGateway::new();
        gateway.expect_recommend().returning(|_, _, _, _| {
            Ok(RecommendResponse {
                live_recommendations: vec![article(0)],
                mind_recommendation_count: 0,
            })
        });
        let mut images = MockImageSearch::new();
        images.expect_first_image().returning(|_| Ok(None));

        let (_, controller) = controller(gateway, images);
        controller.submit("space").await.unwrap();
        assert_eq!(controller.pending_query(), "space");

        controller.reset();
        assert_eq!(controller.pending_query(), "");
        assert_eq!(controller.state(), RequestState::Idle);
    }
}
