// Trending feed: category + page selection and the fetch state machine
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::gateway::FeedGateway;
use crate::models::{Category, FeedQuery, FeedResult, RequestState};
use crate::Result;

const TRENDING_FAILED: &str = "Unable to load trending news right now.";

struct Selection {
    query: FeedQuery,
    /// Bumped on every fetch; a response is only applied if its generation
    /// is still the latest.
    generation: u64,
}

/// Owns the trending (category, page) selection and its fetch state.
///
/// Methods take `&self` so fetches can overlap; a fetch that was overtaken
/// by a newer one has its response dropped.
pub struct TrendingController {
    gateway: Arc<dyn FeedGateway>,
    selection: Mutex<Selection>,
    state: watch::Sender<RequestState<FeedResult>>,
}

impl TrendingController {
    pub fn new(gateway: Arc<dyn FeedGateway>) -> Self {
        let (state, _) = watch::channel(RequestState::Idle);
        Self {
            gateway,
            selection: Mutex::new(Selection {
                query: FeedQuery::default(),
                generation: 0,
            }),
            state,
        }
    }

    pub fn query(&self) -> FeedQuery {
        self.selection.lock().query
    }

    pub fn state(&self) -> RequestState<FeedResult> {
        self.state.borrow().clone()
    }

    /// Receive every state transition
    pub fn subscribe(&self) -> watch::Receiver<RequestState<FeedResult>> {
        self.state.subscribe()
    }

    /// "Previous" is disabled on page 1 and while loading
    pub fn can_go_previous(&self) -> bool {
        !self.state.borrow().is_loading() && self.query().page > 1
    }

    /// There is no known last page, so "Next" only waits for loading
    pub fn can_go_next(&self) -> bool {
        !self.state.borrow().is_loading()
    }

    /// Switch category (page goes back to 1 when it changes) and refetch
    pub async fn set_category(&self, category: Category) -> RequestState<FeedResult> {
        {
            let mut selection = self.selection.lock();
            if selection.query.category != category {
                debug!("Category {} -> {}, page reset", selection.query.category, category);
                selection.query = FeedQuery { category, page: 1 };
            }
        }
        self.fetch().await
    }

    /// Like `set_category`, for names coming straight from the user
    pub async fn set_category_name(&self, name: &str) -> Result<RequestState<FeedResult>> {
        let category: Category = name.parse()?;
        Ok(self.set_category(category).await)
    }

    /// Jump straight to `page` of `category` with a single fetch. The page
    /// always applies to the new category, so nothing stale is requested.
    pub async fn select(&self, category: Category, page: i64) -> RequestState<FeedResult> {
        let page = page.clamp(1, u32::MAX as i64) as u32;
        {
            let mut selection = self.selection.lock();
            if selection.query.category != category {
                debug!("Category {} -> {}", selection.query.category, category);
            }
            selection.query = FeedQuery { category, page };
        }
        self.fetch().await
    }

    /// Pages below 1 are clamped to 1
    pub async fn set_page(&self, page: i64) -> RequestState<FeedResult> {
        let page = page.clamp(1, u32::MAX as i64) as u32;
        self.selection.lock().query.page = page;
        self.fetch().await
    }

    pub async fn next_page(&self) -> RequestState<FeedResult> {
        let page = self.query().page as i64 + 1;
        self.set_page(page).await
    }

    pub async fn previous_page(&self) -> RequestState<FeedResult> {
        let page = self.query().page as i64 - 1;
        self.set_page(page).await
    }

    /// Refetch the current selection. The transport attaches a fresh
    /// cache-buster to every request, so this always reaches the service.
    pub async fn refresh(&self) -> RequestState<FeedResult> {
        self.fetch().await
    }

    async fn fetch(&self) -> RequestState<FeedResult> {
        let (generation, query) = {
            let mut selection = self.selection.lock();
            selection.generation += 1;
            // Loading replaces whatever was shown before
            self.state.send_replace(RequestState::Loading);
            (selection.generation, selection.query)
        };

        debug!(
            "Fetching trending {} page {} (generation {})",
            query.category, query.page, generation
        );
        let result = self.gateway.trending(query.category, query.page).await;

        let selection = self.selection.lock();
        if selection.generation != generation {
            debug!(
                "Dropping stale trending response (generation {}, latest {})",
                generation, selection.generation
            );
            return self.state.borrow().clone();
        }

        let next = match result {
            Ok(articles) => {
                info!(
                    "Trending {} page {}: {} articles",
                    query.category,
                    query.page,
                    articles.len()
                );
                RequestState::Success(FeedResult { articles, query })
            }
            Err(e) => {
                warn!("Trending fetch failed: {}", e);
                RequestState::Failed(TRENDING_FAILED.to_string())
            }
        };
        self.state.send_replace(next.clone());
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MockFeedGateway;
    use crate::models::Article;
    use crate::Error;
    use mockall::predicate::eq;

    fn article(n: usize) -> Article {
        Article {
            title: format!("Story {}", n),
            description: String::new(),
            url: format!("https://news.example/{}", n),
            source: "Wire".into(),
            published_at: None,
            image_url: None,
            similarity_score: None,
        }
    }

    #[tokio::test]
    async fn test_general_page_one_success() {
        let mut gateway = MockFeedGateway::new();
        gateway
            .expect_trending()
            .with(eq(Category::General), eq(1))
            .times(1)
            .returning(|_, _| Ok((0..5).map(article).collect()));

        let controller = TrendingController::new(Arc::new(gateway));
        let state = controller.refresh().await;

        let result = state.success().expect("success");
        assert_eq!(result.articles.len(), 5);
        assert_eq!(result.query, FeedQuery::default());
        assert_eq!(controller.state(), state);
    }

    #[tokio::test]
    async fn test_category_change_resets_page() {
        let mut gateway = MockFeedGateway::new();
        gateway
            .expect_trending()
            .with(eq(Category::General), eq(3))
            .times(1)
            .returning(|_, _| Ok(vec![article(1)]));
        gateway
            .expect_trending()
            .with(eq(Category::Technology), eq(1))
            .times(1)
            .returning(|_, _| Ok(vec![article(2)]));

        let controller = TrendingController::new(Arc::new(gateway));
        controller.set_page(3).await;
        let state = controller.set_category(Category::Technology).await;

        assert_eq!(
            state.success().unwrap().query,
            FeedQuery {
                category: Category::Technology,
                page: 1
            }
        );
    }

    #[tokio::test]
    async fn test_select_fetches_requested_page_once() {
        let mut gateway = MockFeedGateway::new();
        gateway
            .expect_trending()
            .with(eq(Category::Sports), eq(4))
            .times(1)
            .returning(|_, _| Ok(vec![article(4)]));
        gateway
            .expect_trending()
            .with(eq(Category::Sports), eq(1))
            .never();

        let controller = TrendingController::new(Arc::new(gateway));
        let state = controller.select(Category::Sports, 4).await;

        assert_eq!(
            state.success().unwrap().query,
            FeedQuery {
                category: Category::Sports,
                page: 4
            }
        );
        assert!(controller.can_go_previous());
    }

    #[tokio::test]
    async fn test_same_category_keeps_page_and_refetches() {
        let mut gateway = MockFeedGateway::new();
        gateway
            .expect_trending()
            .with(eq(Category::General), eq(2))
            .times(2)
            .returning(|_, _| Ok(vec![]));

        let controller = TrendingController::new(Arc::new(gateway));
        controller.set_page(2).await;
        let state = controller.set_category(Category::General).await;

        // Empty is still a success
        assert_eq!(state.success().unwrap().articles.len(), 0);
    }

    #[tokio::test]
    async fn test_failure_discards_previous_success() {
        let mut gateway = MockFeedGateway::new();
        let mut calls = 0;
        gateway.expect_trending().times(2).returning(move |_, _| {
            calls += 1;
            if calls == 1 {
                Ok(vec![article(1)])
            } else {
                Err(Error::Transport("Status 502".into()))
            }
        });

        let controller = TrendingController::new(Arc::new(gateway));
        assert!(controller.refresh().await.success().is_some());

        let state = controller.refresh().await;
        assert!(matches!(state, RequestState::Failed(_)));
        assert!(controller.state().success().is_none());
    }

    #[tokio::test]
    async fn test_page_is_clamped_and_navigation_flags() {
        let mut gateway = MockFeedGateway::new();
        gateway
            .expect_trending()
            .with(eq(Category::General), eq(1))
            .returning(|_, _| Ok(vec![]));

        let controller = TrendingController::new(Arc::new(gateway));
        controller.set_page(-4).await;
        assert_eq!(controller.query().page, 1);
        assert!(!controller.can_go_previous());
        assert!(controller.can_go_next());

        controller.previous_page().await;
        assert_eq!(controller.query().page, 1);
    }

    #[tokio::test]
    async fn test_unknown_category_name_never_fetches() {
        let gateway = MockFeedGateway::new();
        let controller = TrendingController::new(Arc::new(gateway));

        let result = controller.set_category_name("astrology").await;
        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(controller.state(), RequestState::Idle);
    }
}
