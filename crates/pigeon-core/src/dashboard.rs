// Wires the controllers, the interest profile and the history ledger
// together behind the intents a presentation layer forwards.
use std::sync::Arc;

use tracing::info;

use crate::gateway::{FeedGateway, ImageSearch};
use crate::history::HistoryLedger;
use crate::interests::{InterestProfileManager, ProfileState};
use crate::models::{FeedResult, RequestState, SearchResult};
use crate::profile_store::ProfileStore;
use crate::search::{SearchController, SearchSettings};
use crate::session::SessionManager;
use crate::trending::TrendingController;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActiveView {
    #[default]
    Feed,
    Explore,
    History,
    Profile,
}

pub struct Dashboard {
    session: SessionManager,
    interests: InterestProfileManager,
    history: Arc<HistoryLedger>,
    trending: TrendingController,
    search: SearchController,
    view: ActiveView,
}

impl Dashboard {
    /// Loads every slice from `store`; nothing is fetched until `open`
    pub fn new(
        store: ProfileStore,
        gateway: Arc<dyn FeedGateway>,
        images: Arc<dyn ImageSearch>,
        settings: SearchSettings,
    ) -> Self {
        let history = Arc::new(HistoryLedger::load(store.clone()));

        Self {
            session: SessionManager::load(store.clone()),
            interests: InterestProfileManager::load(store),
            trending: TrendingController::new(gateway.clone()),
            search: SearchController::new(gateway, images, history.clone(), settings),
            history,
            view: ActiveView::Feed,
        }
    }

    /// Enter the dashboard. Requires a session. A personalized profile gets
    /// its feed fetched straight away; a new user is left to onboard.
    pub async fn open(&mut self) -> Result<Option<RequestState<FeedResult>>> {
        if !self.session.is_authenticated() {
            return Err(Error::NotAuthenticated);
        }
        self.view = ActiveView::Feed;

        match self.interests.state() {
            ProfileState::Personalized { .. } => {
                let category = self.interests.feed_category();
                info!("Opening personalized feed for {}", category);
                Ok(Some(self.trending.set_category(category).await))
            }
            _ => Ok(None),
        }
    }

    pub fn view(&self) -> ActiveView {
        self.view
    }

    pub fn select_view(&mut self, view: ActiveView) {
        self.view = view;
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionManager {
        &mut self.session
    }

    pub fn interests(&self) -> &InterestProfileManager {
        &self.interests
    }

    pub fn history(&self) -> &HistoryLedger {
        &self.history
    }

    pub fn trending(&self) -> &TrendingController {
        &self.trending
    }

    pub fn search(&self) -> &SearchController {
        &self.search
    }

    pub fn edit_interests(&mut self) {
        self.interests.begin_onboarding();
    }

    pub fn toggle_interest(&mut self, name: &str) -> bool {
        self.interests.toggle_interest(name)
    }

    /// Save the draft and, only if that worked, show the personalized feed
    pub async fn save_interests(&mut self) -> Result<RequestState<FeedResult>> {
        let category = self.interests.save_draft()?;
        self.view = ActiveView::Feed;
        Ok(self.trending.set_category(category).await)
    }

    /// Replace the saved interests outright (no draft), then refetch
    pub async fn replace_interests(&mut self, names: &[String]) -> Result<RequestState<FeedResult>> {
        let category = self.interests.save(names)?;
        self.view = ActiveView::Feed;
        Ok(self.trending.set_category(category).await)
    }

    pub async fn submit_search(&mut self, query_text: &str) -> Result<RequestState<SearchResult>> {
        let state = self.search.submit(query_text).await?;
        self.view = ActiveView::Explore;
        Ok(state)
    }

    /// Put a past query back in the search box without running it
    pub fn select_history(&mut self, id: i64) -> Result<()> {
        let entry = self
            .history
            .get(id)
            .ok_or_else(|| Error::Validation(format!("No history entry {}", id)))?;

        self.search.set_pending_query(&entry.query_text);
        self.view = ActiveView::Explore;
        Ok(())
    }

    pub fn clear_history(&self) {
        self.history.clear();
    }

    pub fn back_to_trending(&mut self) {
        self.search.reset();
        self.view = ActiveView::Feed;
    }

    pub fn logout(&mut self) {
        self.search.reset();
        self.session.logout();
        self.view = ActiveView::Feed;
    }
}
