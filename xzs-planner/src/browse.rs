//! Topic browsing view
//!
//! Holds the discovery pool, the favorites pool and the discovery status,
//! and applies the backend's mutations to them locally. The three fetches
//! are independent; each result replaces only its own part of the state.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};
use xzs_common::api::SkipRequest;
use xzs_common::topic::{DiscoveryStatus, SkipReason};
use xzs_common::{TopicCandidate, TopicType};

use crate::address::{write_address, BrowseTab, NavigationHistory, SessionView, PAGE_SIZE};
use crate::client::TopicRepository;
use crate::error::{PlannerError, Result};

/// Pools and status as last fetched
#[derive(Debug, Clone, Default)]
pub struct BrowseState {
    pub discovery: Vec<TopicCandidate>,
    pub favorites: Vec<TopicCandidate>,
    pub status: DiscoveryStatus,
    /// Discovery pool fetch or discovery run failure
    pub error: Option<String>,
    /// Failed mutations, keyed by topic id
    pub topic_errors: HashMap<String, String>,
}

/// What one tab shows
#[derive(Debug, Clone)]
pub struct BrowsePage {
    pub tab: BrowseTab,
    pub topics: Vec<TopicCandidate>,
    /// Topics in the tab before pagination
    pub total: usize,
    pub has_more: bool,
    /// Discovery pool size per topic type
    pub counts: HashMap<TopicType, usize>,
    pub favorites_count: usize,
}

pub struct BrowsingView {
    repo: Arc<dyn TopicRepository>,
    state: RwLock<BrowseState>,
    collecting: AtomicBool,
}

impl BrowsingView {
    pub fn new(repo: Arc<dyn TopicRepository>) -> Self {
        Self {
            repo,
            state: RwLock::new(BrowseState::default()),
            collecting: AtomicBool::new(false),
        }
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> BrowseState {
        self.state.read().await.clone()
    }

    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    pub async fn dismiss_error(&self) {
        self.state.write().await.error = None;
    }

    pub async fn topic_error(&self, topic_id: &str) -> Option<String> {
        self.state.read().await.topic_errors.get(topic_id).cloned()
    }

    pub async fn dismiss_topic_error(&self, topic_id: &str) {
        self.state.write().await.topic_errors.remove(topic_id);
    }

    /// Fetch discovery pool, favorites and status concurrently
    ///
    /// Only a discovery pool failure is reported; the other two are logged.
    pub async fn refresh_all(&self) -> Result<()> {
        let (discovery, _, _) = tokio::join!(
            self.refresh_discovery(),
            self.refresh_favorites(),
            self.refresh_status()
        );
        discovery
    }

    pub async fn refresh_discovery(&self) -> Result<()> {
        match self.repo.list_discovery().await {
            Ok(topics) => {
                info!(count = topics.len(), "Discovery pool refreshed");
                self.state.write().await.discovery = topics;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch discovery pool");
                self.state.write().await.error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    pub async fn refresh_favorites(&self) -> Result<()> {
        match self.repo.list_favorites().await {
            Ok(topics) => {
                self.state.write().await.favorites = topics;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch favorites");
                Err(e.into())
            }
        }
    }

    pub async fn refresh_status(&self) -> Result<()> {
        match self.repo.discovery_status().await {
            Ok(status) => {
                self.state.write().await.status = status;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch discovery status");
                Err(e.into())
            }
        }
    }

    /// True while a discovery run started here is pending
    pub fn is_collecting(&self) -> bool {
        self.collecting.load(Ordering::SeqCst)
    }

    /// Run discovery and replace the discovery pool with its topics
    ///
    /// Returns `Ok(false)` without sending a request while a run is pending.
    pub async fn trigger_discovery(&self) -> Result<bool> {
        if self
            .collecting
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            info!("Discovery already running, trigger suppressed");
            return Ok(false);
        }

        self.state.write().await.error = None;
        let result = self.repo.collect().await;

        let outcome = {
            let mut state = self.state.write().await;
            match result {
                Ok(response) => {
                    info!(count = response.topics.len(), "Discovery run finished");
                    state.status.last_run = Some(chrono::Utc::now().to_rfc3339());
                    state.status.last_count = response.topics.len();
                    state.discovery = response.topics;
                    Ok(true)
                }
                Err(e) => {
                    warn!(error = %e, "Discovery run failed");
                    state.error = Some(e.to_string());
                    Err(e.into())
                }
            }
        };

        self.collecting.store(false, Ordering::SeqCst);
        outcome
    }

    fn record_topic_error(state: &mut BrowseState, topic_id: &str, error: &PlannerError) {
        state
            .topic_errors
            .insert(topic_id.to_string(), error.to_string());
    }

    /// Toggle favorite; a favorited topic moves from discovery to favorites
    pub async fn toggle_favorite(&self, topic_id: &str) -> Result<bool> {
        match self.repo.toggle_favorite(topic_id).await {
            Ok(is_favorited) => {
                let mut state = self.state.write().await;
                state.topic_errors.remove(topic_id);
                if is_favorited {
                    if let Some(pos) = state.discovery.iter().position(|t| t.id() == topic_id) {
                        let mut topic = state.discovery.remove(pos);
                        topic.base.is_favorited = true;
                        state.favorites.push(topic);
                    }
                } else {
                    state.favorites.retain(|t| t.id() != topic_id);
                }
                info!(topic_id = %topic_id, is_favorited, "Favorite toggled");
                Ok(is_favorited)
            }
            Err(e) => {
                warn!(topic_id = %topic_id, error = %e, "Failed to toggle favorite");
                let err = PlannerError::from(e);
                Self::record_topic_error(&mut *self.state.write().await, topic_id, &err);
                Err(err)
            }
        }
    }

    /// Mark done; every topic sharing the work name is flagged in both pools
    ///
    /// A failure is recorded against each of those topics.
    pub async fn mark_done(&self, work_name: &str, dish_name: &str) -> Result<()> {
        let outcome = self.repo.mark_done(work_name, dish_name).await;

        let mut state = self.state.write().await;
        let BrowseState {
            discovery,
            favorites,
            topic_errors,
            ..
        } = &mut *state;
        let same_work = discovery
            .iter_mut()
            .chain(favorites.iter_mut())
            .filter(|t| t.work_name() == work_name);

        match outcome {
            Ok(()) => {
                for topic in same_work {
                    topic.base.is_done = true;
                    topic_errors.remove(topic.id());
                }
                info!(work_name = %work_name, "Topic marked done");
                Ok(())
            }
            Err(e) => {
                warn!(work_name = %work_name, error = %e, "Failed to mark topic done");
                let err = PlannerError::from(e);
                for topic in same_work {
                    topic_errors.insert(topic.id().to_string(), err.to_string());
                }
                Err(err)
            }
        }
    }

    fn skip_request(topic: &TopicCandidate, reason: SkipReason) -> SkipRequest {
        SkipRequest {
            topic_id: topic.id().to_string(),
            work_name: topic.work_name().to_string(),
            dish_name: topic.dish_name().to_string(),
            reason,
        }
    }

    async fn find_topic(&self, topic_id: &str, favorites: bool) -> Result<TopicCandidate> {
        let state = self.state.read().await;
        let pool = if favorites {
            &state.favorites
        } else {
            &state.discovery
        };
        pool.iter()
            .find(|t| t.id() == topic_id)
            .cloned()
            .ok_or_else(|| PlannerError::Validation(format!("Unknown topic: {}", topic_id)))
    }

    /// Skip a discovery topic, then re-fetch the pool to refill it
    pub async fn skip_topic(&self, topic_id: &str, reason: SkipReason) -> Result<()> {
        let topic = self.find_topic(topic_id, false).await?;
        let request = Self::skip_request(&topic, reason);

        if let Err(e) = self.repo.skip(&request).await {
            warn!(topic_id = %topic_id, error = %e, "Failed to skip topic");
            let err = PlannerError::from(e);
            Self::record_topic_error(&mut *self.state.write().await, topic_id, &err);
            return Err(err);
        }

        {
            let mut state = self.state.write().await;
            state.discovery.retain(|t| t.id() != topic_id);
            state.topic_errors.remove(topic_id);
        }
        info!(topic_id = %topic_id, reason = reason.as_str(), "Topic skipped");

        // A failed refill is recorded as the view error; the skip itself stands
        let _ = self.refresh_discovery().await;
        Ok(())
    }

    /// Un-favorite (result ignored), skip, and drop from the favorites pool
    pub async fn skip_favorite(&self, topic_id: &str, reason: SkipReason) -> Result<()> {
        let topic = self.find_topic(topic_id, true).await?;

        if let Err(e) = self.repo.toggle_favorite(topic_id).await {
            warn!(topic_id = %topic_id, error = %e, "Un-favorite before skip failed");
        }

        let request = Self::skip_request(&topic, reason);
        if let Err(e) = self.repo.skip(&request).await {
            warn!(topic_id = %topic_id, error = %e, "Failed to skip favorite");
            let err = PlannerError::from(e);
            Self::record_topic_error(&mut *self.state.write().await, topic_id, &err);
            return Err(err);
        }

        let mut state = self.state.write().await;
        state.favorites.retain(|t| t.id() != topic_id);
        state.topic_errors.remove(topic_id);
        info!(topic_id = %topic_id, reason = reason.as_str(), "Favorite skipped");
        Ok(())
    }

    /// Skip from whichever pool the tab shows
    pub async fn skip_in_tab(&self, tab: BrowseTab, topic_id: &str, reason: SkipReason) -> Result<()> {
        match tab {
            BrowseTab::Favorites => self.skip_favorite(topic_id, reason).await,
            _ => self.skip_topic(topic_id, reason).await,
        }
    }

    /// Topics for a tab, limited to `visible_count`
    pub async fn page(&self, tab: BrowseTab, visible_count: usize) -> BrowsePage {
        let state = self.state.read().await;

        let mut counts: HashMap<TopicType, usize> =
            TopicType::ALL.iter().map(|t| (*t, 0)).collect();
        for topic in &state.discovery {
            *counts.entry(topic.topic_type()).or_insert(0) += 1;
        }

        let in_tab: Vec<&TopicCandidate> = match tab.topic_type() {
            Some(topic_type) => state
                .discovery
                .iter()
                .filter(|t| t.topic_type() == topic_type)
                .collect(),
            None => state.favorites.iter().collect(),
        };

        let total = in_tab.len();
        BrowsePage {
            tab,
            topics: in_tab.into_iter().take(visible_count).cloned().collect(),
            total,
            has_more: total > visible_count,
            counts,
            favorites_count: state.favorites.len(),
        }
    }

    /// Page for the view the address describes (home if it is a workflow)
    pub async fn page_for(&self, history: &NavigationHistory) -> BrowsePage {
        match history.view() {
            SessionView::Browse { tab, visible_count } => self.page(tab, visible_count).await,
            SessionView::Workflow { .. } => self.page(BrowseTab::default(), PAGE_SIZE).await,
        }
    }
}

/// Switch tab (new history entry, pagination reset)
pub fn select_tab(history: &mut NavigationHistory, tab: BrowseTab) {
    history.push(write_address(&SessionView::Browse {
        tab,
        visible_count: PAGE_SIZE,
    }));
}

/// Show one more page (replaces the current entry)
pub fn load_more(history: &mut NavigationHistory) {
    let (tab, visible_count) = match history.view() {
        SessionView::Browse { tab, visible_count } => (tab, visible_count),
        SessionView::Workflow { .. } => (BrowseTab::default(), PAGE_SIZE),
    };
    history.replace(write_address(&SessionView::Browse {
        tab,
        visible_count: visible_count + PAGE_SIZE,
    }));
}

/// Open the workflow for a topic at its first step
pub fn start_workflow(history: &mut NavigationHistory, topic_id: &str) {
    history.push(write_address(&SessionView::Workflow {
        topic_id: topic_id.to_string(),
        step: 0,
    }));
}
