use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

use super::{follow_user_id, state_channel, FailureNotice, RetryCounter, Services, StateTx};
use crate::error::{CueError, CueResult};
use crate::models::{Genre, Show};
use crate::subscription::AbortOnDrop;
use crate::usecase::{self, PersonalizedContent};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoverState {
    pub is_loading: bool,
    pub user_id: Option<String>,
    pub search_query: String,
    pub search_results: Vec<Show>,
    pub trending: Vec<Show>,
    pub popular: Vec<Show>,
    pub top_rated: Vec<Show>,
    pub for_you: Vec<Show>,
    pub genres: Vec<Genre>,
    pub error: Option<FailureNotice>,
    pub library_message: Option<String>,
    pub is_adding_to_library: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DiscoverAction {
    LoadInitial,
    Search(String),
    AddToLibrary(Box<Show>),
}

pub struct DiscoverStateHolder {
    services: Services,
    state: StateTx<DiscoverState>,
    retry: Mutex<RetryCounter<DiscoverAction>>,
    _session: AbortOnDrop,
}

impl DiscoverStateHolder {
    /// Must be called inside a Tokio runtime. Nothing is loaded until
    /// [`load_initial`](Self::load_initial).
    pub fn new(services: Services) -> Self {
        let state = state_channel();
        let session = follow_user_id(
            services.auth.as_ref(),
            Arc::clone(&state),
            |s: &mut DiscoverState, id| {
                if s.user_id == id {
                    return false;
                }
                s.user_id = id;
                true
            },
        );
        Self {
            services,
            state,
            retry: Mutex::new(RetryCounter::new()),
            _session: session,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<DiscoverState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> DiscoverState {
        self.state.borrow().clone()
    }

    fn begin(&self) {
        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
        });
    }

    async fn fail(&self, action: DiscoverAction, context: &str, error: &CueError) {
        let notice = self.retry.lock().await.record_failure(action, context, error);
        warn!(
            error = %error,
            context,
            attempt = notice.attempt,
            can_retry = notice.can_retry,
            "discover action failed"
        );
        self.state.send_modify(|s| {
            s.is_loading = false;
            s.is_adding_to_library = false;
            s.error = Some(notice);
        });
    }

    async fn succeed(&self) {
        self.retry.lock().await.record_success();
    }

    /// Trending and popular lists for signed-out browsing.
    async fn anonymous_content(&self) -> CueResult<PersonalizedContent> {
        let shows = self.services.shows.as_ref();
        let (trending, popular) =
            tokio::join!(usecase::trending_shows(shows), usecase::popular_shows(shows, 1));
        match (trending, popular) {
            (Err(e), Err(_)) => Err(e),
            (trending, popular) => Ok(PersonalizedContent {
                trending: trending.unwrap_or_default(),
                popular: popular.unwrap_or_default(),
                ..PersonalizedContent::default()
            }),
        }
    }

    /// Personalized lists when signed in, plain trending and popular otherwise.
    pub async fn load_initial(&self) {
        self.begin();
        let user_id = self.state.borrow().user_id.clone();
        let result = match &user_id {
            Some(uid) => {
                usecase::personalized_recommendations(
                    self.services.shows.as_ref(),
                    self.services.users.as_ref(),
                    uid,
                )
                .await
            }
            None => self.anonymous_content().await,
        };
        match result {
            Ok(content) => {
                self.succeed().await;
                self.state.send_modify(|s| {
                    s.is_loading = false;
                    s.trending = content.trending;
                    s.popular = content.popular;
                    s.top_rated = content.top_rated;
                    s.for_you = content.for_you;
                    s.genres = content.genres;
                });
            }
            Err(e) => {
                self.fail(DiscoverAction::LoadInitial, "Could not load shows", &e)
                    .await
            }
        }
    }

    /// Records `query` and searches for it; a blank query clears the results.
    pub async fn update_search_query(&self, query: &str) {
        self.state
            .send_modify(|s| s.search_query = query.to_string());
        if query.trim().is_empty() {
            self.state.send_modify(|s| s.search_results.clear());
            return;
        }
        self.search(query).await;
    }

    pub async fn search(&self, query: &str) {
        self.begin();
        match usecase::search_shows(self.services.shows.as_ref(), query, 1).await {
            Ok(results) => {
                self.succeed().await;
                self.state.send_modify(|s| {
                    s.is_loading = false;
                    s.search_results = results;
                });
            }
            Err(e) => {
                self.fail(DiscoverAction::Search(query.to_string()), "Search failed", &e)
                    .await
            }
        }
    }

    pub async fn add_to_library(&self, show: &Show) {
        let user_id = self.state.borrow().user_id.clone();
        let Some(user_id) = user_id else {
            let error = CueError::Unauthorized("sign in to keep a library".into());
            self.state.send_modify(|s| {
                s.error = Some(FailureNotice::terminal("Could not add show", &error));
            });
            return;
        };
        self.state.send_modify(|s| {
            s.is_adding_to_library = true;
            s.error = None;
        });
        match usecase::add_show_to_library(self.services.users.as_ref(), &user_id, show).await {
            Ok(_) => {
                self.succeed().await;
                info!(show_id = show.id, "show added from discover");
                self.state.send_modify(|s| {
                    s.is_adding_to_library = false;
                    s.library_message = Some(format!("'{}' added to your library!", show.name));
                });
            }
            Err(e) => {
                let action = DiscoverAction::AddToLibrary(Box::new(show.clone()));
                self.fail(action, "Could not add show", &e).await
            }
        }
    }

    /// Runs the last failed action again if a retry is on offer. Returns
    /// whether anything ran.
    pub async fn retry(&self) -> bool {
        let action = self.retry.lock().await.take_retry();
        let Some(action) = action else {
            return false;
        };
        match action {
            DiscoverAction::LoadInitial => self.load_initial().await,
            DiscoverAction::Search(query) => self.search(&query).await,
            DiscoverAction::AddToLibrary(show) => self.add_to_library(&show).await,
        }
        true
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|s| s.error = None);
    }

    pub fn clear_library_message(&self) {
        self.state.send_modify(|s| s.library_message = None);
    }
}
