use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::warn;

use super::{follow_user_id, state_channel, FailureNotice, RetryCounter, Services, StateTx};
use crate::error::{CueError, CueResult};
use crate::models::Show;
use crate::subscription::AbortOnDrop;
use crate::usecase::{self, ShowProgress};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShowDetailState {
    pub is_loading: bool,
    pub user_id: Option<String>,
    pub show: Option<Show>,
    /// Present when the show is in the signed-in user's library
    pub progress: Option<ShowProgress>,
    pub error: Option<FailureNotice>,
    pub library_message: Option<String>,
    pub is_adding_to_library: bool,
}

impl ShowDetailState {
    pub fn in_library(&self) -> bool {
        self.progress.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailAction {
    Load(i32),
    AddToLibrary,
}

pub struct ShowDetailStateHolder {
    services: Services,
    state: StateTx<ShowDetailState>,
    retry: Mutex<RetryCounter<DetailAction>>,
    _session: AbortOnDrop,
}

impl ShowDetailStateHolder {
    /// Must be called inside a Tokio runtime.
    pub fn new(services: Services) -> Self {
        let state = state_channel();
        let session = follow_user_id(
            services.auth.as_ref(),
            Arc::clone(&state),
            |s: &mut ShowDetailState, id| {
                if s.user_id == id {
                    return false;
                }
                if id.is_none() {
                    s.progress = None;
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

    pub fn subscribe(&self) -> watch::Receiver<ShowDetailState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ShowDetailState {
        self.state.borrow().clone()
    }

    async fn fail(&self, action: DetailAction, context: &str, error: &CueError) {
        let notice = self.retry.lock().await.record_failure(action, context, error);
        warn!(error = %error, context, attempt = notice.attempt, "show detail action failed");
        self.state.send_modify(|s| {
            s.is_loading = false;
            s.is_adding_to_library = false;
            s.error = Some(notice);
        });
    }

    /// Progress for the signed-in user, `None` when signed out or untracked.
    /// Failures here only cost the progress panel.
    async fn progress_for(&self, show: &Show) -> Option<ShowProgress> {
        let user_id = self.state.borrow().user_id.clone()?;
        match self
            .services
            .users
            .library_entry(&user_id, show.id)
            .await
        {
            Ok(entry) => entry.map(|e| usecase::compute_progress(&e, show)),
            Err(e) => {
                warn!(error = %e, show_id = show.id, "progress unavailable");
                None
            }
        }
    }

    pub async fn load(&self, show_id: i32) {
        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
        });
        match usecase::show_details(self.services.shows.as_ref(), show_id).await {
            Ok(show) => {
                self.retry.lock().await.record_success();
                let progress = self.progress_for(&show).await;
                self.state.send_modify(|s| {
                    s.is_loading = false;
                    s.show = Some(show);
                    s.progress = progress;
                });
            }
            Err(e) => {
                self.fail(DetailAction::Load(show_id), "Could not load show", &e)
                    .await
            }
        }
    }

    async fn add_loaded_show(&self) -> CueResult<Show> {
        let (user_id, show) = {
            let state = self.state.borrow();
            (state.user_id.clone(), state.show.clone())
        };
        let user_id =
            user_id.ok_or_else(|| CueError::Unauthorized("sign in to keep a library".into()))?;
        let show = show.ok_or_else(|| CueError::InvalidInput("no show is loaded".into()))?;
        usecase::add_show_to_library(self.services.users.as_ref(), &user_id, &show).await?;
        Ok(show)
    }

    /// Adds the loaded show to the library and shows its (fresh) progress.
    pub async fn add_to_library(&self) {
        self.state.send_modify(|s| {
            s.is_adding_to_library = true;
            s.error = None;
        });
        match self.add_loaded_show().await {
            Ok(show) => {
                self.retry.lock().await.record_success();
                let progress = self.progress_for(&show).await;
                self.state.send_modify(|s| {
                    s.is_adding_to_library = false;
                    s.progress = progress;
                    s.library_message = Some(format!("'{}' added to your library!", show.name));
                });
            }
            Err(e) => {
                self.fail(DetailAction::AddToLibrary, "Could not add show", &e)
                    .await
            }
        }
    }

    pub async fn retry(&self) -> bool {
        let action = self.retry.lock().await.take_retry();
        match action {
            Some(DetailAction::Load(show_id)) => self.load(show_id).await,
            Some(DetailAction::AddToLibrary) => self.add_to_library().await,
            None => return false,
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
