use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

use super::{FailureNotice, RetryCounter, StateTx};
use crate::error::{CueError, CueResult};
use crate::models::{UserProfile, UserShow, WatchStatus};
use crate::repository::{AuthRepository, UserRepository};
use crate::subscription::{AbortOnDrop, Subscription};
use crate::usecase;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LibraryState {
    pub is_loading: bool,
    pub user_id: Option<String>,
    pub shows: Vec<UserShow>,
    pub watching: Vec<UserShow>,
    pub completed: Vec<UserShow>,
    pub plan_to_watch: Vec<UserShow>,
    pub on_hold: Vec<UserShow>,
    pub dropped: Vec<UserShow>,
    pub error: Option<FailureNotice>,
    pub message: Option<String>,
}

impl LibraryState {
    /// Replaces the library and recomputes the status partitions.
    pub fn set_shows(&mut self, shows: Vec<UserShow>) {
        let with = |status: WatchStatus| -> Vec<UserShow> {
            shows.iter().filter(|s| s.status == status).cloned().collect()
        };
        self.watching = with(WatchStatus::Watching);
        self.completed = with(WatchStatus::Completed);
        self.plan_to_watch = with(WatchStatus::PlanToWatch);
        self.on_hold = with(WatchStatus::OnHold);
        self.dropped = with(WatchStatus::Dropped);
        self.shows = shows;
        self.is_loading = false;
    }

    pub fn by_status(&self, status: WatchStatus) -> &[UserShow] {
        match status {
            WatchStatus::Watching => &self.watching,
            WatchStatus::Completed => &self.completed,
            WatchStatus::PlanToWatch => &self.plan_to_watch,
            WatchStatus::OnHold => &self.on_hold,
            WatchStatus::Dropped => &self.dropped,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LibraryAction {
    Remove(i32),
    UpdateStatus(i32, WatchStatus),
    Rate(i32, f64),
    Notes(i32, String),
    EpisodeWatched { show_id: i32, season: i32, episode: i32 },
    SeasonCompleted { show_id: i32, season: i32 },
}

impl LibraryAction {
    fn describe(&self) -> (&'static str, &'static str) {
        match self {
            LibraryAction::Remove(_) => ("Could not remove show", "Show removed"),
            LibraryAction::UpdateStatus(..) => ("Could not update status", "Status updated"),
            LibraryAction::Rate(..) => ("Could not save rating", "Rating saved"),
            LibraryAction::Notes(..) => ("Could not save notes", "Notes saved"),
            LibraryAction::EpisodeWatched { .. } => {
                ("Could not mark episode", "Episode marked as watched")
            }
            LibraryAction::SeasonCompleted { .. } => {
                ("Could not complete season", "Season marked as completed")
            }
        }
    }
}

/// The signed-in user's library, kept live, plus library edits.
pub struct LibraryStateHolder {
    users: Arc<dyn UserRepository>,
    state: StateTx<LibraryState>,
    retry: Mutex<RetryCounter<LibraryAction>>,
    _feed: AbortOnDrop,
}

async fn next_value<T: Clone + Send + Sync + 'static>(
    live: &mut Option<Subscription<T>>,
) -> Option<T> {
    match live {
        Some(sub) => sub.next().await,
        None => std::future::pending().await,
    }
}

/// Fresh state for `user_id`. Loading until the first library snapshot.
fn state_for(user_id: Option<String>) -> LibraryState {
    LibraryState {
        is_loading: user_id.is_some(),
        user_id,
        ..LibraryState::default()
    }
}

/// Follows the session and swaps the live library whenever the account
/// changes. State already published for the reported account is kept.
async fn feed_library(
    mut session: Subscription<Option<UserProfile>>,
    users: Arc<dyn UserRepository>,
    state: StateTx<LibraryState>,
) {
    let mut followed: Option<String> = None;
    let mut synced = false;
    let mut live: Option<Subscription<Vec<UserShow>>> = None;
    let mut reported = Some(session.current());

    loop {
        if let Some(user) = reported.take() {
            let id = user.map(|u| u.id);
            if !synced || id != followed {
                synced = true;
                followed = id;
                live = None;
                state.send_if_modified(|s| {
                    if s.user_id == followed {
                        return false;
                    }
                    *s = state_for(followed.clone());
                    true
                });
                if let Some(uid) = &followed {
                    debug!(user_id = %uid, "following library");
                    match users.user_shows(uid).await {
                        Ok(sub) => {
                            let shows = sub.current();
                            state.send_modify(|s| s.set_shows(shows));
                            live = Some(sub);
                        }
                        Err(e) => {
                            warn!(error = %e, "library unavailable");
                            state.send_modify(|s| {
                                s.is_loading = false;
                                s.error =
                                    Some(FailureNotice::terminal("Could not load library", &e));
                            });
                        }
                    }
                }
            }
        }

        tokio::select! {
            user = session.next() => match user {
                Some(user) => reported = Some(user),
                None => break,
            },
            shows = next_value(&mut live) => match shows {
                Some(shows) => state.send_modify(|s| s.set_shows(shows)),
                None => live = None,
            },
        }
    }
}

impl LibraryStateHolder {
    /// Must be called inside a Tokio runtime.
    pub fn new(users: Arc<dyn UserRepository>, auth: &dyn AuthRepository) -> Self {
        let session = usecase::current_user(auth);
        let (tx, _) = watch::channel(state_for(session.current().map(|u| u.id)));
        let state = Arc::new(tx);
        let feed = tokio::spawn(feed_library(session, Arc::clone(&users), Arc::clone(&state)));
        Self {
            users,
            state,
            retry: Mutex::new(RetryCounter::new()),
            _feed: AbortOnDrop(feed),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<LibraryState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> LibraryState {
        self.state.borrow().clone()
    }

    async fn perform(&self, user_id: &str, action: &LibraryAction) -> CueResult<()> {
        let users = self.users.as_ref();
        match action {
            LibraryAction::Remove(show_id) => {
                usecase::remove_show_from_library(users, user_id, *show_id).await
            }
            LibraryAction::UpdateStatus(show_id, status) => {
                usecase::update_show_status(users, user_id, *show_id, *status).await
            }
            LibraryAction::Rate(show_id, rating) => {
                usecase::rate_show(users, user_id, *show_id, *rating).await
            }
            LibraryAction::Notes(show_id, notes) => {
                usecase::add_show_notes(users, user_id, *show_id, notes).await
            }
            LibraryAction::EpisodeWatched {
                show_id,
                season,
                episode,
            } => {
                usecase::mark_episode_watched(
                    users, user_id, *show_id, *season, *episode, None, None,
                )
                .await
            }
            LibraryAction::SeasonCompleted { show_id, season } => {
                usecase::mark_season_completed(users, user_id, *show_id, *season).await
            }
        }
    }

    async fn run(&self, action: LibraryAction) {
        let (failure, success) = action.describe();
        let user_id = self.state.borrow().user_id.clone();
        let result = match &user_id {
            Some(uid) => self.perform(uid, &action).await,
            None => Err(CueError::Unauthorized("no user is signed in".into())),
        };
        match result {
            Ok(()) => {
                self.retry.lock().await.record_success();
                self.state.send_modify(|s| {
                    s.error = None;
                    s.message = Some(success.to_string());
                });
            }
            Err(e) => {
                let notice = self.retry.lock().await.record_failure(action, failure, &e);
                warn!(error = %e, attempt = notice.attempt, "library action failed");
                self.state.send_modify(|s| s.error = Some(notice));
            }
        }
    }

    pub async fn remove_show(&self, show_id: i32) {
        self.run(LibraryAction::Remove(show_id)).await
    }

    pub async fn update_status(&self, show_id: i32, status: WatchStatus) {
        self.run(LibraryAction::UpdateStatus(show_id, status)).await
    }

    pub async fn rate_show(&self, show_id: i32, rating: f64) {
        self.run(LibraryAction::Rate(show_id, rating)).await
    }

    pub async fn add_notes(&self, show_id: i32, notes: &str) {
        self.run(LibraryAction::Notes(show_id, notes.to_string()))
            .await
    }

    pub async fn mark_episode_watched(&self, show_id: i32, season: i32, episode: i32) {
        self.run(LibraryAction::EpisodeWatched {
            show_id,
            season,
            episode,
        })
        .await
    }

    pub async fn mark_season_completed(&self, show_id: i32, season: i32) {
        self.run(LibraryAction::SeasonCompleted { show_id, season })
            .await
    }

    pub async fn retry(&self) -> bool {
        let action = self.retry.lock().await.take_retry();
        match action {
            Some(action) => {
                self.run(action).await;
                true
            }
            None => false,
        }
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|s| s.error = None);
    }

    pub fn clear_message(&self) {
        self.state.send_modify(|s| s.message = None);
    }
}
