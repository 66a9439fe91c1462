use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{from_document, to_fields, today};
use crate::error::{CueError, CueResult};
use crate::models::{Show, UserPreferences, UserProfile, UserShow, WatchStatus, WatchedEpisode};
use crate::store::{Document, DocumentStore, Fields, Query, USERS, USER_SHOWS};
use crate::subscription::Subscription;

/// Per-user profile and library records.
///
/// Each (user, show) pair has at most one library entry. Writes addressed to a
/// pair without an entry fail with `NotFound`.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn profile(&self, user_id: &str) -> CueResult<Option<UserProfile>>;
    async fn save_profile(&self, profile: &UserProfile) -> CueResult<()>;
    async fn update_preferences(&self, user_id: &str, preferences: &UserPreferences)
        -> CueResult<()>;

    /// One-shot read of the whole library.
    async fn library(&self, user_id: &str) -> CueResult<Vec<UserShow>>;
    /// Live view of the library, republished after every change.
    async fn user_shows(&self, user_id: &str) -> CueResult<Subscription<Vec<UserShow>>>;
    async fn library_entry(&self, user_id: &str, show_id: i32) -> CueResult<Option<UserShow>>;

    async fn add_show(&self, user_id: &str, show: &Show) -> CueResult<UserShow>;
    async fn remove_show(&self, user_id: &str, show_id: i32) -> CueResult<()>;
    async fn update_status(&self, user_id: &str, show_id: i32, status: WatchStatus)
        -> CueResult<()>;
    async fn update_rating(&self, user_id: &str, show_id: i32, rating: f64) -> CueResult<()>;
    async fn update_notes(&self, user_id: &str, show_id: i32, notes: &str) -> CueResult<()>;
    async fn update_position(
        &self,
        user_id: &str,
        show_id: i32,
        season: i32,
        episode: i32,
    ) -> CueResult<()>;
    /// Records `episode`, replacing an earlier record of the same episode.
    async fn add_watched_episode(
        &self,
        user_id: &str,
        show_id: i32,
        episode: WatchedEpisode,
    ) -> CueResult<()>;

    /// Records `episode` and then moves the position pointer past it. The two
    /// writes are not atomic; repeating the call after a partial failure is
    /// safe.
    async fn mark_episode_watched(
        &self,
        user_id: &str,
        show_id: i32,
        episode: WatchedEpisode,
    ) -> CueResult<()> {
        let (season, number) = (episode.season_number, episode.episode_number);
        self.add_watched_episode(user_id, show_id, episode).await?;
        let entry = self
            .library_entry(user_id, show_id)
            .await?
            .ok_or_else(|| CueError::NotFound(format!("show {show_id} is not in the library")))?;
        let current = (entry.current_season, entry.current_episode);
        let next = next_position(current, (season, number));
        if next != current {
            self.update_position(user_id, show_id, next.0, next.1).await?;
        }
        Ok(())
    }

    /// Jumps to the first episode of the following season without checking
    /// what was watched.
    async fn mark_season_completed(&self, user_id: &str, show_id: i32, season: i32)
        -> CueResult<()> {
        self.update_position(user_id, show_id, season + 1, 1).await
    }
}

/// Position after watching `watched`: one past it when it is at or beyond
/// `current`, otherwise unchanged.
pub fn next_position(current: (i32, i32), watched: (i32, i32)) -> (i32, i32) {
    if watched >= current {
        (watched.0, watched.1 + 1)
    } else {
        current
    }
}

pub struct StoreUserRepository {
    store: Arc<dyn DocumentStore>,
}

impl StoreUserRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn entry_query(user_id: &str, show_id: i32) -> Query {
        Query::collection(USER_SHOWS)
            .where_eq("userId", user_id)
            .where_eq("showId", show_id)
    }

    async fn find_entry(&self, user_id: &str, show_id: i32) -> CueResult<Option<Document>> {
        let mut docs = self.store.query(&Self::entry_query(user_id, show_id)).await?;
        if docs.len() > 1 {
            warn!(user_id, show_id, count = docs.len(), "duplicate library entries");
        }
        Ok(if docs.is_empty() { None } else { Some(docs.swap_remove(0)) })
    }

    async fn require_entry(&self, user_id: &str, show_id: i32) -> CueResult<Document> {
        self.find_entry(user_id, show_id)
            .await?
            .ok_or_else(|| CueError::NotFound(format!("show {show_id} is not in the library")))
    }

    async fn update_entry(&self, user_id: &str, show_id: i32, patch: Value) -> CueResult<()> {
        let doc = self.require_entry(user_id, show_id).await?;
        self.store
            .update(USER_SHOWS, &doc.id, to_fields(&patch)?)
            .await
    }
}

fn user_show_of(doc: &Document) -> CueResult<UserShow> {
    let mut show: UserShow = from_document(doc)?;
    show.id = doc.id.clone();
    Ok(show)
}

/// Decodes every well-formed entry and logs the rest.
fn user_shows_of(docs: &[Document]) -> Vec<UserShow> {
    docs.iter()
        .filter_map(|doc| match user_show_of(doc) {
            Ok(show) => Some(show),
            Err(e) => {
                warn!(error = %e, "skipping unreadable library entry");
                None
            }
        })
        .collect()
}

#[async_trait]
impl UserRepository for StoreUserRepository {
    async fn profile(&self, user_id: &str) -> CueResult<Option<UserProfile>> {
        let Some(doc) = self.store.get(USERS, user_id).await? else {
            return Ok(None);
        };
        let mut profile: UserProfile = from_document(&doc)?;
        profile.id = doc.id;
        Ok(Some(profile))
    }

    async fn save_profile(&self, profile: &UserProfile) -> CueResult<()> {
        if profile.id.is_empty() {
            return Err(CueError::InvalidInput("profile has no user id".into()));
        }
        self.store.set(USERS, &profile.id, to_fields(profile)?).await
    }

    async fn update_preferences(
        &self,
        user_id: &str,
        preferences: &UserPreferences,
    ) -> CueResult<()> {
        let mut patch = Fields::new();
        patch.insert("preferences".into(), serde_json::to_value(preferences)?);
        self.store.update(USERS, user_id, patch).await
    }

    async fn library(&self, user_id: &str) -> CueResult<Vec<UserShow>> {
        let docs = self
            .store
            .query(&Query::collection(USER_SHOWS).where_eq("userId", user_id))
            .await?;
        Ok(user_shows_of(&docs))
    }

    async fn user_shows(&self, user_id: &str) -> CueResult<Subscription<Vec<UserShow>>> {
        let live = self
            .store
            .watch(Query::collection(USER_SHOWS).where_eq("userId", user_id))
            .await?;
        Ok(live.map(|docs| user_shows_of(&docs)))
    }

    async fn library_entry(&self, user_id: &str, show_id: i32) -> CueResult<Option<UserShow>> {
        self.find_entry(user_id, show_id)
            .await?
            .as_ref()
            .map(user_show_of)
            .transpose()
    }

    async fn add_show(&self, user_id: &str, show: &Show) -> CueResult<UserShow> {
        if let Some(doc) = self.find_entry(user_id, show.id).await? {
            debug!(user_id, show_id = show.id, "show already tracked");
            return user_show_of(&doc);
        }
        let mut entry = UserShow::from_show(user_id, show, today());
        entry.id = self.store.add(USER_SHOWS, to_fields(&entry)?).await?;
        info!(user_id, show_id = show.id, "show added to library");
        Ok(entry)
    }

    async fn remove_show(&self, user_id: &str, show_id: i32) -> CueResult<()> {
        let docs = self.store.query(&Self::entry_query(user_id, show_id)).await?;
        for doc in docs {
            self.store.delete(USER_SHOWS, &doc.id).await?;
        }
        info!(user_id, show_id, "show removed from library");
        Ok(())
    }

    async fn update_status(
        &self,
        user_id: &str,
        show_id: i32,
        status: WatchStatus,
    ) -> CueResult<()> {
        self.update_entry(user_id, show_id, json!({ "status": status }))
            .await
    }

    async fn update_rating(&self, user_id: &str, show_id: i32, rating: f64) -> CueResult<()> {
        if !(0.0..=10.0).contains(&rating) {
            return Err(CueError::InvalidInput(format!(
                "rating {rating} is outside 0 to 10"
            )));
        }
        self.update_entry(user_id, show_id, json!({ "personalRating": rating }))
            .await
    }

    async fn update_notes(&self, user_id: &str, show_id: i32, notes: &str) -> CueResult<()> {
        self.update_entry(user_id, show_id, json!({ "personalNotes": notes }))
            .await
    }

    async fn update_position(
        &self,
        user_id: &str,
        show_id: i32,
        season: i32,
        episode: i32,
    ) -> CueResult<()> {
        self.update_entry(
            user_id,
            show_id,
            json!({ "currentSeason": season, "currentEpisode": episode }),
        )
        .await
    }

    async fn add_watched_episode(
        &self,
        user_id: &str,
        show_id: i32,
        episode: WatchedEpisode,
    ) -> CueResult<()> {
        let doc = self.require_entry(user_id, show_id).await?;
        let mut watched = user_show_of(&doc)?.watched_episodes;
        watched.retain(|w| {
            !(w.season_number == episode.season_number
                && w.episode_number == episode.episode_number)
        });
        let watched_on = episode.watched_date;
        watched.push(episode);

        let mut patch = Fields::new();
        patch.insert("watchedEpisodes".into(), serde_json::to_value(&watched)?);
        patch.insert("lastWatched".into(), serde_json::to_value(watched_on)?);
        self.store.update(USER_SHOWS, &doc.id, patch).await
    }
}
