use crate::error::{CueError, CueResult};
use crate::models::{Show, UserShow, WatchStatus};
use crate::repository::UserRepository;

/// Starts tracking `show` as plan-to-watch. An already tracked show is
/// returned as it is.
pub async fn add_show_to_library(
    users: &dyn UserRepository,
    user_id: &str,
    show: &Show,
) -> CueResult<UserShow> {
    users.add_show(user_id, show).await
}

pub async fn remove_show_from_library(
    users: &dyn UserRepository,
    user_id: &str,
    show_id: i32,
) -> CueResult<()> {
    users.remove_show(user_id, show_id).await
}

pub async fn update_show_status(
    users: &dyn UserRepository,
    user_id: &str,
    show_id: i32,
    status: WatchStatus,
) -> CueResult<()> {
    users.update_status(user_id, show_id, status).await
}

pub async fn rate_show(
    users: &dyn UserRepository,
    user_id: &str,
    show_id: i32,
    rating: f64,
) -> CueResult<()> {
    users.update_rating(user_id, show_id, rating).await
}

pub async fn add_show_notes(
    users: &dyn UserRepository,
    user_id: &str,
    show_id: i32,
    notes: &str,
) -> CueResult<()> {
    if notes.trim().is_empty() {
        return Err(CueError::InvalidInput("notes are empty".into()));
    }
    users.update_notes(user_id, show_id, notes.trim()).await
}
