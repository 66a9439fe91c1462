use std::collections::BTreeSet;

use crate::error::{CueError, CueResult};
use crate::models::{Show, UserShow, WatchStatus, WatchedEpisode};
use crate::repository::{today, ShowRepository, UserRepository};

#[derive(Debug, Clone, PartialEq)]
pub struct ShowProgress {
    pub show_id: i32,
    pub total_episodes: i32,
    pub watched_episodes: Vec<WatchedEpisode>,
    /// 0 to 100
    pub percentage: f64,
    pub seasons: Vec<SeasonProgress>,
    pub current_season: i32,
    pub current_episode: i32,
    pub status: WatchStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonProgress {
    pub season_number: i32,
    pub total_episodes: i32,
    /// Watched episode numbers, ascending
    pub watched: Vec<i32>,
    pub completed: bool,
}

/// Progress of `entry` against the catalog's episode counts for `show`.
pub fn compute_progress(entry: &UserShow, show: &Show) -> ShowProgress {
    let total_episodes = show.number_of_episodes.unwrap_or(0).max(0);
    let percentage = if total_episodes > 0 {
        (entry.watched_episodes.len() as f64 * 100.0 / total_episodes as f64).min(100.0)
    } else {
        0.0
    };

    let seasons = show
        .seasons
        .iter()
        .flatten()
        .map(|season| {
            let watched: BTreeSet<i32> = entry
                .watched_episodes
                .iter()
                .filter(|w| w.season_number == season.season_number)
                .map(|w| w.episode_number)
                .collect();
            SeasonProgress {
                season_number: season.season_number,
                total_episodes: season.episode_count,
                completed: season.episode_count > 0
                    && watched.len() >= season.episode_count as usize,
                watched: watched.into_iter().collect(),
            }
        })
        .collect();

    ShowProgress {
        show_id: entry.show_id,
        total_episodes,
        watched_episodes: entry.watched_episodes.clone(),
        percentage,
        seasons,
        current_season: entry.current_season,
        current_episode: entry.current_episode,
        status: entry.status,
    }
}

pub async fn show_progress(
    shows: &dyn ShowRepository,
    users: &dyn UserRepository,
    user_id: &str,
    show_id: i32,
) -> CueResult<ShowProgress> {
    let entry = users
        .library_entry(user_id, show_id)
        .await?
        .ok_or_else(|| CueError::NotFound(format!("show {show_id} is not in the library")))?;
    let show = shows.show_details(show_id).await?;
    Ok(compute_progress(&entry, &show))
}

pub async fn mark_episode_watched(
    users: &dyn UserRepository,
    user_id: &str,
    show_id: i32,
    season: i32,
    episode: i32,
    rating: Option<f64>,
    notes: Option<String>,
) -> CueResult<()> {
    if season < 0 || episode < 1 {
        return Err(CueError::InvalidInput(format!(
            "no episode S{season}E{episode}"
        )));
    }
    if let Some(r) = rating {
        if !(0.0..=10.0).contains(&r) {
            return Err(CueError::InvalidInput(format!("rating {r} is outside 0 to 10")));
        }
    }
    let watched = WatchedEpisode {
        season_number: season,
        episode_number: episode,
        watched_date: today(),
        rating,
        notes,
    };
    users.mark_episode_watched(user_id, show_id, watched).await
}

pub async fn mark_season_completed(
    users: &dyn UserRepository,
    user_id: &str,
    show_id: i32,
    season: i32,
) -> CueResult<()> {
    if season < 0 {
        return Err(CueError::InvalidInput(format!("no season {season}")));
    }
    users.mark_season_completed(user_id, show_id, season).await
}
