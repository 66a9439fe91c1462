use tracing::debug;

use crate::error::CueResult;
use crate::models::{Season, Show};
use crate::repository::ShowRepository;

pub async fn trending_shows(shows: &dyn ShowRepository) -> CueResult<Vec<Show>> {
    shows.trending_shows().await
}

pub async fn popular_shows(shows: &dyn ShowRepository, page: u32) -> CueResult<Vec<Show>> {
    shows.popular_shows(page).await
}

pub async fn top_rated_shows(shows: &dyn ShowRepository, page: u32) -> CueResult<Vec<Show>> {
    shows.top_rated_shows(page).await
}

/// A blank query yields no results and makes no request.
pub async fn search_shows(
    shows: &dyn ShowRepository,
    query: &str,
    page: u32,
) -> CueResult<Vec<Show>> {
    let query = query.trim();
    if query.is_empty() {
        debug!("blank search query");
        return Ok(Vec::new());
    }
    shows.search_shows(query, page).await
}

pub async fn show_details(shows: &dyn ShowRepository, show_id: i32) -> CueResult<Show> {
    shows.show_details(show_id).await
}

pub async fn season_details(
    shows: &dyn ShowRepository,
    show_id: i32,
    season: i32,
) -> CueResult<Season> {
    shows.show_season(show_id, season).await
}

pub async fn shows_by_genre(
    shows: &dyn ShowRepository,
    genre_id: i32,
    page: u32,
) -> CueResult<Vec<Show>> {
    shows.shows_by_genre(genre_id, page).await
}
