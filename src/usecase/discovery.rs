use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

use crate::error::CueResult;
use crate::models::{Genre, Show, UserPreferences, UserShow, WatchStatus};
use crate::repository::{ShowRepository, UserRepository};

pub const LIST_LIMIT: usize = 10;
pub const FOR_YOU_LIMIT: usize = 15;
const SUGGESTION_SOURCES: usize = 3;
const SUGGESTIONS_PER_SOURCE: usize = 3;
const TOP_GENRES: usize = 3;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonalizedContent {
    pub trending: Vec<Show>,
    pub popular: Vec<Show>,
    pub top_rated: Vec<Show>,
    pub for_you: Vec<Show>,
    pub genres: Vec<Genre>,
}

/// What a user's library and preferences say about a catalog show.
struct Taste<'a> {
    tracked: HashSet<i32>,
    preferred: &'a [i32],
    excluded: &'a [i32],
}

impl<'a> Taste<'a> {
    fn new(library: &[UserShow], preferences: &'a UserPreferences) -> Self {
        Self {
            tracked: library.iter().map(|s| s.show_id).collect(),
            preferred: &preferences.preferred_genres,
            excluded: &preferences.excluded_genres,
        }
    }

    fn admits(&self, show: &Show) -> bool {
        !self.tracked.contains(&show.id)
            && !show.has_any_genre(self.excluded)
            && (self.preferred.is_empty() || show.has_any_genre(self.preferred))
    }

    fn affinity(&self, show: &Show) -> usize {
        show.genre_ids
            .iter()
            .filter(|g| self.preferred.contains(g))
            .count()
    }

    fn pick(&self, shows: &[Show], limit: usize) -> Vec<Show> {
        shows
            .iter()
            .filter(|s| self.admits(s))
            .take(limit)
            .cloned()
            .collect()
    }
}

fn or_empty<T: Default>(what: &str, result: CueResult<T>) -> T {
    result.unwrap_or_else(|e| {
        warn!(list = what, error = %e, "catalog list unavailable");
        T::default()
    })
}

fn dedup_by_id(shows: impl IntoIterator<Item = Show>) -> Vec<Show> {
    let mut seen = HashSet::new();
    shows.into_iter().filter(|s| seen.insert(s.id)).collect()
}

/// Discover page for `user_id`. Tracked shows and excluded genres are removed
/// everywhere; a failed catalog list comes back empty unless all of them fail.
pub async fn personalized_recommendations(
    shows: &dyn ShowRepository,
    users: &dyn UserRepository,
    user_id: &str,
) -> CueResult<PersonalizedContent> {
    let (library, profile) = tokio::try_join!(users.library(user_id), users.profile(user_id))?;
    let preferences = profile.map(|p| p.preferences).unwrap_or_default();
    let taste = Taste::new(&library, &preferences);

    let (trending, popular, top_rated, genres) = tokio::join!(
        shows.trending_shows(),
        shows.popular_shows(1),
        shows.top_rated_shows(1),
        shows.genres(),
    );
    let (trending, popular, top_rated) = match (trending, popular, top_rated) {
        (Err(e), Err(_), Err(_)) => return Err(e),
        (t, p, r) => (
            or_empty("trending", t),
            or_empty("popular", p),
            or_empty("top_rated", r),
        ),
    };

    let mut for_you: Vec<Show> = dedup_by_id(
        trending
            .iter()
            .chain(&popular)
            .chain(&top_rated)
            .filter(|s| taste.admits(s))
            .cloned(),
    );
    for_you.sort_by(|a, b| {
        taste
            .affinity(b)
            .cmp(&taste.affinity(a))
            .then(b.popularity.total_cmp(&a.popularity))
    });
    for_you.truncate(FOR_YOU_LIMIT);

    let content = PersonalizedContent {
        trending: taste.pick(&trending, LIST_LIMIT),
        popular: taste.pick(&popular, LIST_LIMIT),
        top_rated: taste.pick(&top_rated, LIST_LIMIT),
        for_you,
        genres: or_empty("genres", genres),
    };
    info!(
        user_id,
        tracked = taste.tracked.len(),
        for_you = content.for_you.len(),
        "personalized recommendations ready"
    );
    Ok(content)
}

/// Popular shows sharing a genre with what the user is currently watching.
pub async fn watchlist_suggestions(
    shows: &dyn ShowRepository,
    users: &dyn UserRepository,
    user_id: &str,
) -> CueResult<Vec<Show>> {
    let library = users.library(user_id).await?;
    let tracked: HashSet<i32> = library.iter().map(|s| s.show_id).collect();
    let watching: Vec<&UserShow> = library
        .iter()
        .filter(|s| s.status == WatchStatus::Watching)
        .take(SUGGESTION_SOURCES)
        .collect();
    if watching.is_empty() {
        return Ok(Vec::new());
    }

    let popular = shows.popular_shows(1).await?;
    let mut suggestions = Vec::new();
    for entry in watching {
        let details = match shows.show_details(entry.show_id).await {
            Ok(details) => details,
            Err(e) => {
                warn!(show_id = entry.show_id, error = %e, "skipping suggestion source");
                continue;
            }
        };
        suggestions.extend(
            popular
                .iter()
                .filter(|s| !tracked.contains(&s.id) && s.has_any_genre(&details.genre_ids))
                .take(SUGGESTIONS_PER_SOURCE)
                .cloned(),
        );
    }
    let mut suggestions = dedup_by_id(suggestions);
    suggestions.truncate(LIST_LIMIT);
    Ok(suggestions)
}

/// Most frequent genres first; ties go to the lower id.
fn top_genres(genre_ids: impl IntoIterator<Item = i32>, limit: usize) -> Vec<i32> {
    let mut counts: HashMap<i32, usize> = HashMap::new();
    for id in genre_ids {
        *counts.entry(id).or_default() += 1;
    }
    let mut ranked: Vec<(i32, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.into_iter().take(limit).map(|(id, _)| id).collect()
}

/// Popular shows in the library's three strongest genres, topped up from
/// trending. An empty library gets nothing.
pub async fn library_recommendations(
    shows: &dyn ShowRepository,
    users: &dyn UserRepository,
    user_id: &str,
) -> CueResult<Vec<Show>> {
    let library = users.library(user_id).await?;
    if library.is_empty() {
        return Ok(Vec::new());
    }
    let tracked: HashSet<i32> = library.iter().map(|s| s.show_id).collect();

    let mut seen_genres = Vec::new();
    for entry in &library {
        match shows.show_details(entry.show_id).await {
            Ok(details) => seen_genres.extend(details.genre_ids),
            Err(e) => warn!(show_id = entry.show_id, error = %e, "no genres for library show"),
        }
    }
    let favourites = top_genres(seen_genres, TOP_GENRES);

    let popular = or_empty("popular", shows.popular_shows(1).await);
    let mut picks: Vec<Show> = popular
        .into_iter()
        .filter(|s| !tracked.contains(&s.id) && s.has_any_genre(&favourites))
        .take(LIST_LIMIT)
        .collect();

    if picks.len() < LIST_LIMIT {
        let trending = or_empty("trending", shows.trending_shows().await);
        let missing = LIST_LIMIT - picks.len();
        let filler: Vec<Show> = trending
            .into_iter()
            .filter(|s| !tracked.contains(&s.id) && !picks.iter().any(|p| p.id == s.id))
            .take(missing)
            .collect();
        picks.extend(filler);
    }
    Ok(picks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn show(id: i32, genres: &[i32], popularity: f64) -> Show {
        Show {
            id,
            name: format!("Show {id}"),
            overview: String::new(),
            poster_path: None,
            backdrop_path: None,
            first_air_date: None,
            vote_average: 0.0,
            vote_count: 0,
            popularity,
            genre_ids: genres.to_vec(),
            original_language: "en".into(),
            original_name: String::new(),
            status: None,
            number_of_seasons: None,
            number_of_episodes: None,
            in_production: None,
            networks: None,
            created_by: None,
            genres: None,
            seasons: None,
        }
    }

    #[test]
    fn taste_drops_tracked_and_excluded_shows() {
        let prefs = UserPreferences {
            excluded_genres: vec![27],
            ..UserPreferences::default()
        };
        let mut taste = Taste::new(&[], &prefs);
        taste.tracked.insert(1);

        assert!(!taste.admits(&show(1, &[18], 1.0)));
        assert!(!taste.admits(&show(2, &[18, 27], 1.0)));
        assert!(taste.admits(&show(3, &[18], 1.0)));
    }

    #[test]
    fn preferred_genres_narrow_the_selection() {
        let prefs = UserPreferences {
            preferred_genres: vec![35, 18],
            ..UserPreferences::default()
        };
        let taste = Taste::new(&[], &prefs);
        assert!(!taste.admits(&show(1, &[10765], 1.0)));
        assert!(taste.admits(&show(2, &[35], 1.0)));
        assert_eq!(taste.affinity(&show(3, &[35, 18, 80], 1.0)), 2);
    }

    #[test]
    fn top_genres_rank_by_frequency() {
        assert_eq!(top_genres([18, 35, 18, 80, 35, 18, 99], 3), vec![18, 35, 80]);
        assert!(top_genres([], 3).is_empty());
    }

    #[test]
    fn duplicates_keep_their_first_occurrence() {
        let shows = dedup_by_id([show(1, &[], 1.0), show(2, &[], 1.0), show(1, &[], 9.0)]);
        assert_eq!(shows.len(), 2);
        assert_eq!(shows[0].popularity, 1.0);
    }
}
