//! Single-purpose operations composed from the repositories. Each takes the
//! repositories it needs by reference and returns a [`CueResult`].
//!
//! [`CueResult`]: crate::error::CueResult

mod auth;
mod discovery;
mod library;
mod progress;
mod shows;

pub use auth::{current_user, reset_password, sign_in, sign_out, sign_up};
pub use discovery::{
    library_recommendations, personalized_recommendations, watchlist_suggestions,
    PersonalizedContent, FOR_YOU_LIMIT, LIST_LIMIT,
};
pub use library::{
    add_show_notes, add_show_to_library, rate_show, remove_show_from_library, update_show_status,
};
pub use progress::{
    compute_progress, mark_episode_watched, mark_season_completed, show_progress, SeasonProgress,
    ShowProgress,
};
pub use shows::{
    popular_shows, search_shows, season_details, show_details, shows_by_genre, top_rated_shows,
    trending_shows,
};
