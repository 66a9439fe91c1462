use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Show {
    pub id: i32,
    pub name: String,
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub first_air_date: Option<NaiveDate>,
    pub vote_average: f64,
    pub vote_count: i32,
    pub popularity: f64,
    pub genre_ids: Vec<i32>,
    pub original_language: String,
    pub original_name: String,
    pub status: Option<String>,
    pub number_of_seasons: Option<i32>,
    pub number_of_episodes: Option<i32>,
    pub in_production: Option<bool>,
    pub networks: Option<Vec<Network>>,
    pub created_by: Option<Vec<Creator>>,
    pub genres: Option<Vec<Genre>>,
    pub seasons: Option<Vec<Season>>,
}

impl Show {
    pub fn has_any_genre(&self, genre_ids: &[i32]) -> bool {
        self.genre_ids.iter().any(|g| genre_ids.contains(g))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Season {
    pub id: i32,
    pub name: String,
    pub overview: String,
    pub poster_path: Option<String>,
    pub season_number: i32,
    pub episode_count: i32,
    pub air_date: Option<NaiveDate>,
    /// Only filled by the season endpoint
    pub episodes: Vec<Episode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub id: i32,
    pub name: String,
    pub overview: String,
    pub still_path: Option<String>,
    pub episode_number: i32,
    pub season_number: i32,
    pub air_date: Option<NaiveDate>,
    pub vote_average: f64,
    pub vote_count: i32,
    pub runtime: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub id: i32,
    pub name: String,
    pub logo_path: Option<String>,
    pub origin_country: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    pub id: i32,
    pub name: String,
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowImages {
    pub backdrops: Vec<ImageData>,
    pub posters: Vec<ImageData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageData {
    pub file_path: String,
    pub width: i32,
    pub height: i32,
    pub aspect_ratio: f64,
    pub vote_average: f64,
    pub vote_count: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub key: String,
    pub name: String,
    pub site: String,
    pub video_type: String,
    pub official: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WatchStatus {
    Watching,
    Completed,
    OnHold,
    Dropped,
    PlanToWatch,
}

impl WatchStatus {
    pub const ALL: [WatchStatus; 5] = [
        WatchStatus::Watching,
        WatchStatus::Completed,
        WatchStatus::OnHold,
        WatchStatus::Dropped,
        WatchStatus::PlanToWatch,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            WatchStatus::Watching => "Watching",
            WatchStatus::Completed => "Completed",
            WatchStatus::OnHold => "On hold",
            WatchStatus::Dropped => "Dropped",
            WatchStatus::PlanToWatch => "Plan to watch",
        }
    }
}

/// A tracked show in a user's library, stored as one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserShow {
    /// Document id; not part of the stored fields
    #[serde(skip)]
    pub id: String,
    pub user_id: String,
    pub show_id: i32,
    pub show_name: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    pub status: WatchStatus,
    #[serde(default = "first")]
    pub current_season: i32,
    #[serde(default = "first")]
    pub current_episode: i32,
    #[serde(default)]
    pub personal_rating: Option<f64>,
    #[serde(default)]
    pub personal_notes: Option<String>,
    pub date_added: NaiveDate,
    #[serde(default)]
    pub last_watched: Option<NaiveDate>,
    #[serde(default)]
    pub watched_episodes: Vec<WatchedEpisode>,
}

fn first() -> i32 {
    1
}

impl UserShow {
    /// Fresh plan-to-watch entry for `show`.
    pub fn from_show(user_id: &str, show: &Show, today: NaiveDate) -> Self {
        Self {
            id: String::new(),
            user_id: user_id.to_string(),
            show_id: show.id,
            show_name: show.name.clone(),
            poster_path: show.poster_path.clone(),
            status: WatchStatus::PlanToWatch,
            current_season: 1,
            current_episode: 1,
            personal_rating: None,
            personal_notes: None,
            date_added: today,
            last_watched: None,
            watched_episodes: Vec::new(),
        }
    }

    pub fn has_watched(&self, season: i32, episode: i32) -> bool {
        self.watched_episodes
            .iter()
            .any(|w| w.season_number == season && w.episode_number == episode)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchedEpisode {
    pub season_number: i32,
    pub episode_number: i32,
    pub watched_date: NaiveDate,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(skip)]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub profile_picture_url: Option<String>,
    pub join_date: NaiveDate,
    #[serde(default)]
    pub preferences: UserPreferences,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPreferences {
    pub notifications_enabled: bool,
    pub spoiler_protection: bool,
    pub preferred_language: String,
    /// "system", "light" or "dark"
    pub theme: String,
    pub preferred_genres: Vec<i32>,
    pub excluded_genres: Vec<i32>,
    pub reminder_offset_minutes: i32,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            notifications_enabled: true,
            spoiler_protection: true,
            preferred_language: "en".to_string(),
            theme: "system".to_string(),
            preferred_genres: Vec::new(),
            excluded_genres: Vec::new(),
            reminder_offset_minutes: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn watch_status_uses_stored_names() {
        assert_eq!(
            serde_json::to_value(WatchStatus::PlanToWatch).unwrap(),
            json!("PLAN_TO_WATCH")
        );
        let status: WatchStatus = serde_json::from_value(json!("ON_HOLD")).unwrap();
        assert_eq!(status, WatchStatus::OnHold);
    }

    #[test]
    fn user_show_document_fills_defaults() {
        let doc = json!({
            "userId": "u1",
            "showId": 1399,
            "showName": "Game of Thrones",
            "status": "WATCHING",
            "dateAdded": "2024-03-01"
        });
        let show: UserShow = serde_json::from_value(doc).unwrap();
        assert_eq!(show.current_season, 1);
        assert_eq!(show.current_episode, 1);
        assert!(show.watched_episodes.is_empty());
        assert!(show.id.is_empty());
    }

    #[test]
    fn preferences_default_when_absent() {
        let doc = json!({ "email": "a@b.com", "joinDate": "2024-01-01" });
        let profile: UserProfile = serde_json::from_value(doc).unwrap();
        assert_eq!(profile.preferences, UserPreferences::default());
        assert_eq!(profile.preferences.theme, "system");
    }
}
