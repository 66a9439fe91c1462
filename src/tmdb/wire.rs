//! Wire records exactly as the TMDB v3 API returns them.
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbPage<T> {
    pub page: i32,
    #[serde(default)]
    pub total_results: i32,
    #[serde(default)]
    pub total_pages: i32,
    pub results: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbShow {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: i32,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub genre_ids: Vec<i32>,
    #[serde(default)]
    pub original_language: String,
    #[serde(default)]
    pub original_name: String,
    pub status: Option<String>,
    pub number_of_seasons: Option<i32>,
    pub number_of_episodes: Option<i32>,
    pub in_production: Option<bool>,
    pub networks: Option<Vec<TmdbNetwork>>,
    pub created_by: Option<Vec<TmdbCreator>>,
    pub genres: Option<Vec<TmdbGenre>>,
    pub seasons: Option<Vec<TmdbSeason>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbSeason {
    pub id: i32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub overview: String,
    pub poster_path: Option<String>,
    pub season_number: i32,
    /// Present in the show details payload, absent from the season endpoint
    pub episode_count: Option<i32>,
    pub air_date: Option<String>,
    #[serde(default)]
    pub episodes: Vec<TmdbEpisode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbEpisode {
    pub id: i32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub overview: String,
    pub still_path: Option<String>,
    pub episode_number: i32,
    pub season_number: i32,
    pub air_date: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: i32,
    pub runtime: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbGenre {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbGenreList {
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbNetwork {
    pub id: i32,
    pub name: String,
    pub logo_path: Option<String>,
    #[serde(default)]
    pub origin_country: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbCreator {
    pub id: i32,
    pub name: String,
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbImages {
    #[serde(default)]
    pub backdrops: Vec<TmdbImage>,
    #[serde(default)]
    pub posters: Vec<TmdbImage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbImage {
    pub file_path: String,
    #[serde(default)]
    pub width: i32,
    #[serde(default)]
    pub height: i32,
    #[serde(default)]
    pub aspect_ratio: f64,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbVideos {
    #[serde(default)]
    pub results: Vec<TmdbVideo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbVideo {
    pub id: String,
    pub key: String,
    #[serde(default)]
    pub name: String,
    pub site: String,
    #[serde(rename = "type")]
    pub video_type: String,
    #[serde(default)]
    pub official: bool,
}
