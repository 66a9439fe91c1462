use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::cache::TtlCache;
use crate::config::Config;
use crate::error::CueResult;
use crate::models::{Episode, Genre, Season, Show, ShowImages, Video};
use crate::tmdb::map::{map_episode, map_genre, map_images, map_season, map_show, map_video};
use crate::tmdb::{CatalogApi, TmdbPage, TmdbShow};

/// Catalog reads expressed in domain records.
#[async_trait]
pub trait ShowRepository: Send + Sync {
    async fn trending_shows(&self) -> CueResult<Vec<Show>>;
    async fn popular_shows(&self, page: u32) -> CueResult<Vec<Show>>;
    async fn top_rated_shows(&self, page: u32) -> CueResult<Vec<Show>>;
    async fn search_shows(&self, query: &str, page: u32) -> CueResult<Vec<Show>>;
    async fn show_details(&self, show_id: i32) -> CueResult<Show>;
    async fn show_season(&self, show_id: i32, season: i32) -> CueResult<Season>;
    async fn show_episode(&self, show_id: i32, season: i32, episode: i32) -> CueResult<Episode>;
    async fn genres(&self) -> CueResult<Vec<Genre>>;
    async fn shows_by_genre(&self, genre_id: i32, page: u32) -> CueResult<Vec<Show>>;
    async fn similar_shows(&self, show_id: i32) -> CueResult<Vec<Show>>;
    async fn recommended_shows(&self, show_id: i32) -> CueResult<Vec<Show>>;
    async fn show_images(&self, show_id: i32) -> CueResult<ShowImages>;
    async fn show_videos(&self, show_id: i32) -> CueResult<Vec<Video>>;
}

const GENRES_KEY: () = ();

pub struct TmdbShowRepository {
    api: Arc<dyn CatalogApi>,
    shows: Mutex<TtlCache<i32, Show>>,
    genres: Mutex<TtlCache<(), Vec<Genre>>>,
}

impl TmdbShowRepository {
    pub fn new(api: Arc<dyn CatalogApi>, ttl: Duration, capacity: usize) -> Self {
        Self {
            api,
            shows: Mutex::new(TtlCache::new(ttl, capacity)),
            genres: Mutex::new(TtlCache::new(ttl, 1)),
        }
    }

    pub fn from_config(api: Arc<dyn CatalogApi>, config: &Config) -> Self {
        Self::new(api, config.cache_ttl(), config.cache_capacity)
    }

    pub async fn cached_show(&self, show_id: i32) -> Option<Show> {
        self.shows.lock().await.get(&show_id)
    }

    pub async fn cache_show(&self, show: Show) {
        self.shows.lock().await.insert(show.id, show);
    }

    pub async fn cached_genres(&self) -> Vec<Genre> {
        self.genres.lock().await.get(&GENRES_KEY).unwrap_or_default()
    }

    pub async fn cache_genres(&self, genres: Vec<Genre>) {
        self.genres.lock().await.insert(GENRES_KEY, genres);
    }
}

fn shows_of(page: TmdbPage<TmdbShow>) -> Vec<Show> {
    page.results.into_iter().map(map_show).collect()
}

#[async_trait]
impl ShowRepository for TmdbShowRepository {
    async fn trending_shows(&self) -> CueResult<Vec<Show>> {
        let page = self.api.trending().await?;
        debug!(count = page.results.len(), "trending shows fetched");
        Ok(shows_of(page))
    }

    async fn popular_shows(&self, page: u32) -> CueResult<Vec<Show>> {
        Ok(shows_of(self.api.popular(page).await?))
    }

    async fn top_rated_shows(&self, page: u32) -> CueResult<Vec<Show>> {
        Ok(shows_of(self.api.top_rated(page).await?))
    }

    async fn search_shows(&self, query: &str, page: u32) -> CueResult<Vec<Show>> {
        let found = shows_of(self.api.search(query, page).await?);
        info!(query, results = found.len(), "show search completed");
        Ok(found)
    }

    async fn show_details(&self, show_id: i32) -> CueResult<Show> {
        if let Some(show) = self.cached_show(show_id).await {
            debug!(show_id, "show details cache hit");
            return Ok(show);
        }
        let show = map_show(self.api.details(show_id).await?);
        self.cache_show(show.clone()).await;
        Ok(show)
    }

    async fn show_season(&self, show_id: i32, season: i32) -> CueResult<Season> {
        Ok(map_season(self.api.season(show_id, season).await?))
    }

    async fn show_episode(&self, show_id: i32, season: i32, episode: i32) -> CueResult<Episode> {
        Ok(map_episode(self.api.episode(show_id, season, episode).await?))
    }

    async fn genres(&self) -> CueResult<Vec<Genre>> {
        let cached = self.cached_genres().await;
        if !cached.is_empty() {
            return Ok(cached);
        }
        let genres: Vec<Genre> = self
            .api
            .genres()
            .await?
            .into_iter()
            .map(map_genre)
            .collect();
        self.cache_genres(genres.clone()).await;
        Ok(genres)
    }

    async fn shows_by_genre(&self, genre_id: i32, page: u32) -> CueResult<Vec<Show>> {
        Ok(shows_of(self.api.by_genre(genre_id, page).await?))
    }

    async fn similar_shows(&self, show_id: i32) -> CueResult<Vec<Show>> {
        Ok(shows_of(self.api.similar(show_id).await?))
    }

    async fn recommended_shows(&self, show_id: i32) -> CueResult<Vec<Show>> {
        Ok(shows_of(self.api.recommendations(show_id).await?))
    }

    async fn show_images(&self, show_id: i32) -> CueResult<ShowImages> {
        Ok(map_images(self.api.images(show_id).await?))
    }

    async fn show_videos(&self, show_id: i32) -> CueResult<Vec<Video>> {
        Ok(self
            .api
            .videos(show_id)
            .await?
            .into_iter()
            .map(map_video)
            .collect())
    }
}
