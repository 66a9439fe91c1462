use async_trait::async_trait;

use crate::error::CueResult;

mod client;
pub mod map;
pub mod wire;

pub use client::TmdbClient;
pub use wire::{
    TmdbEpisode, TmdbGenre, TmdbImages, TmdbPage, TmdbSeason, TmdbShow, TmdbVideo,
};

pub const IMAGE_BASE: &str = "https://image.tmdb.org/t/p/";

/// Common TMDB image widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    W300,
    W342,
    W500,
    W780,
    W1280,
    Original,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::W300 => "w300",
            ImageSize::W342 => "w342",
            ImageSize::W500 => "w500",
            ImageSize::W780 => "w780",
            ImageSize::W1280 => "w1280",
            ImageSize::Original => "original",
        }
    }
}

pub fn image_url(path: Option<&str>, size: ImageSize) -> Option<String> {
    image_url_at(IMAGE_BASE, path, size)
}

/// Like [`image_url`] against a configured image host.
pub fn image_url_at(base: &str, path: Option<&str>, size: ImageSize) -> Option<String> {
    let base = base.trim_end_matches('/');
    path.filter(|p| !p.is_empty())
        .map(|p| format!("{base}/{}{p}", size.as_str()))
}

/// Read-only access to the TV catalog. Each call is a single request with no
/// retry or caching.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn trending(&self) -> CueResult<TmdbPage<TmdbShow>>;
    async fn popular(&self, page: u32) -> CueResult<TmdbPage<TmdbShow>>;
    async fn top_rated(&self, page: u32) -> CueResult<TmdbPage<TmdbShow>>;
    async fn search(&self, query: &str, page: u32) -> CueResult<TmdbPage<TmdbShow>>;
    async fn details(&self, show_id: i32) -> CueResult<TmdbShow>;
    async fn season(&self, show_id: i32, season: i32) -> CueResult<TmdbSeason>;
    async fn episode(&self, show_id: i32, season: i32, episode: i32) -> CueResult<TmdbEpisode>;
    async fn genres(&self) -> CueResult<Vec<TmdbGenre>>;
    async fn by_genre(&self, genre_id: i32, page: u32) -> CueResult<TmdbPage<TmdbShow>>;
    async fn similar(&self, show_id: i32) -> CueResult<TmdbPage<TmdbShow>>;
    async fn recommendations(&self, show_id: i32) -> CueResult<TmdbPage<TmdbShow>>;
    async fn images(&self, show_id: i32) -> CueResult<TmdbImages>;
    async fn videos(&self, show_id: i32) -> CueResult<Vec<TmdbVideo>>;
}
