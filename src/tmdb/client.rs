use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::wire::{
    TmdbEpisode, TmdbGenre, TmdbGenreList, TmdbImages, TmdbPage, TmdbSeason, TmdbShow,
    TmdbVideo, TmdbVideos,
};
use super::CatalogApi;
use crate::config::Config;
use crate::error::{CueError, CueResult};

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
    base_url: String,
    language: String,
}

impl TmdbClient {
    pub fn new(config: &Config) -> CueResult<Self> {
        let user_agent = format!("cueview/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(5))
            .timeout(config.request_timeout())
            .user_agent(user_agent)
            .build()
            .map_err(|e| CueError::Other(format!("Failed to build TMDB HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: config.tmdb_api_key.clone(),
            base_url: config.tmdb_base_url.trim_end_matches('/').to_string(),
            language: config.tmdb_language.clone(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> CueResult<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(path, "TMDB request");
        let res = self
            .client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", self.language.as_str()),
            ])
            .query(params)
            .send()
            .await?;
        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            warn!(path, status = status.as_u16(), "TMDB request failed");
            return Err(CueError::from_status(
                status.as_u16(),
                format!("{path} -> {text}"),
            ));
        }
        serde_json::from_str(&text).map_err(|e| {
            warn!(path, error = %e, "TMDB payload did not match the expected shape");
            CueError::Decode(format!("{path}: {e}"))
        })
    }
}

fn page_param(page: u32) -> (&'static str, String) {
    ("page", page.max(1).to_string())
}

#[async_trait]
impl CatalogApi for TmdbClient {
    async fn trending(&self) -> CueResult<TmdbPage<TmdbShow>> {
        self.get_json("/trending/tv/week", &[]).await
    }

    async fn popular(&self, page: u32) -> CueResult<TmdbPage<TmdbShow>> {
        self.get_json("/tv/popular", &[page_param(page)]).await
    }

    async fn top_rated(&self, page: u32) -> CueResult<TmdbPage<TmdbShow>> {
        self.get_json("/tv/top_rated", &[page_param(page)]).await
    }

    async fn search(&self, query: &str, page: u32) -> CueResult<TmdbPage<TmdbShow>> {
        self.get_json(
            "/search/tv",
            &[("query", query.to_string()), page_param(page)],
        )
        .await
    }

    async fn details(&self, show_id: i32) -> CueResult<TmdbShow> {
        self.get_json(&format!("/tv/{show_id}"), &[]).await
    }

    async fn season(&self, show_id: i32, season: i32) -> CueResult<TmdbSeason> {
        self.get_json(&format!("/tv/{show_id}/season/{season}"), &[])
            .await
    }

    async fn episode(&self, show_id: i32, season: i32, episode: i32) -> CueResult<TmdbEpisode> {
        self.get_json(
            &format!("/tv/{show_id}/season/{season}/episode/{episode}"),
            &[],
        )
        .await
    }

    async fn genres(&self) -> CueResult<Vec<TmdbGenre>> {
        let list: TmdbGenreList = self.get_json("/genre/tv/list", &[]).await?;
        Ok(list.genres)
    }

    async fn by_genre(&self, genre_id: i32, page: u32) -> CueResult<TmdbPage<TmdbShow>> {
        self.get_json(
            "/discover/tv",
            &[
                ("with_genres", genre_id.to_string()),
                ("sort_by", "popularity.desc".to_string()),
                page_param(page),
            ],
        )
        .await
    }

    async fn similar(&self, show_id: i32) -> CueResult<TmdbPage<TmdbShow>> {
        self.get_json(&format!("/tv/{show_id}/similar"), &[]).await
    }

    async fn recommendations(&self, show_id: i32) -> CueResult<TmdbPage<TmdbShow>> {
        self.get_json(&format!("/tv/{show_id}/recommendations"), &[])
            .await
    }

    async fn images(&self, show_id: i32) -> CueResult<TmdbImages> {
        // Untagged images are only returned when asked for explicitly.
        self.get_json(
            &format!("/tv/{show_id}/images"),
            &[("include_image_language", format!("{},null", short_lang(&self.language)))],
        )
        .await
    }

    async fn videos(&self, show_id: i32) -> CueResult<Vec<TmdbVideo>> {
        let videos: TmdbVideos = self.get_json(&format!("/tv/{show_id}/videos"), &[]).await?;
        Ok(videos.results)
    }
}

fn short_lang(language: &str) -> &str {
    language.split('-').next().unwrap_or(language)
}
