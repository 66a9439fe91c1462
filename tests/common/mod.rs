#![allow(dead_code)]

use cueview::error::{CueError, CueResult};
use cueview::identity::MemoryIdentity;
use cueview::repository::{IdentityAuthRepository, StoreUserRepository, TmdbShowRepository};
use cueview::state::Services;
use cueview::store::MemoryStore;
use cueview::tmdb::{
    CatalogApi, TmdbEpisode, TmdbGenre, TmdbImages, TmdbPage, TmdbSeason, TmdbShow, TmdbVideo,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

pub fn wire_show(id: i32, genres: &[i32], popularity: f64) -> TmdbShow {
    serde_json::from_value(json!({
        "id": id,
        "name": format!("Show {id}"),
        "overview": "",
        "poster_path": format!("/poster{id}.jpg"),
        "first_air_date": "2020-01-01",
        "vote_average": 7.5,
        "vote_count": 100,
        "popularity": popularity,
        "genre_ids": genres,
        "original_language": "en",
        "original_name": format!("Show {id}"),
    }))
    .unwrap()
}

/// Details payload: genres as objects, episode totals and season summaries.
pub fn wire_details(id: i32, genres: &[i32], seasons: &[(i32, i32)]) -> TmdbShow {
    let total: i32 = seasons.iter().map(|(_, n)| n).sum();
    serde_json::from_value(json!({
        "id": id,
        "name": format!("Show {id}"),
        "overview": "details",
        "poster_path": null,
        "first_air_date": "",
        "popularity": 10.0,
        "genres": genres.iter().map(|g| json!({"id": g, "name": format!("Genre {g}")})).collect::<Vec<_>>(),
        "number_of_episodes": total,
        "number_of_seasons": seasons.len(),
        "seasons": seasons.iter().map(|(n, count)| json!({
            "id": 1000 + n,
            "name": format!("Season {n}"),
            "season_number": n,
            "episode_count": count,
        })).collect::<Vec<_>>(),
    }))
    .unwrap()
}

fn page(results: Vec<TmdbShow>) -> TmdbPage<TmdbShow> {
    TmdbPage {
        page: 1,
        total_results: results.len() as i32,
        total_pages: 1,
        results,
    }
}

/// Catalog served from memory. `fail_next` makes that many upcoming calls
/// fail with a network error.
#[derive(Default)]
pub struct FakeCatalog {
    pub trending: Vec<TmdbShow>,
    pub popular: Vec<TmdbShow>,
    pub top_rated: Vec<TmdbShow>,
    pub details: HashMap<i32, TmdbShow>,
    pub calls: AtomicUsize,
    pub fail_next: AtomicUsize,
    pub queries: Mutex<Vec<String>>,
}

impl FakeCatalog {
    fn enter(&self) -> CueResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(CueError::Network("connection reset".into()));
        }
        Ok(())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl CatalogApi for FakeCatalog {
    async fn trending(&self) -> CueResult<TmdbPage<TmdbShow>> {
        self.enter()?;
        Ok(page(self.trending.clone()))
    }

    async fn popular(&self, _page: u32) -> CueResult<TmdbPage<TmdbShow>> {
        self.enter()?;
        Ok(page(self.popular.clone()))
    }

    async fn top_rated(&self, _page: u32) -> CueResult<TmdbPage<TmdbShow>> {
        self.enter()?;
        Ok(page(self.top_rated.clone()))
    }

    async fn search(&self, query: &str, _page: u32) -> CueResult<TmdbPage<TmdbShow>> {
        self.enter()?;
        self.queries.lock().unwrap().push(query.to_string());
        let hits = self
            .popular
            .iter()
            .filter(|s| s.name.contains(query))
            .cloned()
            .collect();
        Ok(page(hits))
    }

    async fn details(&self, show_id: i32) -> CueResult<TmdbShow> {
        self.enter()?;
        self.details
            .get(&show_id)
            .cloned()
            .ok_or_else(|| CueError::NotFound(format!("show {show_id}")))
    }

    async fn season(&self, show_id: i32, _season: i32) -> CueResult<TmdbSeason> {
        self.enter()?;
        Err(CueError::NotFound(format!("season of {show_id}")))
    }

    async fn episode(&self, show_id: i32, _season: i32, _episode: i32) -> CueResult<TmdbEpisode> {
        self.enter()?;
        Err(CueError::NotFound(format!("episode of {show_id}")))
    }

    async fn genres(&self) -> CueResult<Vec<TmdbGenre>> {
        self.enter()?;
        Ok(vec![
            TmdbGenre { id: 18, name: "Drama".into() },
            TmdbGenre { id: 35, name: "Comedy".into() },
            TmdbGenre { id: 27, name: "Horror".into() },
        ])
    }

    async fn by_genre(&self, genre_id: i32, _page: u32) -> CueResult<TmdbPage<TmdbShow>> {
        self.enter()?;
        let hits = self
            .popular
            .iter()
            .filter(|s| s.genre_ids.contains(&genre_id))
            .cloned()
            .collect();
        Ok(page(hits))
    }

    async fn similar(&self, _show_id: i32) -> CueResult<TmdbPage<TmdbShow>> {
        self.enter()?;
        Ok(page(Vec::new()))
    }

    async fn recommendations(&self, _show_id: i32) -> CueResult<TmdbPage<TmdbShow>> {
        self.enter()?;
        Ok(page(Vec::new()))
    }

    async fn images(&self, _show_id: i32) -> CueResult<TmdbImages> {
        self.enter()?;
        Ok(TmdbImages {
            backdrops: Vec::new(),
            posters: Vec::new(),
        })
    }

    async fn videos(&self, _show_id: i32) -> CueResult<Vec<TmdbVideo>> {
        self.enter()?;
        Ok(Vec::new())
    }
}

/// The whole stack over in-memory backends and a fake catalog.
pub struct Harness {
    pub catalog: Arc<FakeCatalog>,
    pub store: MemoryStore,
    pub shows: Arc<TmdbShowRepository>,
    pub users: Arc<StoreUserRepository>,
    pub auth: Arc<IdentityAuthRepository>,
}

impl Harness {
    pub fn new(catalog: FakeCatalog) -> Self {
        let catalog = Arc::new(catalog);
        let store = MemoryStore::new();
        let shows = Arc::new(TmdbShowRepository::new(
            catalog.clone(),
            Duration::from_secs(60),
            100,
        ));
        let users = Arc::new(StoreUserRepository::new(Arc::new(store.clone())));
        let auth = Arc::new(IdentityAuthRepository::new(
            Arc::new(MemoryIdentity::new()),
            Arc::new(store.clone()),
        ));
        Self {
            catalog,
            store,
            shows,
            users,
            auth,
        }
    }

    pub fn services(&self) -> Services {
        Services {
            shows: self.shows.clone(),
            users: self.users.clone(),
            auth: self.auth.clone(),
        }
    }
}

/// Waits (bounded) until the published state satisfies `ready`.
pub async fn settle<S: Clone>(rx: &mut watch::Receiver<S>, ready: impl FnMut(&S) -> bool) -> S {
    let state = tokio::time::timeout(Duration::from_secs(2), rx.wait_for(ready))
        .await
        .expect("state did not settle in time")
        .expect("state holder dropped");
    state.clone()
}
