use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use cueview::config::Config;
use cueview::error::{CueError, ErrorKind};
use cueview::repository::{ShowRepository, TmdbShowRepository};
use cueview::tmdb::{CatalogApi, TmdbClient};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const API_KEY: &str = "test-key";

#[derive(Clone, Default)]
struct Fixture {
    detail_hits: Arc<AtomicUsize>,
}

fn authorized(params: &HashMap<String, String>) -> Result<(), Response> {
    if params.get("api_key").map(String::as_str) == Some(API_KEY) {
        return Ok(());
    }
    let body = Json(json!({"status_code": 7, "status_message": "Invalid API key"}));
    Err((StatusCode::UNAUTHORIZED, body).into_response())
}

async fn trending(Query(params): Query<HashMap<String, String>>) -> Response {
    if let Err(denied) = authorized(&params) {
        return denied;
    }
    Json(json!({
        "page": 1,
        "total_pages": 1,
        "total_results": 2,
        "results": [
            {
                "id": 1396,
                "name": "Breaking Bad",
                "poster_path": "/bb.jpg",
                "first_air_date": "2008-01-20",
                "vote_average": 8.9,
                "genre_ids": [18, 80],
                "popularity": 300.5
            },
            {
                "id": 7,
                "name": "Unaired",
                "poster_path": null,
                "first_air_date": "",
                "genre_ids": []
            }
        ]
    }))
    .into_response()
}

async fn details(
    State(fixture): State<Fixture>,
    Path(id): Path<i32>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(denied) = authorized(&params) {
        return denied;
    }
    fixture.detail_hits.fetch_add(1, Ordering::SeqCst);
    match id {
        1396 => Json(json!({
            "id": 1396,
            "name": "Breaking Bad",
            "first_air_date": "2008-01-20",
            "genres": [{"id": 18, "name": "Drama"}, {"id": 80, "name": "Crime"}],
            "number_of_seasons": 1,
            "number_of_episodes": 7,
            "seasons": [{"id": 3572, "name": "Season 1", "season_number": 1, "episode_count": 7}]
        }))
        .into_response(),
        13 => (StatusCode::OK, "{\"id\": \"not a number\"").into_response(),
        408 => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            (StatusCode::OK, "{}").into_response()
        }
        500 => (StatusCode::INTERNAL_SERVER_ERROR, "upstream down").into_response(),
        _ => {
            let body = Json(json!({"status_code": 34, "status_message": "not found"}));
            (StatusCode::NOT_FOUND, body).into_response()
        }
    }
}

async fn season(
    Path((_id, number)): Path<(i32, i32)>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(denied) = authorized(&params) {
        return denied;
    }
    Json(json!({
        "id": 3572,
        "name": format!("Season {number}"),
        "season_number": number,
        "air_date": "2008-01-20",
        "episodes": [
            {"id": 62085, "name": "Pilot", "episode_number": 1, "season_number": number, "runtime": 58},
            {"id": 62086, "name": "Cat's in the Bag...", "episode_number": 2, "season_number": number}
        ]
    }))
    .into_response()
}

async fn serve(fixture: Fixture) -> String {
    let app = Router::new()
        .route("/3/trending/tv/week", get(trending))
        .route("/3/tv/:id", get(details))
        .route("/3/tv/:id/season/:season", get(season))
        .with_state(fixture);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/3")
}

fn client(base_url: &str, api_key: &str) -> TmdbClient {
    TmdbClient::new(&Config::with_base_url(api_key, base_url)).unwrap()
}

#[tokio::test]
async fn trending_page_maps_blank_dates_to_unknown() {
    let base = serve(Fixture::default()).await;
    let repo = TmdbShowRepository::new(
        Arc::new(client(&base, API_KEY)),
        Duration::from_secs(60),
        10,
    );

    let shows = repo.trending_shows().await.unwrap();
    assert_eq!(shows.len(), 2);
    assert_eq!(shows[0].name, "Breaking Bad");
    assert_eq!(
        shows[0].first_air_date,
        chrono::NaiveDate::from_ymd_opt(2008, 1, 20)
    );
    assert_eq!(shows[0].genre_ids, vec![18, 80]);
    assert_eq!(shows[1].first_air_date, None);
    assert_eq!(shows[1].vote_average, 0.0);
}

#[tokio::test]
async fn wrong_api_key_is_unauthorized() {
    let base = serve(Fixture::default()).await;
    let err = client(&base, "wrong").trending().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn status_codes_become_error_kinds() {
    let base = serve(Fixture::default()).await;
    let api = client(&base, API_KEY);

    let missing = api.details(99).await.unwrap_err();
    assert!(matches!(missing, CueError::NotFound(_)));

    let down = api.details(500).await.unwrap_err();
    assert!(matches!(down, CueError::Api { status: 500, .. }));
    assert!(down.is_retryable());

    let garbled = api.details(13).await.unwrap_err();
    assert_eq!(garbled.kind(), ErrorKind::Decode);
    assert!(!garbled.is_retryable());
}

#[tokio::test]
async fn season_without_count_uses_its_episodes() {
    let base = serve(Fixture::default()).await;
    let repo = TmdbShowRepository::new(
        Arc::new(client(&base, API_KEY)),
        Duration::from_secs(60),
        10,
    );

    let season = repo.show_season(1396, 1).await.unwrap();
    assert_eq!(season.episode_count, 2);
    assert_eq!(season.episodes[0].runtime, Some(58));
    assert_eq!(season.episodes[1].runtime, None);
}

#[tokio::test]
async fn details_are_fetched_once_while_fresh() {
    let fixture = Fixture::default();
    let base = serve(fixture.clone()).await;
    let repo = TmdbShowRepository::new(
        Arc::new(client(&base, API_KEY)),
        Duration::from_secs(60),
        10,
    );

    let first = repo.show_details(1396).await.unwrap();
    let second = repo.show_details(1396).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.genre_ids, vec![18, 80]);
    assert_eq!(first.seasons.as_ref().map(Vec::len), Some(1));
    assert_eq!(fixture.detail_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unreachable_host_is_a_retryable_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{addr}/3"), API_KEY)
        .trending()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(err.is_retryable());
}

#[tokio::test]
async fn slow_responses_time_out() {
    let base = serve(Fixture::default()).await;
    let mut config = Config::with_base_url(API_KEY, base);
    config.request_timeout_secs = 1;
    let api = TmdbClient::new(&config).unwrap();

    let err = api.details(408).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(err.is_retryable());
}
