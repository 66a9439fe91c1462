use anyhow::{Context, Result};
use cueview::config::Config;
use cueview::identity::MemoryIdentity;
use cueview::models::{Show, UserPreferences};
use cueview::repository::{
    IdentityAuthRepository, ShowRepository, StoreUserRepository, TmdbShowRepository,
    UserRepository,
};
use cueview::store::MemoryStore;
use cueview::tmdb::{image_url_at, ImageSize, TmdbClient};
use cueview::usecase;
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEMO_EMAIL: &str = "demo@cueview.local";
const DEMO_PASSWORD: &str = "demo-password";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn print_list(config: &Config, title: &str, shows: &[Show]) {
    println!("\n== {title} ({}) ==", shows.len());
    for show in shows {
        let year = show
            .first_air_date
            .map(|d| d.format("%Y").to_string())
            .unwrap_or_else(|| "----".into());
        println!(
            "  {:>7}  {}  {:<40} {:.1}  {}",
            show.id,
            year,
            show.name,
            show.vote_average,
            image_url_at(
                &config.tmdb_image_base_url,
                show.poster_path.as_deref(),
                ImageSize::W342
            )
            .unwrap_or_default()
        );
    }
}

/// Signs a demo user up against in-memory backends, tracks the top trending
/// show and prints the personalized discover page.
#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    match dotenv() {
        Ok(path) => info!("Loaded environment from {:?}", path),
        Err(e) => warn!("No .env file loaded ({}) - relying on environment", e),
    }

    let config = Config::from_env()?;
    let client = TmdbClient::new(&config).context("building catalog client")?;
    let shows = TmdbShowRepository::from_config(Arc::new(client), &config);

    let store = Arc::new(MemoryStore::new());
    let users = StoreUserRepository::new(store.clone());
    let auth = IdentityAuthRepository::new(Arc::new(MemoryIdentity::new()), store);

    let profile = usecase::sign_up(&auth, DEMO_EMAIL, DEMO_PASSWORD, "").await?;
    info!(user = %profile.id, name = ?profile.display_name, "demo user signed up");

    let trending = usecase::trending_shows(&shows).await?;
    if let Some(first) = trending.first() {
        usecase::add_show_to_library(&users, &profile.id, first).await?;
        let details = shows.show_details(first.id).await?;
        users
            .update_preferences(
                &profile.id,
                &UserPreferences {
                    preferred_genres: details.genre_ids.clone(),
                    ..UserPreferences::default()
                },
            )
            .await?;
        info!(show = %details.name, "tracking the top trending show");
    }

    let page = usecase::personalized_recommendations(&shows, &users, &profile.id).await?;
    print_list(&config, "For you", &page.for_you);
    print_list(&config, "Trending", &page.trending);
    print_list(&config, "Popular", &page.popular);
    print_list(&config, "Top rated", &page.top_rated);
    let genres: Vec<&str> = page.genres.iter().map(|g| g.name.as_str()).collect();
    println!("\nGenres: {}", genres.join(", "));
    Ok(())
}
