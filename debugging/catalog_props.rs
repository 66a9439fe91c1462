//! Fetch catalog records and print them as the app sees them after mapping.
//! Usage:
//!   cargo run --bin catalog_props -- show <tmdb_id>
//!   cargo run --bin catalog_props -- season <tmdb_id> <season_number>
//!   cargo run --bin catalog_props -- search <query...>
//! Requires TMDB_API_KEY in the environment (.env supported).

use anyhow::{Context, Result};
use cueview::config::Config;
use cueview::repository::{ShowRepository, TmdbShowRepository};
use cueview::tmdb::{image_url_at, ImageSize, TmdbClient};
use dotenvy::dotenv;
use serde_json::json;
use std::env;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Lookup {
    Show,
    Season,
    Search,
}

impl FromStr for Lookup {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "show" => Ok(Lookup::Show),
            "season" => Ok(Lookup::Season),
            "search" => Ok(Lookup::Search),
            _ => Err(anyhow::anyhow!("lookup must be 'show', 'season' or 'search'")),
        }
    }
}

fn usage() -> ! {
    eprintln!("Usage: cargo run --bin catalog_props -- show <tmdb_id>");
    eprintln!("       cargo run --bin catalog_props -- season <tmdb_id> <season_number>");
    eprintln!("       cargo run --bin catalog_props -- search <query...>");
    std::process::exit(1);
}

fn arg_number(args: &[String], index: usize, what: &str) -> Result<i32> {
    args.get(index)
        .ok_or_else(|| anyhow::anyhow!("missing {what}"))?
        .parse()
        .with_context(|| format!("{what} must be an integer"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        usage();
    }
    let lookup = Lookup::from_str(&args[1])?;

    dotenv().ok();
    let config = Config::from_env()?;
    let client = TmdbClient::new(&config).context("building catalog client")?;
    let shows = TmdbShowRepository::from_config(Arc::new(client), &config);
    let poster = |path: Option<&str>| {
        image_url_at(&config.tmdb_image_base_url, path, ImageSize::Original)
    };

    let output = match lookup {
        Lookup::Show => {
            let id = arg_number(&args, 2, "tmdb_id")?;
            let show = shows.show_details(id).await?;
            let videos = shows.show_videos(id).await.unwrap_or_default();
            let trailer = videos
                .iter()
                .find(|v| v.site == "YouTube" && v.video_type == "Trailer")
                .map(|v| format!("https://www.youtube.com/watch?v={}", v.key));
            json!({
                "show": show,
                "img": poster(show.poster_path.as_deref()),
                "backdrop": poster(show.backdrop_path.as_deref()),
                "trailer": trailer,
            })
        }
        Lookup::Season => {
            let id = arg_number(&args, 2, "tmdb_id")?;
            let number = arg_number(&args, 3, "season number")?;
            let season = shows.show_season(id, number).await?;
            let runtimes: Vec<i32> = season.episodes.iter().filter_map(|e| e.runtime).collect();
            let average_runtime = if runtimes.is_empty() {
                None
            } else {
                Some(runtimes.iter().sum::<i32>() / runtimes.len() as i32)
            };
            json!({
                "season": season,
                "img": poster(season.poster_path.as_deref()),
                "runtime_minutes": average_runtime,
            })
        }
        Lookup::Search => {
            let query = args[2..].join(" ");
            let found = shows.search_shows(&query, 1).await?;
            json!({ "query": query, "results": found })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
