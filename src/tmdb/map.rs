use chrono::NaiveDate;

use super::wire::{
    TmdbCreator, TmdbEpisode, TmdbGenre, TmdbImage, TmdbImages, TmdbNetwork, TmdbSeason,
    TmdbShow, TmdbVideo,
};
use crate::models::{
    Creator, Episode, Genre, ImageData, Network, Season, Show, ShowImages, Video,
};

/// TMDB dates are `YYYY-MM-DD`; anything else (including "") is treated as unknown.
pub fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

pub fn map_show(show: TmdbShow) -> Show {
    let genres = show
        .genres
        .map(|g| g.into_iter().map(map_genre).collect::<Vec<_>>());
    // Detail payloads carry genre objects instead of the id list.
    let genre_ids = if show.genre_ids.is_empty() {
        genres
            .as_ref()
            .map(|g| g.iter().map(|x| x.id).collect())
            .unwrap_or_default()
    } else {
        show.genre_ids
    };

    Show {
        id: show.id,
        name: show.name,
        overview: show.overview,
        poster_path: show.poster_path,
        backdrop_path: show.backdrop_path,
        first_air_date: parse_date(show.first_air_date.as_deref()),
        vote_average: show.vote_average,
        vote_count: show.vote_count,
        popularity: show.popularity,
        genre_ids,
        original_language: show.original_language,
        original_name: show.original_name,
        status: show.status,
        number_of_seasons: show.number_of_seasons,
        number_of_episodes: show.number_of_episodes,
        in_production: show.in_production,
        networks: show
            .networks
            .map(|n| n.into_iter().map(map_network).collect()),
        created_by: show
            .created_by
            .map(|c| c.into_iter().map(map_creator).collect()),
        genres,
        seasons: show.seasons.map(|s| s.into_iter().map(map_season).collect()),
    }
}

pub fn map_season(season: TmdbSeason) -> Season {
    let episodes: Vec<Episode> = season.episodes.into_iter().map(map_episode).collect();
    let episode_count = season
        .episode_count
        .unwrap_or(episodes.len() as i32);
    Season {
        id: season.id,
        name: season.name,
        overview: season.overview,
        poster_path: season.poster_path,
        season_number: season.season_number,
        episode_count,
        air_date: parse_date(season.air_date.as_deref()),
        episodes,
    }
}

pub fn map_episode(episode: TmdbEpisode) -> Episode {
    Episode {
        id: episode.id,
        name: episode.name,
        overview: episode.overview,
        still_path: episode.still_path,
        episode_number: episode.episode_number,
        season_number: episode.season_number,
        air_date: parse_date(episode.air_date.as_deref()),
        vote_average: episode.vote_average,
        vote_count: episode.vote_count,
        runtime: episode.runtime,
    }
}

pub fn map_genre(genre: TmdbGenre) -> Genre {
    Genre {
        id: genre.id,
        name: genre.name,
    }
}

fn map_network(network: TmdbNetwork) -> Network {
    Network {
        id: network.id,
        name: network.name,
        logo_path: network.logo_path,
        origin_country: network.origin_country,
    }
}

fn map_creator(creator: TmdbCreator) -> Creator {
    Creator {
        id: creator.id,
        name: creator.name,
        profile_path: creator.profile_path,
    }
}

pub fn map_images(images: TmdbImages) -> ShowImages {
    ShowImages {
        backdrops: images.backdrops.into_iter().map(map_image).collect(),
        posters: images.posters.into_iter().map(map_image).collect(),
    }
}

fn map_image(image: TmdbImage) -> ImageData {
    ImageData {
        file_path: image.file_path,
        width: image.width,
        height: image.height,
        aspect_ratio: image.aspect_ratio,
        vote_average: image.vote_average,
        vote_count: image.vote_count,
    }
}

pub fn map_video(video: TmdbVideo) -> Video {
    Video {
        id: video.id,
        key: video.key,
        name: video.name,
        site: video.site,
        video_type: video.video_type,
        official: video.official,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire_show(first_air_date: Option<&str>) -> TmdbShow {
        serde_json::from_value(serde_json::json!({
            "id": 1396,
            "name": "Breaking Bad",
            "overview": "A chemistry teacher...",
            "poster_path": "/ggFHVNu6YYI5L9pCfOacjizRGt.jpg",
            "backdrop_path": null,
            "first_air_date": first_air_date,
            "vote_average": 8.9,
            "vote_count": 14000,
            "popularity": 400.5,
            "genre_ids": [18, 80],
            "original_language": "en",
            "original_name": "Breaking Bad"
        }))
        .unwrap()
    }

    #[test]
    fn parses_well_formed_dates() {
        assert_eq!(
            parse_date(Some("2008-01-20")),
            NaiveDate::from_ymd_opt(2008, 1, 20)
        );
    }

    #[test]
    fn blank_missing_and_malformed_dates_are_absent() {
        assert_eq!(parse_date(None), None);
        assert_eq!(parse_date(Some("")), None);
        assert_eq!(parse_date(Some("   ")), None);
        assert_eq!(parse_date(Some("2008-13-45")), None);
        assert_eq!(parse_date(Some("20/01/2008")), None);
        assert_eq!(parse_date(Some("2008")), None);
    }

    #[test]
    fn malformed_date_does_not_fail_the_record() {
        let show = map_show(wire_show(Some("not a date")));
        assert_eq!(show.id, 1396);
        assert_eq!(show.first_air_date, None);
        assert_eq!(show.genre_ids, vec![18, 80]);
    }

    #[test]
    fn detail_genres_fill_genre_ids() {
        let wire: TmdbShow = serde_json::from_value(serde_json::json!({
            "id": 1399,
            "name": "Game of Thrones",
            "poster_path": null,
            "backdrop_path": null,
            "first_air_date": "2011-04-17",
            "genres": [{"id": 10765, "name": "Sci-Fi & Fantasy"}, {"id": 18, "name": "Drama"}],
            "number_of_episodes": 73,
            "seasons": [{
                "id": 3624, "name": "Season 1", "overview": "", "poster_path": null,
                "season_number": 1, "episode_count": 10, "air_date": ""
            }]
        }))
        .unwrap();
        let show = map_show(wire);
        assert_eq!(show.genre_ids, vec![10765, 18]);
        let seasons = show.seasons.unwrap();
        assert_eq!(seasons[0].episode_count, 10);
        assert_eq!(seasons[0].air_date, None);
    }

    #[test]
    fn season_without_count_uses_episode_list() {
        let wire: TmdbSeason = serde_json::from_value(serde_json::json!({
            "id": 3624,
            "name": "Season 1",
            "overview": "",
            "poster_path": null,
            "season_number": 1,
            "air_date": "2011-04-17",
            "episodes": [
                {"id": 1, "name": "Winter Is Coming", "overview": "", "still_path": null,
                 "episode_number": 1, "season_number": 1, "air_date": "2011-04-17",
                 "vote_average": 7.9, "vote_count": 300, "runtime": 62},
                {"id": 2, "name": "The Kingsroad", "overview": "", "still_path": null,
                 "episode_number": 2, "season_number": 1, "air_date": "bogus",
                 "vote_average": 7.7, "vote_count": 250, "runtime": null}
            ]
        }))
        .unwrap();
        let season = map_season(wire);
        assert_eq!(season.episode_count, 2);
        assert_eq!(season.episodes[1].air_date, None);
        assert_eq!(season.episodes[0].runtime, Some(62));
    }
}
