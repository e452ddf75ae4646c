// Flattening of record unions into CSV tables

use anyhow::{anyhow, Result};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use traktarr_models::{
    CollectionEntry, HistoryEntry, HistoryItem, Ids, Movie, RatedItem, RatingEntry, Show, Stats,
    WatchedEntry,
};

pub const HISTORY_HEADER: &[&str] = &[
    "ID",
    "Type",
    "Title",
    "Season",
    "Episode Number",
    "Episode Title",
    "Show Title",
    "Year",
    "Watched At",
    "Trakt ID",
    "IMDB ID",
    "TMDB ID",
    "Runtime",
    "Genres",
];

pub const WATCHED_MOVIES_HEADER: &[&str] = &[
    "Movie Title",
    "Year",
    "Plays",
    "Last Watched",
    "Runtime (min)",
    "Genres",
    "Trakt ID",
    "IMDB ID",
    "TMDB ID",
];

pub const WATCHED_SHOWS_HEADER: &[&str] = &[
    "Show Title",
    "Show Year",
    "Season",
    "Episode",
    "Episode Title",
    "Plays",
    "Last Watched",
    "Trakt ID",
    "IMDB ID",
];

pub const RATINGS_HEADER: &[&str] = &[
    "Type",
    "Title",
    "Rating",
    "Rated At",
    "Year",
    "Season",
    "Episode",
    "Show Title",
    "Trakt ID",
    "IMDB ID",
];

pub const COLLECTION_HEADER: &[&str] = &[
    "Type",
    "Title",
    "Year",
    "Collected At",
    "Trakt ID",
    "IMDB ID",
    "TMDB ID",
    "Runtime",
    "Genres",
];

pub const STATS_HEADER: &[&str] = &["Category", "Metric", "Value"];

const UNKNOWN_TITLE: &str = "Unknown";

type Row = Vec<String>;

/// Render a header and rows as CSV text.
///
/// Fields holding a comma, quote or line break are quoted with inner quotes
/// doubled; everything else is written bare.
pub fn render(header: &[&str], rows: &[Row]) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to flush CSV buffer: {}", e.error()))?;
    Ok(String::from_utf8(bytes)?)
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn title_or_unknown(title: Option<&str>) -> String {
    title.unwrap_or(UNKNOWN_TITLE).to_string()
}

fn join_genres(genres: Option<&[String]>) -> String {
    genres.map(|g| g.join(", ")).unwrap_or_default()
}

fn trakt(ids: &Ids) -> String {
    opt(ids.trakt)
}

fn imdb(ids: &Ids) -> String {
    opt(ids.imdb.as_deref())
}

fn tmdb(ids: &Ids) -> String {
    opt(ids.tmdb)
}

pub fn history_rows(entries: &[HistoryEntry]) -> Vec<Row> {
    entries
        .iter()
        .map(|entry| match &entry.item {
            HistoryItem::Movie(movie) => vec![
                entry.id.to_string(),
                "movie".to_string(),
                title_or_unknown(movie.title.as_deref()),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                opt(movie.year),
                entry.watched_at.clone(),
                trakt(&movie.ids),
                imdb(&movie.ids),
                tmdb(&movie.ids),
                opt(movie.runtime),
                join_genres(movie.genres.as_deref()),
            ],
            HistoryItem::Episode { show, episode } => {
                let episode_title = opt(episode.title.as_deref());
                vec![
                    entry.id.to_string(),
                    "episode".to_string(),
                    episode_title.clone(),
                    episode.season.to_string(),
                    episode.number.to_string(),
                    episode_title,
                    title_or_unknown(show.title.as_deref()),
                    opt(show.year),
                    entry.watched_at.clone(),
                    trakt(&episode.ids),
                    imdb(&show.ids),
                    tmdb(&episode.ids),
                    opt(episode.runtime.or(show.runtime)),
                    join_genres(show.genres.as_deref()),
                ]
            }
        })
        .collect()
}

pub fn watched_movie_rows<'a, I>(entries: I) -> Vec<Row>
where
    I: IntoIterator<Item = &'a WatchedEntry>,
{
    entries
        .into_iter()
        .filter_map(|entry| match entry {
            WatchedEntry::Movie {
                movie,
                plays,
                last_watched_at,
                ..
            } => Some(vec![
                title_or_unknown(movie.title.as_deref()),
                opt(movie.year),
                plays.to_string(),
                opt(last_watched_at.as_deref()),
                opt(movie.runtime),
                join_genres(movie.genres.as_deref()),
                trakt(&movie.ids),
                imdb(&movie.ids),
                tmdb(&movie.ids),
            ]),
            WatchedEntry::Show { .. } => None,
        })
        .collect()
}

/// One row per watched episode. Shows without season detail produce nothing.
pub fn watched_show_rows<'a, I>(entries: I) -> Vec<Row>
where
    I: IntoIterator<Item = &'a WatchedEntry>,
{
    let mut rows = Vec::new();
    for entry in entries {
        let (Some(show), Some(seasons)) = (entry.as_show(), entry.seasons()) else {
            continue;
        };
        for season in seasons {
            for episode in &season.episodes {
                rows.push(vec![
                    title_or_unknown(show.title.as_deref()),
                    opt(show.year),
                    season.number.to_string(),
                    episode.number.to_string(),
                    String::new(),
                    episode.plays.to_string(),
                    opt(episode.last_watched_at.as_deref()),
                    trakt(&show.ids),
                    imdb(&show.ids),
                ]);
            }
        }
    }
    rows
}

fn titled_rating_row(kind: &str, rating: &RatingEntry, title: Option<&str>, year: Option<u32>, ids: &Ids) -> Row {
    vec![
        kind.to_string(),
        title_or_unknown(title),
        rating.rating.to_string(),
        rating.rated_at.clone(),
        opt(year),
        String::new(),
        String::new(),
        String::new(),
        trakt(ids),
        imdb(ids),
    ]
}

pub fn rating_rows(entries: &[RatingEntry]) -> Vec<Row> {
    entries
        .iter()
        .map(|entry| match &entry.item {
            RatedItem::Movie(Movie {
                title, year, ids, ..
            }) => titled_rating_row("movie", entry, title.as_deref(), *year, ids),
            RatedItem::Show(Show {
                title, year, ids, ..
            }) => titled_rating_row("show", entry, title.as_deref(), *year, ids),
            RatedItem::Season { show, season } => vec![
                "season".to_string(),
                format!("Season {}", season.number),
                entry.rating.to_string(),
                entry.rated_at.clone(),
                opt(show.year),
                season.number.to_string(),
                String::new(),
                title_or_unknown(show.title.as_deref()),
                trakt(&season.ids),
                imdb(&show.ids),
            ],
            RatedItem::Episode { show, episode } => vec![
                "episode".to_string(),
                title_or_unknown(episode.title.as_deref()),
                entry.rating.to_string(),
                entry.rated_at.clone(),
                opt(show.year),
                episode.season.to_string(),
                episode.number.to_string(),
                title_or_unknown(show.title.as_deref()),
                trakt(&episode.ids),
                imdb(&show.ids),
            ],
        })
        .collect()
}

pub fn collection_rows<'a, I>(entries: I) -> Vec<Row>
where
    I: IntoIterator<Item = &'a CollectionEntry>,
{
    entries
        .into_iter()
        .map(|entry| match entry {
            CollectionEntry::Movie {
                movie,
                collected_at,
                ..
            } => vec![
                "movie".to_string(),
                title_or_unknown(movie.title.as_deref()),
                opt(movie.year),
                opt(collected_at.as_deref()),
                trakt(&movie.ids),
                imdb(&movie.ids),
                tmdb(&movie.ids),
                opt(movie.runtime),
                join_genres(movie.genres.as_deref()),
            ],
            CollectionEntry::Show { show, .. } => vec![
                "show".to_string(),
                title_or_unknown(show.title.as_deref()),
                opt(show.year),
                String::new(),
                trakt(&show.ids),
                imdb(&show.ids),
                tmdb(&show.ids),
                opt(show.runtime),
                join_genres(show.genres.as_deref()),
            ],
        })
        .collect()
}

pub fn stats_rows(stats: &Stats) -> Vec<Row> {
    let metrics: [(&str, &str, u64); 19] = [
        ("Movies", "Plays", stats.movies.plays),
        ("Movies", "Watched", stats.movies.watched),
        ("Movies", "Minutes", stats.movies.minutes),
        ("Movies", "Collected", stats.movies.collected),
        ("Movies", "Ratings", stats.movies.ratings),
        ("Movies", "Comments", stats.movies.comments),
        ("Shows", "Watched", stats.shows.watched),
        ("Shows", "Collected", stats.shows.collected),
        ("Shows", "Ratings", stats.shows.ratings),
        ("Shows", "Comments", stats.shows.comments),
        ("Episodes", "Plays", stats.episodes.plays),
        ("Episodes", "Watched", stats.episodes.watched),
        ("Episodes", "Minutes", stats.episodes.minutes),
        ("Episodes", "Collected", stats.episodes.collected),
        ("Episodes", "Ratings", stats.episodes.ratings),
        ("Episodes", "Comments", stats.episodes.comments),
        ("Network", "Friends", stats.network.friends),
        ("Network", "Followers", stats.network.followers),
        ("Network", "Following", stats.network.following),
    ];

    let mut rows: Vec<Row> = metrics
        .iter()
        .map(|(category, metric, value)| {
            vec![category.to_string(), metric.to_string(), value.to_string()]
        })
        .collect();

    rows.extend(stats.ratings.distribution.iter().map(|(stars, count)| {
        vec![
            "Ratings".to_string(),
            format!("{}/10 Stars", stars),
            count.to_string(),
        ]
    }));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lines(text: &str) -> Vec<&str> {
        text.lines().collect()
    }

    #[test]
    fn test_escapes_quotes_and_commas() {
        let text = render(&["Title"], &[vec![r#"Say "Hi", Bye"#.to_string()]]).unwrap();
        assert_eq!(lines(&text), vec!["Title", r#""Say ""Hi"", Bye""#]);

        let text = render(&["A", "B"], &[vec!["line\nbreak".to_string(), String::new()]]).unwrap();
        assert_eq!(text, "A,B\n\"line\nbreak\",\n");
    }

    #[test]
    fn test_history_rows_for_movie_and_episode() {
        let entries: Vec<HistoryEntry> = serde_json::from_value(json!([
            {
                "id": 11,
                "watched_at": "2024-01-02T20:00:00.000Z",
                "type": "movie",
                "movie": {
                    "title": "Heat",
                    "year": 1995,
                    "runtime": 170,
                    "genres": ["crime", "drama"],
                    "ids": { "trakt": 3, "imdb": "tt0113277", "tmdb": 949 }
                }
            },
            {
                "id": 12,
                "watched_at": "2024-01-03T20:00:00.000Z",
                "type": "episode",
                "show": {
                    "title": "Breaking Bad",
                    "year": 2008,
                    "runtime": 45,
                    "genres": ["drama"],
                    "ids": { "trakt": 1388, "imdb": "tt0903747", "tmdb": 1396 }
                },
                "episode": { "season": 0, "number": 1, "ids": { "trakt": 73482, "tmdb": 62085 } }
            }
        ]))
        .unwrap();

        let text = render(HISTORY_HEADER, &history_rows(&entries)).unwrap();
        assert_eq!(
            lines(&text),
            vec![
                "ID,Type,Title,Season,Episode Number,Episode Title,Show Title,Year,Watched At,Trakt ID,IMDB ID,TMDB ID,Runtime,Genres",
                "11,movie,Heat,,,,,1995,2024-01-02T20:00:00.000Z,3,tt0113277,949,170,\"crime, drama\"",
                "12,episode,,0,1,,Breaking Bad,2008,2024-01-03T20:00:00.000Z,73482,tt0903747,62085,45,drama",
            ]
        );
    }

    #[test]
    fn test_rating_rows_branch_on_kind() {
        let entries: Vec<RatingEntry> = serde_json::from_value(json!([
            {
                "type": "movie",
                "rating": 8,
                "rated_at": "2024-01-01",
                "movie": { "title": "X", "year": 2020, "ids": { "trakt": 1, "imdb": "tt1" } }
            },
            {
                "type": "season",
                "rating": 9,
                "rated_at": "2024-02-01",
                "show": { "title": "The Wire", "year": 2002, "ids": { "trakt": 10, "imdb": "tt0306414" } },
                "season": { "number": 2, "ids": { "trakt": 77 } }
            },
            {
                "type": "episode",
                "rating": 10,
                "rated_at": "2024-03-01",
                "show": { "year": 2002, "ids": { "imdb": "tt0306414" } },
                "episode": { "season": 3, "number": 4, "title": "Hamsterdam", "ids": { "trakt": 88 } }
            }
        ]))
        .unwrap();

        let text = render(RATINGS_HEADER, &rating_rows(&entries)).unwrap();
        assert_eq!(
            lines(&text)[1..],
            [
                "movie,X,8,2024-01-01,2020,,,,1,tt1",
                "season,Season 2,9,2024-02-01,2002,2,,The Wire,77,tt0306414",
                "episode,Hamsterdam,10,2024-03-01,2002,3,4,Unknown,88,tt0306414",
            ]
        );
    }

    #[test]
    fn test_watched_rows_split_by_kind() {
        let entries: Vec<WatchedEntry> = serde_json::from_value(json!([
            {
                "plays": 2,
                "last_watched_at": "2024-01-01T00:00:00.000Z",
                "movie": { "title": "Heat", "year": 1995, "ids": { "trakt": 3 } }
            },
            {
                "plays": 3,
                "show": { "title": "Lost", "year": 2004, "ids": { "trakt": 4, "imdb": "tt0411008" } },
                "seasons": [
                    { "number": 1, "episodes": [
                        { "number": 1, "plays": 1, "last_watched_at": "2024-02-01T00:00:00.000Z" },
                        { "number": 2, "plays": 2 }
                    ] }
                ]
            },
            {
                "plays": 1,
                "show": { "title": "No Seasons", "ids": {} }
            }
        ]))
        .unwrap();

        let movies = watched_movie_rows(&entries);
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0][..4], ["Heat", "1995", "2", "2024-01-01T00:00:00.000Z"]);

        let shows = watched_show_rows(&entries);
        assert_eq!(
            shows,
            vec![
                vec!["Lost", "2004", "1", "1", "", "1", "2024-02-01T00:00:00.000Z", "4", "tt0411008"],
                vec!["Lost", "2004", "1", "2", "", "2", "", "4", "tt0411008"],
            ]
        );
    }

    #[test]
    fn test_collection_show_rows_leave_collected_at_blank() {
        let entries: Vec<CollectionEntry> = serde_json::from_value(json!([
            { "collected_at": "2023-05-05T00:00:00.000Z", "movie": { "ids": { "tmdb": 5 } } },
            { "last_collected_at": "2023-06-06T00:00:00.000Z", "show": { "title": "Lost", "year": 2004, "ids": {} } }
        ]))
        .unwrap();

        let rows = collection_rows(&entries);
        assert_eq!(rows[0], vec!["movie", "Unknown", "", "2023-05-05T00:00:00.000Z", "", "", "5", "", ""]);
        assert_eq!(rows[1], vec!["show", "Lost", "2004", "", "", "", "", "", ""]);
    }

    #[test]
    fn test_stats_rows_include_distribution() {
        let stats: Stats = serde_json::from_value(json!({
            "movies": { "plays": 155, "watched": 114, "minutes": 15650 },
            "network": { "friends": 1 },
            "ratings": { "total": 3, "distribution": { "10": 1, "8": 2 } }
        }))
        .unwrap();

        let rows = stats_rows(&stats);
        assert_eq!(rows.len(), 21);
        assert_eq!(rows[0], vec!["Movies", "Plays", "155"]);
        assert_eq!(rows[6], vec!["Shows", "Watched", "0"]);
        assert_eq!(rows[16], vec!["Network", "Friends", "1"]);
        assert_eq!(rows[19], vec!["Ratings", "8/10 Stars", "2"]);
        assert_eq!(rows[20], vec!["Ratings", "10/10 Stars", "1"]);
    }
}
