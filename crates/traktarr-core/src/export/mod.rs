mod sink;
pub mod table;

pub use sink::{DeliveredFile, DirectorySink, FileSink, MemorySink};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::str::FromStr;
use thiserror::Error;
use tracing::{error, info};
use traktarr_models::{CollectionEntry, HistoryEntry, RatingEntry, Stats, WatchedEntry};

pub const JSON_MIME: &str = "application/json";
pub const CSV_MIME: &str = "text/csv";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to serialize export: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to deliver export file: {0}")]
    Delivery(#[from] io::Error),

    #[error("Failed to download CSV files")]
    CsvDownload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(ExportError::UnsupportedFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

/// Everything one export run gathered. Absent categories are left out of
/// the JSON document and produce no CSV file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<HistoryEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watched: Option<Vec<WatchedEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watched_movies: Option<Vec<WatchedEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watched_shows: Option<Vec<WatchedEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratings: Option<Vec<RatingEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<Vec<CollectionEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_movies: Option<Vec<CollectionEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_shows: Option<Vec<CollectionEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<Stats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
}

// Split lists win; otherwise the combined list is narrowed to one kind.
fn split_or_combined<'a, T>(
    split: &'a Option<Vec<T>>,
    combined: &'a Option<Vec<T>>,
    keep: fn(&T) -> bool,
) -> Vec<&'a T> {
    match split {
        Some(entries) => entries.iter().collect(),
        None => combined.iter().flatten().filter(|e| keep(*e)).collect(),
    }
}

impl ExportBundle {
    pub fn is_empty(&self) -> bool {
        self == &ExportBundle::default()
    }

    pub fn watched_movie_entries(&self) -> Vec<&WatchedEntry> {
        split_or_combined(&self.watched_movies, &self.watched, WatchedEntry::is_movie)
    }

    pub fn watched_show_entries(&self) -> Vec<&WatchedEntry> {
        split_or_combined(&self.watched_shows, &self.watched, WatchedEntry::is_show)
    }

    pub fn collection_movie_entries(&self) -> Vec<&CollectionEntry> {
        split_or_combined(
            &self.collection_movies,
            &self.collection,
            CollectionEntry::is_movie,
        )
    }

    pub fn collection_show_entries(&self) -> Vec<&CollectionEntry> {
        split_or_combined(
            &self.collection_shows,
            &self.collection,
            CollectionEntry::is_show,
        )
    }
}

/// Serialize `bundle` and hand the resulting file(s) to `sink`.
///
/// Returns the delivered file names in delivery order.
pub fn export_data(
    bundle: &ExportBundle,
    format: ExportFormat,
    filename_base: &str,
    sink: &dyn FileSink,
) -> Result<Vec<String>, ExportError> {
    match format {
        ExportFormat::Json => export_json(bundle, filename_base, sink),
        ExportFormat::Csv => export_csv(bundle, filename_base, sink).map_err(|e| {
            error!("CSV export failed: {:#}", e);
            ExportError::CsvDownload
        }),
    }
}

fn json_filename(base: &str) -> String {
    if base.ends_with(".json") {
        base.to_string()
    } else {
        format!("{}.json", base)
    }
}

fn export_json(
    bundle: &ExportBundle,
    filename_base: &str,
    sink: &dyn FileSink,
) -> Result<Vec<String>, ExportError> {
    let content = serde_json::to_string_pretty(bundle)?;
    let filename = json_filename(filename_base);
    sink.deliver(&content, JSON_MIME, &filename)?;
    info!(file = %filename, bytes = content.len(), "Exported JSON");
    Ok(vec![filename])
}

fn export_csv(
    bundle: &ExportBundle,
    filename_base: &str,
    sink: &dyn FileSink,
) -> anyhow::Result<Vec<String>> {
    let mut tables: Vec<(&str, &[&str], Vec<Vec<String>>)> = Vec::new();

    if let Some(history) = bundle.history.as_deref() {
        tables.push(("history", table::HISTORY_HEADER, table::history_rows(history)));
    }
    tables.push((
        "watched-movies",
        table::WATCHED_MOVIES_HEADER,
        table::watched_movie_rows(bundle.watched_movie_entries()),
    ));
    tables.push((
        "watched-shows",
        table::WATCHED_SHOWS_HEADER,
        table::watched_show_rows(bundle.watched_show_entries()),
    ));
    if let Some(ratings) = bundle.ratings.as_deref() {
        tables.push(("ratings", table::RATINGS_HEADER, table::rating_rows(ratings)));
    }
    tables.push((
        "collection-movies",
        table::COLLECTION_HEADER,
        table::collection_rows(bundle.collection_movie_entries()),
    ));
    tables.push((
        "collection-shows",
        table::COLLECTION_HEADER,
        table::collection_rows(bundle.collection_show_entries()),
    ));
    if let Some(stats) = &bundle.stats {
        tables.push(("stats", table::STATS_HEADER, table::stats_rows(stats)));
    }

    let mut delivered = Vec::new();
    for (category, header, rows) in tables {
        if rows.is_empty() {
            continue;
        }
        let content = table::render(header, &rows)?;
        let filename = format!("{}-{}.csv", filename_base, category);
        sink.deliver(&content, CSV_MIME, &filename)?;
        info!(file = %filename, rows = rows.len(), "Exported CSV");
        delivered.push(filename);
    }
    Ok(delivered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    struct FailingSink;

    impl FileSink for FailingSink {
        fn deliver(&self, _: &str, _: &str, _: &str) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        }
    }

    fn history_json() -> Value {
        json!([
            {
                "id": 1,
                "watched_at": "2024-01-02T20:00:00.000Z",
                "action": "watch",
                "type": "movie",
                "movie": { "title": "Heat", "year": 1995, "ids": { "trakt": 3 } }
            },
            {
                "id": 2,
                "watched_at": "2024-01-03T20:00:00.000Z",
                "action": "scrobble",
                "type": "episode",
                "show": { "title": "Lost", "year": 2004, "ids": { "trakt": 4 } },
                "episode": { "season": 1, "number": 1, "title": "Pilot", "ids": { "trakt": 5 } }
            }
        ])
    }

    #[test]
    fn test_json_export_round_trips_history() {
        let bundle = ExportBundle {
            history: Some(serde_json::from_value(history_json()).unwrap()),
            ..ExportBundle::default()
        };
        let sink = MemorySink::new();
        let files = export_data(&bundle, ExportFormat::Json, "trakt-export", &sink).unwrap();
        assert_eq!(files, vec!["trakt-export.json"]);

        let file = sink.get("trakt-export.json").unwrap();
        assert_eq!(file.mime_type, JSON_MIME);
        assert!(file.content.contains("\n  \"history\": ["));

        let parsed: Value = serde_json::from_str(&file.content).unwrap();
        assert_eq!(parsed, json!({ "history": history_json() }));

        let restored: ExportBundle = serde_json::from_str(&file.content).unwrap();
        assert_eq!(restored, bundle);
    }

    #[test]
    fn test_json_extension_appended_once() {
        let sink = MemorySink::new();
        let bundle = ExportBundle::default();
        export_data(&bundle, ExportFormat::Json, "backup.json", &sink).unwrap();
        export_data(&bundle, ExportFormat::Json, "backup", &sink).unwrap();
        let names: Vec<_> = sink.files().into_iter().map(|f| f.filename).collect();
        assert_eq!(names, vec!["backup.json", "backup.json"]);
    }

    #[test]
    fn test_csv_ratings_scenario() {
        let bundle = ExportBundle {
            ratings: Some(
                serde_json::from_value(json!([{
                    "type": "movie",
                    "rating": 8,
                    "rated_at": "2024-01-01",
                    "movie": { "title": "X", "year": 2020, "ids": { "trakt": 1, "imdb": "tt1" } }
                }]))
                .unwrap(),
            ),
            ..ExportBundle::default()
        };
        let sink = MemorySink::new();
        let files = export_data(&bundle, ExportFormat::Csv, "base", &sink).unwrap();
        assert_eq!(files, vec!["base-ratings.csv"]);

        let file = sink.get("base-ratings.csv").unwrap();
        assert_eq!(file.mime_type, CSV_MIME);
        let mut reader = csv::Reader::from_reader(file.content.as_bytes());
        let rows: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].iter().collect::<Vec<_>>().join(","),
            "movie,X,8,2024-01-01,2020,,,,1,tt1"
        );
    }

    #[test]
    fn test_csv_skips_empty_categories_and_splits_combined_lists() {
        let watched: Vec<WatchedEntry> = serde_json::from_value(json!([
            { "plays": 1, "movie": { "title": "Heat", "ids": {} } },
            { "plays": 1, "show": { "title": "Lost", "ids": {} } }
        ]))
        .unwrap();
        let bundle = ExportBundle {
            history: Some(Vec::new()),
            watched: Some(watched),
            stats: Some(Stats::default()),
            ..ExportBundle::default()
        };
        let sink = MemorySink::new();
        let files = export_data(&bundle, ExportFormat::Csv, "base", &sink).unwrap();
        // the show has no seasons, so there is nothing to flatten
        assert_eq!(files, vec!["base-watched-movies.csv", "base-stats.csv"]);
    }

    #[test]
    fn test_delivery_failures() {
        let bundle = ExportBundle {
            stats: Some(Stats::default()),
            ..ExportBundle::default()
        };

        let err = export_data(&bundle, ExportFormat::Csv, "base", &FailingSink).unwrap_err();
        assert!(matches!(err, ExportError::CsvDownload));
        assert_eq!(err.to_string(), "Failed to download CSV files");

        let err = export_data(&bundle, ExportFormat::Json, "base", &FailingSink).unwrap_err();
        match err {
            ExportError::Delivery(io_err) => {
                assert_eq!(io_err.kind(), io::ErrorKind::PermissionDenied)
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("csv".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        let err = "xml".parse::<ExportFormat>().unwrap_err();
        assert_eq!(err.to_string(), "Unsupported export format: xml");
    }
}
