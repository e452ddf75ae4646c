use crate::export::{DateRange, ExportBundle, ExportError, ExportFormat};
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use tracing::{debug, info};
use traktarr_api::{format_api_date, ListKind, PageQuery, TraktError, TraktService};
use traktarr_config::ExportConfig;

#[derive(Error, Debug)]
pub enum CollectError {
    #[error(transparent)]
    Trakt(#[from] TraktError),
}

/// Which categories to gather for one export run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub include_history: bool,
    pub include_watched: bool,
    pub include_ratings: bool,
    pub include_collection: bool,
    pub include_stats: bool,
    /// Only applies to history.
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Json,
            include_history: true,
            include_watched: true,
            include_ratings: true,
            include_collection: true,
            include_stats: true,
            start_date: None,
            end_date: None,
        }
    }
}

impl ExportOptions {
    pub fn from_config(config: &ExportConfig) -> Result<Self, ExportError> {
        Ok(Self {
            format: config.format.parse()?,
            include_history: config.include_history,
            include_watched: config.include_watched,
            include_ratings: config.include_ratings,
            include_collection: config.include_collection,
            include_stats: config.include_stats,
            start_date: None,
            end_date: None,
        })
    }

    fn date_range(&self) -> Option<DateRange> {
        if self.start_date.is_none() && self.end_date.is_none() {
            return None;
        }
        Some(DateRange {
            start_date: self.start_date.as_ref().map(format_api_date),
            end_date: self.end_date.as_ref().map(format_api_date),
        })
    }
}

/// `<prefix>-<YYYY-MM-DD>`
pub fn default_filename_base(prefix: &str, date: NaiveDate) -> String {
    format!("{}-{}", prefix, date.format("%Y-%m-%d"))
}

/// Fetch every requested category into one bundle.
///
/// Movie and show lists are fetched concurrently. CSV bundles keep them
/// apart; JSON bundles store one combined list per category.
pub async fn collect_bundle(
    service: &TraktService,
    options: &ExportOptions,
) -> Result<ExportBundle, CollectError> {
    let mut bundle = ExportBundle::default();
    let split = options.format == ExportFormat::Csv;

    if options.include_history {
        let query = PageQuery {
            start_date: options.start_date,
            end_date: options.end_date,
            ..PageQuery::default()
        };
        let history = service.get_all_history(&query).await?;
        debug!("Collected {} history entries", history.len());
        bundle.history = Some(history);
    }

    if options.include_watched {
        let (movies, shows) = futures::try_join!(
            service.get_watched(ListKind::Movies),
            service.get_watched(ListKind::Shows)
        )?;
        debug!(movies = movies.len(), shows = shows.len(), "Collected watched");
        if split {
            bundle.watched_movies = Some(movies);
            bundle.watched_shows = Some(shows);
        } else {
            bundle.watched = Some(movies.into_iter().chain(shows).collect());
        }
    }

    if options.include_ratings {
        bundle.ratings = Some(service.get_ratings(None, None).await?);
    }

    if options.include_collection {
        let (movies, shows) = futures::try_join!(
            service.get_collection(ListKind::Movies),
            service.get_collection(ListKind::Shows)
        )?;
        debug!(movies = movies.len(), shows = shows.len(), "Collected collection");
        if split {
            bundle.collection_movies = Some(movies);
            bundle.collection_shows = Some(shows);
        } else {
            bundle.collection = Some(movies.into_iter().chain(shows).collect());
        }
    }

    if options.include_stats {
        bundle.stats = Some(service.get_stats().await?);
    }

    bundle.date_range = options.date_range();
    info!(format = %options.format, "Collected export bundle");
    Ok(bundle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;
    use std::sync::Arc;
    use traktarr_api::{TokenAuth, TraktSettings};
    use traktarr_config::{KeyValueStore, MemoryStore};

    fn service(server: &ServerGuard) -> TraktService {
        let store = Arc::new(MemoryStore::new());
        store.set_trakt_access_token("token").unwrap();
        store
            .set_trakt_token_expires(Utc::now() + Duration::hours(1))
            .unwrap();
        let settings = TraktSettings::new("client", "secret").with_api_url(server.url());
        TraktService::new(settings, Arc::new(TokenAuth::new(store))).unwrap()
    }

    async fn mock_list(server: &mut ServerGuard, path: &str, body: serde_json::Value) -> mockito::Mock {
        server
            .mock("GET", path)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await
    }

    fn watched_bodies() -> (serde_json::Value, serde_json::Value) {
        (
            json!([{ "plays": 1, "movie": { "title": "Heat", "ids": { "trakt": 1 } } }]),
            json!([{ "plays": 2, "show": { "title": "Lost", "ids": { "trakt": 2 } }, "seasons": [] }]),
        )
    }

    #[tokio::test]
    async fn test_csv_bundle_keeps_lists_split() {
        let mut server = Server::new_async().await;
        let (movies, shows) = watched_bodies();
        let history = server
            .mock("GET", "/sync/history")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("start_at".into(), "2024-01-01T00:00:00.000Z".into()),
                Matcher::UrlEncoded("page".into(), "1".into()),
            ]))
            .with_status(200)
            .with_header("X-Pagination-Page-Count", "1")
            .with_body(
                json!([{
                    "id": 9,
                    "watched_at": "2024-01-02T00:00:00.000Z",
                    "type": "movie",
                    "movie": { "title": "Heat", "ids": {} }
                }])
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;
        let _movies = mock_list(&mut server, "/sync/watched/movies", movies).await;
        let _shows = mock_list(&mut server, "/sync/watched/shows", shows).await;

        let options = ExportOptions {
            format: ExportFormat::Csv,
            include_ratings: false,
            include_collection: false,
            include_stats: false,
            start_date: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            ..ExportOptions::default()
        };
        let bundle = collect_bundle(&service(&server), &options).await.unwrap();

        history.assert_async().await;
        assert_eq!(bundle.history.as_ref().map(Vec::len), Some(1));
        assert_eq!(bundle.watched_movies.as_ref().map(Vec::len), Some(1));
        assert_eq!(bundle.watched_shows.as_ref().map(Vec::len), Some(1));
        assert!(bundle.watched.is_none());
        assert!(bundle.ratings.is_none());
        assert_eq!(
            bundle.date_range,
            Some(DateRange {
                start_date: Some("2024-01-01T00:00:00.000Z".to_string()),
                end_date: None,
            })
        );
    }

    #[tokio::test]
    async fn test_json_bundle_combines_lists() {
        let mut server = Server::new_async().await;
        let (movies, shows) = watched_bodies();
        let _movies = mock_list(&mut server, "/sync/watched/movies", movies).await;
        let _shows = mock_list(&mut server, "/sync/watched/shows", shows).await;
        let _stats = mock_list(
            &mut server,
            "/users/me/stats",
            json!({ "movies": { "plays": 4 } }),
        )
        .await;

        let options = ExportOptions {
            include_history: false,
            include_ratings: false,
            include_collection: false,
            ..ExportOptions::default()
        };
        let bundle = collect_bundle(&service(&server), &options).await.unwrap();

        let watched = bundle.watched.unwrap();
        assert_eq!(watched.len(), 2);
        assert!(watched[0].is_movie() && watched[1].is_show());
        assert_eq!(bundle.stats.unwrap().movies.plays, 4);
        assert!(bundle.date_range.is_none());
    }

    #[tokio::test]
    async fn test_fetch_errors_propagate() {
        let mut server = Server::new_async().await;
        let _ratings = server
            .mock("GET", "/sync/ratings")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let options = ExportOptions {
            include_history: false,
            include_watched: false,
            include_collection: false,
            include_stats: false,
            ..ExportOptions::default()
        };
        let err = collect_bundle(&service(&server), &options)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CollectError::Trakt(TraktError::Api { status: 500, .. })
        ));
    }

    #[test]
    fn test_options_from_config() {
        let mut config = ExportConfig::default();
        config.include_stats = false;
        config.format = "csv".to_string();
        let options = ExportOptions::from_config(&config).unwrap();
        assert_eq!(options.format, ExportFormat::Csv);
        assert!(!options.include_stats);

        config.format = "xml".to_string();
        assert!(ExportOptions::from_config(&config).is_err());
    }

    #[test]
    fn test_default_filename_base() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(default_filename_base("trakt-export", date), "trakt-export-2024-03-09");
    }
}
