use crate::error::TraktError;
use crate::kinds::{ListKind, RatingsKind};
use crate::pagination::{
    fetch_all_pages, Page, PageFetcher, PageQuery, PaginationMeta, DEFAULT_BULK_PAGE_LIMIT,
    DEFAULT_PAGE_LIMIT,
};
use crate::traits::AuthProvider;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;
use traktarr_config::{FetchConfig, TraktConfig};
use traktarr_models::{CollectionEntry, HistoryEntry, RatingEntry, Stats, WatchedEntry};

/// Connection settings shared by the data service and the OAuth client.
#[derive(Debug, Clone)]
pub struct TraktSettings {
    pub api_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub user_agent: String,
    pub page_limit: u32,
    pub bulk_page_limit: u32,
    /// Ask for `extended=full` so records carry runtime and genres.
    pub extended_info: bool,
}

impl TraktSettings {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self::from_config(&TraktConfig::new(client_id, client_secret), &FetchConfig::default())
    }

    pub fn from_config(trakt: &TraktConfig, fetch: &FetchConfig) -> Self {
        Self {
            api_url: trakt.api_url.trim_end_matches('/').to_string(),
            client_id: trakt.client_id.clone(),
            client_secret: trakt.client_secret.clone(),
            redirect_uri: trakt.redirect_uri.clone(),
            user_agent: trakt.user_agent.clone(),
            page_limit: fetch.page_limit,
            bulk_page_limit: fetch.bulk_page_limit,
            extended_info: fetch.extended_info,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }
}

/// Authenticated access to the user's Trakt data.
pub struct TraktService {
    http: Client,
    settings: TraktSettings,
    auth: Arc<dyn AuthProvider>,
}

impl TraktService {
    pub fn new(settings: TraktSettings, auth: Arc<dyn AuthProvider>) -> Result<Self, TraktError> {
        let http = Client::builder()
            .user_agent(settings.user_agent.clone())
            .build()?;
        Ok(Self {
            http,
            settings,
            auth,
        })
    }

    pub fn settings(&self) -> &TraktSettings {
        &self.settings
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_authenticated()
    }

    fn get(&self, path: &str) -> Result<RequestBuilder, TraktError> {
        let token = self
            .auth
            .access_token()
            .ok_or(TraktError::NotAuthenticated)?;

        let mut request = self
            .http
            .get(self.settings.url(path))
            .bearer_auth(token)
            .header("trakt-api-version", "2")
            .header("trakt-api-key", &self.settings.client_id)
            .header("Content-Type", "application/json");
        if self.settings.extended_info {
            request = request.query(&[("extended", "full")]);
        }
        Ok(request)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<(T, PaginationMeta), TraktError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                body
            };
            return Err(TraktError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let meta = PaginationMeta::from_headers(response.headers());
        let body = response.text().await?;
        let parsed = serde_json::from_str(&body)?;
        Ok((parsed, meta))
    }

    /// One page of `/sync/history[/{kind}]`.
    pub async fn get_history_page(
        &self,
        query: &PageQuery,
    ) -> Result<Page<HistoryEntry>, TraktError> {
        let path = match query.kind {
            Some(kind) => format!("/sync/history/{}", kind),
            None => "/sync/history".to_string(),
        };
        let page_limit = if self.settings.page_limit == 0 {
            DEFAULT_PAGE_LIMIT
        } else {
            self.settings.page_limit
        };
        let request = self.get(&path)?.query(&query.query_pairs(page_limit));
        let (records, meta): (Vec<HistoryEntry>, _) = self.send(request).await?;

        debug!(
            page = query.page_number(),
            records = records.len(),
            page_count = ?meta.page_count(),
            item_count = ?meta.item_count(),
            "Fetched Trakt history page"
        );
        Ok(Page { records, meta })
    }

    /// Every page of history matching `query` (its page number is ignored).
    pub async fn get_all_history(&self, query: &PageQuery) -> Result<Vec<HistoryEntry>, TraktError> {
        let bulk_limit = if self.settings.bulk_page_limit == 0 {
            DEFAULT_BULK_PAGE_LIMIT
        } else {
            self.settings.bulk_page_limit
        };
        let query = PageQuery {
            limit: query.limit.or(Some(bulk_limit)),
            ..query.clone()
        };
        let history = fetch_all_pages(self, &query).await?;
        debug!("Fetched Trakt history: total_items={}", history.len());
        Ok(history)
    }

    pub async fn get_watched(&self, kind: ListKind) -> Result<Vec<WatchedEntry>, TraktError> {
        let request = self.get(&format!("/sync/watched/{}", kind))?;
        let (watched, _): (Vec<WatchedEntry>, _) = self.send(request).await?;
        debug!("Fetched Trakt watched {}: {} items", kind, watched.len());
        Ok(watched)
    }

    /// `/sync/ratings[/{kind}[/{rating}]]`. A rating filter without a kind
    /// queries the `all` kind, since the API only accepts the rating segment
    /// after a type segment.
    pub async fn get_ratings(
        &self,
        kind: Option<RatingsKind>,
        rating: Option<u8>,
    ) -> Result<Vec<RatingEntry>, TraktError> {
        let mut path = "/sync/ratings".to_string();
        match (kind, rating) {
            (Some(kind), _) => path.push_str(&format!("/{}", kind)),
            (None, Some(_)) => path.push_str(&format!("/{}", RatingsKind::All)),
            (None, None) => {}
        }
        if let Some(rating) = rating {
            path.push_str(&format!("/{}", rating));
        }

        let request = self.get(&path)?;
        let (ratings, _): (Vec<RatingEntry>, _) = self.send(request).await?;
        debug!("Fetched Trakt ratings from {}: {} items", path, ratings.len());
        Ok(ratings)
    }

    pub async fn get_collection(&self, kind: ListKind) -> Result<Vec<CollectionEntry>, TraktError> {
        let request = self.get(&format!("/sync/collection/{}", kind))?;
        let (collection, _): (Vec<CollectionEntry>, _) = self.send(request).await?;
        debug!("Fetched Trakt collection {}: {} items", kind, collection.len());
        Ok(collection)
    }

    pub async fn get_stats(&self) -> Result<Stats, TraktError> {
        let request = self.get("/users/me/stats")?;
        let (stats, _): (Stats, _) = self.send(request).await?;
        Ok(stats)
    }
}

#[async_trait]
impl PageFetcher<HistoryEntry> for TraktService {
    async fn fetch_page(&self, query: &PageQuery) -> Result<Page<HistoryEntry>, TraktError> {
        self.get_history_page(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::HistoryKind;
    use crate::trakt::auth::TokenAuth;
    use chrono::{Duration, TimeZone, Utc};
    use mockito::{Matcher, Server};
    use serde_json::json;
    use traktarr_config::{KeyValueStore, MemoryStore};

    fn signed_in() -> Arc<TokenAuth> {
        let store = Arc::new(MemoryStore::new());
        store.set_trakt_access_token("test_token").unwrap();
        store
            .set_trakt_token_expires(Utc::now() + Duration::hours(1))
            .unwrap();
        Arc::new(TokenAuth::new(store))
    }

    fn service(server: &Server, auth: Arc<TokenAuth>) -> TraktService {
        let settings = TraktSettings::new("test_client", "test_secret").with_api_url(server.url());
        TraktService::new(settings, auth).unwrap()
    }

    fn history_page(start: u64, count: u64) -> serde_json::Value {
        let entries: Vec<_> = (start..start + count)
            .map(|id| {
                json!({
                    "id": id,
                    "watched_at": "2024-01-01T00:00:00.000Z",
                    "action": "watch",
                    "type": "movie",
                    "movie": { "title": format!("Movie {}", id), "year": 2000, "ids": { "trakt": id } }
                })
            })
            .collect();
        json!(entries)
    }

    #[tokio::test]
    async fn test_history_page_sends_headers_and_reads_pagination() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/sync/history/movies")
            .match_header("authorization", "Bearer test_token")
            .match_header("trakt-api-version", "2")
            .match_header("trakt-api-key", "test_client")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("page".into(), "2".into()),
                Matcher::UrlEncoded("limit".into(), "100".into()),
                Matcher::UrlEncoded("start_at".into(), "2024-01-01T00:00:00.000Z".into()),
                Matcher::UrlEncoded("extended".into(), "full".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_header("X-Pagination-Page", "2")
            .with_header("X-Pagination-Limit", "100")
            .with_header("X-Pagination-Page-Count", "4")
            .with_header("X-Pagination-Item-Count", "350")
            .with_body(history_page(101, 2).to_string())
            .create_async()
            .await;

        let service = service(&server, signed_in());
        let query = PageQuery {
            kind: Some(HistoryKind::Movies),
            start_date: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            page: Some(2),
            ..PageQuery::default()
        };
        let page = service.get_history_page(&query).await.unwrap();

        assert_eq!(page.records.len(), 2);
        assert_eq!(page.records[0].id, 101);
        assert_eq!(page.meta.page(), Some(2));
        assert_eq!(page.meta.page_count(), Some(4));
        assert_eq!(page.meta.item_count(), Some(350));
        assert_eq!(page.meta.as_map().len(), 4);
    }

    #[tokio::test]
    async fn test_all_history_walks_pages() {
        let mut server = Server::new_async().await;
        let mut mocks = Vec::new();
        for page in 1..=3u64 {
            let mock = server
                .mock("GET", "/sync/history")
                .match_query(Matcher::AllOf(vec![
                    Matcher::UrlEncoded("page".into(), page.to_string()),
                    Matcher::UrlEncoded("limit".into(), "10".into()),
                ]))
                .with_status(200)
                .with_header("X-Pagination-Page-Count", "3")
                .with_body(history_page((page - 1) * 10, 10).to_string())
                .expect(1)
                .create_async()
                .await;
            mocks.push(mock);
        }

        let service = service(&server, signed_in());
        let query = PageQuery {
            limit: Some(10),
            ..PageQuery::default()
        };
        let history = service.get_all_history(&query).await.unwrap();

        assert_eq!(history.len(), 30);
        let ids: Vec<u64> = history.iter().map(|h| h.id).collect();
        assert_eq!(ids, (0..30).collect::<Vec<_>>());
        for mock in mocks {
            mock.assert_async().await;
        }
    }

    #[tokio::test]
    async fn test_error_status_becomes_api_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/sync/watched/movies")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body("")
            .create_async()
            .await;

        let err = service(&server, signed_in())
            .get_watched(ListKind::Movies)
            .await
            .unwrap_err();
        match err {
            TraktError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Unauthorized");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_requires_token() {
        let server = Server::new_async().await;
        let auth = Arc::new(TokenAuth::new(Arc::new(MemoryStore::new())));
        let err = service(&server, auth).get_stats().await.unwrap_err();
        assert!(matches!(err, TraktError::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_ratings_paths() {
        let mut server = Server::new_async().await;
        let body = json!([{
            "rating": 8,
            "rated_at": "2024-01-01T00:00:00.000Z",
            "type": "movie",
            "movie": { "title": "X", "year": 2020, "ids": { "trakt": 1, "imdb": "tt1" } }
        }]);
        let by_rating = server
            .mock("GET", "/sync/ratings/all/8")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await;
        let by_kind = server
            .mock("GET", "/sync/ratings/movies")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await;

        let service = service(&server, signed_in());
        let ratings = service.get_ratings(None, Some(8)).await.unwrap();
        assert_eq!(ratings.len(), 1);
        assert!(ratings[0].is_movie());
        service
            .get_ratings(Some(RatingsKind::Movies), None)
            .await
            .unwrap();

        by_rating.assert_async().await;
        by_kind.assert_async().await;
    }

    #[tokio::test]
    async fn test_collection_and_stats() {
        let mut server = Server::new_async().await;
        let _collection = server
            .mock("GET", "/sync/collection/shows")
            .match_query(Matcher::UrlEncoded("extended".into(), "full".into()))
            .with_status(200)
            .with_body(
                json!([{
                    "last_collected_at": "2023-07-01T00:00:00.000Z",
                    "show": { "title": "Firefly", "year": 2002, "ids": { "trakt": 8 } },
                    "seasons": []
                }])
                .to_string(),
            )
            .create_async()
            .await;
        let _stats = server
            .mock("GET", "/users/me/stats")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({ "movies": { "plays": 3 }, "ratings": { "total": 1, "distribution": { "8": 1 } } }).to_string())
            .create_async()
            .await;

        let service = service(&server, signed_in());
        let collection = service.get_collection(ListKind::Shows).await.unwrap();
        assert!(collection[0].is_show());

        let stats = service.get_stats().await.unwrap();
        assert_eq!(stats.movies.plays, 3);
        assert_eq!(stats.ratings.distribution.get(&8), Some(&1));
    }
}
