use crate::error::TraktError;
use crate::kinds::HistoryKind;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::HeaderMap;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub const PAGINATION_HEADER_PREFIX: &str = "x-pagination-";
pub const DEFAULT_PAGE_LIMIT: u32 = 100;
pub const DEFAULT_BULK_PAGE_LIMIT: u32 = 1000;

/// Pagination headers of one response, keyed by lower-case header name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PaginationMeta {
    headers: BTreeMap<String, String>,
}

impl PaginationMeta {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let headers = headers
            .iter()
            .filter_map(|(name, value)| {
                let name = name.as_str().to_lowercase();
                if !name.starts_with(PAGINATION_HEADER_PREFIX) {
                    return None;
                }
                value.to_str().ok().map(|v| (name, v.to_string()))
            })
            .collect();
        Self { headers }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let headers = pairs
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_lowercase(), v.into()))
            .filter(|(k, _)| k.starts_with(PAGINATION_HEADER_PREFIX))
            .collect();
        Self { headers }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    fn parsed<T: std::str::FromStr>(&self, suffix: &str) -> Option<T> {
        self.headers
            .get(&format!("{}{}", PAGINATION_HEADER_PREFIX, suffix))
            .and_then(|v| v.trim().parse().ok())
    }

    pub fn page(&self) -> Option<u32> {
        self.parsed("page")
    }

    pub fn page_count(&self) -> Option<u32> {
        self.parsed("page-count")
    }

    pub fn limit(&self) -> Option<u32> {
        self.parsed("limit")
    }

    pub fn item_count(&self) -> Option<u64> {
        self.parsed("item-count")
    }
}

/// One page of records plus the metadata that came with it.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub records: Vec<T>,
    pub meta: PaginationMeta,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageQuery {
    pub kind: Option<HistoryKind>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    /// 1-based; defaults to 1.
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// ISO-8601 with milliseconds and a `Z` suffix, e.g. `2024-01-01T00:00:00.000Z`.
pub fn format_api_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl PageQuery {
    pub fn page_number(&self) -> u32 {
        self.page.unwrap_or(1)
    }

    /// Query-string pairs, falling back to `default_limit` when no limit is set.
    pub fn query_pairs(&self, default_limit: u32) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page_number().to_string()),
            ("limit", self.limit.unwrap_or(default_limit).to_string()),
        ];
        if let Some(start) = &self.start_date {
            pairs.push(("start_at", format_api_date(start)));
        }
        if let Some(end) = &self.end_date {
            pairs.push(("end_at", format_api_date(end)));
        }
        pairs
    }
}

#[async_trait]
pub trait PageFetcher<T: Send>: Send + Sync {
    async fn fetch_page(&self, query: &PageQuery) -> Result<Page<T>, TraktError>;
}

/// Walk every page sequentially, starting at page 1.
///
/// The page count is re-read from each response. A missing or unparseable
/// count makes the current page the last one, and an empty page ends the
/// walk whatever the count says.
pub async fn fetch_all_pages<T, F>(fetcher: &F, query: &PageQuery) -> Result<Vec<T>, TraktError>
where
    T: Send,
    F: PageFetcher<T> + ?Sized,
{
    let limit = query.limit.unwrap_or(DEFAULT_BULK_PAGE_LIMIT);
    let mut all_records = Vec::new();
    let mut page = 1;

    loop {
        let page_query = PageQuery {
            page: Some(page),
            limit: Some(limit),
            ..query.clone()
        };
        let Page { records, meta } = fetcher.fetch_page(&page_query).await?;
        let total_pages = meta.page_count().unwrap_or(page);
        debug!(
            page,
            total_pages,
            records = records.len(),
            "Fetched page"
        );
        if records.is_empty() {
            if page < total_pages {
                warn!(page, total_pages, "Empty page before the reported last page");
            }
            break;
        }
        all_records.extend(records);

        page += 1;
        if page > total_pages {
            break;
        }
    }

    Ok(all_records)
}
