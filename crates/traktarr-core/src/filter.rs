// Client-side filtering and sorting over any record union

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use tracing::debug;
use traktarr_models::{parse_timestamp, FilterSpec, MediaRecord, SortField, SortOrder};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Apply every populated stage of `spec` and return the surviving records.
///
/// Stages run in order: type, rating, genre, year, search, then sort. The
/// input slice is left untouched.
pub fn apply_filters<T>(records: &[T], spec: &FilterSpec) -> Vec<T>
where
    T: MediaRecord + Clone,
{
    let wanted_type = spec.kind.and_then(|kind| kind.record_type());
    let search = spec.search.as_deref().filter(|s| !s.is_empty()).map(str::to_lowercase);

    let mut filtered: Vec<T> = records
        .iter()
        .filter(|r| wanted_type.map_or(true, |t| r.record_type() == t))
        .filter(|r| spec.rating.map_or(true, |min| effective_rating(*r) >= min))
        .filter(|r| {
            spec.genre
                .as_deref()
                .map_or(true, |genre| genres(*r).iter().any(|g| g == genre))
        })
        .filter(|r| spec.year.map_or(true, |year| effective_year(*r) == year))
        .filter(|r| {
            search
                .as_deref()
                .map_or(true, |term| title(*r).to_lowercase().contains(term))
        })
        .cloned()
        .collect();

    if let Some(field) = spec.sort_by {
        let order = spec.sort_order.unwrap_or(SortOrder::Desc);
        filtered.sort_by(|a, b| {
            let ordering = compare_by(a, b, field);
            match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
    }

    debug!(
        input = records.len(),
        output = filtered.len(),
        "Applied filters"
    );
    filtered
}

/// Keep records whose watch timestamp falls inside `[start, end]`.
///
/// The timestamp is `watched_at`, falling back to `last_watched_at`.
/// Records without one, or with one that does not parse, are dropped as soon
/// as either bound is set.
pub fn filter_by_date_range<T>(
    records: &[T],
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Vec<T>
where
    T: MediaRecord + Clone,
{
    if start.is_none() && end.is_none() {
        return records.to_vec();
    }

    records
        .iter()
        .filter(|record| {
            let Some(watched) = record
                .watched_at()
                .or_else(|| record.last_watched_at())
                .and_then(parse_timestamp)
            else {
                return false;
            };
            start.map_or(true, |s| watched >= s) && end.map_or(true, |e| watched <= e)
        })
        .cloned()
        .collect()
}

/// Locale-style string ordering: accent- and case-insensitive first, with the
/// raw strings breaking ties so the order is total.
pub fn collate(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

fn collation_key(s: &str) -> String {
    s.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

fn effective_rating<T: MediaRecord>(record: &T) -> f64 {
    record
        .own_rating()
        .or_else(|| record.movie().and_then(|m| m.rating))
        .or_else(|| record.show().and_then(|s| s.rating))
        .or_else(|| record.episode().and_then(|e| e.rating))
        .unwrap_or(0.0)
}

fn genres<T: MediaRecord>(record: &T) -> &[String] {
    record
        .movie()
        .and_then(|m| m.genres.as_deref())
        .or_else(|| record.show().and_then(|s| s.genres.as_deref()))
        .unwrap_or(&[])
}

fn effective_year<T: MediaRecord>(record: &T) -> u32 {
    record
        .movie()
        .and_then(|m| m.year)
        .or_else(|| record.show().and_then(|s| s.year))
        .unwrap_or(0)
}

fn title<T: MediaRecord>(record: &T) -> &str {
    record
        .movie()
        .and_then(|m| m.title.as_deref())
        .or_else(|| record.show().and_then(|s| s.title.as_deref()))
        .or_else(|| record.episode().and_then(|e| e.title.as_deref()))
        .unwrap_or("")
}

fn compare_by<T: MediaRecord>(a: &T, b: &T, field: SortField) -> Ordering {
    match field {
        SortField::Title => collate(title(a), title(b)),
        SortField::Year => effective_year(a).cmp(&effective_year(b)),
        SortField::Rating => effective_rating(a)
            .partial_cmp(&effective_rating(b))
            .unwrap_or(Ordering::Equal),
        SortField::WatchedAt => {
            let watched = |r: &T| r.watched_at().or_else(|| r.last_watched_at()).unwrap_or("").to_string();
            collate(&watched(a), &watched(b))
        }
        SortField::CollectedAt => collate(
            a.collected_at().unwrap_or(""),
            b.collected_at().unwrap_or(""),
        ),
    }
}
