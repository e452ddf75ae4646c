use super::progress::Spinner;
use super::Session;
use crate::output::Output;
use crate::FilterArgs;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Attribute, Cell, Table};
use serde::Serialize;
use serde_json::json;
use traktarr_api::{ListKind, Page, PageQuery, PaginationMeta, RatingsKind};
use traktarr_core::export::table::{stats_rows, STATS_HEADER};
use traktarr_core::{apply_filters, filter_by_date_range};
use traktarr_models::{
    CollectionEntry, FilterSpec, HistoryEntry, MediaRecord, RatedItem, RatingEntry, WatchedEntry,
};

impl FilterArgs {
    pub fn spec(&self) -> FilterSpec {
        FilterSpec {
            kind: self.filter_type,
            rating: self.min_rating,
            genre: self.genre.clone(),
            year: self.year,
            search: self.search.clone(),
            sort_by: self.sort_by,
            sort_order: self.sort_order,
        }
    }

    /// Date range first, then the filter/sort pipeline.
    pub fn apply<T: MediaRecord + Clone>(&self, records: Vec<T>) -> Vec<T> {
        let records = if self.since.is_some() || self.until.is_some() {
            filter_by_date_range(&records, self.since, self.until)
        } else {
            records
        };
        apply_filters(&records, &self.spec())
    }
}

fn media_title<T: MediaRecord + ?Sized>(record: &T) -> String {
    let show_title = record.show().and_then(|s| s.title.as_deref()).unwrap_or("Unknown");
    match (record.movie(), record.episode()) {
        (Some(movie), _) => movie.title.clone().unwrap_or_else(|| "Unknown".to_string()),
        (None, Some(episode)) => {
            let label = format!("{} S{:02}E{:02}", show_title, episode.season, episode.number);
            match &episode.title {
                Some(title) => format!("{} {}", label, title),
                None => label,
            }
        }
        (None, None) => show_title.to_string(),
    }
}

/// How a record shows up in a terminal table.
trait Listing: MediaRecord + Serialize {
    fn display_title(&self) -> String {
        media_title(self)
    }

    fn year(&self) -> Option<u32> {
        self.movie()
            .and_then(|m| m.year)
            .or_else(|| self.show().and_then(|s| s.year))
    }

    fn rating_label(&self) -> String {
        if let Some(own) = self.own_rating() {
            return format!("{}", own);
        }
        self.movie()
            .and_then(|m| m.rating)
            .or_else(|| self.show().and_then(|s| s.rating))
            .map(|r| format!("{:.1}", r))
            .unwrap_or_default()
    }

    fn when(&self) -> Option<&str> {
        self.watched_at()
            .or_else(|| self.last_watched_at())
            .or_else(|| self.collected_at())
    }
}

impl Listing for HistoryEntry {}
impl Listing for WatchedEntry {}
impl Listing for CollectionEntry {}

impl Listing for RatingEntry {
    fn display_title(&self) -> String {
        match &self.item {
            RatedItem::Season { show, season } => format!(
                "{} Season {}",
                show.title.as_deref().unwrap_or("Unknown"),
                season.number
            ),
            _ => media_title(self),
        }
    }

    fn when(&self) -> Option<&str> {
        Some(&self.rated_at)
    }
}

fn print_records<T: Listing>(
    records: &[T],
    when_header: &str,
    meta: Option<&PaginationMeta>,
    output: &Output,
) -> Result<()> {
    if !output.is_human() {
        let value = json!({
            "count": records.len(),
            "records": records,
            "pagination": meta,
        });
        output.json(&value);
        return Ok(());
    }

    if records.is_empty() {
        output.info("No matching records");
    } else {
        let mut table = Table::new();
        table.set_header(
            ["Type", "Title", "Year", "Rating", when_header]
                .into_iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );
        for record in records {
            table.add_row(vec![
                Cell::new(record.record_type()),
                Cell::new(record.display_title()),
                Cell::new(record.year().map(|y| y.to_string()).unwrap_or_default()),
                Cell::new(record.rating_label()),
                Cell::new(record.when().unwrap_or("")),
            ]);
        }
        output.table(table);
    }

    match meta {
        Some(meta) if !meta.is_empty() => output.println(format!(
            "Page {} of {} ({} items total, {} per page)",
            meta.page().map(|p| p.to_string()).unwrap_or_else(|| "?".into()),
            meta.page_count().map(|p| p.to_string()).unwrap_or_else(|| "?".into()),
            meta.item_count().map(|c| c.to_string()).unwrap_or_else(|| "?".into()),
            meta.limit().map(|l| l.to_string()).unwrap_or_else(|| "?".into()),
        )),
        _ => output.println(format!("{} records", records.len())),
    }
    Ok(())
}

pub async fn run_history(
    query: PageQuery,
    all: bool,
    filters: &FilterArgs,
    output: &Output,
) -> Result<()> {
    let session = Session::load()?;
    let service = session.service()?;

    let spinner = Spinner::start(if all {
        "Fetching every history page..."
    } else {
        "Fetching history..."
    });
    let fetched = if all {
        service
            .get_all_history(&query)
            .await
            .map(|records| Page {
                records,
                meta: PaginationMeta::default(),
            })
    } else {
        service.get_history_page(&query).await
    };
    spinner.finish();
    let Page { records, meta } = fetched.map_err(|e| eyre!("Failed to fetch history: {}", e))?;

    let records = filters.apply(records);
    print_records(&records, "Watched At", Some(&meta), output)
}

pub async fn run_watched(kind: ListKind, filters: &FilterArgs, output: &Output) -> Result<()> {
    let session = Session::load()?;
    let spinner = Spinner::start(format!("Fetching watched {}...", kind));
    let fetched = session.service()?.get_watched(kind).await;
    spinner.finish();
    let records = fetched.map_err(|e| eyre!("Failed to fetch watched {}: {}", kind, e))?;

    print_records(&filters.apply(records), "Last Watched", None, output)
}

pub async fn run_ratings(
    kind: Option<RatingsKind>,
    rating: Option<u8>,
    filters: &FilterArgs,
    output: &Output,
) -> Result<()> {
    let session = Session::load()?;
    let spinner = Spinner::start("Fetching ratings...");
    let fetched = session.service()?.get_ratings(kind, rating).await;
    spinner.finish();
    let records = fetched.map_err(|e| eyre!("Failed to fetch ratings: {}", e))?;

    print_records(&filters.apply(records), "Rated At", None, output)
}

pub async fn run_collection(kind: ListKind, filters: &FilterArgs, output: &Output) -> Result<()> {
    let session = Session::load()?;
    let spinner = Spinner::start(format!("Fetching {} collection...", kind));
    let fetched = session.service()?.get_collection(kind).await;
    spinner.finish();
    let records = fetched.map_err(|e| eyre!("Failed to fetch {} collection: {}", kind, e))?;

    print_records(&filters.apply(records), "Collected At", None, output)
}

pub async fn run_stats(output: &Output) -> Result<()> {
    let session = Session::load()?;
    let spinner = Spinner::start("Fetching stats...");
    let fetched = session.service()?.get_stats().await;
    spinner.finish();
    let stats = fetched.map_err(|e| eyre!("Failed to fetch stats: {}", e))?;

    if !output.is_human() {
        output.json(&serde_json::to_value(&stats)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(STATS_HEADER.to_vec());
    for row in stats_rows(&stats) {
        table.add_row(row);
    }
    output.table(table);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use traktarr_models::{SortField, TypeFilter};

    fn history() -> Vec<HistoryEntry> {
        serde_json::from_value(json!([
            {
                "id": 1,
                "watched_at": "2024-01-01T00:00:00.000Z",
                "type": "movie",
                "movie": { "title": "Heat", "year": 1995, "rating": 8.2, "ids": {} }
            },
            {
                "id": 2,
                "watched_at": "2024-02-01T00:00:00.000Z",
                "type": "episode",
                "show": { "title": "Lost", "year": 2004, "ids": {} },
                "episode": { "season": 1, "number": 2, "title": "Pilot (2)", "ids": {} }
            }
        ]))
        .unwrap()
    }

    #[test]
    fn test_filter_args_build_spec_and_apply() {
        let args = FilterArgs {
            filter_type: Some(TypeFilter::Movies),
            sort_by: Some(SortField::Title),
            ..FilterArgs::default()
        };
        let spec = args.spec();
        assert_eq!(spec.kind, Some(TypeFilter::Movies));
        assert_eq!(spec.sort_order, None);

        let kept = args.apply(history());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, 1);

        let since = FilterArgs {
            since: traktarr_models::parse_timestamp("2024-01-15"),
            ..FilterArgs::default()
        };
        assert_eq!(since.apply(history())[0].id, 2);
    }

    #[test]
    fn test_listing_labels() {
        let records = history();
        assert_eq!(records[0].display_title(), "Heat");
        assert_eq!(records[0].rating_label(), "8.2");
        assert_eq!(records[1].display_title(), "Lost S01E02 Pilot (2)");
        assert_eq!(records[1].year(), Some(2004));
        assert_eq!(records[1].when(), Some("2024-02-01T00:00:00.000Z"));

        let season: RatingEntry = serde_json::from_value(json!({
            "rating": 9,
            "rated_at": "2024-03-01T00:00:00.000Z",
            "type": "season",
            "show": { "title": "The Wire", "ids": {} },
            "season": { "number": 3, "ids": {} }
        }))
        .unwrap();
        assert_eq!(season.display_title(), "The Wire Season 3");
        assert_eq!(season.rating_label(), "9");
        assert_eq!(season.when(), Some("2024-03-01T00:00:00.000Z"));
    }
}
