pub mod collection;
pub mod filter;
pub mod history;
pub mod ids;
pub mod media;
pub mod rating;
pub mod record;
pub mod stats;
pub mod watched;

pub use collection::{CollectedEpisode, CollectedSeason, CollectionEntry};
pub use filter::{FilterSpec, SortField, SortOrder, TypeFilter};
pub use history::{HistoryEntry, HistoryItem};
pub use ids::Ids;
pub use media::{Episode, Movie, RecordType, Season, Show};
pub use rating::{RatedItem, RatingEntry};
pub use record::{parse_timestamp, MediaRecord, ShapeError};
pub use stats::{EpisodeStats, MovieStats, NetworkStats, RatingStats, SeasonStats, ShowStats, Stats};
pub use watched::{WatchedEntry, WatchedEpisode, WatchedSeason};
