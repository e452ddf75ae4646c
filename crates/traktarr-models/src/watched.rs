use crate::media::{Movie, RecordType, Show};
use crate::record::{MediaRecord, ShapeError};
use serde::{Deserialize, Serialize};

/// Aggregate watch state from `/sync/watched/{movies|shows}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "RawWatchedEntry", into = "RawWatchedEntry")]
pub enum WatchedEntry {
    Movie {
        movie: Movie,
        plays: u32,
        last_watched_at: Option<String>,
        last_updated_at: Option<String>,
    },
    Show {
        show: Show,
        seasons: Option<Vec<WatchedSeason>>,
        plays: Option<u32>,
        last_watched_at: Option<String>,
        last_updated_at: Option<String>,
        reset_at: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct WatchedSeason {
    pub number: u32,
    #[serde(default)]
    pub episodes: Vec<WatchedEpisode>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct WatchedEpisode {
    pub number: u32,
    #[serde(default)]
    pub plays: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_watched_at: Option<String>,
}

impl WatchedEntry {
    pub fn is_movie(&self) -> bool {
        matches!(self, WatchedEntry::Movie { .. })
    }

    pub fn is_show(&self) -> bool {
        matches!(self, WatchedEntry::Show { .. })
    }

    pub fn as_movie(&self) -> Option<&Movie> {
        match self {
            WatchedEntry::Movie { movie, .. } => Some(movie),
            WatchedEntry::Show { .. } => None,
        }
    }

    pub fn as_show(&self) -> Option<&Show> {
        match self {
            WatchedEntry::Show { show, .. } => Some(show),
            WatchedEntry::Movie { .. } => None,
        }
    }

    /// Per-season breakdown; `None` for movies and for shows fetched without it.
    pub fn seasons(&self) -> Option<&[WatchedSeason]> {
        match self {
            WatchedEntry::Show {
                seasons: Some(seasons),
                ..
            } => Some(seasons),
            _ => None,
        }
    }

    pub fn plays(&self) -> Option<u32> {
        match self {
            WatchedEntry::Movie { plays, .. } => Some(*plays),
            WatchedEntry::Show { plays, .. } => *plays,
        }
    }
}

impl MediaRecord for WatchedEntry {
    fn record_type(&self) -> RecordType {
        match self {
            WatchedEntry::Movie { .. } => RecordType::Movie,
            WatchedEntry::Show { .. } => RecordType::Show,
        }
    }

    fn movie(&self) -> Option<&Movie> {
        self.as_movie()
    }

    fn show(&self) -> Option<&Show> {
        self.as_show()
    }

    fn last_watched_at(&self) -> Option<&str> {
        match self {
            WatchedEntry::Movie {
                last_watched_at, ..
            }
            | WatchedEntry::Show {
                last_watched_at, ..
            } => last_watched_at.as_deref(),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct RawWatchedEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    plays: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_watched_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reset_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    movie: Option<Movie>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    show: Option<Show>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    seasons: Option<Vec<WatchedSeason>>,
}

impl TryFrom<RawWatchedEntry> for WatchedEntry {
    type Error = ShapeError;

    fn try_from(raw: RawWatchedEntry) -> Result<Self, Self::Error> {
        match (raw.movie, raw.show) {
            (Some(movie), None) => Ok(WatchedEntry::Movie {
                movie,
                plays: raw.plays.unwrap_or(0),
                last_watched_at: raw.last_watched_at,
                last_updated_at: raw.last_updated_at,
            }),
            (None, Some(show)) => Ok(WatchedEntry::Show {
                show,
                seasons: raw.seasons,
                plays: raw.plays,
                last_watched_at: raw.last_watched_at,
                last_updated_at: raw.last_updated_at,
                reset_at: raw.reset_at,
            }),
            (None, None) => Err(ShapeError::Empty("watched")),
            (Some(_), Some(_)) => Err(ShapeError::Ambiguous("watched")),
        }
    }
}

impl From<WatchedEntry> for RawWatchedEntry {
    fn from(entry: WatchedEntry) -> Self {
        match entry {
            WatchedEntry::Movie {
                movie,
                plays,
                last_watched_at,
                last_updated_at,
            } => Self {
                plays: Some(plays),
                last_watched_at,
                last_updated_at,
                reset_at: None,
                movie: Some(movie),
                show: None,
                seasons: None,
            },
            WatchedEntry::Show {
                show,
                seasons,
                plays,
                last_watched_at,
                last_updated_at,
                reset_at,
            } => Self {
                plays,
                last_watched_at,
                last_updated_at,
                reset_at,
                movie: None,
                show: Some(show),
                seasons,
            },
        }
    }
}
