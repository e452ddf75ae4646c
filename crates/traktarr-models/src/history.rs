use crate::media::{Episode, Movie, RecordType, Show};
use crate::record::{MediaRecord, ShapeError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One play event from `/sync/history`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "RawHistoryEntry", into = "RawHistoryEntry")]
pub struct HistoryEntry {
    pub id: u64,
    pub watched_at: String,
    pub action: Option<String>,
    pub item: HistoryItem,
    /// Unrecognised top-level fields, kept for verbatim JSON export.
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryItem {
    Movie(Movie),
    Episode { show: Show, episode: Episode },
}

impl HistoryEntry {
    pub fn movie(id: u64, watched_at: impl Into<String>, movie: Movie) -> Self {
        Self {
            id,
            watched_at: watched_at.into(),
            action: Some("watch".to_string()),
            item: HistoryItem::Movie(movie),
            extra: Map::new(),
        }
    }

    pub fn episode(id: u64, watched_at: impl Into<String>, show: Show, episode: Episode) -> Self {
        Self {
            id,
            watched_at: watched_at.into(),
            action: Some("watch".to_string()),
            item: HistoryItem::Episode { show, episode },
            extra: Map::new(),
        }
    }

    pub fn is_movie(&self) -> bool {
        matches!(self.item, HistoryItem::Movie(_))
    }

    pub fn is_episode(&self) -> bool {
        matches!(self.item, HistoryItem::Episode { .. })
    }

    pub fn as_movie(&self) -> Option<&Movie> {
        match &self.item {
            HistoryItem::Movie(movie) => Some(movie),
            HistoryItem::Episode { .. } => None,
        }
    }

    pub fn as_episode(&self) -> Option<(&Show, &Episode)> {
        match &self.item {
            HistoryItem::Episode { show, episode } => Some((show, episode)),
            HistoryItem::Movie(_) => None,
        }
    }
}

impl MediaRecord for HistoryEntry {
    fn record_type(&self) -> RecordType {
        match self.item {
            HistoryItem::Movie(_) => RecordType::Movie,
            HistoryItem::Episode { .. } => RecordType::Episode,
        }
    }

    fn movie(&self) -> Option<&Movie> {
        self.as_movie()
    }

    fn show(&self) -> Option<&Show> {
        self.as_episode().map(|(show, _)| show)
    }

    fn episode(&self) -> Option<&Episode> {
        self.as_episode().map(|(_, episode)| episode)
    }

    fn watched_at(&self) -> Option<&str> {
        Some(&self.watched_at)
    }
}

#[derive(Serialize, Deserialize)]
struct RawHistoryEntry {
    id: u64,
    watched_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    action: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    movie: Option<Movie>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    show: Option<Show>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    episode: Option<Episode>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl TryFrom<RawHistoryEntry> for HistoryEntry {
    type Error = ShapeError;

    fn try_from(raw: RawHistoryEntry) -> Result<Self, Self::Error> {
        let item = match (raw.movie, raw.show, raw.episode) {
            (Some(movie), None, None) => HistoryItem::Movie(movie),
            (None, Some(show), Some(episode)) => HistoryItem::Episode { show, episode },
            (None, _, None) | (None, None, Some(_)) => return Err(ShapeError::Empty("history")),
            (Some(_), _, _) => return Err(ShapeError::Ambiguous("history")),
        };

        let found = match item {
            HistoryItem::Movie(_) => RecordType::Movie,
            HistoryItem::Episode { .. } => RecordType::Episode,
        };
        if let Some(tag) = raw.kind {
            if tag.parse::<RecordType>()? != found {
                return Err(ShapeError::TagMismatch {
                    tag,
                    found: found.as_str(),
                });
            }
        }

        Ok(Self {
            id: raw.id,
            watched_at: raw.watched_at,
            action: raw.action,
            item,
            extra: raw.extra,
        })
    }
}

impl From<HistoryEntry> for RawHistoryEntry {
    fn from(entry: HistoryEntry) -> Self {
        let (kind, movie, show, episode) = match entry.item {
            HistoryItem::Movie(movie) => (RecordType::Movie, Some(movie), None, None),
            HistoryItem::Episode { show, episode } => {
                (RecordType::Episode, None, Some(show), Some(episode))
            }
        };
        Self {
            id: entry.id,
            watched_at: entry.watched_at,
            action: entry.action,
            kind: Some(kind.as_str().to_string()),
            movie,
            show,
            episode,
            extra: entry.extra,
        }
    }
}
