use crate::media::{Movie, RecordType, Show};
use crate::record::{MediaRecord, ShapeError};
use serde::{Deserialize, Serialize};

/// An item in the user's collection (`/sync/collection/{movies|shows}`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "RawCollectionEntry", into = "RawCollectionEntry")]
pub enum CollectionEntry {
    Movie {
        movie: Movie,
        collected_at: Option<String>,
        updated_at: Option<String>,
    },
    Show {
        show: Show,
        seasons: Option<Vec<CollectedSeason>>,
        last_collected_at: Option<String>,
        last_updated_at: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CollectedSeason {
    pub number: u32,
    #[serde(default)]
    pub episodes: Vec<CollectedEpisode>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CollectedEpisode {
    pub number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collected_at: Option<String>,
}

impl CollectionEntry {
    pub fn is_movie(&self) -> bool {
        matches!(self, CollectionEntry::Movie { .. })
    }

    pub fn is_show(&self) -> bool {
        matches!(self, CollectionEntry::Show { .. })
    }

    pub fn as_movie(&self) -> Option<&Movie> {
        match self {
            CollectionEntry::Movie { movie, .. } => Some(movie),
            CollectionEntry::Show { .. } => None,
        }
    }

    pub fn as_show(&self) -> Option<&Show> {
        match self {
            CollectionEntry::Show { show, .. } => Some(show),
            CollectionEntry::Movie { .. } => None,
        }
    }

    pub fn seasons(&self) -> Option<&[CollectedSeason]> {
        match self {
            CollectionEntry::Show {
                seasons: Some(seasons),
                ..
            } => Some(seasons),
            _ => None,
        }
    }
}

impl MediaRecord for CollectionEntry {
    fn record_type(&self) -> RecordType {
        match self {
            CollectionEntry::Movie { .. } => RecordType::Movie,
            CollectionEntry::Show { .. } => RecordType::Show,
        }
    }

    fn movie(&self) -> Option<&Movie> {
        self.as_movie()
    }

    fn show(&self) -> Option<&Show> {
        self.as_show()
    }

    // Only movie entries carry a per-item collected_at
    fn collected_at(&self) -> Option<&str> {
        match self {
            CollectionEntry::Movie { collected_at, .. } => collected_at.as_deref(),
            CollectionEntry::Show { .. } => None,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct RawCollectionEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    collected_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_collected_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    movie: Option<Movie>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    show: Option<Show>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    seasons: Option<Vec<CollectedSeason>>,
}

impl TryFrom<RawCollectionEntry> for CollectionEntry {
    type Error = ShapeError;

    fn try_from(raw: RawCollectionEntry) -> Result<Self, Self::Error> {
        match (raw.movie, raw.show) {
            (Some(movie), None) => Ok(CollectionEntry::Movie {
                movie,
                collected_at: raw.collected_at,
                updated_at: raw.updated_at,
            }),
            (None, Some(show)) => Ok(CollectionEntry::Show {
                show,
                seasons: raw.seasons,
                last_collected_at: raw.last_collected_at,
                last_updated_at: raw.last_updated_at,
            }),
            (None, None) => Err(ShapeError::Empty("collection")),
            (Some(_), Some(_)) => Err(ShapeError::Ambiguous("collection")),
        }
    }
}

impl From<CollectionEntry> for RawCollectionEntry {
    fn from(entry: CollectionEntry) -> Self {
        match entry {
            CollectionEntry::Movie {
                movie,
                collected_at,
                updated_at,
            } => Self {
                collected_at,
                updated_at,
                last_collected_at: None,
                last_updated_at: None,
                movie: Some(movie),
                show: None,
                seasons: None,
            },
            CollectionEntry::Show {
                show,
                seasons,
                last_collected_at,
                last_updated_at,
            } => Self {
                collected_at: None,
                updated_at: None,
                last_collected_at,
                last_updated_at,
                movie: None,
                show: Some(show),
                seasons,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_collection_entries() {
        let movie: CollectionEntry = serde_json::from_value(json!({
            "collected_at": "2023-06-01T00:00:00.000Z",
            "updated_at": "2023-06-02T00:00:00.000Z",
            "movie": { "title": "Alien", "year": 1979, "ids": { "trakt": 7 } }
        }))
        .unwrap();
        assert!(movie.is_movie());
        assert_eq!(movie.collected_at(), Some("2023-06-01T00:00:00.000Z"));

        let show: CollectionEntry = serde_json::from_value(json!({
            "last_collected_at": "2023-07-01T00:00:00.000Z",
            "show": { "title": "Firefly", "year": 2002, "ids": { "trakt": 8 } },
            "seasons": [{ "number": 1, "episodes": [{ "number": 1, "collected_at": "2023-07-01T00:00:00.000Z" }] }]
        }))
        .unwrap();
        assert!(show.is_show());
        assert_eq!(show.record_type(), RecordType::Show);
        assert_eq!(show.collected_at(), None);
        assert_eq!(show.seasons().map(|s| s.len()), Some(1));
    }

    #[test]
    fn test_rejects_empty_entry() {
        let result = serde_json::from_value::<CollectionEntry>(json!({
            "collected_at": "2023-06-01T00:00:00.000Z"
        }));
        assert!(result.is_err());
    }
}
