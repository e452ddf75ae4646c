use crate::media::{Episode, Movie, RecordType, Season, Show};
use crate::record::{MediaRecord, ShapeError};
use serde::{Deserialize, Serialize};

/// A user rating from `/sync/ratings`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "RawRatingEntry", into = "RawRatingEntry")]
pub struct RatingEntry {
    /// Always within 1..=10.
    pub rating: u8,
    pub rated_at: String,
    pub item: RatedItem,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RatedItem {
    Movie(Movie),
    Show(Show),
    Season { show: Show, season: Season },
    Episode { show: Show, episode: Episode },
}

impl RatedItem {
    pub fn record_type(&self) -> RecordType {
        match self {
            RatedItem::Movie(_) => RecordType::Movie,
            RatedItem::Show(_) => RecordType::Show,
            RatedItem::Season { .. } => RecordType::Season,
            RatedItem::Episode { .. } => RecordType::Episode,
        }
    }
}

impl RatingEntry {
    pub fn new(rating: u8, rated_at: impl Into<String>, item: RatedItem) -> Result<Self, ShapeError> {
        if !(1..=10).contains(&rating) {
            return Err(ShapeError::RatingOutOfRange(rating));
        }
        Ok(Self {
            rating,
            rated_at: rated_at.into(),
            item,
        })
    }

    pub fn is_movie(&self) -> bool {
        matches!(self.item, RatedItem::Movie(_))
    }

    pub fn is_show(&self) -> bool {
        matches!(self.item, RatedItem::Show(_))
    }

    pub fn is_season(&self) -> bool {
        matches!(self.item, RatedItem::Season { .. })
    }

    pub fn is_episode(&self) -> bool {
        matches!(self.item, RatedItem::Episode { .. })
    }

    pub fn as_movie(&self) -> Option<&Movie> {
        match &self.item {
            RatedItem::Movie(movie) => Some(movie),
            _ => None,
        }
    }

    /// The show this rating belongs to, for show, season and episode ratings.
    pub fn as_show(&self) -> Option<&Show> {
        match &self.item {
            RatedItem::Show(show)
            | RatedItem::Season { show, .. }
            | RatedItem::Episode { show, .. } => Some(show),
            RatedItem::Movie(_) => None,
        }
    }

    pub fn as_season(&self) -> Option<&Season> {
        match &self.item {
            RatedItem::Season { season, .. } => Some(season),
            _ => None,
        }
    }

    pub fn as_episode(&self) -> Option<&Episode> {
        match &self.item {
            RatedItem::Episode { episode, .. } => Some(episode),
            _ => None,
        }
    }
}

impl MediaRecord for RatingEntry {
    fn record_type(&self) -> RecordType {
        self.item.record_type()
    }

    fn movie(&self) -> Option<&Movie> {
        self.as_movie()
    }

    fn show(&self) -> Option<&Show> {
        self.as_show()
    }

    fn episode(&self) -> Option<&Episode> {
        self.as_episode()
    }

    fn own_rating(&self) -> Option<f64> {
        Some(f64::from(self.rating))
    }
}

#[derive(Serialize, Deserialize)]
struct RawRatingEntry {
    rating: u8,
    rated_at: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    movie: Option<Movie>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    show: Option<Show>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    season: Option<Season>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    episode: Option<Episode>,
}

impl TryFrom<RawRatingEntry> for RatingEntry {
    type Error = ShapeError;

    fn try_from(raw: RawRatingEntry) -> Result<Self, Self::Error> {
        let item = match (raw.movie, raw.show, raw.season, raw.episode) {
            (Some(movie), None, None, None) => RatedItem::Movie(movie),
            (None, Some(show), None, None) => RatedItem::Show(show),
            (None, Some(show), Some(season), None) => RatedItem::Season { show, season },
            (None, Some(show), None, Some(episode)) => RatedItem::Episode { show, episode },
            (None, None, _, _) => return Err(ShapeError::Empty("rating")),
            _ => return Err(ShapeError::Ambiguous("rating")),
        };

        let found = item.record_type();
        if let Some(tag) = raw.kind {
            if tag.parse::<RecordType>()? != found {
                return Err(ShapeError::TagMismatch {
                    tag,
                    found: found.as_str(),
                });
            }
        }

        RatingEntry::new(raw.rating, raw.rated_at, item)
    }
}

impl From<RatingEntry> for RawRatingEntry {
    fn from(entry: RatingEntry) -> Self {
        let kind = Some(entry.item.record_type().as_str().to_string());
        let mut raw = Self {
            rating: entry.rating,
            rated_at: entry.rated_at,
            kind,
            movie: None,
            show: None,
            season: None,
            episode: None,
        };
        match entry.item {
            RatedItem::Movie(movie) => raw.movie = Some(movie),
            RatedItem::Show(show) => raw.show = Some(show),
            RatedItem::Season { show, season } => {
                raw.show = Some(show);
                raw.season = Some(season);
            }
            RatedItem::Episode { show, episode } => {
                raw.show = Some(show);
                raw.episode = Some(episode);
            }
        }
        raw
    }
}
