use crate::ids::Ids;
use crate::record::ShapeError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

// Sub-entities keep unrecognised wire fields in `extra` so a JSON export
// reproduces what the API sent.

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Movie {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    #[serde(default)]
    pub ids: Ids,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Show {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    #[serde(default)]
    pub ids: Ids,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Season {
    pub number: u32,
    #[serde(default)]
    pub ids: Ids,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Episode {
    pub season: u32,
    pub number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub ids: Ids,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Movie {
    pub fn new(title: impl Into<String>, year: Option<u32>, ids: Ids) -> Self {
        Self {
            title: Some(title.into()),
            year,
            ids,
            ..Self::default()
        }
    }
}

impl Show {
    pub fn new(title: impl Into<String>, year: Option<u32>, ids: Ids) -> Self {
        Self {
            title: Some(title.into()),
            year,
            ids,
            ..Self::default()
        }
    }
}

/// Singular record kind, as used by the wire `type` tag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    Movie,
    Show,
    Season,
    Episode,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Movie => "movie",
            RecordType::Show => "show",
            RecordType::Season => "season",
            RecordType::Episode => "episode",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = ShapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(RecordType::Movie),
            "show" => Ok(RecordType::Show),
            "season" => Ok(RecordType::Season),
            "episode" => Ok(RecordType::Episode),
            other => Err(ShapeError::UnknownTag(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_movie_keeps_unknown_fields() {
        let value = json!({
            "title": "Heat",
            "year": 1995,
            "ids": { "trakt": 3, "slug": "heat-1995", "imdb": "tt0113277" },
            "tagline": "A Los Angeles crime saga",
            "runtime": 170
        });

        let movie: Movie = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(movie.title.as_deref(), Some("Heat"));
        assert_eq!(movie.runtime, Some(170));
        assert_eq!(movie.extra.get("tagline"), Some(&json!("A Los Angeles crime saga")));
        assert_eq!(serde_json::to_value(&movie).unwrap(), value);
    }

    #[test]
    fn test_record_type_parse() {
        assert_eq!("season".parse::<RecordType>().unwrap(), RecordType::Season);
        assert!("person".parse::<RecordType>().is_err());
        assert_eq!(RecordType::Episode.to_string(), "episode");
    }
}
