use crate::media::RecordType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Client-side filter and sort criteria. Absent fields impose no constraint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<TypeFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
}

impl FilterSpec {
    /// Initial dashboard state: everything, most recently watched first.
    pub fn dashboard() -> Self {
        Self {
            kind: Some(TypeFilter::All),
            sort_by: Some(SortField::WatchedAt),
            sort_order: Some(SortOrder::Desc),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TypeFilter {
    Movies,
    Shows,
    Episodes,
    All,
}

impl TypeFilter {
    /// Singular record type this filter selects; `None` for `All`.
    pub fn record_type(&self) -> Option<RecordType> {
        match self {
            TypeFilter::Movies => Some(RecordType::Movie),
            TypeFilter::Shows => Some(RecordType::Show),
            TypeFilter::Episodes => Some(RecordType::Episode),
            TypeFilter::All => None,
        }
    }
}

impl FromStr for TypeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "movies" | "movie" => Ok(TypeFilter::Movies),
            "shows" | "show" => Ok(TypeFilter::Shows),
            "episodes" | "episode" => Ok(TypeFilter::Episodes),
            "all" => Ok(TypeFilter::All),
            _ => Err(format!(
                "Invalid type filter: {}. Must be one of: movies, shows, episodes, all",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Title,
    Year,
    Rating,
    WatchedAt,
    CollectedAt,
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "title" => Ok(SortField::Title),
            "year" => Ok(SortField::Year),
            "rating" => Ok(SortField::Rating),
            "watched_at" => Ok(SortField::WatchedAt),
            "collected_at" => Ok(SortField::CollectedAt),
            _ => Err(format!(
                "Invalid sort field: {}. Must be one of: title, year, rating, watched_at, collected_at",
                s
            )),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortField::Title => "title",
            SortField::Year => "year",
            SortField::Rating => "rating",
            SortField::WatchedAt => "watched_at",
            SortField::CollectedAt => "collected_at",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(format!("Invalid sort order: {}. Must be 'asc' or 'desc'", s)),
        }
    }
}
