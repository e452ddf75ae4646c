use std::fmt;
use std::str::FromStr;

/// Path segment for `/sync/history/{kind}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryKind {
    Movies,
    Shows,
    Episodes,
}

/// Path segment for `/sync/watched/{kind}` and `/sync/collection/{kind}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Movies,
    Shows,
}

/// Path segment for `/sync/ratings/{kind}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingsKind {
    Movies,
    Shows,
    Seasons,
    Episodes,
    All,
}

impl HistoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryKind::Movies => "movies",
            HistoryKind::Shows => "shows",
            HistoryKind::Episodes => "episodes",
        }
    }
}

impl ListKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListKind::Movies => "movies",
            ListKind::Shows => "shows",
        }
    }
}

impl RatingsKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RatingsKind::Movies => "movies",
            RatingsKind::Shows => "shows",
            RatingsKind::Seasons => "seasons",
            RatingsKind::Episodes => "episodes",
            RatingsKind::All => "all",
        }
    }
}

impl FromStr for HistoryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "movies" => Ok(HistoryKind::Movies),
            "shows" => Ok(HistoryKind::Shows),
            "episodes" => Ok(HistoryKind::Episodes),
            _ => Err(format!(
                "Invalid history type: {}. Must be one of: movies, shows, episodes",
                s
            )),
        }
    }
}

impl FromStr for ListKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "movies" => Ok(ListKind::Movies),
            "shows" => Ok(ListKind::Shows),
            _ => Err(format!("Invalid type: {}. Must be 'movies' or 'shows'", s)),
        }
    }
}

impl FromStr for RatingsKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "movies" => Ok(RatingsKind::Movies),
            "shows" => Ok(RatingsKind::Shows),
            "seasons" => Ok(RatingsKind::Seasons),
            "episodes" => Ok(RatingsKind::Episodes),
            "all" => Ok(RatingsKind::All),
            _ => Err(format!(
                "Invalid ratings type: {}. Must be one of: movies, shows, seasons, episodes, all",
                s
            )),
        }
    }
}

impl fmt::Display for HistoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for RatingsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
