use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Snapshot from `/users/me/stats`. Missing counters default to zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Stats {
    pub movies: MovieStats,
    pub shows: ShowStats,
    pub seasons: SeasonStats,
    pub episodes: EpisodeStats,
    pub network: NetworkStats,
    pub ratings: RatingStats,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct MovieStats {
    pub plays: u64,
    pub watched: u64,
    pub minutes: u64,
    pub collected: u64,
    pub ratings: u64,
    pub comments: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ShowStats {
    pub watched: u64,
    pub collected: u64,
    pub ratings: u64,
    pub comments: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct SeasonStats {
    pub ratings: u64,
    pub comments: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct EpisodeStats {
    pub plays: u64,
    pub watched: u64,
    pub minutes: u64,
    pub collected: u64,
    pub ratings: u64,
    pub comments: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct NetworkStats {
    pub friends: u64,
    pub followers: u64,
    pub following: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct RatingStats {
    pub total: u64,
    /// Rating value (1-10) to count, iterated in ascending order.
    pub distribution: BTreeMap<u8, u64>,
}
