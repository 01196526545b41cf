use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Source of the random draws behind a simulated detection.
pub trait RandomSource: Send + Sync {
    /// Uniform index in `0..upper`. Callers guarantee `upper > 0`.
    fn next_index(&self, upper: usize) -> usize;

    /// Uniform integer in `low..=high`.
    fn next_in_range(&self, low: u8, high: u8) -> u8;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[async_trait]
pub trait Delay: Send + Sync {
    async fn wait(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsSource {
    #[default]
    Seed,
    Live,
}

pub trait ConfigProvider: Send + Sync {
    fn detection_delay(&self) -> Duration;
    fn detection_timeout(&self) -> Duration;
    fn random_seed(&self) -> Option<u64>;
    fn history_max_entries(&self) -> Option<usize>;
    fn stats_source(&self) -> StatsSource;
}
