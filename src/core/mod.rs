pub mod catalog;
pub mod detection;
pub mod history;
pub mod query;
pub mod session;
pub mod stats;

pub use crate::domain::model::{DetectionResult, Disease, Severity, Stats};
pub use crate::domain::ports::{Clock, ConfigProvider, Delay, RandomSource, StatsSource};
pub use crate::utils::error::Result;
