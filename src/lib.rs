pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::SessionConfig;

pub use crate::core::{
    catalog::DiseaseCatalog,
    detection::{DetectionService, DetectionSettings, DetectionState},
    history::HistoryLedger,
    query::{QueryEngine, SearchCriteria},
    session::Session,
    stats::StatsAggregator,
};
pub use domain::model::{DetectionResult, Disease, Month, NamedCount, Severity, Stats};
pub use utils::error::{ErrorKind, KbError, Result};
