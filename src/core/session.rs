use crate::core::catalog::DiseaseCatalog;
use crate::core::detection::{DetectionService, DetectionState};
use crate::core::query::{QueryEngine, SearchCriteria};
use crate::core::stats::StatsAggregator;
use crate::domain::model::{DetectionResult, Disease, Stats};
use crate::domain::ports::{Clock, ConfigProvider, Delay, RandomSource, StatsSource};
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use std::sync::Arc;
use tokio::sync::watch;

/// One user session: the catalog, its detection service and ledger, and the
/// query and stats views over them. Built at session start, dropped at the end.
pub struct Session<R = crate::adapters::StdRandom, D = crate::adapters::TokioDelay, K = crate::adapters::SystemClock>
where
    R: RandomSource,
    D: Delay,
    K: Clock,
{
    catalog: Arc<DiseaseCatalog>,
    detection: DetectionService<R, D, K>,
    query: QueryEngine,
    seed_stats: StatsAggregator,
    stats_source: StatsSource,
}

impl Session {
    /// Session over the embedded catalog, configured from `config`.
    ///
    /// The config is validated first, so a zero history cap or timeout is
    /// rejected with `ConfigValidation`.
    pub fn start<C: ConfigProvider + Validate>(config: &C) -> Result<Self> {
        config.validate()?;
        let catalog = Arc::new(DiseaseCatalog::load()?);
        let detection = DetectionService::from_config(catalog.clone(), config);
        Session::assemble(catalog, detection, config.stats_source())
    }
}

impl<R, D, K> Session<R, D, K>
where
    R: RandomSource,
    D: Delay,
    K: Clock,
{
    /// Session over an already-built detection service. `catalog` must be the
    /// catalog the service draws from.
    pub fn assemble(
        catalog: Arc<DiseaseCatalog>,
        detection: DetectionService<R, D, K>,
        stats_source: StatsSource,
    ) -> Result<Self> {
        let seed_stats = StatsAggregator::from_seed(&catalog)?;
        tracing::info!(
            "Session started: {} diseases, stats source {:?}",
            catalog.len(),
            stats_source
        );
        Ok(Self {
            catalog,
            detection,
            query: QueryEngine::new(),
            seed_stats,
            stats_source,
        })
    }

    pub fn load_catalog(&self) -> &[Disease] {
        self.catalog.diseases()
    }

    pub fn catalog(&self) -> &DiseaseCatalog {
        &self.catalog
    }

    pub async fn submit_detection(&self, image_ref: impl Into<String>) -> Result<DetectionResult> {
        self.detection.submit(image_ref).await
    }

    pub fn detection_state(&self) -> DetectionState {
        self.detection.state()
    }

    pub fn subscribe_detection(&self) -> watch::Receiver<DetectionState> {
        self.detection.subscribe()
    }

    pub fn search(&self, criteria: &SearchCriteria) -> Vec<&Disease> {
        self.query.search(&self.catalog, criteria)
    }

    pub fn clear_filters(&self, criteria: &mut SearchCriteria) {
        self.query.clear_filters(criteria);
    }

    pub fn get_disease_by_id(&self, id: &str) -> Result<&Disease> {
        self.catalog.get_by_id(id)
    }

    pub fn get_history(&self) -> Vec<DetectionResult> {
        self.detection.history()
    }

    pub fn stats_aggregator(&self) -> StatsAggregator {
        match self.stats_source {
            StatsSource::Seed => self.seed_stats.clone(),
            StatsSource::Live => self.detection.read_ledger(|ledger| {
                StatsAggregator::from_history(&self.catalog, ledger, self.detection.counters())
            }),
        }
    }

    pub fn get_stats(&self) -> Stats {
        self.stats_aggregator().snapshot()
    }
}
