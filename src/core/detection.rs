use crate::adapters::{StdRandom, SystemClock, TokioDelay};
use crate::core::catalog::DiseaseCatalog;
use crate::core::history::HistoryLedger;
use crate::domain::model::{DetectionResult, Disease};
use crate::domain::ports::{Clock, ConfigProvider, Delay, RandomSource};
use crate::utils::error::{ErrorKind, KbError, Result};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::watch;

pub const CONFIDENCE_MIN: u8 = 70;
pub const CONFIDENCE_MAX: u8 = 95;

pub const AIR_CIRCULATION_ADVISORY: &str = "Ensure proper crop spacing for air circulation";
pub const HUMIDITY_ADVISORY: &str = "Monitor humidity levels in your field";
const FALLBACK_TREATMENT_ADVISORY: &str =
    "Consult a local agricultural extension officer for a suitable treatment";

#[derive(Debug, Clone, PartialEq)]
pub enum DetectionState {
    Idle,
    Submitting { image_ref: String },
    Completed(DetectionResult),
    Failed { kind: ErrorKind, message: String },
}

impl DetectionState {
    pub fn is_submitting(&self) -> bool {
        matches!(self, DetectionState::Submitting { .. })
    }
}

/// Settled detection attempts. Busy rejections never count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectionCounters {
    pub completed: u64,
    pub failed: u64,
}

impl DetectionCounters {
    pub fn attempts(&self) -> u64 {
        self.completed + self.failed
    }

    pub fn success_rate(&self) -> f64 {
        match self.attempts() {
            0 => 0.0,
            attempts => self.completed as f64 * 100.0 / attempts as f64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionSettings {
    pub delay: Duration,
    pub timeout: Duration,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(2000),
            timeout: Duration::from_millis(10_000),
        }
    }
}

impl DetectionSettings {
    pub fn from_provider<C: ConfigProvider>(config: &C) -> Self {
        Self {
            delay: config.detection_delay(),
            timeout: config.detection_timeout(),
        }
    }
}

/// The three advisories attached to every detection, in fixed order.
pub fn recommendations_for(disease: &Disease) -> Vec<String> {
    let treatment = disease
        .treatments
        .chemical
        .first()
        .or_else(|| disease.treatments.organic.first());

    let first = match treatment {
        Some(treatment) => format!("Apply {} as recommended", treatment),
        None => FALLBACK_TREATMENT_ADVISORY.to_string(),
    };

    vec![
        first,
        AIR_CIRCULATION_ADVISORY.to_string(),
        HUMIDITY_ADVISORY.to_string(),
    ]
}

/// Simulated disease classification with single-flight submission.
///
/// A successful call appends its result to the ledger owned by the service.
/// A failed or dropped call leaves the ledger untouched.
pub struct DetectionService<R = StdRandom, D = TokioDelay, K = SystemClock>
where
    R: RandomSource,
    D: Delay,
    K: Clock,
{
    catalog: Arc<DiseaseCatalog>,
    random: R,
    delay: D,
    clock: K,
    settings: DetectionSettings,
    ledger: RwLock<HistoryLedger>,
    state: watch::Sender<DetectionState>,
    counters: Mutex<DetectionCounters>,
    last_id: Mutex<i64>,
}

impl DetectionService {
    /// Service wired to the real randomness, clock and delay.
    pub fn from_config<C: ConfigProvider>(catalog: Arc<DiseaseCatalog>, config: &C) -> Self {
        DetectionService::new(
            catalog,
            StdRandom::from_seed_option(config.random_seed()),
            TokioDelay,
            SystemClock,
        )
        .with_settings(DetectionSettings::from_provider(config))
        .with_ledger(HistoryLedger::from_limit(config.history_max_entries()))
    }
}

impl<R, D, K> DetectionService<R, D, K>
where
    R: RandomSource,
    D: Delay,
    K: Clock,
{
    pub fn new(catalog: Arc<DiseaseCatalog>, random: R, delay: D, clock: K) -> Self {
        let (state, _) = watch::channel(DetectionState::Idle);
        Self {
            catalog,
            random,
            delay,
            clock,
            settings: DetectionSettings::default(),
            ledger: RwLock::new(HistoryLedger::new()),
            state,
            counters: Mutex::new(DetectionCounters::default()),
            last_id: Mutex::new(0),
        }
    }

    pub fn with_settings(mut self, settings: DetectionSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_ledger(mut self, ledger: HistoryLedger) -> Self {
        self.ledger = RwLock::new(ledger);
        self
    }

    /// Runs one simulated detection for `image_ref`.
    ///
    /// Rejected with [`KbError::Busy`] while another call is in flight.
    pub async fn submit(&self, image_ref: impl Into<String>) -> Result<DetectionResult> {
        let image_ref = image_ref.into();

        let claimed = self.state.send_if_modified(|state| {
            if state.is_submitting() {
                false
            } else {
                *state = DetectionState::Submitting {
                    image_ref: image_ref.clone(),
                };
                true
            }
        });
        if !claimed {
            tracing::warn!("Rejected detection for {}: another detection is running", image_ref);
            return Err(KbError::Busy);
        }

        tracing::info!("Detection started for {}", image_ref);
        let mut in_flight = InFlight {
            state: &self.state,
            settled: false,
        };

        let outcome = self.run(&image_ref).await;

        match &outcome {
            Ok(result) => {
                lock(&self.counters).completed += 1;
                tracing::info!(
                    "Detection {} completed: {} ({}% confidence)",
                    result.id,
                    result.disease_name,
                    result.confidence
                );
                in_flight.settle(DetectionState::Completed(result.clone()));
            }
            Err(e) => {
                lock(&self.counters).failed += 1;
                tracing::warn!("Detection for {} failed: {}", image_ref, e);
                in_flight.settle(DetectionState::Failed {
                    kind: e.kind(),
                    message: e.to_string(),
                });
            }
        }

        outcome
    }

    async fn run(&self, image_ref: &str) -> Result<DetectionResult> {
        if self.catalog.is_empty() {
            return Err(KbError::EmptyCatalog);
        }

        let diseases = self.catalog.diseases();
        let disease = &diseases[self.random.next_index(diseases.len())];
        let confidence = self.random.next_in_range(CONFIDENCE_MIN, CONFIDENCE_MAX);
        let (id, timestamp) = self.stamp();

        let result = DetectionResult {
            id,
            timestamp,
            image_ref: image_ref.to_string(),
            disease_id: disease.id.clone(),
            disease_name: disease.name.clone(),
            confidence,
            recommendations: recommendations_for(disease),
        };
        tracing::debug!("Detection {} picked disease {}", result.id, disease.id);

        tokio::time::timeout(self.settings.timeout, self.delay.wait(self.settings.delay))
            .await
            .map_err(|_| KbError::Timeout {
                timeout_ms: self.settings.timeout.as_millis() as u64,
            })?;

        self.ledger
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .append(result.clone())?;

        Ok(result)
    }

    /// Id from the current time in milliseconds, bumped past the previous id
    /// when the clock has not moved on. The timestamp never precedes the
    /// newest ledger entry.
    fn stamp(&self) -> (String, DateTime<Utc>) {
        let now = self.clock.now();

        let mut last_id = lock(&self.last_id);
        let id = now.timestamp_millis().max(*last_id + 1);
        *last_id = id;

        let newest = self
            .ledger
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .latest()
            .map(|entry| entry.timestamp);
        let timestamp = match newest {
            Some(newest) if newest > now => newest,
            _ => now,
        };

        (id.to_string(), timestamp)
    }

    pub fn state(&self) -> DetectionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DetectionState> {
        self.state.subscribe()
    }

    /// Returns a settled state to `Idle`. No effect while a call is in flight.
    pub fn acknowledge(&self) {
        self.state.send_if_modified(|state| {
            if state.is_submitting() || *state == DetectionState::Idle {
                false
            } else {
                *state = DetectionState::Idle;
                true
            }
        });
    }

    pub fn counters(&self) -> DetectionCounters {
        *lock(&self.counters)
    }

    pub fn history(&self) -> Vec<DetectionResult> {
        self.read_ledger(|ledger| ledger.list())
    }

    pub fn read_ledger<T>(&self, f: impl FnOnce(&HistoryLedger) -> T) -> T {
        let ledger = self.ledger.read().unwrap_or_else(PoisonError::into_inner);
        f(&ledger)
    }
}

/// Releases the single-flight claim if a `submit` future is dropped mid-flight.
struct InFlight<'a> {
    state: &'a watch::Sender<DetectionState>,
    settled: bool,
}

impl InFlight<'_> {
    fn settle(&mut self, state: DetectionState) {
        self.settled = true;
        self.state.send_replace(state);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::debug!("Detection dropped before completion");
            self.state.send_replace(DetectionState::Idle);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
