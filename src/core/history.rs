use crate::domain::model::DetectionResult;
use crate::utils::error::{KbError, Result};
use std::collections::VecDeque;

/// Append-only record of detections, newest first.
#[derive(Debug, Clone, Default)]
pub struct HistoryLedger {
    entries: VecDeque<DetectionResult>,
    max_entries: Option<usize>,
}

impl HistoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// A ledger that drops its oldest entries once it holds more than `max_entries`.
    pub fn with_capacity_limit(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries: Some(max_entries),
        }
    }

    pub fn from_limit(max_entries: Option<usize>) -> Self {
        match max_entries {
            Some(limit) => Self::with_capacity_limit(limit),
            None => Self::new(),
        }
    }

    /// Prepends `result`. Rejects a result older than the current head so the
    /// ledger stays in reverse-chronological order.
    pub fn append(&mut self, result: DetectionResult) -> Result<()> {
        if let Some(head) = self.entries.front() {
            if result.timestamp < head.timestamp {
                return Err(KbError::validation(
                    "timestamp",
                    &result.timestamp.to_rfc3339(),
                    format!("older than the latest entry at {}", head.timestamp.to_rfc3339()),
                ));
            }
        }

        self.entries.push_front(result);

        if let Some(limit) = self.max_entries {
            while self.entries.len() > limit {
                if let Some(evicted) = self.entries.pop_back() {
                    tracing::debug!("History cap {} reached, evicted detection {}", limit, evicted.id);
                }
            }
        }

        Ok(())
    }

    /// Snapshot of every result in current order. Later appends do not affect it.
    pub fn list(&self) -> Vec<DetectionResult> {
        self.entries.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DetectionResult> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&DetectionResult> {
        self.entries.front()
    }

    pub fn get(&self, id: &str) -> Option<&DetectionResult> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
