#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use crop_disease_kb::domain::ports::{Clock, Delay, RandomSource};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Replays fixed index and confidence sequences, then falls back to the lowest value.
pub struct ScriptedRandom {
    indices: Mutex<VecDeque<usize>>,
    confidences: Mutex<VecDeque<u8>>,
}

impl ScriptedRandom {
    pub fn new(indices: &[usize], confidences: &[u8]) -> Self {
        Self {
            indices: Mutex::new(indices.iter().copied().collect()),
            confidences: Mutex::new(confidences.iter().copied().collect()),
        }
    }
}

impl RandomSource for ScriptedRandom {
    fn next_index(&self, upper: usize) -> usize {
        self.indices.lock().unwrap().pop_front().unwrap_or(0) % upper
    }

    fn next_in_range(&self, low: u8, high: u8) -> u8 {
        self.confidences
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(low)
            .clamp(low, high)
    }
}

/// Advances by `step` on every reading.
pub struct SteppingClock {
    next: Mutex<DateTime<Utc>>,
    step: ChronoDuration,
}

impl SteppingClock {
    pub fn starting_at(start: DateTime<Utc>, step: ChronoDuration) -> Self {
        Self {
            next: Mutex::new(start),
            step,
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let mut next = self.next.lock().unwrap();
        let now = *next;
        *next = now + self.step;
        now
    }
}

pub struct InstantDelay;

#[async_trait]
impl Delay for InstantDelay {
    async fn wait(&self, _duration: Duration) {}
}

pub fn june_first() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap()
}
