// Adapters layer: concrete implementations of the domain ports (randomness, time, delay).

pub mod random {
    use crate::domain::ports::RandomSource;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::sync::Mutex;

    /// `StdRng` behind a mutex so the source can be shared by `&self`.
    pub struct StdRandom {
        rng: Mutex<StdRng>,
    }

    impl StdRandom {
        pub fn seeded(seed: u64) -> Self {
            Self {
                rng: Mutex::new(StdRng::seed_from_u64(seed)),
            }
        }

        pub fn from_entropy() -> Self {
            Self {
                rng: Mutex::new(StdRng::from_os_rng()),
            }
        }

        pub fn from_seed_option(seed: Option<u64>) -> Self {
            match seed {
                Some(seed) => Self::seeded(seed),
                None => Self::from_entropy(),
            }
        }

        fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
            // A poisoned lock still holds a usable generator.
            let mut guard = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            f(&mut guard)
        }
    }

    impl RandomSource for StdRandom {
        fn next_index(&self, upper: usize) -> usize {
            self.with_rng(|rng| rng.random_range(0..upper))
        }

        fn next_in_range(&self, low: u8, high: u8) -> u8 {
            self.with_rng(|rng| rng.random_range(low..=high))
        }
    }

}

pub mod clock {
    use crate::domain::ports::Clock;
    use chrono::{DateTime, Utc};

    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

pub mod delay {
    use crate::domain::ports::Delay;
    use async_trait::async_trait;
    use std::time::Duration;

    #[derive(Debug, Clone, Copy, Default)]
    pub struct TokioDelay;

    #[async_trait]
    impl Delay for TokioDelay {
        async fn wait(&self, duration: Duration) {
            tokio::time::sleep(duration).await;
        }
    }
}

pub use clock::SystemClock;
pub use delay::TokioDelay;
pub use random::StdRandom;
