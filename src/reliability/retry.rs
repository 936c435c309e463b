use crate::config::Config;
use crate::sender::DeliveryError;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// With retry disabled a delivery error propagates to the caller so the
    /// external buffer layer can redeliver the whole chunk.
    pub enabled: bool,
    /// 0 means unlimited attempts.
    pub max_attempts: u32,
    pub min_interval: Duration,
    pub max_interval: Duration,
    /// Wall-clock budget since the first attempt; 0 means unlimited.
    pub max_elapsed: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_attempts: 0,
            min_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(300),
            max_elapsed: Duration::from_secs(72 * 3600),
        }
    }
}

impl From<&Config> for RetryConfig {
    fn from(config: &Config) -> Self {
        Self {
            enabled: config.use_internal_retry,
            max_attempts: config.retry_max_times,
            min_interval: config.retry_min_interval(),
            max_interval: config.retry_max_interval(),
            max_elapsed: config.retry_timeout(),
        }
    }
}

/// Terminal state of one delivery loop. `Dropped` is silent towards the
/// caller: the unit is gone and only a warning records it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { attempts: u32 },
    Dropped { attempts: u32 },
}

/// Bounded exponential-backoff retry around a single delivery attempt.
///
/// All state (attempt counter, start time, current interval) lives on the
/// stack of one `run` call; nothing is shared across delivery units or
/// flush invocations. Backoff sleeps deliberately block the invocation:
/// a stalled destination slows that worker's flush cadence.
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub async fn run<F, Fut>(&self, mut attempt: F) -> Result<DeliveryOutcome, DeliveryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), DeliveryError>>,
    {
        let started = Instant::now();
        let mut interval = self.config.min_interval;
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let error = match attempt().await {
                Ok(()) => return Ok(DeliveryOutcome::Delivered { attempts }),
                Err(e) if !self.config.enabled => return Err(e),
                Err(e) => e,
            };

            let elapsed = started.elapsed();
            let out_of_attempts =
                self.config.max_attempts > 0 && attempts >= self.config.max_attempts;
            let out_of_time =
                self.config.max_elapsed > Duration::ZERO && elapsed > self.config.max_elapsed;

            if out_of_attempts || out_of_time {
                warn!(
                    "Dropping batch after {attempts} attempts ({}s elapsed): {error}",
                    elapsed.as_secs()
                );
                return Ok(DeliveryOutcome::Dropped { attempts });
            }

            warn!("Delivery attempt {attempts} failed, retrying in {interval:?}: {error}");
            sleep(interval).await;
            interval = (interval * 2).min(self.config.max_interval);
        }
    }
}
