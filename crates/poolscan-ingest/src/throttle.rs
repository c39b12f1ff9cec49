//! Per-source request throttling.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Minimum-interval limiter for outbound calls to one source.
///
/// The first call goes through immediately; each subsequent call waits until
/// the configured interval has passed since the previous one. Every source
/// carries its own instance, so pools never throttle each other.
pub struct Throttle {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl Throttle {
    /// Create a limiter with the given minimum interval between calls.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    /// Wait until the next call is allowed, then claim the slot.
    pub async fn wait(&self) {
        let mut last = self.last.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.interval {
                tokio::time::sleep(self.interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_call_is_immediate() {
        let throttle = Throttle::new(Duration::from_secs(60));
        let start = Instant::now();
        throttle.wait().await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn second_call_waits_out_the_interval() {
        let throttle = Throttle::new(Duration::from_secs(5));
        throttle.wait().await;
        let start = Instant::now();
        throttle.wait().await;
        assert!(start.elapsed() >= Duration::from_secs(5));
    }
}
