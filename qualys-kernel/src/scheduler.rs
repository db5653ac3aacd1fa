//! Minimum-spacing gate for outbound requests.

use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::trace;

/// Minimum gap between the starts of two consecutive requests.
pub const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(1000);

/// Serialises operations so that no two start closer together than the
/// configured interval.
///
/// Callers queue on a fair lock, so suspended callers proceed in the order
/// they called [`RateLimiter::schedule`]. The lock is released before the
/// operation itself runs: spacing is measured between starts, not between
/// completions. There is no bursting and no adaptation to server hints.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_dispatch: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Creates a limiter with the supplied minimum spacing.
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_dispatch: Mutex::new(None),
        }
    }

    /// Waits for the next free slot, records it, then runs `operation`.
    pub async fn schedule<F, Fut>(&self, operation: F) -> Fut::Output
    where
        F: FnOnce() -> Fut,
        Fut: Future,
    {
        {
            let mut last = self.last_dispatch.lock().await;
            if let Some(previous) = *last {
                let elapsed = previous.elapsed();
                if elapsed < self.min_interval {
                    let wait = self.min_interval - elapsed;
                    let wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX);
                    trace!(wait_ms, "rate limiter delaying dispatch");
                    sleep(wait).await;
                }
            }
            *last = Some(Instant::now());
        }
        operation().await
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(MIN_REQUEST_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex as StdMutex};

    use futures::future::join_all;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_dispatch_is_immediate() {
        let limiter = RateLimiter::default();
        let before = Instant::now();
        let started = limiter.schedule(|| async { Instant::now() }).await;
        assert_eq!(started, before);
    }

    #[tokio::test(start_paused = true)]
    async fn back_to_back_dispatches_are_spaced() {
        let limiter = RateLimiter::default();
        let order = Arc::new(StdMutex::new(Vec::new()));

        let calls = (0..5).map(|index| {
            let order = Arc::clone(&order);
            limiter.schedule(move || async move {
                order.lock().unwrap().push(index);
                Instant::now()
            })
        });
        let starts = join_all(calls).await;

        for pair in starts.windows(2) {
            assert!(pair[1] - pair[0] >= MIN_REQUEST_INTERVAL);
        }
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn spacing_is_measured_from_the_previous_start() {
        let limiter = RateLimiter::default();

        let first = limiter
            .schedule(|| async {
                let started = Instant::now();
                sleep(Duration::from_secs(3)).await;
                started
            })
            .await;
        let second = limiter.schedule(|| async { Instant::now() }).await;

        assert_eq!(second - first, Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn partial_wait_covers_only_the_remainder() {
        let limiter = RateLimiter::new(Duration::from_millis(1000));
        let first = limiter.schedule(|| async { Instant::now() }).await;
        sleep(Duration::from_millis(400)).await;
        let second = limiter.schedule(|| async { Instant::now() }).await;

        assert_eq!(second - first, Duration::from_millis(1000));
    }
}
