use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::BoardConfig;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Gate in front of every provider call.
///
/// Bounds the number of outstanding requests and spaces them to a rate
/// quota, so a parallel board build stays within the provider's limits.
#[derive(Clone)]
pub struct RequestThrottle {
    limiter: Arc<DirectRateLimiter>,
    slots: Arc<Semaphore>,
    max_in_flight: usize,
}

/// Held for the duration of one provider call.
#[derive(Debug)]
pub struct ThrottlePermit {
    _slot: Option<OwnedSemaphorePermit>,
}

impl RequestThrottle {
    pub fn new(max_in_flight: usize, quota_window: Duration, quota_limit: u32) -> Self {
        let max_in_flight = max_in_flight.max(1);
        Self {
            limiter: Arc::new(RateLimiter::direct(quota_from_window(
                quota_window,
                quota_limit,
            ))),
            slots: Arc::new(Semaphore::new(max_in_flight)),
            max_in_flight,
        }
    }

    pub fn from_config(config: &BoardConfig) -> Self {
        Self::new(
            config.max_concurrency,
            Duration::from_secs(60),
            config.rate_limit_per_minute,
        )
    }

    pub const fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    /// Waits for a free slot, then for rate budget.
    pub async fn acquire(&self) -> ThrottlePermit {
        // The semaphore is never closed, so a missing permit cannot happen in practice.
        let slot = self.slots.clone().acquire_owned().await.ok();
        self.limiter.until_ready().await;
        ThrottlePermit { _slot: slot }
    }
}

fn quota_from_window(quota_window: Duration, quota_limit: u32) -> Quota {
    let burst = NonZeroU32::new(quota_limit.max(1)).unwrap_or(NonZeroU32::MIN);

    let seconds_per_cell = (quota_window.as_secs_f64() / f64::from(burst.get())).max(0.001);
    let period = Duration::from_secs_f64(seconds_per_cell);

    Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(burst))
        .allow_burst(burst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bounds_outstanding_permits() {
        let throttle = RequestThrottle::new(2, Duration::from_secs(1), 1_000);

        let first = throttle.acquire().await;
        let _second = throttle.acquire().await;
        assert_eq!(throttle.available_slots(), 0);

        let blocked = tokio::time::timeout(Duration::from_millis(30), throttle.acquire()).await;
        assert!(blocked.is_err(), "third permit must wait for a free slot");

        drop(first);
        let third = tokio::time::timeout(Duration::from_millis(200), throttle.acquire()).await;
        assert!(third.is_ok(), "released slot should be reusable");
    }

    #[tokio::test]
    async fn waits_once_rate_budget_is_spent() {
        let throttle = RequestThrottle::new(10, Duration::from_secs(60), 2);

        drop(throttle.acquire().await);
        drop(throttle.acquire().await);

        let blocked = tokio::time::timeout(Duration::from_millis(50), throttle.acquire()).await;
        assert!(blocked.is_err(), "burst of two per minute is exhausted");
    }

    #[test]
    fn zero_concurrency_is_clamped_to_one() {
        let throttle = RequestThrottle::new(0, Duration::from_secs(60), 0);
        assert_eq!(throttle.max_in_flight(), 1);
        assert_eq!(throttle.available_slots(), 1);
    }
}
