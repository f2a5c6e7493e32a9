use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{future::Future, num::NonZeroU32, sync::Arc};
use tokio::sync::Semaphore;

type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Paces bulk chain lookups: a token bucket bounds the request rate and a
/// semaphore bounds how many lookups are in flight at once.
#[derive(Clone, Default)]
pub struct RequestScheduler {
    limiter: Option<Arc<Limiter>>,
    permits: Option<Arc<Semaphore>>,
}

impl RequestScheduler {
    pub fn new(requests_per_second: NonZeroU32, max_in_flight: usize) -> Self {
        let quota = Quota::per_second(requests_per_second);
        Self {
            limiter: Some(Arc::new(RateLimiter::direct(quota))),
            permits: Some(Arc::new(Semaphore::new(max_in_flight.max(1)))),
        }
    }

    /// Scheduler that runs every request immediately.
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub async fn run<F: Future>(&self, request: F) -> F::Output {
        // The semaphore is never closed, so acquiring only fails if that changes.
        let _permit = match &self.permits {
            Some(permits) => permits.acquire().await.ok(),
            None => None,
        };

        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        request.await
    }
}
