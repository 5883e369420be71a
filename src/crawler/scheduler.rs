//! Concurrency pools and request pacing
//!
//! Two independent semaphores bound the pipeline: one for plain HTTP fetches
//! and one for browser renders. Keeping them separate means slow renders
//! never hold up cheap fetches.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Permit pools plus the pause applied after each request
#[derive(Debug, Clone)]
pub struct Scheduler {
    http_permits: Arc<Semaphore>,
    render_permits: Arc<Semaphore>,
    request_delay: Duration,
}

impl Scheduler {
    /// Creates a scheduler
    ///
    /// # Arguments
    ///
    /// * `concurrency` - Maximum simultaneous HTTP fetches (at least 1)
    /// * `render_concurrency` - Maximum simultaneous browser renders (at least 1)
    /// * `request_delay` - Pause taken after each request while still
    ///   holding its permit
    pub fn new(concurrency: usize, render_concurrency: usize, request_delay: Duration) -> Self {
        Self {
            http_permits: Arc::new(Semaphore::new(concurrency.max(1))),
            render_permits: Arc::new(Semaphore::new(render_concurrency.max(1))),
            request_delay,
        }
    }

    /// Waits for a slot in the HTTP pool
    pub async fn acquire_http(&self) -> Option<OwnedSemaphorePermit> {
        self.http_permits.clone().acquire_owned().await.ok()
    }

    /// Waits for a slot in the render pool
    pub async fn acquire_render(&self) -> Option<OwnedSemaphorePermit> {
        self.render_permits.clone().acquire_owned().await.ok()
    }

    /// Sleeps for the configured inter-request delay
    pub async fn pause(&self) {
        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }
    }

    pub fn request_delay(&self) -> Duration {
        self.request_delay
    }

    pub fn available_http(&self) -> usize {
        self.http_permits.available_permits()
    }

    pub fn available_render(&self) -> usize {
        self.render_permits.available_permits()
    }
}

/// Calculates the delay between requests to the target site
///
/// This takes the maximum of the configured delay and the robots.txt crawl
/// delay, if one was given.
///
/// # Arguments
///
/// * `config_delay_ms` - `crawl-delay-ms` from the configuration
/// * `robots_delay_secs` - `Crawl-delay` from robots.txt, in seconds
pub fn effective_delay(config_delay_ms: u64, robots_delay_secs: Option<f64>) -> Duration {
    let config_delay = Duration::from_millis(config_delay_ms);
    let robots_delay = robots_delay_secs
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .unwrap_or(Duration::ZERO);

    std::cmp::max(config_delay, robots_delay)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_delay_uses_config() {
        assert_eq!(effective_delay(1000, None), Duration::from_millis(1000));
    }

    #[test]
    fn test_effective_delay_with_robots_delay() {
        assert_eq!(effective_delay(1000, Some(5.0)), Duration::from_secs(5));
    }

    #[test]
    fn test_effective_delay_robots_smaller_than_config() {
        assert_eq!(effective_delay(1000, Some(0.5)), Duration::from_millis(1000));
    }

    #[test]
    fn test_effective_delay_ignores_invalid_robots_value() {
        assert_eq!(effective_delay(300, Some(-2.0)), Duration::from_millis(300));
        assert_eq!(effective_delay(0, Some(f64::NAN)), Duration::ZERO);
    }

    #[test]
    fn test_zero_concurrency_is_clamped() {
        let scheduler = Scheduler::new(0, 0, Duration::ZERO);
        assert_eq!(scheduler.available_http(), 1);
        assert_eq!(scheduler.available_render(), 1);
    }

    #[tokio::test]
    async fn test_pools_are_independent() {
        let scheduler = Scheduler::new(2, 1, Duration::ZERO);

        let render = scheduler.acquire_render().await;
        assert!(render.is_some());
        assert_eq!(scheduler.available_render(), 0);

        let first = scheduler.acquire_http().await;
        let second = scheduler.acquire_http().await;
        assert!(first.is_some() && second.is_some());
        assert_eq!(scheduler.available_http(), 0);

        drop(first);
        assert_eq!(scheduler.available_http(), 1);
        drop(render);
        assert_eq!(scheduler.available_render(), 1);
    }

    #[tokio::test]
    async fn test_pause_waits_for_delay() {
        let scheduler = Scheduler::new(1, 1, Duration::from_millis(30));
        let start = std::time::Instant::now();
        scheduler.pause().await;
        assert!(start.elapsed() >= Duration::from_millis(30));
    }
}
