use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant};
use tracing::{debug, warn};

const WINDOW: Duration = Duration::from_secs(1);
const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug)]
struct IpRecord {
    count: u32,
    window_start: Instant,
    last_seen: Instant,
}

/// Per-IP fixed-window rate limiter.
///
/// The window is fixed, not sliding: a burst straddling a window boundary
/// can admit up to ~2x the threshold within a short span. That trade-off
/// is intentional and kept.
pub struct RateLimiter {
    requests_per_second: u32,
    cleanup_interval: Duration,
    ips: RwLock<HashMap<String, IpRecord>>,
}

impl RateLimiter {
    /// `requests_per_second`: maximum requests admitted per second per IP.
    pub fn new(requests_per_second: u32) -> Self {
        Self::with_cleanup_interval(requests_per_second, DEFAULT_CLEANUP_INTERVAL)
    }

    pub fn with_cleanup_interval(requests_per_second: u32, cleanup_interval: Duration) -> Self {
        Self {
            requests_per_second,
            cleanup_interval,
            ips: RwLock::new(HashMap::new()),
        }
    }

    /// Whether `ip` may make another request right now.
    pub async fn allow(&self, ip: &str) -> bool {
        let now = Instant::now();
        let mut ips = self.ips.write().await;

        match ips.entry(ip.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(IpRecord { count: 1, window_start: now, last_seen: now });
                true
            }
            Entry::Occupied(mut slot) => {
                let record = slot.get_mut();
                if now.duration_since(record.window_start) >= WINDOW {
                    record.count = 1;
                    record.window_start = now;
                    record.last_seen = now;
                    true
                } else {
                    record.count += 1;
                    record.last_seen = now;
                    record.count <= self.requests_per_second
                }
            }
        }
    }

    /// Number of IPs currently tracked (bounded by the eviction task).
    pub async fn tracked_ips(&self) -> usize {
        self.ips.read().await.len()
    }

    /// Spawn the periodic eviction task. It runs until `shutdown` fires,
    /// dropping records not seen for longer than the cleanup interval.
    pub fn spawn_cleanup(
        self: Arc<Self>,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.cleanup_interval);
            // The first tick of a tokio interval completes immediately;
            // consume it so eviction starts one full interval from now.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if AssertUnwindSafe(self.evict_stale())
                            .catch_unwind()
                            .await
                            .is_err()
                        {
                            warn!("rate limiter eviction tick panicked");
                        }
                    }
                    _ = shutdown.changed() => {
                        debug!("rate limiter eviction task stopping");
                        break;
                    }
                }
            }
        })
    }

    async fn evict_stale(&self) {
        let now = Instant::now();
        let mut ips = self.ips.write().await;
        let before = ips.len();
        ips.retain(|_, record| now.duration_since(record.last_seen) <= self.cleanup_interval);
        let evicted = before - ips.len();
        if evicted > 0 {
            debug!(evicted, remaining = ips.len(), "evicted stale rate limit records");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    #[tokio::test(start_paused = true)]
    async fn admits_up_to_the_threshold_within_one_window() {
        let limiter = RateLimiter::new(3);

        assert!(limiter.allow("1.2.3.4").await);
        assert!(limiter.allow("1.2.3.4").await);
        assert!(limiter.allow("1.2.3.4").await);
        assert!(!limiter.allow("1.2.3.4").await);
        assert!(!limiter.allow("1.2.3.4").await);
    }

    #[tokio::test(start_paused = true)]
    async fn window_resets_after_one_second() {
        let limiter = RateLimiter::new(3);
        for _ in 0..5 {
            limiter.allow("1.2.3.4").await;
        }
        assert!(!limiter.allow("1.2.3.4").await);

        advance(Duration::from_millis(1100)).await;
        assert!(limiter.allow("1.2.3.4").await);
    }

    #[tokio::test(start_paused = true)]
    async fn distinct_ips_count_independently() {
        let limiter = Arc::new(RateLimiter::new(1));

        let mut handles = Vec::new();
        for i in 0..16 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                limiter.allow(&format!("10.0.0.{i}")).await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap());
        }
        assert_eq!(limiter.tracked_ips().await, 16);

        // A second hit from one IP is denied without touching the others.
        assert!(!limiter.allow("10.0.0.0").await);
        assert!(limiter.allow("10.99.0.1").await);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_records_are_evicted() {
        let limiter = RateLimiter::with_cleanup_interval(3, Duration::from_secs(60));
        limiter.allow("1.2.3.4").await;
        assert_eq!(limiter.tracked_ips().await, 1);

        advance(Duration::from_secs(61)).await;
        limiter.evict_stale().await;
        assert_eq!(limiter.tracked_ips().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn recently_seen_records_survive_a_tick() {
        let limiter = RateLimiter::with_cleanup_interval(3, Duration::from_secs(60));
        limiter.allow("1.2.3.4").await;

        advance(Duration::from_secs(30)).await;
        limiter.evict_stale().await;
        assert_eq!(limiter.tracked_ips().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cleanup_task_stops_on_shutdown_signal() {
        let limiter = Arc::new(RateLimiter::with_cleanup_interval(3, Duration::from_secs(1)));
        let (tx, rx) = watch::channel(false);
        let handle = Arc::clone(&limiter).spawn_cleanup(rx);

        limiter.allow("1.2.3.4").await;
        tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
