use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant};
use tracing::{debug, warn};

const DEFAULT_BLOCK_DURATION: Duration = Duration::from_secs(5 * 60);
const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

struct DetectorState {
    window_start: Instant,
    // Request counts per IP inside the current global window.
    counts: HashMap<String, u32>,
    // Blocked IPs with the instant they were quarantined.
    blocklist: HashMap<String, Instant>,
}

/// Coarse abuse detector: counts requests per IP over one shared global
/// window and quarantines offenders for a fixed block duration.
///
/// The window is global: when it expires the whole counter map resets at
/// once, so an attacker spread exactly across the boundary is undercounted.
/// Kept as-is.
pub struct DdosDetector {
    max_requests_per_ip: u32,
    window_duration: Duration,
    block_duration: Duration,
    cleanup_interval: Duration,
    state: RwLock<DetectorState>,
}

impl DdosDetector {
    pub fn new(max_requests_per_ip: u32, window_duration: Duration) -> Self {
        Self::with_durations(
            max_requests_per_ip,
            window_duration,
            DEFAULT_BLOCK_DURATION,
            DEFAULT_CLEANUP_INTERVAL,
        )
    }

    pub fn with_durations(
        max_requests_per_ip: u32,
        window_duration: Duration,
        block_duration: Duration,
        cleanup_interval: Duration,
    ) -> Self {
        Self {
            max_requests_per_ip,
            window_duration,
            block_duration,
            cleanup_interval,
            state: RwLock::new(DetectorState {
                window_start: Instant::now(),
                counts: HashMap::new(),
                blocklist: HashMap::new(),
            }),
        }
    }

    /// Whether `ip` is currently quarantined. Read-only: repeated calls
    /// never change detector state.
    pub async fn is_blocked(&self, ip: &str) -> bool {
        let state = self.state.read().await;
        match state.blocklist.get(ip) {
            Some(blocked_at) => blocked_at.elapsed() <= self.block_duration,
            None => false,
        }
    }

    /// Count a request from `ip`. Returns `false` when the request pushes
    /// the IP over the window threshold; the IP is quarantined at that
    /// moment.
    pub async fn record_request(&self, ip: &str) -> bool {
        let now = Instant::now();
        let mut state = self.state.write().await;

        if now.duration_since(state.window_start) > self.window_duration {
            state.counts.clear();
            state.window_start = now;
        }

        let count = {
            let count = state.counts.entry(ip.to_string()).or_insert(0);
            *count += 1;
            *count
        };

        if count > self.max_requests_per_ip {
            state.blocklist.insert(ip.to_string(), now);
            return false;
        }

        true
    }

    /// Number of IPs on the blocklist (including expired, not yet evicted).
    pub async fn blocked_count(&self) -> usize {
        self.state.read().await.blocklist.len()
    }

    /// Spawn the periodic eviction task; runs until `shutdown` fires,
    /// dropping blocklist entries older than the block duration.
    pub fn spawn_cleanup(
        self: Arc<Self>,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.cleanup_interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if AssertUnwindSafe(self.evict_expired())
                            .catch_unwind()
                            .await
                            .is_err()
                        {
                            warn!("ddos eviction tick panicked");
                        }
                    }
                    _ = shutdown.changed() => {
                        debug!("ddos eviction task stopping");
                        break;
                    }
                }
            }
        })
    }

    async fn evict_expired(&self) {
        let now = Instant::now();
        let mut state = self.state.write().await;
        let before = state.blocklist.len();
        let block_duration = self.block_duration;
        state
            .blocklist
            .retain(|_, blocked_at| now.duration_since(*blocked_at) <= block_duration);
        let evicted = before - state.blocklist.len();
        if evicted > 0 {
            debug!(evicted, "removed expired blocklist entries");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    fn detector() -> DdosDetector {
        // 5 requests / 1 s window, 5 min block, 1 min eviction interval.
        DdosDetector::with_durations(
            5,
            Duration::from_secs(1),
            Duration::from_secs(300),
            Duration::from_secs(60),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn sixth_request_in_the_window_trips_the_detector() {
        let d = detector();
        for _ in 0..5 {
            assert!(d.record_request("1.2.3.4").await);
        }
        assert!(!d.record_request("1.2.3.4").await);
        assert!(d.is_blocked("1.2.3.4").await);
    }

    #[tokio::test(start_paused = true)]
    async fn is_blocked_is_idempotent() {
        let d = detector();
        for _ in 0..6 {
            d.record_request("1.2.3.4").await;
        }
        assert!(d.is_blocked("1.2.3.4").await);
        assert!(d.is_blocked("1.2.3.4").await);
        assert_eq!(d.blocked_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn block_expires_after_block_duration() {
        let d = detector();
        for _ in 0..6 {
            d.record_request("1.2.3.4").await;
        }
        assert!(d.is_blocked("1.2.3.4").await);

        advance(Duration::from_secs(301)).await;
        assert!(!d.is_blocked("1.2.3.4").await);
    }

    #[tokio::test(start_paused = true)]
    async fn window_expiry_resets_every_counter() {
        let d = detector();
        for _ in 0..5 {
            d.record_request("1.2.3.4").await;
        }
        advance(Duration::from_millis(1100)).await;
        // Fresh window: the same IP starts from zero again.
        assert!(d.record_request("1.2.3.4").await);
        assert!(!d.is_blocked("1.2.3.4").await);
    }

    #[tokio::test(start_paused = true)]
    async fn unrelated_ips_are_not_blocked() {
        let d = detector();
        for _ in 0..6 {
            d.record_request("1.2.3.4").await;
        }
        assert!(!d.is_blocked("5.6.7.8").await);
        assert!(d.record_request("5.6.7.8").await);
    }

    #[tokio::test(start_paused = true)]
    async fn eviction_drops_expired_blocklist_entries() {
        let d = detector();
        for _ in 0..6 {
            d.record_request("1.2.3.4").await;
        }
        assert_eq!(d.blocked_count().await, 1);

        advance(Duration::from_secs(301)).await;
        d.evict_expired().await;
        assert_eq!(d.blocked_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cleanup_task_stops_on_shutdown_signal() {
        let d = Arc::new(detector());
        let (tx, rx) = watch::channel(false);
        let handle = Arc::clone(&d).spawn_cleanup(rx);

        tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
