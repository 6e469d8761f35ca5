//! Fixed-window request limiter keyed by client address.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy)]
struct Window {
    start: Instant,
    count: u32,
}

#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    clients: DashMap<String, Window>,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            clients: DashMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Counts one request for `key`. Returns false once the window's limit is exceeded.
    pub fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Instant::now())
    }

    pub fn allow_at(&self, key: &str, now: Instant) -> bool {
        let mut entry = self.clients.entry(key.to_string()).or_insert(Window {
            start: now,
            count: 0,
        });
        if now.saturating_duration_since(entry.start) > self.window {
            *entry = Window {
                start: now,
                count: 0,
            };
        }
        entry.count = entry.count.saturating_add(1);
        entry.count <= self.limit
    }

    /// Drops clients whose window has run out. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&self, now: Instant) -> usize {
        let before = self.clients.len();
        self.clients
            .retain(|_, window| now.saturating_duration_since(window.start) <= self.window);
        before.saturating_sub(self.clients.len())
    }
}

/// Sweeps once per window until the returned handle is aborted.
pub fn spawn_sweeper(limiter: Arc<RateLimiter>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(limiter.window());
        interval.tick().await;
        loop {
            interval.tick().await;
            let removed = limiter.sweep();
            if removed > 0 {
                tracing::debug!(removed, remaining = limiter.len(), "rate limit sweep");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(60_000);

    #[test]
    fn allows_up_to_limit_then_blocks() {
        let limiter = RateLimiter::new(30, WINDOW);
        let start = Instant::now();
        for _ in 0..30 {
            assert!(limiter.allow_at("1.2.3.4", start));
        }
        assert!(!limiter.allow_at("1.2.3.4", start + Duration::from_millis(10)));
    }

    #[test]
    fn new_window_accepts_again() {
        let limiter = RateLimiter::new(2, WINDOW);
        let start = Instant::now();
        assert!(limiter.allow_at("a", start));
        assert!(limiter.allow_at("a", start));
        assert!(!limiter.allow_at("a", start));
        assert!(!limiter.allow_at("a", start + WINDOW));
        assert!(limiter.allow_at("a", start + WINDOW + Duration::from_millis(1)));
    }

    #[test]
    fn clients_are_counted_separately() {
        let limiter = RateLimiter::new(1, WINDOW);
        let start = Instant::now();
        assert!(limiter.allow_at("a", start));
        assert!(limiter.allow_at("b", start));
        assert!(!limiter.allow_at("a", start));
    }

    #[test]
    fn sweep_removes_only_stale_windows() {
        let limiter = RateLimiter::new(5, WINDOW);
        let start = Instant::now();
        limiter.allow_at("old", start);
        limiter.allow_at("fresh", start + Duration::from_millis(30_000));
        assert_eq!(limiter.sweep_at(start + Duration::from_millis(60_500)), 1);
        assert_eq!(limiter.len(), 1);
    }

    #[test]
    fn flooded_window_count_saturates() {
        let limiter = RateLimiter::new(3, WINDOW);
        let start = Instant::now();
        limiter.clients.insert(
            "flood".to_string(),
            Window {
                start,
                count: u32::MAX,
            },
        );
        assert!(!limiter.allow_at("flood", start));
        assert_eq!(limiter.clients.get("flood").map(|window| window.count), Some(u32::MAX));
    }
}
