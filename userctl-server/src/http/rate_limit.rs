//! Per-client request rate limiting
//!
//! Fixed window per client key: the first request opens a window, each
//! further request inside it bumps the count, and anything past
//! `max_requests` is refused until the window resets.
//!
//! The map is bounded. Expired entries are dropped by a periodic sweep and,
//! when the map is full, on the insert path. A new client arriving while the
//! map is full of live windows replaces the window closest to expiry, so
//! every client is counted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Rate limiter settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Requests allowed per window
    pub max_requests: u32,
    /// Window length
    pub window: Duration,
    /// Maximum number of tracked clients
    pub capacity: usize,
    /// How often the background sweep drops expired entries
    pub sweep_interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(15 * 60),
            capacity: 10_000,
            sweep_interval: Duration::from_secs(60),
        }
    }
}

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Limited { retry_after: Duration },
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    count: u32,
    reset_at: Instant,
}

/// Shared per-client counters
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    entries: Mutex<HashMap<String, Entry>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a request from `key` and decide whether it may proceed.
    pub fn check(&self, key: &str) -> Decision {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> Decision {
        let mut entries = self.entries();

        if let Some(entry) = entries.get_mut(key) {
            if now >= entry.reset_at {
                *entry = self.fresh_entry(now);
                return Decision::Allowed;
            }

            entry.count = entry.count.saturating_add(1);
            if entry.count > self.config.max_requests {
                return Decision::Limited {
                    retry_after: entry.reset_at.saturating_duration_since(now),
                };
            }
            return Decision::Allowed;
        }

        if entries.len() >= self.config.capacity {
            entries.retain(|_, e| e.reset_at > now);
        }
        if entries.len() >= self.config.capacity {
            evict_oldest(&mut entries);
        }

        entries.insert(key.to_owned(), self.fresh_entry(now));
        Decision::Allowed
    }

    fn fresh_entry(&self, now: Instant) -> Entry {
        Entry {
            count: 1,
            reset_at: now + self.config.window,
        }
    }

    /// Drop expired entries, returning how many were removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    fn sweep_at(&self, now: Instant) -> usize {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, e| e.reset_at > now);
        before - entries.len()
    }

    /// Number of tracked clients.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Spawn the periodic sweep. The task ends once the limiter is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        let period = self.config.sweep_interval;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // First tick fires immediately
            interval.tick().await;

            loop {
                interval.tick().await;
                let Some(limiter) = weak.upgrade() else {
                    break;
                };
                let removed = limiter.sweep();
                if removed > 0 {
                    tracing::debug!(removed, remaining = limiter.len(), "rate limiter sweep");
                }
            }
        })
    }
}

/// Drop the live window closest to expiry so a new client is always tracked.
fn evict_oldest(entries: &mut HashMap<String, Entry>) {
    let oldest = entries
        .iter()
        .min_by_key(|(_, e)| e.reset_at)
        .map(|(key, _)| key.clone());

    if let Some(key) = oldest {
        tracing::debug!(client = %key, "rate limiter full, evicting oldest window");
        entries.remove(&key);
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32, capacity: usize) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            max_requests,
            window: Duration::from_secs(60),
            capacity,
            sweep_interval: Duration::from_secs(1),
        })
    }

    #[test]
    fn limits_after_threshold() {
        let rl = limiter(3, 10);
        let now = Instant::now();
        for _ in 0..3 {
            assert_eq!(rl.check_at("a", now), Decision::Allowed);
        }
        assert_eq!(
            rl.check_at("a", now + Duration::from_secs(10)),
            Decision::Limited {
                retry_after: Duration::from_secs(50)
            }
        );
    }

    #[test]
    fn clients_are_independent() {
        let rl = limiter(1, 10);
        let now = Instant::now();
        assert_eq!(rl.check_at("a", now), Decision::Allowed);
        assert!(matches!(rl.check_at("a", now), Decision::Limited { .. }));
        assert_eq!(rl.check_at("b", now), Decision::Allowed);
    }

    #[test]
    fn window_resets() {
        let rl = limiter(1, 10);
        let now = Instant::now();
        assert_eq!(rl.check_at("a", now), Decision::Allowed);
        assert!(matches!(rl.check_at("a", now), Decision::Limited { .. }));

        let later = now + Duration::from_secs(60);
        assert_eq!(rl.check_at("a", later), Decision::Allowed);
        assert!(matches!(rl.check_at("a", later), Decision::Limited { .. }));
    }

    #[test]
    fn sweep_drops_expired_only() {
        let rl = limiter(5, 10);
        let now = Instant::now();
        rl.check_at("old", now);
        rl.check_at("new", now + Duration::from_secs(30));

        assert_eq!(rl.sweep_at(now + Duration::from_secs(61)), 1);
        assert_eq!(rl.len(), 1);
    }

    #[test]
    fn full_map_evicts_expired_on_insert() {
        let rl = limiter(5, 2);
        let now = Instant::now();
        rl.check_at("a", now);
        rl.check_at("b", now);

        let later = now + Duration::from_secs(61);
        assert_eq!(rl.check_at("c", later), Decision::Allowed);
        assert_eq!(rl.len(), 1);
    }

    #[test]
    fn full_map_still_limits_new_clients() {
        let rl = limiter(3, 2);
        let now = Instant::now();
        rl.check_at("a", now);
        rl.check_at("b", now + Duration::from_secs(1));

        let later = now + Duration::from_secs(2);
        for _ in 0..3 {
            assert_eq!(rl.check_at("c", later), Decision::Allowed);
        }
        assert!(matches!(rl.check_at("c", later), Decision::Limited { .. }));
        assert_eq!(rl.len(), 2);
    }

    #[test]
    fn full_map_evicts_window_closest_to_expiry() {
        let rl = limiter(1, 2);
        let now = Instant::now();
        rl.check_at("a", now);
        rl.check_at("b", now + Duration::from_secs(1));
        rl.check_at("c", now + Duration::from_secs(2));

        // "b" kept its window, "a" starts over
        let later = now + Duration::from_secs(3);
        assert!(matches!(rl.check_at("b", later), Decision::Limited { .. }));
        assert_eq!(rl.check_at("a", later), Decision::Allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_runs_and_stops_with_limiter() {
        let rl = Arc::new(RateLimiter::new(RateLimitConfig {
            max_requests: 5,
            window: Duration::from_millis(10),
            capacity: 10,
            sweep_interval: Duration::from_millis(50),
        }));
        rl.check("a");
        let handle = rl.spawn_sweeper();

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(rl.is_empty());

        drop(rl);
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(handle.is_finished());
    }
}
