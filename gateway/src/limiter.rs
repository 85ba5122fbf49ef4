//! Rate limiting primitives for the gateway: a single-slot cooldown and a
//! sliding multi-window limiter.
//!
//! Both guard their state with a mutex held only across the check itself;
//! sleeps happen outside the lock and every wake re-checks, so a missed
//! check-then-sleep race only costs an extra loop iteration.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{sleep, Instant};

/// A single-slot cooldown with repeat interval `R`.
///
/// `wait_for` returns immediately if at least `R` has elapsed since the last
/// successful grant, and otherwise sleeps out the remainder. Concurrent
/// callers serialize: whoever wakes first takes the slot.
pub struct Cooldown {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl Cooldown {
    pub fn new(interval: Duration) -> Self {
        Cooldown { interval, last: Mutex::new(None) }
    }

    /// Blocks until the cooldown has elapsed, then records the grant.
    pub async fn wait_for(&self) {
        loop {
            let wait = {
                let mut last = self.last.lock();
                let now = Instant::now();
                match *last {
                    Some(prev) if now.duration_since(prev) < self.interval => {
                        Some(self.interval - now.duration_since(prev))
                    }
                    _ => {
                        *last = Some(now);
                        None
                    }
                }
            };
            match wait {
                Some(duration) => sleep(duration).await,
                None => return,
            }
        }
    }
}

/// A sliding window limiter of `limit` grants per `window`, with a minimum
/// gap of `min_gap` between consecutive grants.
///
/// The state is a ring of the `limit` most recent grant instants. A grant
/// is immediate when the grant `limit` steps ago left the window and the
/// previous grant is at least `min_gap` old; otherwise the caller sleeps
/// out whichever bound is in the way and re-checks.
pub struct SlidingWindow {
    limit: usize,
    window: Duration,
    min_gap: Duration,
    state: Mutex<WindowState>,
}

struct WindowState {
    grants: Vec<Instant>,
    head: usize,
}

impl WindowState {
    // The most recent grant.
    fn prev(&self, limit: usize) -> Option<Instant> {
        if self.grants.is_empty() {
            None
        } else if self.grants.len() < limit {
            self.grants.last().copied()
        } else {
            Some(self.grants[(self.head + limit - 1) % limit])
        }
    }

    // The grant `limit` steps ago, or None if fewer have happened.
    fn oldest(&self, limit: usize) -> Option<Instant> {
        if self.grants.len() < limit {
            None
        } else {
            Some(self.grants[self.head])
        }
    }

    fn record(&mut self, now: Instant, limit: usize) {
        if self.grants.len() < limit {
            self.grants.push(now);
        } else {
            self.grants[self.head] = now;
            self.head = (self.head + 1) % limit;
        }
    }
}

impl SlidingWindow {
    pub fn new(limit: usize, window: Duration, min_gap: Duration) -> Self {
        assert!(limit > 0, "a sliding window needs at least one slot");
        SlidingWindow {
            limit,
            window,
            min_gap,
            state: Mutex::new(WindowState { grants: Vec::with_capacity(limit), head: 0 }),
        }
    }

    /// Blocks until both the window and the inter-event gap allow a grant.
    pub async fn wait_for(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock();
                let now = Instant::now();
                let gap = state.prev(self.limit).map(|prev| now.duration_since(prev));
                let age = state.oldest(self.limit).map(|oldest| now.duration_since(oldest));
                let gap_ok = gap.map_or(true, |g| g >= self.min_gap);
                let window_ok = age.map_or(true, |a| a >= self.window);
                if gap_ok && window_ok {
                    state.record(now, self.limit);
                    None
                } else if window_ok {
                    // capacity exists, only the gap is in the way
                    Some(self.min_gap - gap.unwrap_or_default())
                } else {
                    Some(self.window - age.unwrap_or_default())
                }
            };
            match wait {
                Some(duration) => sleep(duration).await,
                None => return,
            }
        }
    }
}

/// The cooldown that gates gateway connects.
pub fn connect_cooldown() -> Cooldown {
    Cooldown::new(Duration::from_millis(5100))
}

/// The identify window: a thousand sessions per day, or two thousand with
/// the `large-bot` feature, never closer together than 5.1 seconds.
pub fn identify_limiter() -> SlidingWindow {
    let limit = if cfg!(feature = "large-bot") { 2000 } else { 1000 };
    SlidingWindow::new(limit, Duration::from_secs(24 * 60 * 60), Duration::from_millis(5100))
}

/// The limiter applied to every outbound frame.
pub fn send_limiter() -> SlidingWindow {
    SlidingWindow::new(12, Duration::from_secs(6), Duration::from_millis(100))
}

/// The limiter additionally applied to status updates.
pub fn status_limiter() -> SlidingWindow {
    SlidingWindow::new(5, Duration::from_secs(60), Duration::from_secs(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[tokio::test(start_paused = true)]
    async fn cooldowns_space_grants_by_the_interval() {
        let cooldown = Cooldown::new(ms(50));
        let start = Instant::now();
        cooldown.wait_for().await;
        assert_eq!(start.elapsed(), ms(0));
        cooldown.wait_for().await;
        assert!(start.elapsed() >= ms(50));
        cooldown.wait_for().await;
        assert!(start.elapsed() >= ms(100));
    }

    #[tokio::test(start_paused = true)]
    async fn windows_enforce_the_gap_then_the_window() {
        let limiter = SlidingWindow::new(4, ms(60), ms(10));
        let start = Instant::now();
        let mut stamps = Vec::new();
        for _ in 0..5 {
            limiter.wait_for().await;
            stamps.push(start.elapsed());
        }
        // four grants spaced by the gap, the fifth waits for the window
        assert_eq!(stamps[0], ms(0));
        assert_eq!(stamps[1], ms(10));
        assert_eq!(stamps[2], ms(20));
        assert_eq!(stamps[3], ms(30));
        assert_eq!(stamps[4], ms(60));
    }

    #[tokio::test(start_paused = true)]
    async fn an_idle_window_grants_immediately() {
        let limiter = SlidingWindow::new(2, ms(40), ms(5));
        limiter.wait_for().await;
        limiter.wait_for().await;
        limiter.wait_for().await;
        let start = Instant::now();
        tokio::time::sleep(ms(200)).await;
        limiter.wait_for().await;
        assert_eq!(start.elapsed(), ms(200));
    }
}
