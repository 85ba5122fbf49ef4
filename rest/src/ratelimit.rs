use std::sync::Arc;
use std::time::Duration;

use chrono::{offset::TimeZone, DateTime, Utc};
use hashbrown::HashMap;
use parking_lot::{Mutex, RwLock};
use reqwest::header::HeaderMap;
use tokio::time::sleep;

/// The rate-limit state communicated by the API in its response headers.
///
/// Parsed eagerly so bucket updates can be reasoned about (and tested)
/// without a live response in hand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateLimitHeaders {
    /// Whether the response declared a global rate limit.
    pub global: bool,
    /// The total number of calls the bucket allows per window.
    pub limit: Option<i64>,
    /// The number of calls remaining in the current window.
    pub remaining: Option<i64>,
    /// When the current window resets, in unix seconds.
    pub reset: Option<i64>,
    /// How long to wait before retrying, in milliseconds.
    pub retry_after: Option<u64>,
}

impl RateLimitHeaders {
    /// Extracts the rate-limit headers from a response header map.
    pub fn parse(headers: &HeaderMap) -> Self {
        fn number<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
            headers.get(name)?.to_str().ok()?.parse().ok()
        }

        RateLimitHeaders {
            global: headers
                .get("x-ratelimit-global")
                .and_then(|v| v.to_str().ok())
                .map(|v| v == "true")
                .unwrap_or(false),
            limit: number(headers, "x-ratelimit-limit"),
            remaining: number(headers, "x-ratelimit-remaining"),
            reset: number(headers, "x-ratelimit-reset"),
            retry_after: number(headers, "retry-after"),
        }
    }

    /// Whether the per-bucket header triple is present.
    pub fn bucket_state(&self) -> Option<(i64, i64, i64)> {
        Some((self.limit?, self.remaining?, self.reset?))
    }
}

/// A rate limiter bucket used for maintaining Discord rate limits.
#[derive(Debug)]
pub struct Bucket {
    /// The request limit per window.
    pub limit: i64,
    /// The remaining requests in the current window.
    pub remaining: i64,
    /// The time at which the window resets.
    pub reset: Option<DateTime<Utc>>,
}

impl Bucket {
    fn new() -> Self {
        Bucket { limit: 1, remaining: 1, reset: None }
    }
}

/// A utility for rate limiting requests made to the Discord API.
///
/// One bucket per caller-chosen key, plus a process-wide global slot which
/// is cleared lazily by subsequent non-global requests.
#[derive(Debug, Default)]
pub struct Ratelimiter {
    buckets: RwLock<HashMap<String, Arc<Mutex<Bucket>>>>,
    global: Mutex<Option<DateTime<Utc>>>,
}

impl Ratelimiter {
    pub fn new() -> Self {
        Ratelimiter {
            buckets: RwLock::new(HashMap::new()),
            global: Mutex::new(None),
        }
    }

    fn bucket(&self, route: &str) -> Arc<Mutex<Bucket>> {
        let mut buckets = self.buckets.write();
        Arc::clone(
            buckets
                .entry(route.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(Bucket::new()))),
        )
    }

    /// Blocks until the given bucket has capacity for one call, consuming it.
    ///
    /// The global limit gates everything; per-bucket state is consulted
    /// second. Sleeps re-check on wake, so concurrent callers serialize.
    pub async fn acquire(&self, route: &str) {
        loop {
            let wait = {
                let mut global = self.global.lock();
                match *global {
                    Some(reset) if reset > Utc::now() => until(reset),
                    Some(_) => {
                        *global = None;
                        None
                    }
                    None => None,
                }
            };
            match wait {
                Some(duration) => {
                    warn!("Globally rate limited, slowing down requests.");
                    sleep(duration).await;
                }
                None => break,
            }
        }

        let bucket = self.bucket(route);
        loop {
            let wait = {
                let mut bucket = bucket.lock();
                if bucket.remaining > 0 {
                    bucket.remaining -= 1;
                    return;
                }
                match bucket.reset {
                    Some(reset) if reset > Utc::now() => until(reset),
                    _ => {
                        // the window has passed; refresh and re-check
                        bucket.remaining = bucket.limit.max(1);
                        None
                    }
                }
            };
            if let Some(duration) = wait {
                warn!("Bucket {} exhausted, waiting for its window to reset.", route);
                sleep(duration).await;
                let mut bucket = bucket.lock();
                bucket.remaining = bucket.limit.max(1);
            }
        }
    }

    /// Applies the rate-limit state of a response and handles 429s.
    ///
    /// Returns whether the request should be retried.
    pub async fn update(&self, route: &str, status: u16, headers: &RateLimitHeaders) -> bool {
        if headers.global {
            let delay = Duration::from_millis(headers.retry_after.unwrap_or(1000));
            let reset = Utc::now()
                + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::seconds(1));
            *self.global.lock() = Some(reset);
            warn!("Hit the global rate limit, pausing for {:?}.", delay);
            sleep(delay).await;
            return true;
        }

        if let Some((limit, remaining, reset)) = headers.bucket_state() {
            let bucket = self.bucket(route);
            let reset = Utc.timestamp_opt(reset, 0).single();
            {
                let mut bucket = bucket.lock();
                bucket.limit = limit;
                bucket.remaining = remaining;
                bucket.reset = reset;
            }
            if status == 429 {
                if let Some(reset) = reset {
                    let now = Utc::now();
                    if reset > now {
                        warn!("Hit the rate limit on bucket {}, waiting until reset.", route);
                        sleep((reset - now).to_std().unwrap_or_default()).await;
                    }
                }
                bucket.lock().remaining = limit;
                return true;
            }
            return false;
        }

        if status == 429 {
            warn!("Rate limited without headers on bucket {}, pausing briefly.", route);
            sleep(Duration::from_secs(1)).await;
            return true;
        }

        false
    }
}

fn until(instant: DateTime<Utc>) -> Option<Duration> {
    (instant - Utc::now()).to_std().ok()
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use reqwest::header::{HeaderMap, HeaderValue};

    use super::*;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn parses_the_bucket_header_triple() {
        let parsed = RateLimitHeaders::parse(&headers(&[
            ("x-ratelimit-limit", "5"),
            ("x-ratelimit-remaining", "0"),
            ("x-ratelimit-reset", "1554654321"),
        ]));
        assert_eq!(parsed.bucket_state(), Some((5, 0, 1554654321)));
        assert!(!parsed.global);
    }

    #[test]
    fn parses_the_global_flag_and_retry_after() {
        let parsed = RateLimitHeaders::parse(&headers(&[
            ("x-ratelimit-global", "true"),
            ("retry-after", "250"),
        ]));
        assert!(parsed.global);
        assert_eq!(parsed.retry_after, Some(250));
        assert_eq!(parsed.bucket_state(), None);
    }

    #[tokio::test]
    async fn acquire_decrements_known_buckets() {
        let limiter = Ratelimiter::new();
        let far_future = Utc::now() + chrono::Duration::seconds(60);
        {
            let bucket = limiter.bucket("/channels/1");
            let mut bucket = bucket.lock();
            bucket.limit = 3;
            bucket.remaining = 2;
            bucket.reset = Some(far_future);
        }
        limiter.acquire("/channels/1").await;
        limiter.acquire("/channels/1").await;
        assert_eq!(limiter.bucket("/channels/1").lock().remaining, 0);
    }

    #[tokio::test]
    async fn exhausted_buckets_block_until_reset() {
        let limiter = Ratelimiter::new();
        let reset = Utc::now() + chrono::Duration::milliseconds(250);
        {
            let bucket = limiter.bucket("/channels/1");
            let mut bucket = bucket.lock();
            bucket.limit = 1;
            bucket.remaining = 0;
            bucket.reset = Some(reset);
        }
        let start = Instant::now();
        limiter.acquire("/channels/1").await;
        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test]
    async fn a_past_reset_refreshes_the_bucket_without_sleeping() {
        let limiter = Ratelimiter::new();
        {
            let bucket = limiter.bucket("/guilds/1");
            let mut bucket = bucket.lock();
            bucket.limit = 5;
            bucket.remaining = 0;
            bucket.reset = Some(Utc::now() - chrono::Duration::seconds(5));
        }
        let start = Instant::now();
        limiter.acquire("/guilds/1").await;
        assert!(start.elapsed() < Duration::from_millis(50));
        assert_eq!(limiter.bucket("/guilds/1").lock().remaining, 4);
    }

    #[tokio::test]
    async fn a_429_with_headers_sleeps_and_asks_for_a_retry() {
        let limiter = Ratelimiter::new();
        let reset_at = Utc::now() + chrono::Duration::milliseconds(1200);
        let state = RateLimitHeaders {
            global: false,
            limit: Some(2),
            remaining: Some(0),
            reset: Some(reset_at.timestamp()),
            retry_after: None,
        };
        // second-granularity resets truncate; this sleeps until the whole second passes
        let retry = limiter.update("/channels/1", 429, &state).await;
        assert!(retry);
        assert_eq!(limiter.bucket("/channels/1").lock().remaining, 2);
    }
}
