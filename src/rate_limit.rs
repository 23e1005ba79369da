//! Per-client request limiter and the axum middleware that applies it.
//!
//! Each client identifier owns one [`ClientRecord`]. A request that arrives
//! more than `window` after the record's `last_seen` starts a fresh window;
//! otherwise it is counted against `max_requests`. Allowed requests refresh
//! `last_seen`, so a client that keeps calling keeps its window open.
//!
//! Records are never evicted. The map grows with the number of distinct
//! clients seen over the life of the process.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, warn};

use crate::metrics::{RATE_LIMIT_ALLOWED, RATE_LIMIT_DENIED, REQUEST_TOTAL, TRACKED_CLIENTS};

pub const REJECTION_BODY: &str = "rate limit exceeded";

// Limits captured once when the limiter is built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimiterConfig {
    pub max_requests: u32,
    pub window: Duration,
}

// One client's activity in the current window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientRecord {
    pub last_seen: Instant,
    pub count: u32, // never 0 once stored
}

impl ClientRecord {
    fn new(now: Instant) -> Self {
        Self {
            last_seen: now,
            count: 1,
        }
    }

    // strictly greater: a request exactly `window` later is still inside
    fn is_expired(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.last_seen) > window
    }
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Forward to the wrapped handler. `count` is the client's count after this request.
    Allow { count: u32 },
    /// Reject without calling the handler.
    Deny,
}

impl Decision {
    #[cfg(test)]
    pub(crate) fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow { .. })
    }
}

/// Shared handle to the client table. Clones see the same table; separate
/// calls to [`RateLimiter::new`] never do.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<RateLimiterInner>,
}

struct RateLimiterInner {
    config: LimiterConfig,
    clients: DashMap<String, ClientRecord>,
}

impl RateLimiter {
    pub fn new(config: LimiterConfig) -> Self {
        Self {
            inner: Arc::new(RateLimiterInner {
                config,
                clients: DashMap::new(),
            }),
        }
    }

    pub fn config(&self) -> LimiterConfig {
        self.inner.config
    }

    pub fn check(&self, client_id: &str) -> Decision {
        self.check_at(client_id, Instant::now())
    }

    /// Runs the admission check as if the request arrived at `now`.
    ///
    /// The entry guard holds the shard's write lock for the whole
    /// read-decide-write, so two concurrent requests from one client can
    /// never both slip under the limit.
    pub fn check_at(&self, client_id: &str, now: Instant) -> Decision {
        let LimiterConfig {
            max_requests,
            window,
        } = self.inner.config;

        match self.inner.clients.entry(client_id.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(ClientRecord::new(now));
                Decision::Allow { count: 1 }
            }
            Entry::Occupied(mut slot) => {
                let record = slot.get_mut();

                // window expired..? start over
                if record.is_expired(now, window) {
                    *record = ClientRecord::new(now);
                    return Decision::Allow { count: 1 };
                }

                // over limit, leave the record alone
                if record.count >= max_requests {
                    return Decision::Deny;
                }

                record.count += 1;
                record.last_seen = now;
                Decision::Allow {
                    count: record.count,
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn record(&self, client_id: &str) -> Option<ClientRecord> {
        self.inner.clients.get(client_id).map(|entry| *entry)
    }

    pub fn tracked_clients(&self) -> usize {
        self.inner.clients.len()
    }
}

/// Derives the limiter key from a peer address.
///
/// `"10.0.0.7:5123"` and `"[::1]:80"` yield their host part. Anything that
/// does not split into host and port (a bare host, a bare IPv6 address) is
/// used verbatim.
pub fn client_identifier(remote_addr: &str) -> String {
    split_host(remote_addr)
        .unwrap_or(remote_addr)
        .to_string()
}

fn split_host(addr: &str) -> Option<&str> {
    if let Some(rest) = addr.strip_prefix('[') {
        let (host, tail) = rest.split_once(']')?;
        tail.strip_prefix(':')?;
        return Some(host);
    }

    let (host, _port) = addr.rsplit_once(':')?;
    if host.contains(':') {
        return None;
    }
    Some(host)
}

/// Middleware: admits or rejects the request before it reaches the route handler.
pub async fn rate_limit(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    REQUEST_TOTAL.inc();

    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_default();
    let client_id = client_identifier(&remote_addr);

    let decision = limiter.check(&client_id);
    TRACKED_CLIENTS.set(limiter.tracked_clients() as f64);

    match decision {
        Decision::Allow { count } => {
            RATE_LIMIT_ALLOWED.inc();
            debug!(client = %client_id, count, "request allowed");
            next.run(request).await
        }
        Decision::Deny => {
            RATE_LIMIT_DENIED.inc();
            warn!(client = %client_id, "rate limit exceeded");
            (StatusCode::TOO_MANY_REQUESTS, REJECTION_BODY).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32) -> RateLimiter {
        RateLimiter::new(LimiterConfig {
            max_requests,
            window: Duration::from_secs(60),
        })
    }

    #[test]
    fn allows_up_to_max_then_denies_until_window_passes() {
        let limiter = limiter(3);
        let start = Instant::now();

        for expected in 1..=3 {
            assert_eq!(
                limiter.check_at("A", start),
                Decision::Allow { count: expected }
            );
            assert_eq!(limiter.record("A").map(|r| r.count), Some(expected));
        }

        assert_eq!(limiter.check_at("A", start), Decision::Deny);

        let later = start + Duration::from_secs(61);
        assert_eq!(limiter.check_at("A", later), Decision::Allow { count: 1 });
        assert_eq!(limiter.record("A").map(|r| r.count), Some(1));
    }

    #[test]
    fn clients_have_independent_counters() {
        let limiter = limiter(3);
        let now = Instant::now();

        for _ in 0..3 {
            assert!(limiter.check_at("A", now).is_allowed());
        }
        assert_eq!(limiter.check_at("A", now), Decision::Deny);
        assert_eq!(limiter.check_at("B", now), Decision::Allow { count: 1 });
        assert_eq!(limiter.record("A").map(|r| r.count), Some(3));
    }

    #[test]
    fn request_exactly_at_window_edge_is_still_counted() {
        let limiter = limiter(2);
        let start = Instant::now();
        let edge = start + Duration::from_secs(60);

        limiter.check_at("A", start);
        assert_eq!(limiter.check_at("A", edge), Decision::Allow { count: 2 });

        let edge = edge + Duration::from_secs(60);
        assert_eq!(limiter.check_at("A", edge), Decision::Deny);
    }

    #[test]
    fn allowed_requests_slide_the_window_forward() {
        let limiter = limiter(3);
        let start = Instant::now();

        limiter.check_at("A", start);
        limiter.check_at("A", start + Duration::from_secs(50));
        // 100s after the first request, but only 50s after the last one
        assert_eq!(
            limiter.check_at("A", start + Duration::from_secs(100)),
            Decision::Allow { count: 3 }
        );
        assert_eq!(
            limiter.check_at("A", start + Duration::from_secs(150)),
            Decision::Deny
        );
    }

    #[test]
    fn denied_requests_do_not_refresh_last_seen() {
        let limiter = limiter(1);
        let start = Instant::now();

        limiter.check_at("A", start);
        assert_eq!(
            limiter.check_at("A", start + Duration::from_secs(30)),
            Decision::Deny
        );
        assert_eq!(limiter.record("A").map(|r| r.last_seen), Some(start));

        assert_eq!(
            limiter.check_at("A", start + Duration::from_secs(61)),
            Decision::Allow { count: 1 }
        );
    }

    #[test]
    fn clones_share_state_but_new_limiters_do_not() {
        let first = limiter(1);
        let shared = first.clone();
        let other = limiter(1);
        let now = Instant::now();

        assert!(first.check_at("A", now).is_allowed());
        assert_eq!(shared.check_at("A", now), Decision::Deny);
        assert!(other.check_at("A", now).is_allowed());
        assert_eq!(first.tracked_clients(), 1);
    }

    #[test]
    fn concurrent_requests_never_exceed_the_limit() {
        let limiter = limiter(10);
        let now = Instant::now();
        let shared = &limiter;

        let allowed: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..50)
                .map(move |_| scope.spawn(move || shared.check_at("A", now).is_allowed()))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .filter(|allowed| *allowed)
                .count()
        });

        assert_eq!(allowed, 10);
        assert_eq!(limiter.record("A").map(|r| r.count), Some(10));
    }

    #[test]
    fn identifier_strips_port() {
        assert_eq!(client_identifier("192.168.1.5:5432"), "192.168.1.5");
        assert_eq!(client_identifier("[::1]:8080"), "::1");
        assert_eq!(client_identifier("localhost:80"), "localhost");
    }

    #[test]
    fn identifier_falls_back_to_raw_address() {
        assert_eq!(client_identifier("10.0.0.1"), "10.0.0.1");
        assert_eq!(client_identifier("::1"), "::1");
        assert_eq!(client_identifier("[::1]"), "[::1]");
        assert_eq!(client_identifier(""), "");
    }

    #[test]
    fn malformed_address_gets_its_own_counter() {
        let limiter = limiter(1);
        let now = Instant::now();
        let malformed = client_identifier("not-an-address");
        let proper = client_identifier("10.0.0.1:4000");

        assert_eq!(malformed, "not-an-address");
        assert!(limiter.check_at(&malformed, now).is_allowed());
        assert_eq!(limiter.check_at(&malformed, now), Decision::Deny);
        assert!(limiter.check_at(&proper, now).is_allowed());
    }
}
