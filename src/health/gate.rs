//! Per-route health gate with single-flight probing.
//!
//! # Responsibilities
//! - Answer "is this route's backend accepting connections?" per request
//! - Share one in-flight probe sequence among all concurrent callers
//! - Forget the verdict as soon as it resolves
//!
//! # Design Decisions
//! - The slot is a mutex-guarded `Option` holding a shared future; checking
//!   and starting a probe happen in one critical section
//! - The sequence runs in its own task and clears the slot itself, so it
//!   finishes even if every waiting request is dropped
//! - The mutex is never held across an await point

use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::health::probe::{probe_until_available, ProbeOutcome, ProbeTarget};
use crate::observability::metrics;
use crate::resilience::RetryPolicy;

type SharedProbe = Shared<BoxFuture<'static, ProbeOutcome>>;

struct InFlight {
    id: u64,
    outcome: SharedProbe,
}

/// Counters for probe activity on one gate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeStats {
    /// Probe sequences started.
    pub sequences: u64,
    /// Connect attempts across finished sequences.
    pub attempts: u64,
}

struct GateInner {
    route: String,
    target: ProbeTarget,
    policy: RetryPolicy,
    in_flight: Mutex<Option<InFlight>>,
    next_id: AtomicU64,
    sequences: AtomicU64,
    attempts: AtomicU64,
}

impl GateInner {
    fn slot(&self) -> MutexGuard<'_, Option<InFlight>> {
        // The slot holds no invariant a panicking holder could break.
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clear the slot if it still holds sequence `id`.
    fn finish(&self, id: u64) {
        let mut slot = self.slot();
        if slot.as_ref().is_some_and(|in_flight| in_flight.id == id) {
            *slot = None;
        }
    }
}

/// Deduplicating, retry-bounded reachability check for one route.
#[derive(Clone)]
pub struct HealthGate {
    inner: Arc<GateInner>,
}

impl HealthGate {
    pub fn new(route: impl Into<String>, target: ProbeTarget, policy: RetryPolicy) -> Self {
        Self {
            inner: Arc::new(GateInner {
                route: route.into(),
                target,
                policy,
                in_flight: Mutex::new(None),
                next_id: AtomicU64::new(0),
                sequences: AtomicU64::new(0),
                attempts: AtomicU64::new(0),
            }),
        }
    }

    pub fn route(&self) -> &str {
        &self.inner.route
    }

    pub fn target(&self) -> &ProbeTarget {
        &self.inner.target
    }

    /// Whether the backend accepted a connection within the retry budget.
    pub async fn check_available(&self) -> bool {
        self.check().await.available
    }

    /// Join the in-flight probe sequence, or start one.
    pub async fn check(&self) -> ProbeOutcome {
        self.join_or_start().await
    }

    /// Probe counters since the gate was created.
    pub fn stats(&self) -> ProbeStats {
        ProbeStats {
            sequences: self.inner.sequences.load(Ordering::Relaxed),
            attempts: self.inner.attempts.load(Ordering::Relaxed),
        }
    }

    /// Whether a probe sequence is currently pending.
    pub fn is_probing(&self) -> bool {
        self.inner.slot().is_some()
    }

    fn join_or_start(&self) -> SharedProbe {
        let mut slot = self.inner.slot();

        if let Some(in_flight) = slot.as_ref() {
            tracing::trace!(route = %self.inner.route, "Joining in-flight probe");
            return in_flight.outcome.clone();
        }

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.sequences.fetch_add(1, Ordering::Relaxed);

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let outcome = probe_until_available(&inner.route, &inner.target, &inner.policy).await;
            inner.attempts.fetch_add(u64::from(outcome.attempts), Ordering::Relaxed);
            metrics::record_probe(&inner.route, outcome.available, outcome.attempts);
            inner.finish(id);
            outcome
        });

        let inner = Arc::clone(&self.inner);
        let outcome = async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(route = %inner.route, error = %e, "Probe task failed");
                    inner.finish(id);
                    ProbeOutcome {
                        available: false,
                        attempts: 0,
                        elapsed: Duration::ZERO,
                    }
                }
            }
        }
        .boxed()
        .shared();

        *slot = Some(InFlight {
            id,
            outcome: outcome.clone(),
        });
        outcome
    }
}

impl std::fmt::Debug for HealthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthGate")
            .field("route", &self.inner.route)
            .field("target", &self.inner.target)
            .field("policy", &self.inner.policy)
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::future::join_all;
    use std::time::Instant;
    use tokio::net::TcpListener;

    async fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    fn gate(port: u16, max_retry_ms: u64) -> HealthGate {
        HealthGate::new(
            "test",
            ProbeTarget::new("127.0.0.1", port),
            RetryPolicy::from_millis(max_retry_ms, 20),
        )
    }

    #[tokio::test]
    async fn test_concurrent_checks_share_one_sequence() {
        let gate = gate(closed_port().await, 200);

        let checks = (0..16).map(|_| {
            let gate = gate.clone();
            async move { gate.check().await }
        });
        let outcomes = join_all(checks).await;

        assert_eq!(gate.stats().sequences, 1);
        assert!(outcomes.iter().all(|o| !o.available));
        assert!(outcomes.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(gate.stats().attempts, u64::from(outcomes[0].attempts));
    }

    #[tokio::test]
    async fn test_spawned_callers_share_one_sequence() {
        let gate = gate(closed_port().await, 200);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gate = gate.clone();
                tokio::spawn(async move { gate.check_available().await })
            })
            .collect();

        for handle in handles {
            assert!(!handle.await.unwrap());
        }
        assert_eq!(gate.stats().sequences, 1);
    }

    #[tokio::test]
    async fn test_verdict_is_not_cached() {
        let gate = gate(closed_port().await, 100);

        assert!(!gate.check_available().await);
        assert!(!gate.is_probing());
        assert!(!gate.check_available().await);
        assert_eq!(gate.stats().sequences, 2);
    }

    #[tokio::test]
    async fn test_available_backend_resolves_on_first_attempt() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let gate = gate(listener.local_addr().unwrap().port(), 1000);

        let outcome = gate.check().await;
        assert!(outcome.available);
        assert_eq!(outcome.retries(), 0);
        assert_eq!(gate.stats().attempts, 1);
    }

    #[tokio::test]
    async fn test_backend_coming_up_mid_sequence() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let gate = gate(addr.port(), 2000);
        let started = Instant::now();

        let late_bind = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            TcpListener::bind(addr).await.unwrap()
        });

        let outcome = gate.check().await;
        let _listener = late_bind.await.unwrap();

        assert!(outcome.available);
        assert!(outcome.attempts > 1);
        assert!(started.elapsed() < Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn test_sequence_survives_cancelled_callers() {
        let gate = gate(closed_port().await, 150);

        let caller = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.check_available().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        caller.abort();

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(!gate.is_probing());
        assert_eq!(gate.stats().sequences, 1);
        assert!(gate.stats().attempts > 0);
    }
}
