//! TCP reachability probing.
//!
//! # Responsibilities
//! - Open a TCP connection to a backend and close it immediately
//! - Repeat failed attempts within a [`RetryPolicy`] budget
//!
//! # Design Decisions
//! - Connect-only: no HTTP request is sent, any listener counts as up
//! - Refusals and timeouts are expected outcomes, not errors

use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::TcpStream;

use crate::resilience::RetryPolicy;

/// Why a single probe attempt failed.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("connect timed out after {0:?}")]
    Timeout(Duration),
    #[error("connect failed: {0}")]
    Connect(#[from] std::io::Error),
}

/// Result of one probe sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// Whether a connection was established within the budget.
    pub available: bool,
    /// Connect attempts made, including the first.
    pub attempts: u32,
    /// Time from the first attempt to the verdict.
    pub elapsed: Duration,
}

impl ProbeOutcome {
    /// Retries made after the first attempt.
    pub fn retries(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }
}

/// Backend address as configured: hostname plus port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub host: String,
    pub port: u16,
}

impl ProbeTarget {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl std::fmt::Display for ProbeTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.host.contains(':') && !self.host.starts_with('[') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Attempt a single connect-and-close.
pub async fn probe_once(target: &ProbeTarget, timeout: Duration) -> Result<(), ProbeError> {
    let connect = TcpStream::connect((target.host.as_str(), target.port));
    match tokio::time::timeout(timeout, connect).await {
        Ok(Ok(stream)) => {
            drop(stream);
            Ok(())
        }
        Ok(Err(e)) => Err(ProbeError::Connect(e)),
        Err(_) => Err(ProbeError::Timeout(timeout)),
    }
}

/// Probe until the backend accepts a connection or the budget runs out.
pub async fn probe_until_available(
    route: &str,
    target: &ProbeTarget,
    policy: &RetryPolicy,
) -> ProbeOutcome {
    let started = Instant::now();
    let mut attempts = 0u32;

    tracing::debug!(route = %route, backend = %target, "Probe started");

    loop {
        attempts += 1;
        match probe_once(target, policy.attempt_timeout).await {
            Ok(()) => {
                let elapsed = started.elapsed();
                tracing::debug!(
                    route = %route,
                    backend = %target,
                    attempts,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Backend reachable"
                );
                return ProbeOutcome {
                    available: true,
                    attempts,
                    elapsed,
                };
            }
            Err(e) => {
                let elapsed = started.elapsed();
                if !policy.should_retry(elapsed) {
                    tracing::warn!(
                        route = %route,
                        backend = %target,
                        attempts,
                        elapsed_ms = elapsed.as_millis() as u64,
                        error = %e,
                        "Backend unreachable, retry budget exhausted"
                    );
                    return ProbeOutcome {
                        available: false,
                        attempts,
                        elapsed,
                    };
                }
                tracing::debug!(
                    route = %route,
                    backend = %target,
                    attempt = attempts,
                    error = %e,
                    "Probe failed, retrying"
                );
                tokio::time::sleep(policy.interval).await;
            }
        }
    }
}
