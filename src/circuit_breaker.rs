//! Circuit breaker guarding fallback-enabled clients.
//!
//! The breaker counts consecutive failed calls of one client. Once the count
//! reaches the threshold inside the failure window the circuit opens and
//! calls go straight to the fallback. After the reset timeout a few probe
//! calls are let through; enough successes close the circuit again, any
//! failure reopens it.

use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Observable circuit state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls reach the remote service.
    Closed,
    /// Calls are answered by the fallback without reaching the service.
    Open,
    /// A limited number of probe calls reach the service.
    HalfOpen,
}

/// Circuit breaker thresholds.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,
    /// Probe successes that close a half-open circuit.
    pub success_threshold: u32,
    /// How long the circuit stays open before probing.
    pub reset_timeout: Duration,
    /// Probe calls allowed while half-open.
    pub half_open_requests: u32,
    /// Failures further apart than this restart the count.
    pub failure_window: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 20,
            success_threshold: 3,
            reset_timeout: Duration::from_secs(5),
            half_open_requests: 3,
            failure_window: Duration::from_secs(10),
        }
    }
}

impl CircuitBreakerConfig {
    /// Thresholds opening after `failure_threshold` failures for `reset_timeout`.
    pub fn new(failure_threshold: u32, reset_timeout: Duration) -> Self {
        Self {
            failure_threshold,
            reset_timeout,
            ..Default::default()
        }
    }

    /// Set the probe successes needed to close.
    pub fn with_success_threshold(mut self, threshold: u32) -> Self {
        self.success_threshold = threshold;
        self
    }

    /// Set the probe calls allowed while half-open.
    pub fn with_half_open_requests(mut self, count: u32) -> Self {
        self.half_open_requests = count;
        self
    }

    /// Set the failure counting window.
    pub fn with_failure_window(mut self, window: Duration) -> Self {
        self.failure_window = window;
        self
    }
}

#[derive(Debug)]
enum Circuit {
    Closed {
        failures: u32,
        last_failure: Option<Instant>,
    },
    Open {
        since: Instant,
    },
    HalfOpen {
        probes: u32,
        successes: u32,
    },
}

impl Circuit {
    fn closed() -> Self {
        Self::Closed {
            failures: 0,
            last_failure: None,
        }
    }
}

/// Per-client circuit breaker.
#[derive(Debug)]
pub struct CircuitBreaker {
    api: &'static str,
    config: CircuitBreakerConfig,
    circuit: Mutex<Circuit>,
}

impl CircuitBreaker {
    /// Create a closed breaker for the client of `api`.
    pub fn new(api: &'static str, config: CircuitBreakerConfig) -> Self {
        Self {
            api,
            config,
            circuit: Mutex::new(Circuit::closed()),
        }
    }

    /// Thresholds in use.
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Current state, moving an expired open circuit to half-open.
    pub fn state(&self) -> CircuitState {
        let mut circuit = self.circuit.lock();
        self.expire_open(&mut circuit);
        match *circuit {
            Circuit::Closed { .. } => CircuitState::Closed,
            Circuit::Open { .. } => CircuitState::Open,
            Circuit::HalfOpen { .. } => CircuitState::HalfOpen,
        }
    }

    /// Whether a call may reach the service. Half-open circuits count the
    /// call as a probe.
    pub fn is_allowed(&self) -> bool {
        let mut circuit = self.circuit.lock();
        self.expire_open(&mut circuit);
        match &mut *circuit {
            Circuit::Closed { .. } => true,
            Circuit::Open { .. } => false,
            Circuit::HalfOpen { probes, .. } => {
                *probes = probes.saturating_add(1);
                *probes <= self.config.half_open_requests
            }
        }
    }

    /// Record a call that completed successfully.
    pub fn record_success(&self) {
        let mut circuit = self.circuit.lock();
        match &mut *circuit {
            Circuit::Closed { failures, .. } => *failures = 0,
            Circuit::HalfOpen { successes, .. } => {
                *successes = successes.saturating_add(1);
                if *successes >= self.config.success_threshold {
                    info!(api = self.api, "Circuit breaker closing");
                    *circuit = Circuit::closed();
                }
            }
            Circuit::Open { .. } => {
                debug!(api = self.api, "Success recorded while circuit open, ignoring");
            }
        }
    }

    /// Record a call that failed or timed out.
    pub fn record_failure(&self) {
        let now = Instant::now();
        let mut circuit = self.circuit.lock();
        match &mut *circuit {
            Circuit::Closed {
                failures,
                last_failure,
            } => {
                let in_window = last_failure
                    .is_some_and(|last| now.duration_since(last) <= self.config.failure_window);
                *failures = if in_window { failures.saturating_add(1) } else { 1 };
                *last_failure = Some(now);

                if *failures >= self.config.failure_threshold {
                    warn!(api = self.api, failures = *failures, "Circuit breaker opening");
                    *circuit = Circuit::Open { since: now };
                }
            }
            Circuit::HalfOpen { .. } => {
                warn!(api = self.api, "Probe failed, circuit breaker reopening");
                *circuit = Circuit::Open { since: now };
            }
            Circuit::Open { .. } => {}
        }
    }

    /// Consecutive failures counted while closed.
    pub fn failure_count(&self) -> u32 {
        match *self.circuit.lock() {
            Circuit::Closed { failures, .. } => failures,
            _ => 0,
        }
    }

    /// Force the circuit closed.
    pub fn reset(&self) {
        *self.circuit.lock() = Circuit::closed();
    }

    fn expire_open(&self, circuit: &mut Circuit) {
        if let Circuit::Open { since } = circuit
            && since.elapsed() >= self.config.reset_timeout
        {
            debug!(api = self.api, "Circuit breaker transitioning to half-open");
            *circuit = Circuit::HalfOpen {
                probes: 0,
                successes: 0,
            };
        }
    }
}
