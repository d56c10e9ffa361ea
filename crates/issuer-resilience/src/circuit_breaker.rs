//! Circuit breaker pattern implementation.
//!
//! The circuit breaker stops calls to a failing gateway operation and lets it
//! recover. Each breaker guards one named operation; state reads, counter
//! updates and transitions happen under a single mutex so concurrent callers
//! cannot race past the threshold check.

use chrono::{DateTime, Utc};
use issuer_core::{GatewayError, GatewayResult};
use parking_lot::Mutex;
use serde::Serialize;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Circuit is closed, requests flow normally
    Closed,
    /// Circuit is open, requests are rejected
    Open,
    /// Circuit is half-open, a single trial request is admitted
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half_open"),
        }
    }
}

/// Circuit breaker configuration
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before opening the circuit
    pub failure_threshold: u32,
    /// Time since the last failure before a trial call is admitted
    pub reset_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    failure_count: u32,
    last_failure: Option<Instant>,
    last_failure_at: Option<DateTime<Utc>>,
    half_open_trial_in_flight: bool,
}

impl BreakerInner {
    fn closed() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            last_failure: None,
            last_failure_at: None,
            half_open_trial_in_flight: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    Normal,
    Trial,
}

/// Circuit breaker for a single named gateway operation
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker
    #[must_use]
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(BreakerInner::closed()),
        }
    }

    /// Create with default configuration
    #[must_use]
    pub fn with_defaults(name: impl Into<String>) -> Self {
        Self::new(name, CircuitBreakerConfig::default())
    }

    /// Operation name guarded by this breaker
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the current state
    #[must_use]
    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    /// Run `operation` through the breaker.
    ///
    /// Rejected calls never invoke `operation`. Errors for which
    /// [`GatewayError::counts_as_failure`] is false are reported to the caller
    /// but recorded as successes: the gateway answered.
    ///
    /// # Errors
    /// Returns `GatewayError::CircuitBreakerOpen` when the call is rejected,
    /// otherwise whatever `operation` returns.
    pub async fn call<F, Fut, T>(&self, operation: F) -> GatewayResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = GatewayResult<T>>,
    {
        let permit = self.acquire()?;
        let result = operation().await;

        match &result {
            Err(error) if error.counts_as_failure() => permit.failure(),
            _ => permit.success(),
        }

        result
    }

    fn acquire(&self) -> GatewayResult<CallPermit<'_>> {
        let admission = self.admit()?;
        Ok(CallPermit {
            breaker: self,
            admission,
            settled: false,
        })
    }

    fn admit(&self) -> GatewayResult<Admission> {
        let mut inner = self.inner.lock();

        match inner.state {
            CircuitState::Closed => Ok(Admission::Normal),
            CircuitState::Open => {
                let reset_elapsed = inner
                    .last_failure
                    .map_or(true, |at| at.elapsed() >= self.config.reset_timeout);

                if reset_elapsed {
                    inner.state = CircuitState::HalfOpen;
                    inner.half_open_trial_in_flight = true;
                    info!(operation = %self.name, "Circuit breaker half-open, admitting trial call");
                    Ok(Admission::Trial)
                } else {
                    debug!(operation = %self.name, "Circuit breaker open, rejecting call");
                    Err(GatewayError::circuit_breaker_open(&self.name))
                }
            }
            CircuitState::HalfOpen => {
                if inner.half_open_trial_in_flight {
                    debug!(operation = %self.name, "Trial call in flight, rejecting call");
                    Err(GatewayError::circuit_breaker_open(&self.name))
                } else {
                    inner.half_open_trial_in_flight = true;
                    Ok(Admission::Trial)
                }
            }
        }
    }

    fn on_success(&self, admission: Admission) {
        let mut inner = self.inner.lock();

        match (inner.state, admission) {
            (CircuitState::HalfOpen, Admission::Trial) => {
                inner.state = CircuitState::Closed;
                inner.failure_count = 0;
                inner.half_open_trial_in_flight = false;
                info!(operation = %self.name, "Circuit breaker closed");
            }
            (CircuitState::Closed, _) => {
                inner.failure_count = 0;
            }
            // Late result from a call admitted before the circuit opened
            _ => {}
        }
    }

    fn on_failure(&self, admission: Admission) {
        let mut inner = self.inner.lock();

        inner.failure_count = inner.failure_count.saturating_add(1);
        inner.last_failure = Some(Instant::now());
        inner.last_failure_at = Some(Utc::now());

        match (inner.state, admission) {
            (CircuitState::Closed, _)
                if inner.failure_count >= self.config.failure_threshold.max(1) =>
            {
                inner.state = CircuitState::Open;
                warn!(
                    operation = %self.name,
                    failures = inner.failure_count,
                    threshold = self.config.failure_threshold,
                    "Circuit breaker opened"
                );
            }
            (CircuitState::HalfOpen, Admission::Trial) => {
                inner.state = CircuitState::Open;
                inner.half_open_trial_in_flight = false;
                warn!(operation = %self.name, "Circuit breaker trial failed, reopening");
            }
            _ => {}
        }
    }

    /// Reset the circuit breaker to closed state
    pub fn reset(&self) {
        *self.inner.lock() = BreakerInner::closed();
        info!(operation = %self.name, "Circuit breaker reset");
    }

    /// Force the circuit open (for testing or manual intervention)
    pub fn force_open(&self) {
        let mut inner = self.inner.lock();
        inner.state = CircuitState::Open;
        inner.last_failure = Some(Instant::now());
        inner.last_failure_at = Some(Utc::now());
        inner.half_open_trial_in_flight = false;
        warn!(operation = %self.name, "Circuit breaker forced open");
    }

    /// Point-in-time copy of the breaker state
    #[must_use]
    pub fn snapshot(&self) -> CircuitBreakerSnapshot {
        let inner = self.inner.lock();
        CircuitBreakerSnapshot {
            name: self.name.clone(),
            state: inner.state,
            failure_count: inner.failure_count,
            last_failure_at: inner.last_failure_at,
            half_open_trial_in_flight: inner.half_open_trial_in_flight,
        }
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("state", &self.state())
            .finish()
    }
}

/// Admission ticket for one call. Dropping it unsettled (the caller's future
/// was cancelled) counts as a failure so a half-open trial is never leaked.
struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    admission: Admission,
    settled: bool,
}

impl CallPermit<'_> {
    fn success(mut self) {
        self.settled = true;
        self.breaker.on_success(self.admission);
    }

    fn failure(mut self) {
        self.settled = true;
        self.breaker.on_failure(self.admission);
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if !self.settled {
            debug!(operation = %self.breaker.name, "Guarded call abandoned");
            self.breaker.on_failure(self.admission);
        }
    }
}

/// Circuit breaker statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CircuitBreakerSnapshot {
    /// Operation name
    pub name: String,
    /// Current state
    pub state: CircuitState,
    /// Consecutive failure count
    pub failure_count: u32,
    /// Time of the most recent failure
    pub last_failure_at: Option<DateTime<Utc>>,
    /// Whether a half-open trial call is currently running
    pub half_open_trial_in_flight: bool,
}
