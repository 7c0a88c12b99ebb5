//! Command runtime for fallback-enabled clients.
//!
//! A [`Command`] races each call against a timeout and feeds the outcome
//! into a [`CircuitBreaker`]. Unless a client fixed its own timeout, the
//! timeout is read from the process-wide [`CommandDefaults`] on every call,
//! so a change reaches every such fallback client, including ones built
//! before the change and whichever builder made it.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::{CircuitBreaker, CircuitBreakerConfig, RestClientError, Result};

/// Default command timeout when nothing overrides it.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_millis(1000);

/// Environment variable holding the default command timeout in milliseconds.
pub const COMMAND_TIMEOUT_ENV: &str = "ARMATURE_REST_CLIENT_TIMEOUT_MS";

static DEFAULTS: Lazy<RwLock<CommandDefaults>> =
    Lazy::new(|| RwLock::new(CommandDefaults::from_env()));

/// Process-wide command settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandDefaults {
    /// Timeout applied to every command.
    pub timeout: Duration,
}

impl Default for CommandDefaults {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}

impl CommandDefaults {
    /// Load defaults from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load defaults through a variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut defaults = Self::default();
        if let Some(raw) = lookup(COMMAND_TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(millis) => defaults.timeout = Duration::from_millis(millis),
                Err(e) => warn!(
                    variable = COMMAND_TIMEOUT_ENV,
                    value = %raw,
                    error = %e,
                    "Ignoring invalid command timeout"
                ),
            }
        }
        defaults
    }
}

/// Current process-wide command timeout.
pub fn default_timeout() -> Duration {
    DEFAULTS.read().timeout
}

/// Replace the process-wide command timeout.
///
/// This is global state: it changes the timeout of every fallback client in
/// this process that did not fix its own, already built or not. Returns the
/// value in force once the write completed.
pub fn set_default_timeout(timeout: Duration) -> Duration {
    let mut defaults = DEFAULTS.write();
    if defaults.timeout != timeout {
        info!(
            previous_ms = defaults.timeout.as_millis() as u64,
            timeout_ms = timeout.as_millis() as u64,
            "Process-wide command timeout changed"
        );
    }
    defaults.timeout = timeout;
    defaults.timeout
}

/// Timeout and circuit-breaker wrapper around a call.
#[derive(Debug, Clone)]
pub struct Command {
    timeout: Option<Duration>,
    breaker: Arc<CircuitBreaker>,
}

impl Command {
    /// Create a command for the client of `api` with its own circuit breaker.
    ///
    /// The command follows the process-wide default timeout.
    pub fn new(api: &'static str, breaker: CircuitBreakerConfig) -> Self {
        Self {
            timeout: None,
            breaker: Arc::new(CircuitBreaker::new(api, breaker)),
        }
    }

    /// Fix the timeout of this command, ignoring later default changes.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Timeout the next call runs under.
    pub fn timeout(&self) -> Duration {
        self.timeout.unwrap_or_else(default_timeout)
    }

    /// Whether the timeout tracks the process-wide default.
    pub fn follows_default(&self) -> bool {
        self.timeout.is_none()
    }

    /// The command's circuit breaker.
    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Run `call` under the timeout, short-circuiting while the breaker is open.
    pub async fn execute<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if !self.breaker.is_allowed() {
            return Err(RestClientError::CircuitOpen);
        }

        let timeout = self.timeout();
        let outcome = match tokio::time::timeout(timeout, call).await {
            Ok(outcome) => outcome,
            Err(_) => Err(RestClientError::Timeout(timeout)),
        };

        match &outcome {
            Ok(_) => self.breaker.record_success(),
            Err(_) => self.breaker.record_failure(),
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CircuitState;

    fn command(timeout: Duration, breaker: CircuitBreakerConfig) -> Command {
        Command::new("OrderApi", breaker).with_timeout(timeout)
    }

    #[test]
    fn test_defaults_from_lookup() {
        let defaults = CommandDefaults::from_lookup(|_| None);
        assert_eq!(defaults.timeout, DEFAULT_COMMAND_TIMEOUT);

        let defaults = CommandDefaults::from_lookup(|key| {
            (key == COMMAND_TIMEOUT_ENV).then(|| "2500".to_string())
        });
        assert_eq!(defaults.timeout, Duration::from_millis(2500));

        let defaults = CommandDefaults::from_lookup(|_| Some("soon".to_string()));
        assert_eq!(defaults.timeout, DEFAULT_COMMAND_TIMEOUT);
    }

    #[test]
    fn test_default_change_reaches_existing_command() {
        let follower = Command::new("OrderApi", CircuitBreakerConfig::default());
        let fixed = command(Duration::from_millis(300), CircuitBreakerConfig::default());
        assert!(follower.follows_default());
        assert!(!fixed.follows_default());

        let applied = set_default_timeout(Duration::from_millis(1500));
        assert_eq!(applied, Duration::from_millis(1500));
        assert_eq!(default_timeout(), Duration::from_millis(1500));
        assert_eq!(follower.timeout(), Duration::from_millis(1500));
        assert_eq!(fixed.timeout(), Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_execute_passes_result_through() {
        let command = command(Duration::from_secs(1), CircuitBreakerConfig::default());
        let value = command.execute(async { Ok::<_, RestClientError>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_times_out() {
        let command = command(Duration::from_millis(100), CircuitBreakerConfig::default());
        let result = command
            .execute(async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Ok::<_, RestClientError>(())
            })
            .await;

        assert!(
            matches!(result, Err(RestClientError::Timeout(t)) if t == Duration::from_millis(100))
        );
        assert_eq!(command.circuit_breaker().failure_count(), 1);
    }

    #[tokio::test]
    async fn test_open_circuit_short_circuits() {
        let command = command(
            Duration::from_secs(1),
            CircuitBreakerConfig::new(2, Duration::from_secs(60)),
        );

        for _ in 0..2 {
            let _ = command
                .execute(async { Err::<(), _>(RestClientError::status_error(500, "boom")) })
                .await;
        }
        assert_eq!(command.circuit_breaker().state(), CircuitState::Open);

        let result = command.execute(async { Ok::<_, RestClientError>(()) }).await;
        assert!(matches!(result, Err(RestClientError::CircuitOpen)));
    }
}
