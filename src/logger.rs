//! Request and response logging.

use std::time::Duration;

use crate::Response;

/// How much of each exchange is logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    /// No logging.
    None,
    /// Method, URL, status and elapsed time.
    Basic,
    /// Basic plus request and response headers.
    Headers,
    /// Headers plus request and response bodies.
    #[default]
    Full,
}

/// Logs the exchanges of one client.
#[derive(Debug, Clone)]
pub struct RequestLogger {
    api: &'static str,
    level: LogLevel,
}

impl RequestLogger {
    /// Create a logger for the API type `api`.
    pub fn new(api: &'static str, level: LogLevel) -> Self {
        Self { api, level }
    }

    /// Name of the API type being logged.
    pub fn api(&self) -> &'static str {
        self.api
    }

    /// Configured level.
    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Log an outgoing request.
    pub fn log_request(&self, method_key: &str, request: &reqwest::Request) {
        if self.level == LogLevel::None {
            return;
        }

        tracing::debug!(
            api = self.api,
            method_key,
            method = %request.method(),
            url = %request.url(),
            "Sending HTTP request"
        );

        if self.level >= LogLevel::Headers {
            for (name, value) in request.headers() {
                tracing::trace!(
                    api = self.api,
                    method_key,
                    header = %name,
                    value = ?value,
                    "Request header"
                );
            }
        }

        if self.level >= LogLevel::Full
            && let Some(body) = request.body().and_then(|b| b.as_bytes())
        {
            tracing::trace!(
                api = self.api,
                method_key,
                bytes = body.len(),
                body = %String::from_utf8_lossy(body),
                "Request body"
            );
        }
    }

    /// Log a received response.
    pub fn log_response(&self, method_key: &str, response: &Response, elapsed: Duration) {
        if self.level == LogLevel::None {
            return;
        }

        tracing::debug!(
            api = self.api,
            method_key,
            status = %response.status(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Received HTTP response"
        );

        if self.level >= LogLevel::Headers {
            for (name, value) in response.headers() {
                tracing::trace!(
                    api = self.api,
                    method_key,
                    header = %name,
                    value = ?value,
                    "Response header"
                );
            }
        }

        if self.level >= LogLevel::Full
            && let Some(body) = response.text()
        {
            tracing::trace!(
                api = self.api,
                method_key,
                bytes = body.len(),
                body = %body,
                "Response body"
            );
        }
    }

    /// Log a transport failure.
    pub fn log_error(&self, method_key: &str, error: &reqwest::Error, elapsed: Duration) {
        if self.level == LogLevel::None {
            return;
        }

        tracing::debug!(
            api = self.api,
            method_key,
            error = %error,
            elapsed_ms = elapsed.as_millis() as u64,
            "HTTP request failed"
        );
    }
}
