//! Client builder.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::command::{self, Command};
use crate::{
    Authentication, CircuitBreakerConfig, ErrorDecoder, Fallback, FallbackFactory,
    HttpClientConfig, JwtToken, LogLevel, NoAuthentication, Proxy, RequestLogger,
    RestClientError, RestClientErrorDecoder, Result,
};

/// Configures and builds a [`Proxy`] for the API trait `T`.
///
/// `T` is the trait object type of a `#[rest_api]` trait:
///
/// ```rust,ignore
/// let orders = RestClient::<dyn OrderApi>::get()
///     .auth(ApiKeyAuth::header_api_key("api", key))
///     .url("http://localhost:8080/api/")
///     .build_with_fallback(Arc::new(OfflineOrders))?;
/// ```
pub struct RestClient<T: ?Sized> {
    url: Option<String>,
    authentication: Arc<dyn Authentication>,
    fallback_timeout: Option<Duration>,
    http_config: HttpClientConfig,
    circuit_breaker: CircuitBreakerConfig,
    log_level: LogLevel,
    error_decoder: Arc<dyn ErrorDecoder>,
    _api: PhantomData<fn() -> Box<T>>,
}

impl<T: ?Sized> RestClient<T> {
    /// Start configuring a client.
    pub fn get() -> Self {
        Self::new()
    }

    /// Start configuring a client.
    pub fn new() -> Self {
        Self {
            url: None,
            authentication: Arc::new(NoAuthentication),
            fallback_timeout: None,
            http_config: HttpClientConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            log_level: LogLevel::default(),
            error_decoder: Arc::new(RestClientErrorDecoder),
            _api: PhantomData,
        }
    }

    /// Set the authentication applied to every request, replacing any
    /// previous one.
    pub fn auth(mut self, authentication: impl Authentication + 'static) -> Self {
        self.authentication = Arc::new(authentication);
        self
    }

    /// Authenticate with a token obtained from [`JwtClient`](crate::JwtClient).
    pub fn jwt_token(self, token: impl Into<String>) -> Self {
        self.auth(JwtToken::new(token))
    }

    /// Base URL request paths are appended to.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Timeout for fallback-enabled clients.
    ///
    /// The value is written to the process-wide command default when a
    /// fallback client is built. Every fallback client in this process that
    /// was built without its own `fallback_timeout` picks it up on its next
    /// call, including clients built earlier. Plain clients ignore it.
    pub fn fallback_timeout(mut self, timeout: Duration) -> Self {
        self.fallback_timeout = Some(timeout);
        self
    }

    /// Transport settings.
    pub fn http_config(mut self, config: HttpClientConfig) -> Self {
        self.http_config = config;
        self
    }

    /// Circuit breaker settings for fallback-enabled clients.
    pub fn circuit_breaker(mut self, config: CircuitBreakerConfig) -> Self {
        self.circuit_breaker = config;
        self
    }

    /// How much of each exchange is logged.
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Replace the error decoder for non-2xx responses.
    pub fn error_decoder(mut self, decoder: impl ErrorDecoder + 'static) -> Self {
        self.error_decoder = Arc::new(decoder);
        self
    }

    /// Build a client whose errors propagate to the caller.
    pub fn build(self) -> Result<Proxy<T>> {
        self.build_with(Fallback::None)
    }

    /// Build a client answered by `fallback` whenever a call fails.
    pub fn build_with_fallback(self, fallback: Arc<T>) -> Result<Proxy<T>> {
        self.build_with(Fallback::Instance(fallback))
    }

    /// Build a client answered by the instance `factory` creates for each
    /// failure.
    pub fn build_with_fallback_factory(
        self,
        factory: impl FallbackFactory<T> + 'static,
    ) -> Result<Proxy<T>> {
        self.build_with(Fallback::factory(factory))
    }

    /// Build a client with the given fallback strategy.
    pub fn build_with(self, fallback: Fallback<T>) -> Result<Proxy<T>> {
        let api = std::any::type_name::<T>();
        let url = self
            .url
            .ok_or_else(|| RestClientError::Config(format!("url is required for {}", api)))?;
        let parsed = url::Url::parse(&url)
            .map_err(|e| RestClientError::InvalidUrl(format!("{}: {}", url, e)))?;
        if parsed.query().is_some() || parsed.fragment().is_some() {
            return Err(RestClientError::InvalidUrl(format!(
                "{}: request paths are appended to the url, it cannot carry a query or fragment",
                url
            )));
        }

        let inner = self.http_config.build_client()?;

        let command = match &fallback {
            Fallback::None => None,
            Fallback::Instance(_) | Fallback::Factory(_) => {
                let command = Command::new(api, self.circuit_breaker);
                Some(match self.fallback_timeout {
                    Some(timeout) => command.with_timeout(command::set_default_timeout(timeout)),
                    None => command,
                })
            }
        };

        match &command {
            Some(command) => info!(
                api,
                url = %url,
                strategy = fallback.strategy(),
                timeout_ms = command.timeout().as_millis() as u64,
                follows_default = command.follows_default(),
                "Built REST client"
            ),
            None => {
                if self.fallback_timeout.is_some() {
                    debug!(api, "Ignoring fallback timeout for client without fallback");
                }
                info!(api, url = %url, strategy = fallback.strategy(), "Built REST client");
            }
        }

        Ok(Proxy::new(
            inner,
            url,
            self.http_config,
            self.authentication,
            self.error_decoder,
            RequestLogger::new(api, self.log_level),
            fallback,
            command,
        ))
    }
}

impl<T: ?Sized> Default for RestClient<T> {
    fn default() -> Self {
        Self::new()
    }
}
