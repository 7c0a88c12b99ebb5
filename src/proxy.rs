//! Client proxy executing declarative API calls.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

use crate::command::Command;
use crate::{
    Authentication, ErrorDecoder, Fallback, HttpClientConfig, JsonCodec, RequestLogger,
    RequestTemplate, Response, RestClientError, Result,
};

/// A built client for the API trait `T`.
///
/// `#[rest_api]` implements `T` for `Proxy<dyn T>`: each trait method builds
/// a [`RequestTemplate`] and sends it through [`Proxy::call`] or
/// [`Proxy::execute`], asking [`Proxy::fallback_for`] for a substitute when
/// the call fails.
pub struct Proxy<T: ?Sized> {
    inner: reqwest::Client,
    target: String,
    config: Arc<HttpClientConfig>,
    authentication: Arc<dyn Authentication>,
    codec: JsonCodec,
    error_decoder: Arc<dyn ErrorDecoder>,
    logger: RequestLogger,
    fallback: Fallback<T>,
    command: Option<Command>,
}

impl<T: ?Sized> Proxy<T> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        inner: reqwest::Client,
        target: String,
        config: HttpClientConfig,
        authentication: Arc<dyn Authentication>,
        error_decoder: Arc<dyn ErrorDecoder>,
        logger: RequestLogger,
        fallback: Fallback<T>,
        command: Option<Command>,
    ) -> Self {
        Self {
            inner,
            target,
            config: Arc::new(config),
            authentication,
            codec: JsonCodec,
            error_decoder,
            logger,
            fallback,
            command,
        }
    }

    /// Base URL every request path is resolved against.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Transport configuration.
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Fallback strategy chosen at build time.
    pub fn fallback(&self) -> &Fallback<T> {
        &self.fallback
    }

    /// Command wrapper, present for fallback strategies.
    pub fn command(&self) -> Option<&Command> {
        self.command.as_ref()
    }

    /// Encode `body` as the JSON request body.
    pub fn encode_body<B: Serialize + ?Sized>(
        &self,
        template: &mut RequestTemplate,
        body: &B,
    ) -> Result<()> {
        let bytes = self.codec.encode(body)?;
        if template.header_value("content-type").is_none() {
            template.header("Content-Type", "application/json");
        }
        template.body(bytes);
        Ok(())
    }

    /// Send the request and decode a 2xx body into `R`.
    ///
    /// Non-2xx responses are turned into errors by the error decoder.
    pub async fn call<R: DeserializeOwned>(
        &self,
        method_key: &str,
        template: RequestTemplate,
    ) -> Result<R> {
        let response = self.run(method_key, template, true).await?;
        match response.body() {
            Some(body) => self.codec.decode(body),
            None => Err(RestClientError::Decode(format!(
                "response body of {} could not be read",
                method_key
            ))),
        }
    }

    /// Send the request and return the raw response, whatever its status.
    pub async fn execute(&self, method_key: &str, template: RequestTemplate) -> Result<Response> {
        self.run(method_key, template, false).await
    }

    /// Answer a failed call: the fallback chosen at build time, or the cause.
    pub fn fallback_for(&self, cause: RestClientError) -> Result<Arc<T>> {
        if self.fallback.is_enabled() {
            warn!(
                api = self.logger.api(),
                strategy = self.fallback.strategy(),
                cause = %cause,
                "Call failed, answering with fallback"
            );
        }
        self.fallback.resolve(cause)
    }

    async fn run(
        &self,
        method_key: &str,
        mut template: RequestTemplate,
        decode_errors: bool,
    ) -> Result<Response> {
        self.authentication.apply(&mut template);
        let request =
            template.into_request(&self.inner, &self.target, &self.config.default_headers)?;

        let exchange = self.exchange(method_key, request, decode_errors);
        match &self.command {
            Some(command) => command.execute(exchange).await,
            None => exchange.await,
        }
    }

    async fn exchange(
        &self,
        method_key: &str,
        request: reqwest::Request,
        decode_errors: bool,
    ) -> Result<Response> {
        self.logger.log_request(method_key, &request);
        let start = Instant::now();

        let response = match self.inner.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                self.logger.log_error(method_key, &e, start.elapsed());
                return Err(e.into());
            }
        };

        let response = Response::from_reqwest(response).await;
        self.logger
            .log_response(method_key, &response, start.elapsed());

        if decode_errors && !response.is_success() {
            return Err(self.error_decoder.decode(method_key, response));
        }
        Ok(response)
    }
}

impl<T: ?Sized> fmt::Debug for Proxy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("api", &self.logger.api())
            .field("target", &self.target)
            .field("strategy", &self.fallback.strategy())
            .field("timeout", &self.command.as_ref().map(Command::timeout))
            .finish()
    }
}
