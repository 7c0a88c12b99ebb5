//! # Armature REST Client
//!
//! Declarative REST clients: describe an HTTP API as an async trait, then
//! build an implementation of it with authentication, error decoding and
//! optional fallbacks.
//!
//! ## Features
//!
//! - **Declarative APIs**: `#[rest_api]` turns an annotated trait into a client
//! - **Authentication**: API key header, API key body credentials, JWT token
//! - **Error Decoding**: Non-2xx responses become errors carrying status and body
//! - **JSON Codec**: Nulls omitted on encode, unknown fields ignored on decode
//! - **Fallbacks**: Fixed instance or per-failure factory, guarded by a timeout
//!   and a circuit breaker
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use armature_rest_client::prelude::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize)]
//! pub struct Order {
//!     pub product: String,
//!     pub quantity: u32,
//! }
//!
//! #[derive(Deserialize)]
//! #[serde(rename_all = "camelCase")]
//! pub struct OrderResponse {
//!     pub return_code: Option<i32>,
//!     pub return_code_desc: Option<String>,
//! }
//!
//! #[rest_api]
//! #[async_trait]
//! pub trait OrderApi: Send + Sync {
//!     #[request_line("POST /order/")]
//!     #[headers("Content-Type: application/json")]
//!     async fn process(&self, order: Order) -> Result<OrderResponse>;
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let orders = RestClient::<dyn OrderApi>::get()
//!         .auth(ApiKeyAuth::header_api_key("api", "601f1889667efaebb33b8c12572835da3f027f78"))
//!         .url("http://localhost:8080/api/")
//!         .build()?;
//!
//!     let response = orders
//!         .process(Order { product: "widget".into(), quantity: 5 })
//!         .await?;
//!     println!("{:?}", response.return_code_desc);
//!     Ok(())
//! }
//! ```
//!
//! ## With a Fallback
//!
//! Fallback clients run every call under a timeout and a circuit breaker,
//! answering failures with the fallback instead of an error. The timeout is
//! process-wide: see [`RestClient::fallback_timeout`].
//!
//! ```rust,ignore
//! let orders = RestClient::<dyn OrderApi>::get()
//!     .url("http://localhost:8080/api/")
//!     .fallback_timeout(Duration::from_millis(500))
//!     .build_with_fallback_factory(|cause: &RestClientError| {
//!         Arc::new(OfflineOrders::new(cause.to_string())) as Arc<dyn OrderApi>
//!     })?;
//! ```

extern crate self as armature_rest_client;

mod auth;
mod builder;
mod circuit_breaker;
mod codec;
pub mod command;
mod config;
mod error;
mod error_decoder;
mod fallback;
mod logger;
mod proxy;
mod response;
mod template;

pub use auth::{ApiKeyAuth, Authentication, JwtClient, JwtToken, NO_TOKEN, NoAuthentication};
pub use builder::RestClient;
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use codec::JsonCodec;
pub use command::{Command, CommandDefaults, default_timeout, set_default_timeout};
pub use config::{HttpClientConfig, HttpClientConfigBuilder};
pub use error::{RestClientError, Result};
pub use error_decoder::{ErrorDecoder, RestClientErrorDecoder};
pub use fallback::{Fallback, FallbackFactory};
pub use logger::{LogLevel, RequestLogger};
pub use proxy::Proxy;
pub use response::Response;
pub use template::RequestTemplate;

pub use armature_rest_client_macros::rest_api;
pub use async_trait::async_trait;

// Re-export common types
pub use bytes::Bytes;
pub use http::{HeaderMap, HeaderValue, Method, StatusCode, header};
pub use url::Url;

#[doc(hidden)]
pub mod __private {
    pub use async_trait::async_trait;
}

/// Prelude for common imports.
///
/// ```
/// use armature_rest_client::prelude::*;
/// ```
pub mod prelude {
    pub use crate::auth::{
        ApiKeyAuth, Authentication, JwtClient, JwtToken, NO_TOKEN, NoAuthentication,
    };
    pub use crate::builder::RestClient;
    pub use crate::circuit_breaker::CircuitBreakerConfig;
    pub use crate::config::{HttpClientConfig, HttpClientConfigBuilder};
    pub use crate::error::{RestClientError, Result};
    pub use crate::error_decoder::ErrorDecoder;
    pub use crate::fallback::{Fallback, FallbackFactory};
    pub use crate::logger::LogLevel;
    pub use crate::proxy::Proxy;
    pub use crate::response::Response;
    pub use async_trait::async_trait;
    pub use armature_rest_client_macros::rest_api;
    pub use http::{HeaderMap, Method, StatusCode};
}
