// Procedural macros for armature-rest-client
// These macros turn annotated traits into declarative HTTP clients

use proc_macro::TokenStream;

mod request_line;
mod rest_api;

/// Generates an implementation of the annotated trait for
/// `armature_rest_client::Proxy<dyn Trait>`.
///
/// Methods carry `#[request_line("VERB /path")]` and optional
/// `#[headers("Name: value", ...)]`; headers on the trait apply to every
/// method. `{name}` placeholders are expanded from the argument of the same
/// name, and the one remaining argument (if any) is sent as the JSON body.
///
/// `call`, `command`, `config`, `encode_body`, `execute`, `fallback`,
/// `fallback_for` and `target` are methods of the proxy itself and cannot be
/// used as method names.
///
/// Place `#[rest_api]` above `#[async_trait]`:
///
/// ```ignore
/// use armature_rest_client::prelude::*;
///
/// #[rest_api]
/// #[async_trait]
/// pub trait OrderApi: Send + Sync {
///     #[request_line("POST /order/")]
///     #[headers("Content-Type: application/json")]
///     async fn process(&self, order: Order) -> Result<OrderResponse>;
///
///     #[request_line("GET /order/{id}")]
///     async fn find(&self, id: u64) -> Result<OrderResponse>;
/// }
/// ```
#[proc_macro_attribute]
pub fn rest_api(attr: TokenStream, item: TokenStream) -> TokenStream {
    rest_api::rest_api_impl(attr, item)
}
