//! Request authentication.
//!
//! An [`Authentication`] strategy mutates every outgoing
//! [`RequestTemplate`](crate::RequestTemplate) before it is sent. A built
//! client holds exactly one strategy; [`NoAuthentication`] is used when the
//! builder is given none.

mod api_key;
mod jwt;

pub use api_key::ApiKeyAuth;
pub use jwt::{JwtClient, JwtToken, NO_TOKEN};

use crate::RequestTemplate;

/// Applies credentials to an outgoing request.
pub trait Authentication: Send + Sync {
    /// Mutate the request template, e.g. set a header or replace the body.
    fn apply(&self, template: &mut RequestTemplate);
}

/// Authentication that leaves requests untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuthentication;

impl Authentication for NoAuthentication {
    fn apply(&self, _template: &mut RequestTemplate) {}
}
