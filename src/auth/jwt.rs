//! JWT bearer credentials and the login client that obtains them.

use async_trait::async_trait;

use super::Authentication;
use crate::{RequestTemplate, Response, Result, rest_api};

/// Token reported when a login response carries no `authorization` header.
pub const NO_TOKEN: &str = "ND";

/// Sends a previously obtained token in the `Authorization` header.
///
/// The token is sent as issued, so it keeps whatever scheme prefix the login
/// endpoint put on it (e.g. `Bearer ...`).
#[derive(Debug, Clone)]
pub struct JwtToken {
    token: String,
}

impl JwtToken {
    /// Wrap a token returned by a login endpoint.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// The wrapped token.
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl Authentication for JwtToken {
    fn apply(&self, template: &mut RequestTemplate) {
        template.header("Authorization", self.token.as_str());
    }
}

/// Login endpoint exchanging API key credentials for a JWT.
///
/// Build it with the credentials as authentication, e.g.
/// [`ApiKeyAuth::header_api_key`](super::ApiKeyAuth::header_api_key), then
/// hand the result of [`JwtClient::token`] to
/// [`RestClient::jwt_token`](crate::RestClient::jwt_token).
#[rest_api]
#[async_trait]
pub trait JwtClient: Send + Sync {
    /// Post the login request and return the raw response.
    #[request_line("POST /login")]
    #[headers("Content-Type: application/json")]
    async fn auth(&self) -> Result<Response>;

    /// Log in and return the issued token, or [`NO_TOKEN`] when the server
    /// issued none.
    async fn token(&self) -> Result<String> {
        let response = self.auth().await?;
        Ok(response
            .header("authorization")
            .map_or_else(|| NO_TOKEN.to_string(), str::to_string))
    }
}
