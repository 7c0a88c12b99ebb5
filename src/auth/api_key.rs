//! API key credentials.

use super::Authentication;
use crate::RequestTemplate;

/// API key credentials sent either as a header or in the request body.
///
/// Both variants share this type; which one is applied depends on whether a
/// username was given.
#[derive(Debug, Clone)]
pub struct ApiKeyAuth {
    key: String,
    header_name: Option<String>,
    username: Option<String>,
}

impl ApiKeyAuth {
    /// Send `key` in the `header_name` header of every request.
    pub fn header_api_key(header_name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            header_name: Some(header_name.into()),
            username: None,
        }
    }

    /// Replace every request body with `{"username": .., "api_key": ..}`.
    pub fn body_user_api_key(username: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            header_name: None,
            username: Some(username.into()),
        }
    }
}

impl Authentication for ApiKeyAuth {
    fn apply(&self, template: &mut RequestTemplate) {
        match (&self.username, &self.header_name) {
            (Some(username), _) => {
                let body = serde_json::json!({
                    "username": username,
                    "api_key": self.key,
                });
                match serde_json::to_vec_pretty(&body) {
                    Ok(body) => {
                        template.body(body);
                    }
                    Err(e) => tracing::error!(error = %e, "Failed to encode credential body"),
                }
            }
            (None, Some(header_name)) => {
                template.header(header_name.as_str(), self.key.as_str());
            }
            (None, None) => {}
        }
    }
}
