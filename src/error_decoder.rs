//! Translation of failed responses into typed errors.

use crate::{Response, RestClientError};

/// Converts a non-2xx response into an error.
pub trait ErrorDecoder: Send + Sync {
    /// Decode the failed response of the method identified by `method_key`.
    fn decode(&self, method_key: &str, response: Response) -> RestClientError;
}

/// Default error decoder.
///
/// Produces `"status {code} reading {method_key}"`, followed by
/// `"; content:\n{body}"` when a non-empty body was read. A body that failed
/// to read only shortens the message.
#[derive(Debug, Clone, Copy, Default)]
pub struct RestClientErrorDecoder;

impl ErrorDecoder for RestClientErrorDecoder {
    fn decode(&self, method_key: &str, response: Response) -> RestClientError {
        let status = response.status().as_u16();
        let mut message = format!("status {} reading {}", status, method_key);
        if let Some(body) = response.text()
            && !body.is_empty()
        {
            message.push_str("; content:\n");
            message.push_str(&body);
        }
        RestClientError::Status { status, message }
    }
}

impl<F> ErrorDecoder for F
where
    F: Fn(&str, Response) -> RestClientError + Send + Sync,
{
    fn decode(&self, method_key: &str, response: Response) -> RestClientError {
        self(method_key, response)
    }
}
