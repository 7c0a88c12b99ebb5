//! JSON codec.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{RestClientError, Result};

/// JSON codec applied uniformly to every built client.
///
/// The options are fixed: null object members are omitted on encode, output
/// is pretty-printed, and unknown fields are ignored on decode so clients
/// keep working when a server adds fields to its responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl JsonCodec {
    /// Encode a value as a request body.
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        let mut value =
            serde_json::to_value(value).map_err(|e| RestClientError::Encode(e.to_string()))?;
        strip_nulls(&mut value);
        serde_json::to_vec_pretty(&value).map_err(|e| RestClientError::Encode(e.to_string()))
    }

    /// Decode a response body.
    ///
    /// An empty body decodes as `null`, so `()` and `Option<T>` results
    /// accept bodiless responses.
    pub fn decode<T: DeserializeOwned>(&self, body: &[u8]) -> Result<T> {
        let body = if body.iter().all(u8::is_ascii_whitespace) {
            b"null".as_slice()
        } else {
            body
        };
        serde_json::from_slice(body).map_err(|e| RestClientError::Decode(e.to_string()))
    }
}

fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}
