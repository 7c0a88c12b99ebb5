//! Request template.

use http::{HeaderName, HeaderValue, Method};
use std::fmt::Display;

use crate::{RestClientError, Result};

/// A request under construction.
///
/// Generated client methods fill in the verb, path, headers and body;
/// [`Authentication`](crate::Authentication) strategies then mutate the
/// template before the proxy resolves it against the target URL and sends it.
#[derive(Debug, Clone)]
pub struct RequestTemplate {
    method: Method,
    path: String,
    headers: Vec<(String, String)>,
    query: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl RequestTemplate {
    /// Create a template for `method` and a path relative to the target URL.
    ///
    /// The path may carry a query string and `{name}` placeholders.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
        }
    }

    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path relative to the target URL, including any query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Set a header, replacing any existing value for the same name.
    pub fn header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(slot) => slot.1 = value,
            None => self.headers.push((name, value)),
        }
        self
    }

    /// Get a header value by name (case-insensitive).
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// All headers in insertion order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Add a query parameter.
    pub fn query(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Replace the request body.
    pub fn body(&mut self, body: impl Into<Vec<u8>>) -> &mut Self {
        self.body = Some(body.into());
        self
    }

    /// Raw body bytes, if set.
    pub fn body_bytes(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Body as UTF-8 text, if set and valid.
    pub fn body_text(&self) -> Option<&str> {
        self.body
            .as_deref()
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    /// Expand `{name}` placeholders in the path and header values.
    ///
    /// Values are percent-encoded in the path and inserted verbatim in
    /// header values. Each text is scanned once, so braces inside a value are
    /// never expanded again. Unknown placeholders are left as they are.
    pub fn expand(&mut self, vars: &[(&str, &dyn Display)]) -> &mut Self {
        let values: Vec<(&str, String)> = vars
            .iter()
            .map(|(name, value)| (*name, value.to_string()))
            .collect();

        self.path = substitute(&self.path, &values, |raw| urlencoding::encode(raw).into_owned());
        for (_, header) in self.headers.iter_mut() {
            *header = substitute(header, &values, str::to_string);
        }
        self
    }

    /// Resolve the template against the target URL.
    ///
    /// The target is used as a prefix, so a target of `http://host/api/` and
    /// a path of `/order/` resolve to `http://host/api/order/`.
    pub fn resolve(&self, target: &str) -> Result<url::Url> {
        let base = target.trim_end_matches('/');
        let path = self.path.trim_start_matches('/');
        let joined = if path.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, path)
        };

        let mut url =
            url::Url::parse(&joined).map_err(|e| RestClientError::InvalidUrl(e.to_string()))?;

        if !self.query.is_empty() {
            let mut query_pairs = url.query_pairs_mut();
            for (key, value) in &self.query {
                query_pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }

    /// Build a reqwest request for this template.
    pub(crate) fn into_request(
        self,
        client: &reqwest::Client,
        target: &str,
        default_headers: &[(String, String)],
    ) -> Result<reqwest::Request> {
        let url = self.resolve(target)?;
        let mut request = client.request(self.method, url);

        for (name, value) in default_headers.iter().chain(self.headers.iter()) {
            let name = HeaderName::try_from(name.as_str())
                .map_err(|e| RestClientError::RequestBuild(format!("header {}: {}", name, e)))?;
            let value = HeaderValue::try_from(value.as_str())
                .map_err(|e| RestClientError::RequestBuild(format!("header {}: {}", name, e)))?;
            request = request.header(name, value);
        }

        if let Some(body) = self.body {
            request = request.body(body);
        }

        Ok(request.build()?)
    }
}

fn substitute(text: &str, values: &[(&str, String)], encode: impl Fn(&str) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let found = after.find('}').and_then(|end| {
            let name = &after[..end];
            values
                .iter()
                .find(|(candidate, _)| *candidate == name)
                .map(|(_, value)| (end, value))
        });

        match found {
            Some((end, value)) => {
                out.push_str(&encode(value));
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
