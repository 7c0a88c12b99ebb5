//! Compile-time parsing of request lines and header declarations
//!
//! A request line has the form `"VERB /path?query"`:
//! - VERB must be an HTTP method the client can send
//! - The path must start with "/"
//! - No double slashes
//! - Placeholders use `{name}` syntax and name a method argument

use proc_macro2::Span;
use syn::Error;

const VERBS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS"];

/// A validated request line.
pub struct RequestLine {
    /// Upper-case HTTP verb, usable as an `http::Method` associated constant
    pub verb: String,
    /// Path relative to the target URL, query string included
    pub path: String,
    /// Placeholder names in order of appearance
    pub placeholders: Vec<String>,
}

/// A header declared with `#[headers("Name: value")]`
#[derive(Clone)]
pub struct HeaderLine {
    pub name: String,
    pub value: String,
    pub placeholders: Vec<String>,
}

/// Parse and validate a request line
pub fn parse_request_line(line: &str, span: Span) -> Result<RequestLine, Error> {
    let line = line.trim();
    let (verb, path) = match line.split_once(char::is_whitespace) {
        Some((verb, path)) => (verb, path.trim()),
        None => {
            return Err(Error::new(
                span,
                format!(
                    "request line must be \"VERB /path\", got: \"{}\"\n\
                     hint: for example #[request_line(\"GET /orders/{{id}}\")]",
                    line
                ),
            ));
        }
    };

    let verb = verb.to_uppercase();
    if !VERBS.contains(&verb.as_str()) {
        return Err(Error::new(
            span,
            format!(
                "unsupported HTTP method \"{}\"\n\
                 hint: use one of {}",
                verb,
                VERBS.join(", ")
            ),
        ));
    }

    if !path.starts_with('/') {
        return Err(Error::new(
            span,
            format!(
                "request path must start with '/', got: \"{}\"\n\
                 hint: change to \"/{}\"",
                path, path
            ),
        ));
    }

    if path.contains(char::is_whitespace) {
        return Err(Error::new(
            span,
            format!("request path must not contain whitespace: \"{}\"", path),
        ));
    }

    let route = path.split('?').next().unwrap_or(path);
    if route.contains("//") {
        return Err(Error::new(
            span,
            format!(
                "request path contains double slashes: \"{}\"\n\
                 hint: remove consecutive slashes",
                path
            ),
        ));
    }

    let placeholders = extract_placeholders(path, span)?;

    Ok(RequestLine {
        verb,
        path: path.to_string(),
        placeholders,
    })
}

/// Parse a `"Name: value"` header declaration
pub fn parse_header_line(line: &str, span: Span) -> Result<HeaderLine, Error> {
    let Some((name, value)) = line.split_once(':') else {
        return Err(Error::new(
            span,
            format!(
                "header must be \"Name: value\", got: \"{}\"\n\
                 hint: for example #[headers(\"Content-Type: application/json\")]",
                line
            ),
        ));
    };

    let name = name.trim();
    if name.is_empty() || !name.bytes().all(is_token_byte) {
        return Err(Error::new(
            span,
            format!("invalid header name \"{}\"", name),
        ));
    }

    let value = value.trim();
    let placeholders = extract_placeholders(value, span)?;

    Ok(HeaderLine {
        name: name.to_string(),
        value: value.to_string(),
        placeholders,
    })
}

/// Extract `{name}` placeholders, rejecting unbalanced braces and bad names
fn extract_placeholders(text: &str, span: Span) -> Result<Vec<String>, Error> {
    let mut placeholders = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            return Err(Error::new(
                span,
                format!("unclosed placeholder in \"{}\"", text),
            ));
        };

        let name = &after[..close];
        if !is_valid_identifier(name) {
            return Err(Error::new(
                span,
                format!(
                    "invalid placeholder name \"{}\" in \"{}\"\n\
                     hint: placeholder names must match a method argument",
                    name, text
                ),
            ));
        }

        if !placeholders.iter().any(|p| p == name) {
            placeholders.push(name.to_string());
        }
        rest = &after[close + 1..];
    }

    if rest.contains('}') {
        return Err(Error::new(
            span,
            format!("unbalanced '}}' in \"{}\"", text),
        ));
    }

    Ok(placeholders)
}

/// Check if a string is a valid Rust identifier
fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// RFC 9110 token characters
fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}
