//! Request and response described as plain data.
//!
//! # Design
//! `HttpRequest::prepare` turns a URL plus `RequestOptions` into exactly
//! what goes on the wire (final URL, upper-case method, headers, payload),
//! so every transport backend shares the same body and header rules and
//! only has to perform the I/O.

use crate::header::HeaderRecord;
use crate::options::{Method, RequestOptions};
use crate::url::{self, UrlFlags, UrlParts};

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// An HTTP request ready for a transport to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Apply the body rules: form bodies are query-encoded, and the body is
    /// only sent as payload for POST/PUT/PATCH. For any other method a
    /// non-empty body is joined onto the URL's query string instead.
    pub fn prepare(url: &str, opts: &RequestOptions) -> Self {
        let encoded = opts.body.as_ref().map(|b| b.encode()).filter(|b| !b.is_empty());
        let is_form = opts.body.as_ref().is_some_and(|b| b.is_form());

        let mut headers: Vec<(String, String)> = opts
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if !has_header(&headers, "user-agent") && !opts.user_agent.is_empty() {
            headers.push(("User-Agent".to_string(), opts.user_agent.clone()));
        }

        let (url, body) = match encoded {
            Some(body) if opts.method.allows_body() => {
                if is_form && !has_header(&headers, "content-type") {
                    headers.push(("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string()));
                }
                (url.to_string(), Some(body))
            }
            Some(body) => {
                let query = UrlParts {
                    query: Some(body),
                    ..Default::default()
                };
                let (url, _) = url::build_parts(UrlParts::parse(url), &query, UrlFlags::JOIN_QUERY);
                (url, None)
            }
            None => (url.to_string(), None),
        };

        Self {
            method: opts.method,
            url,
            headers,
            body,
        }
    }
}

fn has_header(headers: &[(String, String)], name: &str) -> bool {
    headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
}

/// A completed exchange.
///
/// `headers` holds one record per hop, most recent first, so `headers[0]`
/// belongs to the response whose body is in `body`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub status_code: u16,
    pub headers: Vec<HeaderRecord>,
    pub body: String,
}

impl Response {
    pub fn final_headers(&self) -> Option<&HeaderRecord> {
        self.headers.first()
    }

    /// Look up a field in the final response's headers.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.final_headers().and_then(|h| h.get(name))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}
