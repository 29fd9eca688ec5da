//! Description of the inbound request being served.
//!
//! Only consulted when a URL is built without an explicit base and when a
//! redirect decides whether to send an HTML body.

use std::env;

/// Scheme/host/URI/method of the request currently being handled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub is_secure: bool,
    pub host: String,
    pub request_uri: String,
    pub request_method: String,
}

impl RequestContext {
    /// Read the CGI variables `HTTPS`, `HTTP_HOST`, `REQUEST_URI` and
    /// `REQUEST_METHOD`. Missing values become empty; the method defaults to GET.
    pub fn from_env() -> Self {
        let var = |name: &str| env::var(name).unwrap_or_default();
        let https = var("HTTPS");
        let method = var("REQUEST_METHOD");
        Self {
            is_secure: !https.is_empty() && !https.eq_ignore_ascii_case("off"),
            host: var("HTTP_HOST"),
            request_uri: var("REQUEST_URI"),
            request_method: if method.is_empty() {
                "GET".to_string()
            } else {
                method
            },
        }
    }

    /// Full URL of the current request.
    pub fn current_url(&self) -> String {
        let scheme = if self.is_secure { "https" } else { "http" };
        format!("{scheme}://{}{}", self.host, self.request_uri)
    }

    pub fn is_head(&self) -> bool {
        self.request_method.eq_ignore_ascii_case("HEAD")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_url_uses_https_when_secure() {
        let ctx = RequestContext {
            is_secure: true,
            host: "example.com:8443".to_string(),
            request_uri: "/a?b=1".to_string(),
            request_method: "GET".to_string(),
        };
        assert_eq!(ctx.current_url(), "https://example.com:8443/a?b=1");
    }

    #[test]
    fn current_url_plain_http() {
        let ctx = RequestContext {
            host: "example.com".to_string(),
            request_uri: "/".to_string(),
            ..Default::default()
        };
        assert_eq!(ctx.current_url(), "http://example.com/");
    }

    #[test]
    fn is_head_ignores_case() {
        let ctx = RequestContext {
            request_method: "head".to_string(),
            ..Default::default()
        };
        assert!(ctx.is_head());
        assert!(!RequestContext::default().is_head());
    }
}
