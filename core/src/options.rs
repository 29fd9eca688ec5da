//! Request configuration.
//!
//! # Design
//! Every field has a default, and `#[serde(default)]` lets a partial JSON
//! document be merged over those defaults. In code, the same merge is struct
//! update syntax or the `with_*` setters:
//!
//! ```
//! use httpkit_core::{Method, RequestOptions};
//!
//! let opts = RequestOptions::default()
//!     .with_method(Method::Post)
//!     .with_header("Accept", "application/json");
//! assert_eq!(opts.max_redirects, 5);
//! ```

use std::collections::BTreeMap;
use std::env;
use std::fs::File;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::HttpError;
use crate::query::{self, QueryParam};

/// Environment variable overriding the default `User-Agent`.
pub const USER_AGENT_ENV: &str = "HTTPKIT_USER_AGENT";

const FALLBACK_USER_AGENT: &str = concat!("httpkit/", env!("CARGO_PKG_VERSION"));

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
        }
    }

    /// Whether a body is sent as the request payload. For other methods it
    /// is appended to the URL as a query string.
    pub fn allows_body(&self) -> bool {
        matches!(self, Method::Post | Method::Put | Method::Patch)
    }
}

impl FromStr for Method {
    type Err = HttpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "HEAD" => Ok(Method::Head),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            "OPTIONS" => Ok(Method::Options),
            other => Err(HttpError::Deserialization(format!("unknown method: {other}"))),
        }
    }
}

/// Request body: raw text, or form fields encoded with `build_query`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Body {
    Text(String),
    Form(BTreeMap<String, QueryParam>),
}

impl Body {
    pub fn encode(&self) -> String {
        match self {
            Body::Text(text) => text.clone(),
            Body::Form(fields) => query::build_query(fields),
        }
    }

    pub fn is_form(&self) -> bool {
        matches!(self, Body::Form(_))
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_string())
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<BTreeMap<String, QueryParam>> for Body {
    fn from(fields: BTreeMap<String, QueryParam>) -> Self {
        Body::Form(fields)
    }
}

/// Options for a single request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Body>,
    /// Seconds; rounded up to whole seconds by `timeout()`.
    pub timeout_secs: f64,
    /// Zero disables redirect following.
    pub max_redirects: u32,
    pub user_agent: String,
    pub verify_tls: bool,
    /// Stream the response body into this file instead of returning it.
    pub save_to_file: Option<PathBuf>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::Get,
            headers: BTreeMap::new(),
            body: None,
            timeout_secs: 3.0,
            max_redirects: 5,
            user_agent: default_user_agent(),
            verify_tls: true,
            save_to_file: None,
        }
    }
}

fn default_user_agent() -> String {
    env::var(USER_AGENT_ENV)
        .ok()
        .filter(|ua| !ua.is_empty())
        .unwrap_or_else(|| FALLBACK_USER_AGENT.to_string())
}

impl RequestOptions {
    /// Load options from JSON; absent keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, HttpError> {
        serde_json::from_str(json).map_err(|e| HttpError::Deserialization(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, HttpError> {
        serde_json::to_string(self).map_err(|e| HttpError::Serialization(e.to_string()))
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_timeout_secs(mut self, secs: f64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_max_redirects(mut self, max: u32) -> Self {
        self.max_redirects = max;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    pub fn with_save_to_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.save_to_file = Some(path.into());
        self
    }

    /// Timeout rounded up to whole seconds; negative values become zero.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(0.0).ceil() as u64)
    }

    /// Open the `save_to_file` destination, if any.
    ///
    /// Fails when the parent directory is missing or the file cannot be
    /// created, rather than silently dropping the body.
    pub fn open_sink(&self) -> Result<Option<File>, HttpError> {
        let Some(path) = &self.save_to_file else {
            return Ok(None);
        };
        let unavailable = |reason: String| HttpError::FileSinkUnavailable {
            path: path.display().to_string(),
            reason,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.is_dir() {
                return Err(unavailable("parent directory does not exist".to_string()));
            }
        }
        File::create(path)
            .map(Some)
            .map_err(|e| unavailable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let opts = RequestOptions::default();
        assert_eq!(opts.method, Method::Get);
        assert!(opts.headers.is_empty());
        assert!(opts.body.is_none());
        assert_eq!(opts.timeout_secs, 3.0);
        assert_eq!(opts.max_redirects, 5);
        assert!(!opts.user_agent.is_empty());
        assert!(opts.verify_tls);
        assert!(opts.save_to_file.is_none());
    }

    #[test]
    fn partial_json_merges_over_defaults() {
        let opts = RequestOptions::from_json(r#"{"method":"POST","timeout_secs":1.5}"#).unwrap();
        assert_eq!(opts.method, Method::Post);
        assert_eq!(opts.timeout_secs, 1.5);
        assert_eq!(opts.max_redirects, 5);
        assert!(opts.verify_tls);
    }

    #[test]
    fn json_body_can_be_text_or_form() {
        let opts = RequestOptions::from_json(r#"{"body":"raw"}"#).unwrap();
        assert_eq!(opts.body, Some(Body::Text("raw".to_string())));

        let opts = RequestOptions::from_json(r#"{"body":{"b":2,"a":[3,1]}}"#).unwrap();
        assert_eq!(opts.body.unwrap().encode(), "a=1&a=3&b=2");
    }

    #[test]
    fn invalid_json_is_deserialization_error() {
        let err = RequestOptions::from_json(r#"{"method":"BREW"}"#).unwrap_err();
        assert!(matches!(err, HttpError::Deserialization(_)));
    }

    #[test]
    fn json_round_trip() {
        let opts = RequestOptions::default()
            .with_method(Method::Delete)
            .with_header("X-Token", "t");
        let back = RequestOptions::from_json(&opts.to_json().unwrap()).unwrap();
        assert_eq!(back, opts);
    }

    #[test]
    fn timeout_rounds_up() {
        let opts = RequestOptions::default().with_timeout_secs(1.2);
        assert_eq!(opts.timeout(), Duration::from_secs(2));
        let opts = RequestOptions::default().with_timeout_secs(-4.0);
        assert_eq!(opts.timeout(), Duration::ZERO);
    }

    #[test]
    fn method_from_str_is_case_insensitive() {
        assert_eq!("patch".parse::<Method>().unwrap(), Method::Patch);
        assert!("brew".parse::<Method>().is_err());
        assert!(Method::Put.allows_body());
        assert!(!Method::Delete.allows_body());
    }

    #[test]
    fn open_sink_without_file_is_none() {
        assert!(RequestOptions::default().open_sink().unwrap().is_none());
    }

    #[test]
    fn open_sink_missing_parent_fails() {
        let opts = RequestOptions::default()
            .with_save_to_file(std::env::temp_dir().join("httpkit-missing-dir/out.bin"));
        let err = opts.open_sink().unwrap_err();
        assert!(matches!(err, HttpError::FileSinkUnavailable { .. }));
    }

    #[test]
    fn open_sink_creates_file() {
        let path = std::env::temp_dir().join(format!("httpkit-sink-{}.bin", std::process::id()));
        let opts = RequestOptions::default().with_save_to_file(&path);
        assert!(opts.open_sink().unwrap().is_some());
        assert!(path.exists());
        std::fs::remove_file(path).unwrap();
    }
}
