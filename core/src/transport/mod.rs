//! Pluggable transports.
//!
//! # Design
//! A `Transport` is a backend that can execute a request. The client asks a
//! `TransportRegistry` for the first backend whose `available()` check
//! passes, in registration order. The process-wide registry is built once
//! on first use and is read-only afterwards, so concurrent readers need no
//! locking.
//!
//! Transports follow redirects themselves and record every hop's headers in
//! a per-request `HeaderBuffer`.

#[cfg(feature = "ureq")]
mod ureq_backend;

#[cfg(feature = "ureq")]
pub use ureq_backend::UreqTransport;

use std::fmt;
use std::sync::OnceLock;

use crate::error::HttpError;
use crate::http::{HttpRequest, Response};
use crate::options::{Method, RequestOptions};
use crate::url::{self, UrlFlags, UrlParts};

/// A backend able to perform an HTTP exchange.
pub trait Transport: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Whether this backend can be used in the current process.
    fn available(&self) -> bool;

    fn request(&self, url: &str, opts: &RequestOptions) -> Result<Response, HttpError>;
}

/// Ordered list of transports; earlier entries have priority.
#[derive(Default)]
pub struct TransportRegistry {
    transports: Vec<Box<dyn Transport>>,
}

impl TransportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every backend compiled into this build.
    pub fn with_defaults() -> Self {
        let transports: Vec<Box<dyn Transport>> = vec![
            #[cfg(feature = "ureq")]
            Box::new(UreqTransport::new()),
        ];
        Self { transports }
    }

    /// The process-wide registry, initialized with `with_defaults` on first use.
    pub fn global() -> &'static TransportRegistry {
        static GLOBAL: OnceLock<TransportRegistry> = OnceLock::new();
        GLOBAL.get_or_init(TransportRegistry::with_defaults)
    }

    pub fn register<T: Transport + 'static>(&mut self, transport: T) {
        self.transports.push(Box::new(transport));
    }

    pub fn with<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.register(transport);
        self
    }

    /// First transport that reports itself available.
    pub fn select(&self) -> Option<&dyn Transport> {
        self.transports
            .iter()
            .map(|t| t.as_ref())
            .find(|t| t.available())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.transports.iter().map(|t| t.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.transports.is_empty()
    }
}

impl fmt::Debug for TransportRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportRegistry")
            .field("transports", &self.names())
            .finish()
    }
}

pub(crate) fn is_redirect(status: u16) -> bool {
    matches!(status, 301 | 302 | 303 | 307 | 308)
}

/// Resolve a `Location` header against the URL that produced it.
pub(crate) fn resolve_location(current: &str, location: &str) -> String {
    let target = UrlParts::parse(location);
    let base = UrlParts::parse(current);

    if target.host.is_some() {
        let scheme_only = UrlParts {
            scheme: base.scheme,
            ..Default::default()
        };
        return url::merge(scheme_only, &target, UrlFlags::REPLACE).to_string();
    }

    let base = UrlParts {
        query: None,
        fragment: None,
        ..base
    };
    let relative = target.path.as_deref().is_some_and(|p| !p.starts_with('/'));
    let flags = if relative {
        UrlFlags::JOIN_PATH | UrlFlags::JOIN_QUERY
    } else {
        UrlFlags::REPLACE
    };
    url::merge(base, &target, flags).to_string()
}

/// The request to send for the next hop. 301/302/303 turn into a bodiless
/// GET (HEAD stays HEAD); 307/308 repeat the request unchanged.
pub(crate) fn follow(mut request: HttpRequest, status: u16, location: &str) -> HttpRequest {
    request.url = resolve_location(&request.url, location);
    if matches!(status, 301 | 302 | 303) && request.method != Method::Head {
        request.method = Method::Get;
        if request.body.take().is_some() {
            request
                .headers
                .retain(|(name, _)| !name.eq_ignore_ascii_case("content-type"));
        }
    }
    request
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        name: &'static str,
        available: bool,
    }

    impl Transport for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }

        fn available(&self) -> bool {
            self.available
        }

        fn request(&self, _url: &str, _opts: &RequestOptions) -> Result<Response, HttpError> {
            Ok(Response::default())
        }
    }

    #[test]
    fn select_skips_unavailable_transports() {
        let registry = TransportRegistry::new()
            .with(Fixed { name: "curl", available: false })
            .with(Fixed { name: "socket", available: true })
            .with(Fixed { name: "stream", available: true });
        assert_eq!(registry.select().map(|t| t.name()), Some("socket"));
        assert_eq!(registry.names(), vec!["curl", "socket", "stream"]);
    }

    #[test]
    fn select_on_empty_registry_is_none() {
        assert!(TransportRegistry::new().select().is_none());
        assert!(TransportRegistry::new().is_empty());
    }

    #[test]
    fn global_registry_is_initialized_once() {
        let a = TransportRegistry::global() as *const _;
        let b = TransportRegistry::global() as *const _;
        assert_eq!(a, b);
    }

    #[test]
    fn resolve_absolute_location() {
        assert_eq!(
            resolve_location("https://a.com/x?y=1", "http://b.org/z"),
            "http://b.org/z"
        );
        assert_eq!(
            resolve_location("https://a.com/x", "//cdn.a.com/lib"),
            "https://cdn.a.com/lib"
        );
    }

    #[test]
    fn resolve_root_relative_location_drops_old_query() {
        assert_eq!(
            resolve_location("http://a.com:8080/old?x=1#f", "/new"),
            "http://a.com:8080/new"
        );
        assert_eq!(
            resolve_location("http://a.com/old", "/new?page=2"),
            "http://a.com/new?page=2"
        );
    }

    #[test]
    fn resolve_path_relative_location() {
        assert_eq!(
            resolve_location("http://a.com/dir/file?x=1", "other?y=2"),
            "http://a.com/dir/other?y=2"
        );
    }

    #[test]
    fn follow_303_turns_post_into_get() {
        let request = HttpRequest {
            method: Method::Post,
            url: "http://a.com/form".to_string(),
            headers: vec![
                ("Content-Type".to_string(), "text/plain".to_string()),
                ("X-Keep".to_string(), "1".to_string()),
            ],
            body: Some("data".to_string()),
        };
        let next = follow(request, 303, "/done");
        assert_eq!(next.method, Method::Get);
        assert_eq!(next.url, "http://a.com/done");
        assert!(next.body.is_none());
        assert_eq!(next.headers, vec![("X-Keep".to_string(), "1".to_string())]);
    }

    #[test]
    fn follow_307_keeps_method_and_body() {
        let request = HttpRequest {
            method: Method::Put,
            url: "http://a.com/a".to_string(),
            headers: Vec::new(),
            body: Some("data".to_string()),
        };
        let next = follow(request, 307, "/b");
        assert_eq!(next.method, Method::Put);
        assert_eq!(next.body.as_deref(), Some("data"));
    }

    #[test]
    fn redirect_statuses() {
        assert!(is_redirect(301));
        assert!(is_redirect(308));
        assert!(!is_redirect(304));
        assert!(!is_redirect(200));
    }
}
