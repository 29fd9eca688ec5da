//! Request orchestration.
//!
//! # Design
//! `HttpClient` holds nothing but a reference to a `TransportRegistry` and
//! carries no mutable state between calls. Each request picks the first
//! available transport and hands it the URL and options; the transport does
//! the I/O, follows redirects and returns a normalized `Response`.
//!
//! "No transport" and "transport failed" are separate errors:
//! `NoTransportAvailable` is returned before any I/O is attempted.

use tracing::{debug, instrument, warn};

use crate::error::HttpError;
use crate::http::Response;
use crate::options::{Body, Method, RequestOptions};
use crate::transport::TransportRegistry;

/// Synchronous HTTP client dispatching to pluggable transports.
#[derive(Debug, Clone, Copy)]
pub struct HttpClient<'r> {
    registry: &'r TransportRegistry,
}

impl Default for HttpClient<'static> {
    /// A client backed by the process-wide registry.
    fn default() -> Self {
        Self::new(TransportRegistry::global())
    }
}

impl<'r> HttpClient<'r> {
    pub fn new(registry: &'r TransportRegistry) -> Self {
        Self { registry }
    }

    /// Perform a request. Blocks for at most the configured timeout per hop.
    #[instrument(skip(self, opts), fields(method = opts.method.as_str()))]
    pub fn request(&self, url: &str, opts: RequestOptions) -> Result<Response, HttpError> {
        let Some(transport) = self.registry.select() else {
            warn!(registered = ?self.registry.names(), "no transport available");
            return Err(HttpError::NoTransportAvailable);
        };
        debug!(transport = transport.name(), "dispatching request");
        transport.request(url, &opts)
    }

    /// Perform a request configured by a partial JSON document.
    pub fn request_with_json(&self, url: &str, options_json: &str) -> Result<Response, HttpError> {
        self.request(url, RequestOptions::from_json(options_json)?)
    }

    pub fn get(&self, url: &str) -> Result<Response, HttpError> {
        self.request(url, RequestOptions::default())
    }

    pub fn head(&self, url: &str) -> Result<Response, HttpError> {
        self.request(url, RequestOptions::default().with_method(Method::Head))
    }

    pub fn post(&self, url: &str, body: impl Into<Body>) -> Result<Response, HttpError> {
        self.request(
            url,
            RequestOptions::default()
                .with_method(Method::Post)
                .with_body(body),
        )
    }
}
