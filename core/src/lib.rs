//! Small synchronous HTTP utility layer.
//!
//! # Overview
//! - `url` parses URLs into optional components and merges two URL
//!   descriptions under a REPLACE / JOIN / STRIP flag policy.
//! - `query` encodes and decodes query strings with typed values and a
//!   reproducible parameter order.
//! - `header` parses raw response header text, one record per redirect hop.
//! - `client` dispatches requests to the first available `Transport`.
//!
//! # Design
//! - The URL, query and header functions are pure and never fail on
//!   malformed input; they fall back to defaults instead.
//! - Only the transport performs I/O. Backends are registered in an ordered
//!   `TransportRegistry`; `UreqTransport` is compiled in with the `ureq`
//!   feature.
//! - `redirect` and `context` cover the server side: emitting a redirect
//!   for the request currently being served.

pub mod client;
pub mod context;
pub mod error;
pub mod header;
pub mod http;
pub mod options;
pub mod query;
pub mod redirect;
pub mod transport;
pub mod url;

pub use client::HttpClient;
pub use context::RequestContext;
pub use error::HttpError;
pub use header::{HeaderBuffer, HeaderRecord};
pub use http::{HttpRequest, Response};
pub use options::{Body, Method, RequestOptions};
pub use query::{QueryParam, QueryValue};
pub use redirect::{redirect_to, Redirect, ResponseSink};
pub use transport::{Transport, TransportRegistry};
pub use url::{UrlFlags, UrlParts};

#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
