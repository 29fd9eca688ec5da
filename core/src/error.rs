//! Error types for the HTTP utility core.
//!
//! # Design
//! The pure transforms (URL building, query and header parsing) never fail:
//! they fall back to defaults on malformed input. Everything that touches the
//! outside world returns `HttpError`, and each failure mode gets its own
//! variant so "no transport" is never confused with "transport failed".

/// Errors returned by the client, the transports and the strict parsers.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// A header block's status line did not match `<proto>/<version> <code> <text>`.
    /// Only `header::parse_strict` reports this; `header::parse` defaults instead.
    #[error("malformed header block at index {index}")]
    MalformedHeaderBlock { index: usize },

    /// No registered transport reported itself usable. No I/O was attempted.
    #[error("no transport available")]
    NoTransportAvailable,

    /// The transport could not complete the exchange (connect, timeout, TLS).
    #[error("transport failure for {url}: {message}")]
    TransportIo { url: String, message: String },

    /// The `save_to_file` destination could not be opened for writing.
    #[error("cannot write response body to {path}: {reason}")]
    FileSinkUnavailable { path: String, reason: String },

    /// Request options could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Request options could not be deserialized.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}
