//! Blocking transport backed by `ureq`.
//!
//! ureq's own redirect handling is turned off so that every hop's status
//! line and headers can be recorded; the loop in `request` follows
//! `Location` headers itself up to `max_redirects`. The timeout is a single
//! deadline for the whole chain: each hop only gets the time that is left.

use std::io;
use std::time::{Duration, Instant};

use tracing::{debug, instrument};
use ureq::http::{self, Version};
use ureq::tls::TlsConfig;
use ureq::{Agent, Body};

use super::{follow, is_redirect, Transport};
use crate::error::HttpError;
use crate::header::HeaderBuffer;
use crate::http::{HttpRequest, Response};
use crate::options::RequestOptions;

#[derive(Debug, Clone, Copy, Default)]
pub struct UreqTransport;

impl UreqTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for UreqTransport {
    fn name(&self) -> &'static str {
        "ureq"
    }

    fn available(&self) -> bool {
        true
    }

    #[instrument(skip(self, opts), fields(method = opts.method.as_str()))]
    fn request(&self, url: &str, opts: &RequestOptions) -> Result<Response, HttpError> {
        let mut sink = opts.open_sink()?;
        let agent = build_agent(opts);
        let timeout = opts.timeout();
        let deadline = (!timeout.is_zero()).then(|| Instant::now() + timeout);
        let mut request = HttpRequest::prepare(url, opts);
        let mut headers = HeaderBuffer::new();
        let mut hops = 0;

        loop {
            let remaining = time_left(deadline, timeout, &request.url)?;
            let mut response = execute(&agent, &request, remaining)?;
            let status = response.status().as_u16();
            record_headers(&mut headers, &response);

            let location = response
                .headers()
                .get(http::header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            if let Some(location) = location {
                if is_redirect(status) && hops < opts.max_redirects {
                    hops += 1;
                    debug!(status, %location, hops, "following redirect");
                    request = follow(request, status, &location);
                    continue;
                }
            }

            let body = match sink.as_mut() {
                Some(file) => {
                    io::copy(&mut response.body_mut().as_reader(), file)
                        .map_err(|e| transport_error(&request.url, e))?;
                    String::new()
                }
                None => response
                    .body_mut()
                    .with_config()
                    .limit(u64::MAX)
                    .read_to_string()
                    .map_err(|e| transport_error(&request.url, e))?,
            };
            debug!(status, hops, "request finished");

            return Ok(Response {
                status_code: status,
                headers: headers.into_records(),
                body,
            });
        }
    }
}

/// Time left before `deadline`, or `None` when the request has no timeout.
fn time_left(
    deadline: Option<Instant>,
    timeout: Duration,
    url: &str,
) -> Result<Option<Duration>, HttpError> {
    let Some(deadline) = deadline else {
        return Ok(None);
    };
    let remaining = deadline.saturating_duration_since(Instant::now());
    if remaining.is_zero() {
        return Err(transport_error(
            url,
            format!("timed out after {}s", timeout.as_secs()),
        ));
    }
    Ok(Some(remaining))
}

fn build_agent(opts: &RequestOptions) -> Agent {
    let tls = TlsConfig::builder()
        .disable_verification(!opts.verify_tls)
        .build();
    Agent::config_builder()
        .http_status_as_error(false)
        .max_redirects(0)
        .max_redirects_will_error(false)
        .tls_config(tls)
        .build()
        .new_agent()
}

fn execute(
    agent: &Agent,
    req: &HttpRequest,
    timeout: Option<Duration>,
) -> Result<http::Response<Body>, HttpError> {
    let mut builder = http::Request::builder()
        .method(req.method.as_str())
        .uri(req.url.as_str());
    for (name, value) in &req.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    let result = match &req.body {
        Some(body) => {
            let request = builder
                .body(body.clone())
                .map_err(|e| transport_error(&req.url, e))?;
            let request = agent.configure_request(request).timeout_global(timeout).build();
            agent.run(request)
        }
        None => {
            let request = builder
                .body(())
                .map_err(|e| transport_error(&req.url, e))?;
            let request = agent.configure_request(request).timeout_global(timeout).build();
            agent.run(request)
        }
    };
    result.map_err(|e| transport_error(&req.url, e))
}

/// Write one hop's status line and fields into the per-request buffer.
fn record_headers(buffer: &mut HeaderBuffer, response: &http::Response<Body>) {
    let version = match response.version() {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_2 => "HTTP/2",
        Version::HTTP_3 => "HTTP/3",
        _ => "HTTP/1.1",
    };
    let status = response.status();
    buffer.push_status_line(
        version,
        status.as_u16(),
        status.canonical_reason().unwrap_or(""),
    );
    for (name, value) in response.headers() {
        buffer.push_field(name.as_str(), &String::from_utf8_lossy(value.as_bytes()));
    }
    buffer.end_block();
}

fn transport_error(url: &str, err: impl std::fmt::Display) -> HttpError {
    HttpError::TransportIo {
        url: url.to_string(),
        message: err.to_string(),
    }
}
