//! Emitting redirect responses.
//!
//! The target is normalized against the current request URL, so a relative
//! `Location` such as `/login` becomes absolute. Unless the inbound request
//! was HEAD, a short HTML body links to the target for clients that do not
//! follow the redirect on their own.

use crate::context::RequestContext;
use crate::url::{self, UrlFlags, UrlParts};

pub const DEFAULT_REDIRECT_STATUS: u16 = 302;

/// Where a response is written. Implemented by whatever server framework
/// hosts the code.
pub trait ResponseSink {
    fn status(&mut self, code: u16);
    fn header(&mut self, name: &str, value: &str);
    /// End the response, optionally with a body. Nothing may be written after.
    fn finish(&mut self, body: Option<&str>);
}

/// A redirect ready to be written to a `ResponseSink`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub status: u16,
    pub location: String,
    pub body: Option<String>,
}

impl Redirect {
    pub fn new(target: &str, status: u16, ctx: &RequestContext) -> Self {
        let (location, _) =
            url::build_with_context(ctx, &UrlParts::parse(target), UrlFlags::REPLACE);
        let body = (!ctx.is_head()).then(|| {
            let escaped = escape_html(&location);
            format!("Redirecting to <a href=\"{escaped}\">{escaped}</a>")
        });
        Self {
            status,
            location,
            body,
        }
    }

    pub fn emit<S: ResponseSink + ?Sized>(&self, sink: &mut S) {
        sink.status(self.status);
        sink.header("Location", &self.location);
        sink.finish(self.body.as_deref());
    }
}

/// Build and emit a redirect in one go.
pub fn redirect_to<S: ResponseSink + ?Sized>(
    target: &str,
    status: u16,
    ctx: &RequestContext,
    sink: &mut S,
) -> Redirect {
    let redirect = Redirect::new(target, status, ctx);
    redirect.emit(sink);
    redirect
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}
