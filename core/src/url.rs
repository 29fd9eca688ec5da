//! URL parsing, merging and reconstruction.
//!
//! # Design
//! `UrlParts` is a record of optional components. `None` means "absent" and
//! `Some("")` means "present but empty" (a trailing `?` or `#`), which keeps
//! replace/join/strip decisions unambiguous.
//!
//! `merge` applies three phases in a fixed order, and later phases may undo
//! earlier ones:
//! 1. scheme and host from the overrides always win,
//! 2. either REPLACE (copy every present override component) or the JOIN_*
//!    rules,
//! 3. the STRIP_* flags. Scheme and host are never stripped.

use std::fmt;

use bitflags::bitflags;
use tracing::debug;

use crate::context::RequestContext;

bitflags! {
    /// Merge policy for `merge` / `build`. Values match the classic
    /// `HTTP_URL_*` constants so they can cross the C boundary as integers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct UrlFlags: u32 {
        const REPLACE = 1;
        const JOIN_PATH = 2;
        const JOIN_QUERY = 4;
        const STRIP_USER = 8;
        const STRIP_PASS = 16;
        const STRIP_AUTH = 32;
        const STRIP_PORT = 64;
        const STRIP_PATH = 128;
        const STRIP_QUERY = 256;
        const STRIP_FRAGMENT = 512;
        const STRIP_ALL = 1024;
    }
}

impl Default for UrlFlags {
    fn default() -> Self {
        UrlFlags::REPLACE
    }
}

impl UrlFlags {
    /// Expand STRIP_ALL and STRIP_AUTH into the per-component strip flags.
    pub fn expand(self) -> Self {
        let mut flags = self;
        if flags.contains(UrlFlags::STRIP_ALL) {
            flags |= UrlFlags::STRIP_USER
                | UrlFlags::STRIP_PASS
                | UrlFlags::STRIP_PORT
                | UrlFlags::STRIP_PATH
                | UrlFlags::STRIP_QUERY
                | UrlFlags::STRIP_FRAGMENT;
        }
        if flags.contains(UrlFlags::STRIP_AUTH) {
            flags |= UrlFlags::STRIP_USER | UrlFlags::STRIP_PASS;
        }
        flags
    }
}

/// A parsed or partially specified URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlParts {
    pub scheme: Option<String>,
    pub user: Option<String>,
    pub pass: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub path: Option<String>,
    pub query: Option<String>,
    pub fragment: Option<String>,
}

impl UrlParts {
    /// Split a URL into its components. Never fails: anything that cannot be
    /// recognized as scheme or authority ends up in the path, and a
    /// non-numeric port is dropped.
    pub fn parse(input: &str) -> UrlParts {
        let mut parts = UrlParts::default();
        let mut rest = input;

        if let Some((before, fragment)) = rest.split_once('#') {
            parts.fragment = Some(fragment.to_string());
            rest = before;
        }
        if let Some((before, query)) = rest.split_once('?') {
            parts.query = Some(query.to_string());
            rest = before;
        }

        match split_scheme(rest) {
            Some((scheme, after)) if after.starts_with("//") => {
                parts.scheme = Some(scheme.to_string());
                rest = after;
            }
            // `localhost:8080/x` is a host and port, not a scheme.
            Some((_, after)) if looks_like_port(after) => {
                let (authority, path) = split_authority(rest);
                parts.apply_authority(authority);
                parts.path = non_empty(path);
                return parts;
            }
            // `mailto:someone@example.com`
            Some((scheme, after)) => {
                parts.scheme = Some(scheme.to_string());
                parts.path = non_empty(after);
                return parts;
            }
            None => {}
        }

        match rest.strip_prefix("//") {
            Some(after) => {
                let (authority, path) = split_authority(after);
                parts.apply_authority(authority);
                parts.path = non_empty(path);
            }
            None => parts.path = non_empty(rest),
        }
        parts
    }

    fn apply_authority(&mut self, authority: &str) {
        let host_port = match authority.rfind('@') {
            Some(at) => {
                let userinfo = &authority[..at];
                match userinfo.split_once(':') {
                    Some((user, pass)) => {
                        self.user = Some(user.to_string());
                        self.pass = Some(pass.to_string());
                    }
                    None => self.user = Some(userinfo.to_string()),
                }
                &authority[at + 1..]
            }
            None => authority,
        };

        let (host, port) = if host_port.starts_with('[') {
            match host_port.find(']') {
                Some(end) => (&host_port[..=end], host_port[end + 1..].strip_prefix(':')),
                None => (host_port, None),
            }
        } else {
            match host_port.rsplit_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (host_port, None),
            }
        };

        self.host = non_empty(host);
        if let Some(port) = port.filter(|p| !p.is_empty()) {
            match port.parse::<u16>() {
                Ok(port) => self.port = Some(port),
                Err(_) => debug!(port, "dropping unparseable port"),
            }
        }
    }
}

impl From<&str> for UrlParts {
    fn from(url: &str) -> Self {
        UrlParts::parse(url)
    }
}

/// Reassemble the URL; every component is emitted only when present.
impl fmt::Display for UrlParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(scheme) = &self.scheme {
            write!(f, "{scheme}://")?;
        }
        if let Some(user) = &self.user {
            f.write_str(user)?;
            if let Some(pass) = &self.pass {
                write!(f, ":{pass}")?;
            }
            f.write_str("@")?;
        }
        if let Some(host) = &self.host {
            f.write_str(host)?;
        }
        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }
        if let Some(path) = &self.path {
            f.write_str(path)?;
        }
        if let Some(query) = &self.query {
            write!(f, "?{query}")?;
        }
        if let Some(fragment) = &self.fragment {
            write!(f, "#{fragment}")?;
        }
        Ok(())
    }
}

fn split_scheme(s: &str) -> Option<(&str, &str)> {
    let (scheme, after) = s.split_once(':')?;
    let mut bytes = scheme.bytes();
    let first = bytes.next()?;
    let valid = first.is_ascii_alphabetic()
        && bytes.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.'));
    valid.then_some((scheme, after))
}

fn looks_like_port(after: &str) -> bool {
    let digits = after.split('/').next().unwrap_or("");
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn split_authority(s: &str) -> (&str, &str) {
    match s.find('/') {
        Some(i) => s.split_at(i),
        None => (s, ""),
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

fn replace_if_present<T: Clone>(target: &mut Option<T>, source: &Option<T>) {
    if let Some(value) = source {
        *target = Some(value.clone());
    }
}

/// Drop the base path's trailing file name and append the relative path.
fn join_paths(base: &str, relative: &str) -> String {
    let dir = match base.rfind('/') {
        Some(i) => &base[..=i],
        None => "",
    };
    format!(
        "{}/{}",
        dir.trim_end_matches('/'),
        relative.trim_start_matches('/')
    )
}

/// Merge `overrides` into `base` under `flags`.
pub fn merge(base: UrlParts, overrides: &UrlParts, flags: UrlFlags) -> UrlParts {
    let flags = flags.expand();
    let mut url = base;

    replace_if_present(&mut url.scheme, &overrides.scheme);
    replace_if_present(&mut url.host, &overrides.host);

    if flags.contains(UrlFlags::REPLACE) {
        replace_if_present(&mut url.user, &overrides.user);
        replace_if_present(&mut url.pass, &overrides.pass);
        replace_if_present(&mut url.port, &overrides.port);
        replace_if_present(&mut url.path, &overrides.path);
        replace_if_present(&mut url.query, &overrides.query);
        replace_if_present(&mut url.fragment, &overrides.fragment);
    } else {
        if flags.contains(UrlFlags::JOIN_PATH) {
            if let Some(path) = &overrides.path {
                url.path = Some(match &url.path {
                    Some(base_path) => join_paths(base_path, path),
                    None => path.clone(),
                });
            }
        }
        if flags.contains(UrlFlags::JOIN_QUERY) {
            if let Some(query) = &overrides.query {
                url.query = Some(match &url.query {
                    Some(base_query) => format!("{base_query}&{query}"),
                    None => query.clone(),
                });
            }
        }
    }

    if flags.contains(UrlFlags::STRIP_USER) {
        url.user = None;
    }
    if flags.contains(UrlFlags::STRIP_PASS) {
        url.pass = None;
    }
    if flags.contains(UrlFlags::STRIP_PORT) {
        url.port = None;
    }
    if flags.contains(UrlFlags::STRIP_PATH) {
        url.path = None;
    }
    if flags.contains(UrlFlags::STRIP_QUERY) {
        url.query = None;
    }
    if flags.contains(UrlFlags::STRIP_FRAGMENT) {
        url.fragment = None;
    }
    url
}

/// Merge already-parsed components and render the result.
///
/// Returns the URL string together with the merged parts.
pub fn build_parts(base: UrlParts, overrides: &UrlParts, flags: UrlFlags) -> (String, UrlParts) {
    let parts = merge(base, overrides, flags);
    (parts.to_string(), parts)
}

/// Merge `overrides` into `base`. Without a base, the URL of the request
/// currently being served (read from the CGI environment) is used.
pub fn build(base: Option<&str>, overrides: &str, flags: UrlFlags) -> (String, UrlParts) {
    let base = match base {
        Some(url) => UrlParts::parse(url),
        None => UrlParts::parse(&RequestContext::from_env().current_url()),
    };
    build_parts(base, &UrlParts::parse(overrides), flags)
}

/// Merge `overrides` into the URL of the request described by `ctx`.
pub fn build_with_context(
    ctx: &RequestContext,
    overrides: &UrlParts,
    flags: UrlFlags,
) -> (String, UrlParts) {
    build_parts(UrlParts::parse(&ctx.current_url()), overrides, flags)
}
