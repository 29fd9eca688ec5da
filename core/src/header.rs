//! Raw HTTP response header parsing.
//!
//! # Design
//! A transport that follows redirects sees one status line + header block
//! per hop. `parse` splits the raw text on blank lines, parses each block
//! into a `HeaderRecord` and reverses the result so index 0 is always the
//! final response.
//!
//! Parsing is lenient: a block with an unreadable status line keeps zeroed
//! protocol fields and its header lines are still collected. Callers that
//! want to reject such input use `parse_strict`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::HttpError;

/// One parsed response header block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderRecord {
    pub protocol: String,
    pub protocol_version: String,
    pub status_code: u16,
    pub status_text: String,
    /// Field names are lower-cased with `-` replaced by `_`.
    pub fields: BTreeMap<String, String>,
}

impl HeaderRecord {
    /// Look up a field, normalizing `name` the same way the parser does.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(&normalize_name(name)).map(String::as_str)
    }
}

/// Normalize a header field name: `Content-Type` becomes `content_type`.
pub fn normalize_name(name: &str) -> String {
    name.trim().replace('-', "_").to_ascii_lowercase()
}

/// Parse a raw header buffer, most recent response first.
pub fn parse(raw: &str) -> Vec<HeaderRecord> {
    let mut records: Vec<HeaderRecord> = split_blocks(raw)
        .iter()
        .enumerate()
        .map(|(index, lines)| {
            let (record, well_formed) = parse_block(lines);
            if !well_formed {
                warn!(index, "malformed status line in header block");
            }
            record
        })
        .collect();
    records.reverse();
    records
}

/// Like `parse`, but fails on the first block whose status line is malformed.
///
/// The reported index counts blocks in the order they were received.
pub fn parse_strict(raw: &str) -> Result<Vec<HeaderRecord>, HttpError> {
    let mut records = Vec::new();
    for (index, lines) in split_blocks(raw).iter().enumerate() {
        let (record, well_formed) = parse_block(lines);
        if !well_formed {
            return Err(HttpError::MalformedHeaderBlock { index });
        }
        records.push(record);
    }
    records.reverse();
    Ok(records)
}

/// Normalize line endings and group lines into blocks separated by one or
/// more blank lines.
fn split_blocks(raw: &str) -> Vec<Vec<String>> {
    let normalized = raw.replace("\r\n", "\n").replace('\r', "\n");
    let mut blocks = Vec::new();
    let mut current: Vec<String> = Vec::new();
    for line in normalized.trim().split('\n') {
        if line.is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line.to_string());
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

/// Parse a single block. The flag is false when the status line was unusable.
fn parse_block(lines: &[String]) -> (HeaderRecord, bool) {
    let mut record = HeaderRecord::default();
    let Some((status_line, field_lines)) = lines.split_first() else {
        return (record, false);
    };

    let well_formed = match parse_status_line(status_line) {
        Some(status) => {
            record.protocol = status.protocol;
            record.protocol_version = status.version;
            record.status_code = status.code;
            record.status_text = status.text;
            true
        }
        None => false,
    };

    for line in field_lines {
        let Some((name, value)) = line.trim().split_once(':') else {
            continue;
        };
        let name = normalize_name(name);
        if name.is_empty() {
            continue;
        }
        record.fields.insert(name, value.trim().to_string());
    }

    (record, well_formed)
}

struct StatusLine {
    protocol: String,
    version: String,
    code: u16,
    text: String,
}

/// `<letters>/<version> <digits> <text...>`; the text may be missing (HTTP/2).
fn parse_status_line(line: &str) -> Option<StatusLine> {
    let (protocol, rest) = line.trim().split_once('/')?;
    if protocol.is_empty() || !protocol.bytes().all(|b| b.is_ascii_alphabetic()) {
        return None;
    }
    let (version, rest) = rest.split_once(char::is_whitespace)?;
    let rest = rest.trim_start();
    let (code, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    if code.is_empty() || !code.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(StatusLine {
        protocol: protocol.to_string(),
        version: version.to_string(),
        code: code.parse().ok()?,
        text: text.trim().to_string(),
    })
}

/// Per-request accumulator for raw header text.
///
/// Transports push header data as it arrives (one block per redirect hop)
/// and parse it once the exchange finishes. Each request owns its buffer,
/// so concurrent requests never see each other's headers.
#[derive(Debug, Clone, Default)]
pub struct HeaderBuffer {
    raw: String,
}

impl HeaderBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new block with a status line such as `HTTP/1.1 301 Moved Permanently`.
    pub fn push_status_line(&mut self, version: &str, status_code: u16, status_text: &str) {
        if !self.raw.is_empty() && !self.raw.ends_with("\r\n\r\n") {
            self.end_block();
        }
        self.raw
            .push_str(&format!("{version} {status_code} {status_text}\r\n"));
    }

    pub fn push_field(&mut self, name: &str, value: &str) {
        self.raw.push_str(&format!("{name}: {value}\r\n"));
    }

    /// Terminate the current block with the blank line that separates hops.
    pub fn end_block(&mut self) {
        self.raw.push_str("\r\n");
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn into_records(self) -> Vec<HeaderRecord> {
        parse(&self.raw)
    }
}
