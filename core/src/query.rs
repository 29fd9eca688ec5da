//! Query-string encoding and decoding.
//!
//! # Design
//! Values decoded from a query string are coerced into a small typed scalar
//! (`QueryValue`). The coercion rule is kept as-is for compatibility even
//! though it is lossy for numeric-looking identifiers: `"0042"` stays a
//! string, but `"4200000000"` silently becomes an integer.
//!
//! `build_query` output is deterministic: keys are sorted by byte value and
//! repeated values for a key are sorted naturally. Signed or cached URLs rely
//! on that ordering.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A typed scalar decoded from (or destined for) a query string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    Int(i64),
    Bool(bool),
    Str(String),
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryValue::Int(n) => write!(f, "{n}"),
            QueryValue::Bool(b) => write!(f, "{b}"),
            QueryValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for QueryValue {
    fn from(n: i64) -> Self {
        QueryValue::Int(n)
    }
}

impl From<bool> for QueryValue {
    fn from(b: bool) -> Self {
        QueryValue::Bool(b)
    }
}

impl From<&str> for QueryValue {
    fn from(s: &str) -> Self {
        QueryValue::Str(s.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(s: String) -> Self {
        QueryValue::Str(s)
    }
}

/// The value side of a query parameter: one scalar, or a list that expands
/// to one `key=value` pair per element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryParam {
    Single(QueryValue),
    List(Vec<QueryValue>),
}

impl From<QueryValue> for QueryParam {
    fn from(v: QueryValue) -> Self {
        QueryParam::Single(v)
    }
}

impl From<i64> for QueryParam {
    fn from(n: i64) -> Self {
        QueryParam::Single(n.into())
    }
}

impl From<bool> for QueryParam {
    fn from(b: bool) -> Self {
        QueryParam::Single(b.into())
    }
}

impl From<&str> for QueryParam {
    fn from(s: &str) -> Self {
        QueryParam::Single(s.into())
    }
}

impl From<String> for QueryParam {
    fn from(s: String) -> Self {
        QueryParam::Single(s.into())
    }
}

impl From<Vec<QueryValue>> for QueryParam {
    fn from(values: Vec<QueryValue>) -> Self {
        QueryParam::List(values)
    }
}

/// Result of encoding a `QueryParam`: a sequence in gives a sequence out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodedParam {
    One(String),
    Many(Vec<String>),
}

/// Percent-encode a single value per RFC 3986.
///
/// The unreserved set (`A-Z a-z 0-9 - _ . ~`) is left literal, so `~` never
/// appears as `%7E` and a space becomes `%20`, never `+`.
pub fn encode_value(input: &str) -> String {
    urlencoding::encode(input).into_owned()
}

/// Encode a parameter value, mapping over list elements.
pub fn encode_param(param: &QueryParam) -> EncodedParam {
    match param {
        QueryParam::Single(v) => EncodedParam::One(encode_value(&v.to_string())),
        QueryParam::List(values) => EncodedParam::Many(
            values
                .iter()
                .map(|v| encode_value(&v.to_string()))
                .collect(),
        ),
    }
}

/// Decode one raw right-hand side of a `key=value` pair.
///
/// `^[1-9][0-9]*$` becomes an integer (a string again if it overflows),
/// `true`/`false` in any case becomes a boolean, anything else is
/// URL-decoded with `+` read as a space.
pub fn decode_value(raw: &str) -> QueryValue {
    if is_integer_literal(raw) {
        if let Ok(n) = raw.parse::<i64>() {
            return QueryValue::Int(n);
        }
    }
    if raw.eq_ignore_ascii_case("true") {
        return QueryValue::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return QueryValue::Bool(false);
    }
    QueryValue::Str(url_decode(raw))
}

fn is_integer_literal(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    matches!(bytes.first(), Some(b'1'..=b'9')) && bytes.iter().all(u8::is_ascii_digit)
}

fn url_decode(raw: &str) -> String {
    let plus_decoded = raw.replace('+', " ");
    match urlencoding::decode(&plus_decoded) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => {
            let bytes = urlencoding::decode_binary(plus_decoded.as_bytes());
            String::from_utf8_lossy(&bytes).into_owned()
        }
    }
}

/// Parse a `a=1&b=two&flag` parameter string into a map.
///
/// A pair without `=` (or starting with `=`) maps the whole pair to `None`.
/// Empty segments are skipped and the last duplicate key wins.
pub fn decode_parameters(input: &str) -> BTreeMap<String, Option<QueryValue>> {
    let mut params = BTreeMap::new();
    for pair in input.split('&').filter(|p| !p.is_empty()) {
        match pair.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                params.insert(key.to_string(), Some(decode_value(value)));
            }
            _ => {
                params.insert(pair.to_string(), None);
            }
        }
    }
    params
}

/// Build a URL-encoded query string with a reproducible ordering.
///
/// Keys and values are encoded independently. Pairs are ordered by the
/// byte value of the encoded key; list values are sorted naturally and
/// emitted as repeated `key=value` pairs.
pub fn build_query<I, K, P>(params: I) -> String
where
    I: IntoIterator<Item = (K, P)>,
    K: AsRef<str>,
    P: Borrow<QueryParam>,
{
    let mut encoded: Vec<(String, EncodedParam)> = params
        .into_iter()
        .map(|(k, p)| (encode_value(k.as_ref()), encode_param(p.borrow())))
        .collect();
    encoded.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

    let mut pairs = Vec::with_capacity(encoded.len());
    for (key, value) in encoded {
        match value {
            EncodedParam::One(v) => pairs.push(format!("{key}={v}")),
            EncodedParam::Many(mut values) => {
                values.sort_by(|a, b| natural_cmp(a, b));
                pairs.extend(values.into_iter().map(|v| format!("{key}={v}")));
            }
        }
    }
    pairs.join("&")
}

/// Compare strings the way a human would: digit runs compare by numeric
/// value, everything else byte by byte.
pub(crate) fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i].is_ascii_digit() && b[j].is_ascii_digit() {
            let a_end = i + a[i..].iter().take_while(|c| c.is_ascii_digit()).count();
            let b_end = j + b[j..].iter().take_while(|c| c.is_ascii_digit()).count();
            let a_num = trim_leading_zeros(&a[i..a_end]);
            let b_num = trim_leading_zeros(&b[j..b_end]);
            let ord = a_num.len().cmp(&b_num.len()).then_with(|| a_num.cmp(b_num));
            if ord != Ordering::Equal {
                return ord;
            }
            i = a_end;
            j = b_end;
        } else {
            match a[i].cmp(&b[j]) {
                Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
                ord => return ord,
            }
        }
    }
    (a.len() - i).cmp(&(b.len() - j))
}

fn trim_leading_zeros(digits: &[u8]) -> &[u8] {
    let zeros = digits.iter().take_while(|&&c| c == b'0').count();
    &digits[zeros..]
}
