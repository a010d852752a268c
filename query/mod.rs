/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Canonical query-string codec.
//!
//! Encoding is normalizing: keys are sorted, list values are sorted, and
//! every key and value is percent-escaped, so one logical request always
//! produces one string. The router and the data cache both key off that
//! stability.

use std::collections::BTreeMap;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Characters left bare by `encodeURIComponent`, which the server's query
/// parser grew up with.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// One query parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Text(String),
    Number(f64),
    /// Serialized as the sorted elements joined with `,`, each element
    /// escaped individually.
    List(Vec<String>),
}

impl QueryValue {
    fn serialize(&self) -> String {
        match self {
            QueryValue::Text(text) => escape(text),
            QueryValue::Number(number) => escape(&format_number(*number)),
            QueryValue::List(items) => {
                let mut sorted: Vec<&String> = items.iter().collect();
                sorted.sort();
                sorted
                    .into_iter()
                    .map(|item| escape(item))
                    .collect::<Vec<_>>()
                    .join(",")
            },
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Text(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Text(value)
    }
}

impl From<f64> for QueryValue {
    fn from(value: f64) -> Self {
        QueryValue::Number(value)
    }
}

impl From<u64> for QueryValue {
    fn from(value: u64) -> Self {
        QueryValue::Number(value as f64)
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(value: Vec<String>) -> Self {
        QueryValue::List(value)
    }
}

impl From<&[&str]> for QueryValue {
    fn from(value: &[&str]) -> Self {
        QueryValue::List(value.iter().map(|item| item.to_string()).collect())
    }
}

pub type QueryMap = BTreeMap<String, QueryValue>;

/// Render a mapping as `k1=v1&k2=v2&…` with lexicographically sorted keys.
/// An empty mapping encodes to the empty string.
pub fn encode(map: &QueryMap) -> String {
    map.iter()
        .map(|(key, value)| format!("{}={}", escape(key), value.serialize()))
        .collect::<Vec<_>>()
        .join("&")
}

/// Inverse of [`encode`] down to flat strings: splits on `&` then the first
/// `=`; a key without a value decodes to the empty string. Tolerates one
/// leading `?` left over from fragment splitting. The empty string decodes
/// to an empty mapping, not a mapping with one empty key.
pub fn decode(query: &str) -> BTreeMap<String, String> {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut map = BTreeMap::new();
    if query.is_empty() {
        return map;
    }
    for item in query.split('&') {
        let (key, value) = item.split_once('=').unwrap_or((item, ""));
        map.insert(unescape(key), unescape(value));
    }
    map
}

pub(crate) fn escape(text: &str) -> String {
    utf8_percent_encode(text, COMPONENT).to_string()
}

fn unescape(text: &str) -> String {
    percent_decode_str(text).decode_utf8_lossy().into_owned()
}

/// Integral floats print without a trailing `.0` so numeric parameters
/// match their string form.
fn format_number(number: f64) -> String {
    if number.fract() == 0.0 && number.is_finite() {
        format!("{}", number as i64)
    } else {
        format!("{number}")
    }
}
