// src/matcher.rs
//! URL matcher: substring scan of the page location against the keyword index.
//!
//! Only path + query take part in matching. Scheme, host, port and fragment are
//! dropped so the storefront's own domain never produces a hit.

use percent_encoding::percent_decode_str;
use std::collections::HashSet;
use url::{ParseError, Url};

use crate::indexer::KeywordIndexEntry;

// Base used to resolve site-relative locations such as "/products/x?y=1".
const RELATIVE_BASE: &str = "http://localhost/";

fn parse_location(raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let url = match Url::parse(raw) {
        Ok(u) => u,
        Err(ParseError::RelativeUrlWithoutBase) => Url::parse(RELATIVE_BASE).ok()?.join(raw).ok()?,
        Err(_) => return None,
    };
    if url.cannot_be_a_base() {
        return None;
    }
    Some(url)
}

/// Lower-cased, percent-decoded `path[?query]`, or `None` when the location
/// has no usable path. Invalid UTF-8 sequences decode lossily.
pub fn normalize_location(raw: &str) -> Option<String> {
    let url = parse_location(raw)?;
    let mut out = percent_decode_str(url.path()).decode_utf8_lossy().into_owned();
    if let Some(q) = url.query() {
        out.push('?');
        out.push_str(&percent_decode_str(q).decode_utf8_lossy());
    }
    Some(out.to_lowercase())
}

/// True when the location carries the opt-out query flag.
/// Any value except `0` / `false` (case-insensitive) counts as set.
pub fn opt_out_requested(raw: &str, param: &str) -> bool {
    let Some(url) = parse_location(raw) else {
        return false;
    };
    url.query_pairs().any(|(k, v)| {
        k.eq_ignore_ascii_case(param)
            && !(v.eq_ignore_ascii_case("false") || v == "0")
    })
}

/// Unique matching topic indices, in discovery order.
pub fn match_topics(index: &[KeywordIndexEntry], normalized_location: &str) -> Vec<usize> {
    let haystack = normalized_location.to_lowercase();
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for entry in index {
        if seen.contains(&entry.topic) {
            continue;
        }
        if haystack.contains(entry.keyword.as_str()) {
            seen.insert(entry.topic);
            out.push(entry.topic);
        }
    }
    out
}

/// Normalize + match in one step. Unparseable locations match nothing.
pub fn match_location(index: &[KeywordIndexEntry], raw_location: &str) -> Vec<usize> {
    match normalize_location(raw_location) {
        Some(loc) => match_topics(index, &loc),
        None => Vec::new(),
    }
}
