// src/assembler.rs
//! Post assembler: pinned posts + ranked topic posts, activation filter,
//! first-seen-wins dedup by title.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::collections::HashSet;

use crate::catalog::{Post, Topic};

/// Assembled posts plus bookkeeping for the render gate and telemetry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Assembly {
    pub posts: Vec<Post>,
    /// Pinned posts present in `posts`: active and distinct by title.
    /// They always form the head of `posts`.
    pub pinned_survivors: usize,
    /// Dropped as inactive or not yet started.
    pub filtered_out: usize,
    /// Dropped as duplicate titles.
    pub dedup_out: usize,
}

/// Parse an editor-supplied start date. Accepts RFC 3339, a naive
/// `YYYY-MM-DDTHH:MM[:SS]` (read as UTC) or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_start_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(n) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(n.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|n| n.and_utc())
}

/// Effective visibility at `now`. Unparseable start dates impose no constraint.
pub fn is_post_active(post: &Post, now: DateTime<Utc>) -> bool {
    if !post.active {
        return false;
    }
    match post.start_date.as_deref().and_then(parse_start_date) {
        Some(start) => start <= now,
        None => true,
    }
}

/// Keep the first post for each title, in input order. Returns (kept, removed).
pub fn dedup_by_title(posts: Vec<Post>) -> (Vec<Post>, usize) {
    let mut seen: HashSet<String> = HashSet::new();
    let mut keep = Vec::with_capacity(posts.len());
    let mut removed = 0usize;
    for p in posts {
        if !seen.insert(p.title.clone()) {
            removed += 1;
            continue;
        }
        keep.push(p);
    }
    (keep, removed)
}

/// Build the candidate list for one run.
pub fn assemble_posts(
    ranked: &[usize],
    topics: &[Topic],
    pinned: &[Post],
    now: DateTime<Utc>,
) -> Assembly {
    let topic_posts = ranked
        .iter()
        .filter_map(|&i| topics.get(i))
        .flat_map(|t| t.posts.iter());

    let mut filtered_out = 0usize;
    let mut pinned_titles: HashSet<&str> = HashSet::new();
    let mut candidates = Vec::new();

    for p in pinned {
        if is_post_active(p, now) {
            pinned_titles.insert(p.title.as_str());
            candidates.push(p.clone());
        } else {
            filtered_out += 1;
        }
    }
    for p in topic_posts {
        if is_post_active(p, now) {
            candidates.push(p.clone());
        } else {
            filtered_out += 1;
        }
    }

    let (posts, dedup_out) = dedup_by_title(candidates);
    Assembly {
        posts,
        pinned_survivors: pinned_titles.len(),
        filtered_out,
        dedup_out,
    }
}
