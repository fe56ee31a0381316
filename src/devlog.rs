// src/devlog.rs
//! Dev-only diagnostics: anonymized pipeline logging gated on environment.

use tracing::info;

/// Debug build, or SHUTTLE_ENV in {local, development, dev}.
pub(crate) fn is_dev_env() -> bool {
    if cfg!(debug_assertions) {
        return true;
    }
    matches!(
        std::env::var("SHUTTLE_ENV")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "local" | "development" | "dev"
    )
}

// Dev logging gate: RELATED_POSTS_DEV_LOG=1 AND dev env
pub(crate) fn dev_logging_enabled() -> bool {
    let on = std::env::var("RELATED_POSTS_DEV_LOG").ok().as_deref() == Some("1");
    on && is_dev_env()
}

/// Short, stable fingerprint of a location so raw URLs never hit the logs.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

pub(crate) fn truncate_vec<T: ToString>(v: &[T], max: usize) -> Vec<String> {
    v.iter().take(max).map(|x| x.to_string()).collect()
}

/// Minimal dev logger for one pipeline outcome.
pub(crate) fn dev_log_outcome(event: &str, location: &str, matched: &[String], shown: usize) {
    if !dev_logging_enabled() {
        return;
    }
    let id = anon_hash(location);
    let matched_short = truncate_vec(matched, 5);
    // Never log the raw location. Only hashed id + short lists.
    info!(
        target: "related_posts",
        %id, event, shown,
        matched = ?matched_short
    );
}
