//! # Catalog
//!
//! Author-provided configuration for the related posts panel:
//! topics (keywords + priority tier + posts) and a list of pinned posts.
//!
//! - Loaded from JSON produced by the editorial tool (camelCase field names).
//! - Immutable within a pipeline run; topics are always referenced by index.
//! - `CatalogHandle` wraps the catalog for shared use and optional hot reload.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::{Duration, SystemTime};
use tracing::{info, warn};

/// Fixed editorial priority tiers. Lower discriminant = shown first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PriorityTier {
    Product = 0,
    Brand = 1,
    ProductCategory = 2,
    Discipline = 3,
    Sport = 4,
    StoreLocator = 5,
}

impl TryFrom<u8> for PriorityTier {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Self::Product),
            1 => Ok(Self::Brand),
            2 => Ok(Self::ProductCategory),
            3 => Ok(Self::Discipline),
            4 => Ok(Self::Sport),
            5 => Ok(Self::StoreLocator),
            other => Err(format!("priority tier out of range: {other} (expected 0..=5)")),
        }
    }
}

impl From<PriorityTier> for u8 {
    fn from(t: PriorityTier) -> Self {
        t as u8
    }
}

fn default_active() -> bool {
    true
}

/// A promotional post. `title` doubles as the dedup key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    pub title: String,
    #[serde(default)]
    pub image: String,
    pub url: String,
}

impl Post {
    /// Active post with no start date; handy for fixtures.
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            start_date: None,
            active: true,
            title: title.into(),
            image: String::new(),
            url: url.into(),
        }
    }

    pub fn with_start_date(mut self, date: impl Into<String>) -> Self {
        self.start_date = Some(date.into());
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    /// Editor-facing name; not used for matching.
    #[serde(default)]
    pub label: String,
    pub priority_tier: PriorityTier,
    #[serde(default)]
    pub keywords: Vec<Keyword>,
    #[serde(default)]
    pub posts: Vec<Post>,
}

impl Topic {
    pub fn new(label: impl Into<String>, tier: PriorityTier) -> Self {
        Self {
            label: label.into(),
            priority_tier: tier,
            keywords: Vec::new(),
            posts: Vec::new(),
        }
    }

    /// Builder: append keywords.
    pub fn keywords<I, S>(mut self, kws: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords
            .extend(kws.into_iter().map(|k| Keyword { text: k.into() }));
        self
    }

    /// Builder: append one post.
    pub fn post(mut self, p: Post) -> Self {
        self.posts.push(p);
        self
    }
}

/// Full author configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub priority_posts: Vec<Post>,
}

impl Catalog {
    pub fn from_json_str(s: &str) -> anyhow::Result<Self> {
        let cat: Catalog = serde_json::from_str(s).context("parse catalog JSON")?;
        Ok(cat)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading catalog from {}", path.display()))?;
        let cat = Self::from_json_str(&content)
            .with_context(|| format!("invalid catalog at {}", path.display()))?;
        info!(
            target: "related_posts",
            path = %path.display(),
            topics = cat.topics.len(),
            pinned = cat.priority_posts.len(),
            "catalog loaded"
        );
        Ok(cat)
    }
}

/* ----------------------------
Thread-safe handle + hot reload
---------------------------- */

/// Shared catalog. Readers take a snapshot clone per run so a reload never
/// changes a catalog mid-pipeline.
#[derive(Clone, Default)]
pub struct CatalogHandle {
    inner: Arc<RwLock<Catalog>>,
}

impl CatalogHandle {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            inner: Arc::new(RwLock::new(catalog)),
        }
    }

    pub fn snapshot(&self) -> Catalog {
        match self.inner.read() {
            Ok(g) => g.clone(),
            Err(_) => Catalog::default(),
        }
    }

    pub fn replace(&self, catalog: Catalog) -> bool {
        match self.inner.write() {
            Ok(mut g) => {
                *g = catalog;
                true
            }
            Err(_) => false,
        }
    }

    /// Re-read the catalog from `path`; the current catalog stays on error.
    pub fn reload_from(&self, path: &Path) -> anyhow::Result<usize> {
        let fresh = Catalog::load_from_file(path)?;
        let topics = fresh.topics.len();
        if !self.replace(fresh) {
            anyhow::bail!("catalog lock poisoned");
        }
        Ok(topics)
    }
}

/// Returns true if we should enable hot reload (dev/local only).
fn hot_reload_enabled() -> bool {
    let want = std::env::var("RELATED_POSTS_HOT_RELOAD")
        .ok()
        .map(|v| v == "1")
        .unwrap_or(false);
    want && crate::devlog::is_dev_env()
}

/// One poll step: reload when `path`'s mtime moved past `last_mtime`.
/// The first observation only records the mtime. Returns true on a swap.
fn reload_if_changed(handle: &CatalogHandle, path: &Path, last_mtime: &mut Option<SystemTime>) -> bool {
    let Ok(mtime) = fs::metadata(path).and_then(|m| m.modified()) else {
        return false;
    };
    let changed = matches!(*last_mtime, Some(prev) if mtime > prev);
    if last_mtime.is_none() || changed {
        *last_mtime = Some(mtime);
    }
    if !changed {
        return false;
    }
    match handle.reload_from(path) {
        Ok(_) => true,
        Err(e) => {
            warn!(target: "related_posts", "catalog hot reload failed: {e:#}");
            false
        }
    }
}

/// Poll `path` mtime every 2s and swap the catalog when it changes.
pub fn start_hot_reload_thread(handle: CatalogHandle, path: PathBuf) {
    if !hot_reload_enabled() {
        return;
    }

    thread::spawn(move || {
        let poll = Duration::from_secs(2);
        let mut last_mtime: Option<SystemTime> = None;
        loop {
            reload_if_changed(&handle, &path, &mut last_mtime);
            thread::sleep(poll);
        }
    });
}
