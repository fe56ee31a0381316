// src/config/widget.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, path::PathBuf};

use crate::viewport::{
    ViewportPolicy, DEFAULT_DESKTOP_CAP, DEFAULT_DESKTOP_MIN_WIDTH, DEFAULT_MOBILE_CAP,
};

pub const DEFAULT_WIDGET_CONFIG_PATH: &str = "config/widget.toml";
pub const DEFAULT_CATALOG_PATH: &str = "config/catalog.json";
pub const DEFAULT_OPT_OUT_PARAM: &str = "hide_related_posts";

pub const ENV_WIDGET_CONFIG_PATH: &str = "RELATED_POSTS_CONFIG_PATH";
pub const ENV_CATALOG_PATH: &str = "RELATED_POSTS_CATALOG_PATH";

fn default_catalog_path() -> PathBuf {
    PathBuf::from(DEFAULT_CATALOG_PATH)
}
fn default_desktop_min_width() -> u32 {
    DEFAULT_DESKTOP_MIN_WIDTH
}
fn default_desktop_cap() -> usize {
    DEFAULT_DESKTOP_CAP
}
fn default_mobile_cap() -> usize {
    DEFAULT_MOBILE_CAP
}
fn default_opt_out_param() -> String {
    DEFAULT_OPT_OUT_PARAM.to_string()
}

/// Service-level settings. Every field has a default, so an empty file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetConfig {
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,
    /// Viewports at least this wide are "desktop".
    #[serde(default = "default_desktop_min_width")]
    pub desktop_min_width: u32,
    #[serde(default = "default_desktop_cap")]
    pub desktop_cap: usize,
    #[serde(default = "default_mobile_cap")]
    pub mobile_cap: usize,
    /// Query parameter that force-hides the panel.
    #[serde(default = "default_opt_out_param")]
    pub opt_out_param: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            desktop_min_width: default_desktop_min_width(),
            desktop_cap: default_desktop_cap(),
            mobile_cap: default_mobile_cap(),
            opt_out_param: default_opt_out_param(),
        }
    }
}

impl WidgetConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: WidgetConfig = toml::from_str(s).context("parse widget TOML")?;
        Ok(cfg.sanitized())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading widget config from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("invalid widget config at {}", path.display()))
    }

    /// Resolve config using env var + fallbacks:
    /// 1) $RELATED_POSTS_CONFIG_PATH (must exist)
    /// 2) config/widget.toml
    /// 3) built-in defaults
    ///
    /// $RELATED_POSTS_CATALOG_PATH then overrides `catalog_path`.
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = env::var(ENV_WIDGET_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!(
                    "{ENV_WIDGET_CONFIG_PATH} points to non-existent path {}",
                    pb.display()
                ));
            }
            Self::load_from_file(&pb)?
        } else {
            let pb = PathBuf::from(DEFAULT_WIDGET_CONFIG_PATH);
            if pb.exists() {
                Self::load_from_file(&pb)?
            } else {
                Self::default()
            }
        };

        if let Ok(p) = env::var(ENV_CATALOG_PATH) {
            if !p.trim().is_empty() {
                cfg.catalog_path = PathBuf::from(p.trim());
            }
        }
        Ok(cfg)
    }

    pub fn viewport_policy(&self) -> ViewportPolicy {
        ViewportPolicy {
            desktop_min_width: self.desktop_min_width,
            desktop_cap: self.desktop_cap,
            mobile_cap: self.mobile_cap,
        }
    }

    // Zero width/caps or a blank param would silently disable the panel.
    fn sanitized(mut self) -> Self {
        if self.desktop_min_width == 0 {
            self.desktop_min_width = default_desktop_min_width();
        }
        if self.desktop_cap == 0 {
            self.desktop_cap = default_desktop_cap();
        }
        if self.mobile_cap == 0 {
            self.mobile_cap = default_mobile_cap();
        }
        self.opt_out_param = self.opt_out_param.trim().to_string();
        if self.opt_out_param.is_empty() {
            self.opt_out_param = default_opt_out_param();
        }
        self
    }
}
