// src/viewport.rs
//! Viewport truncator and render gate.
//!
//! Classifies the viewport into a desktop/mobile bucket, caps the assembled
//! list for that bucket and decides whether anything should render at all.

use serde::{Deserialize, Serialize};

use crate::assembler::Assembly;
use crate::catalog::Post;

pub const DEFAULT_DESKTOP_MIN_WIDTH: u32 = 1026;
pub const DEFAULT_DESKTOP_CAP: usize = 10;
pub const DEFAULT_MOBILE_CAP: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Desktop,
    Mobile,
}

impl Device {
    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Desktop => "desktop",
            Device::Mobile => "mobile",
        }
    }
}

/// Breakpoint and per-device caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportPolicy {
    pub desktop_min_width: u32,
    pub desktop_cap: usize,
    pub mobile_cap: usize,
}

impl Default for ViewportPolicy {
    fn default() -> Self {
        Self {
            desktop_min_width: DEFAULT_DESKTOP_MIN_WIDTH,
            desktop_cap: DEFAULT_DESKTOP_CAP,
            mobile_cap: DEFAULT_MOBILE_CAP,
        }
    }
}

impl ViewportPolicy {
    pub fn classify(&self, width: u32) -> Device {
        if width >= self.desktop_min_width {
            Device::Desktop
        } else {
            Device::Mobile
        }
    }

    pub fn cap(&self, device: Device) -> usize {
        match device {
            Device::Desktop => self.desktop_cap,
            Device::Mobile => self.mobile_cap,
        }
    }
}

/// Why a run produced no panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressReason {
    /// Location or viewport could not be read.
    NoEnvironment,
    /// The opt-out query flag is set.
    OptOut,
    NoTopicMatch,
    NothingAssembled,
    /// Only pinned content survived; nothing new to show.
    PinnedOnly,
}

impl SuppressReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuppressReason::NoEnvironment => "no_environment",
            SuppressReason::OptOut => "opt_out",
            SuppressReason::NoTopicMatch => "no_topic_match",
            SuppressReason::NothingAssembled => "nothing_assembled",
            SuppressReason::PinnedOnly => "pinned_only",
        }
    }
}

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RenderOutcome {
    Suppressed { reason: SuppressReason },
    Render { device: Device, posts: Vec<Post> },
}

impl RenderOutcome {
    pub fn suppressed(reason: SuppressReason) -> Self {
        RenderOutcome::Suppressed { reason }
    }

    pub fn is_rendered(&self) -> bool {
        matches!(self, RenderOutcome::Render { .. })
    }

    /// Posts to show; empty when suppressed.
    pub fn posts(&self) -> &[Post] {
        match self {
            RenderOutcome::Render { posts, .. } => posts,
            RenderOutcome::Suppressed { .. } => &[],
        }
    }

    pub fn suppress_reason(&self) -> Option<SuppressReason> {
        match self {
            RenderOutcome::Suppressed { reason } => Some(*reason),
            RenderOutcome::Render { .. } => None,
        }
    }
}

/// Apply the pre-truncation suppression rules, then cap for the device.
/// The caller handles the "no topic matched" short-circuit before this point.
pub fn gate_and_truncate(assembly: Assembly, width: u32, policy: &ViewportPolicy) -> RenderOutcome {
    if assembly.posts.is_empty() {
        return RenderOutcome::suppressed(SuppressReason::NothingAssembled);
    }
    if assembly.posts.len() == assembly.pinned_survivors {
        return RenderOutcome::suppressed(SuppressReason::PinnedOnly);
    }

    let device = policy.classify(width);
    let mut posts = assembly.posts;
    posts.truncate(policy.cap(device));
    RenderOutcome::Render { device, posts }
}
