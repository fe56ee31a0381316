// src/ranker.rs
//! Topic ranker: orders matched topics by editorial priority tier.

use std::cmp::Ordering;

use crate::catalog::{PriorityTier, Topic};

/// A matched topic paired with its tier, used only for sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchedTopic {
    pub index: usize,
    pub tier: PriorityTier,
}

/// Three-way comparator: tier ascending, then topic index ascending.
/// Total order, so the result never depends on the sort algorithm.
pub fn compare_matched(a: &MatchedTopic, b: &MatchedTopic) -> Ordering {
    a.tier.cmp(&b.tier).then_with(|| a.index.cmp(&b.index))
}

/// Resolve matched indices to tiers and return them highest priority first.
/// Indices outside `topics` are dropped.
pub fn rank_topics(matched: &[usize], topics: &[Topic]) -> Vec<usize> {
    let mut ranked: Vec<MatchedTopic> = matched
        .iter()
        .filter_map(|&i| {
            topics.get(i).map(|t| MatchedTopic {
                index: i,
                tier: t.priority_tier,
            })
        })
        .collect();
    ranked.sort_by(compare_matched);
    ranked.into_iter().map(|m| m.index).collect()
}
