// src/indexer.rs
//! Keyword indexer: flattens topic keywords into `(keyword, topic index)` entries.

use crate::catalog::Topic;

/// One lower-cased keyword pointing back at its topic by index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordIndexEntry {
    pub keyword: String,
    pub topic: usize,
}

/// Emit entries in topic order, then keyword order within the topic.
/// Blank keywords are skipped: an empty needle would match every location.
pub fn build_keyword_index(topics: &[Topic]) -> Vec<KeywordIndexEntry> {
    let mut out = Vec::new();
    for (i, topic) in topics.iter().enumerate() {
        for kw in &topic.keywords {
            let k = kw.text.trim().to_lowercase();
            if k.is_empty() {
                continue;
            }
            out.push(KeywordIndexEntry {
                keyword: k,
                topic: i,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PriorityTier;

    #[test]
    fn entries_follow_topic_then_keyword_order() {
        let topics = vec![
            Topic::new("a", PriorityTier::Brand).keywords(["Brooks", " SADDLE "]),
            Topic::new("b", PriorityTier::Product),
            Topic::new("c", PriorityTier::Sport).keywords(["Gravel"]),
        ];
        let idx = build_keyword_index(&topics);
        let got: Vec<(&str, usize)> = idx.iter().map(|e| (e.keyword.as_str(), e.topic)).collect();
        assert_eq!(got, vec![("brooks", 0), ("saddle", 0), ("gravel", 2)]);
    }

    #[test]
    fn blank_keywords_are_ignored() {
        let topics = vec![Topic::new("a", PriorityTier::Brand).keywords(["", "   "])];
        assert!(build_keyword_index(&topics).is_empty());
    }
}
