//! Line-oriented action-item extraction from meeting summaries.
//!
//! Each non-blank line is trimmed and classified against the ordered
//! [`LabelRules`]. Lines that match no rule are dropped. The extractor holds
//! only immutable compiled patterns and can be shared across threads.

pub mod patterns;

use tracing::debug;

use crate::types::ActionItemCandidate;
use patterns::LabelRules;

/// Extracts typed action-item candidates from free text.
#[derive(Default)]
pub struct ActionExtractor {
    rules: LabelRules,
}

impl ActionExtractor {
    pub fn new() -> Self {
        Self {
            rules: LabelRules::new(),
        }
    }

    /// Extract candidates in source-line order.
    ///
    /// Never fails: text with no labelled lines yields an empty list.
    pub fn extract(&self, text: &str) -> Vec<ActionItemCandidate> {
        let candidates: Vec<ActionItemCandidate> = text
            .split('\n')
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter_map(|line| self.rules.classify(line))
            .filter(|(_, description)| !description.is_empty())
            .map(|(action_type, description)| ActionItemCandidate::new(description, action_type))
            .collect();

        debug!(count = candidates.len(), "Action items extracted");
        candidates
    }
}
