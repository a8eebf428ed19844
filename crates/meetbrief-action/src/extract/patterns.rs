//! Label-prefix rules for action-item lines.
//!
//! Rules are evaluated in order and the first match wins, so the order of
//! the list is the precedence between action types.

use regex::Regex;

use meetbrief_core::types::ActionType;

/// How the description is derived from a matched line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionMode {
    /// Keep the whole trimmed line, label included.
    FullLine,
    /// Keep only the text after the label, trimmed.
    AfterLabel,
}

/// A compiled line-prefix rule linked to an action type.
pub struct LabelRule {
    pub regex: Regex,
    pub action_type: ActionType,
    pub mode: DescriptionMode,
}

impl LabelRule {
    /// Classify a trimmed line. Returns the description, which may be empty.
    pub fn apply<'a>(&self, line: &'a str) -> Option<&'a str> {
        let caps = self.regex.captures(line)?;
        match self.mode {
            DescriptionMode::FullLine => Some(line),
            DescriptionMode::AfterLabel => Some(caps.get(1).map_or("", |m| m.as_str()).trim()),
        }
    }
}

/// Ordered rule list, compiled once and reused.
pub struct LabelRules {
    rules: Vec<LabelRule>,
}

impl Default for LabelRules {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelRules {
    /// Email/Contact, then Invite/Schedule, then Action/Task/TODO/Next Step.
    pub fn new() -> Self {
        let definitions: [(&str, ActionType, DescriptionMode); 3] = [
            (
                r"(?i)^(?:email|contact)\s*:(.*)$",
                ActionType::Email,
                DescriptionMode::FullLine,
            ),
            (
                r"(?i)^(?:invite|schedule)\s*:(.*)$",
                ActionType::Invite,
                DescriptionMode::FullLine,
            ),
            (
                r"(?i)^(?:action|task|todo|next step)\s*:(.*)$",
                ActionType::Task,
                DescriptionMode::AfterLabel,
            ),
        ];

        let rules = definitions
            .into_iter()
            .map(|(pat, action_type, mode)| LabelRule {
                regex: Regex::new(pat).expect("Invalid label regex"),
                action_type,
                mode,
            })
            .collect();

        Self { rules }
    }

    /// First rule matching the line, with its derived description.
    pub fn classify<'a>(&self, line: &'a str) -> Option<(ActionType, &'a str)> {
        self.rules
            .iter()
            .find_map(|rule| rule.apply(line).map(|desc| (rule.action_type, desc)))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
