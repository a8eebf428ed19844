//! Action-item extraction for Meetbrief.
//!
//! Turns free-text meeting summaries into typed follow-up candidates using
//! label-prefixed lines (`Email:`, `Invite:`, `Task:` and friends).

pub mod extract;
pub mod types;

pub use extract::ActionExtractor;
pub use types::ActionItemCandidate;
