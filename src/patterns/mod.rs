//! Prompt detection: output normalization, the pattern catalog and the
//! first-match evaluator.

mod catalog;
mod matcher;
mod normalize;

pub use catalog::{ApprovalPattern, PatternSet, Response};
pub use matcher::{recent_lines, Evaluation, MatchResult, PromptMatcher};
pub use normalize::normalize;
