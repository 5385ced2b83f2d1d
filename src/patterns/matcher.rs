use std::ops::Range;

use super::catalog::{PatternSet, Response};
use super::normalize::normalize;

/// Glyphs TUIs animate while busy. A line made only of these (and spaces)
/// carries no prompt text.
const SPINNER_CHARS: &str = "⏺⏹⏸⏵⏴●○◐◑◒◓◴◵◶◷⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏▁▂▃▄▅▆▇█✓✗✳✴✵·✢✶✻✽";

/// A pattern that fired on the tail of the output window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// Position of the pattern in the catalog.
    pub pattern_index: usize,
    pub pattern_name: &'static str,
    /// Byte range of the match within [`Evaluation::tail`].
    pub span: Range<usize>,
    /// The matched text.
    pub matched: String,
    pub response: Response,
}

/// Outcome of one match attempt, including the text that was examined.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub tail: String,
    pub result: Option<MatchResult>,
}

/// Evaluates the pattern catalog against the last few lines of output.
#[derive(Debug, Clone)]
pub struct PromptMatcher {
    patterns: PatternSet,
    max_lines: usize,
}

impl PromptMatcher {
    pub fn new(patterns: PatternSet, max_lines: usize) -> Self {
        Self {
            patterns,
            max_lines,
        }
    }

    /// First catalog pattern matching the window's recent lines, if any.
    pub fn find(&self, window: &[u8]) -> Option<MatchResult> {
        self.evaluate(window).result
    }

    /// Normalize the window, keep its last meaningful lines and test each
    /// pattern in catalog order, stopping at the first hit.
    pub fn evaluate(&self, window: &[u8]) -> Evaluation {
        let tail = recent_lines(&normalize(window), self.max_lines);
        let result = self
            .patterns
            .iter()
            .enumerate()
            .find_map(|(index, pattern)| {
                pattern.regex().find(&tail).map(|m| MatchResult {
                    pattern_index: index,
                    pattern_name: pattern.name(),
                    span: m.range(),
                    matched: m.as_str().to_string(),
                    response: pattern.response(),
                })
            });
        Evaluation { tail, result }
    }
}

impl Default for PromptMatcher {
    fn default() -> Self {
        Self::new(PatternSet::builtin(), crate::config::DEFAULT_MATCH_LINES)
    }
}

/// Last `max_lines` non-blank, non-spinner lines of already normalized text,
/// joined with `\n`.
pub fn recent_lines(text: &str, max_lines: usize) -> String {
    let meaningful: Vec<&str> = text.split('\n').filter(|line| is_meaningful(line)).collect();
    let start = meaningful.len().saturating_sub(max_lines);
    meaningful[start..].join("\n")
}

fn is_meaningful(line: &str) -> bool {
    line.chars()
        .any(|c| !c.is_whitespace() && !SPINNER_CHARS.contains(c))
}
