//! Compiled-in catalog of approval prompt shapes.
//!
//! Order is priority: the matcher stops at the first pattern that fires.
//! Extending the catalog means adding an entry to [`CATALOG`].

use regex::Regex;

/// What gets written to the child when a pattern fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// A single carriage return, the byte a real Enter keypress produces in
    /// raw mode. Accepts the highlighted default of a menu.
    Enter,
    /// `y` followed by Enter, for inline yes/no questions.
    Affirm,
}

impl Response {
    pub fn bytes(self) -> &'static [u8] {
        match self {
            Response::Enter => b"\r",
            Response::Affirm => b"y\r",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Response::Enter => "pressing Enter",
            Response::Affirm => "sending 'y' + Enter",
        }
    }
}

/// Optional pointer glyph TUIs draw in front of the highlighted option.
const POINTER: &str = r"(?:[›❯>➤•*][ \t]*)?";

struct PatternSource {
    name: &'static str,
    expression: &'static str,
    response: Response,
}

// `{P}` stands for POINTER and `{MENU}` for the two-line numbered menu; both
// are expanded in `expand`.
const MENU: &str = r"^[ \t]*{P}1[.)][ \t]*Yes\b[^\n]*\n[ \t]*{P}2[.)][ \t]*(?:No|Yes)\b";

const CATALOG: &[PatternSource] = &[
    PatternSource {
        name: "question_menu",
        expression: r"(?im)\?[ \t]*\n{MENU}",
        response: Response::Enter,
    },
    PatternSource {
        name: "numbered_menu",
        expression: r"(?im){MENU}",
        response: Response::Enter,
    },
    PatternSource {
        name: "inline_yes_no",
        expression: r"(?i)(?:\(|\[)[ \t]*(?:yes[ \t]*/[ \t]*no|y[ \t]*/[ \t]*n)[ \t]*(?:\)|\])[^\n]*\s*\z",
        response: Response::Affirm,
    },
    PatternSource {
        name: "enter_value",
        expression: r"(?i)(?:enter a value|press (?:enter|return) to continue)[^\n]*\s*\z",
        response: Response::Enter,
    },
    // Looser shapes, tried only after everything above.
    PatternSource {
        name: "choice_list",
        expression: r"(?i)(?:\(|\[)[ \t]*(?:yes|y)[ \t]*/[ \t]*(?:no|n)(?:[ \t]*/[ \t]*[^\s/\])]+)+[ \t]*(?:\)|\])[^\n]*\s*\z",
        response: Response::Affirm,
    },
    PatternSource {
        name: "bare_yes_no",
        expression: r"(?i)\?[ \t]*(?:yes|y)[ \t]*/[ \t]*(?:no|n)\b[^\n]*\s*\z",
        response: Response::Affirm,
    },
    PatternSource {
        name: "yes_no_always",
        expression: r"(?i)\byes\b[ \t]*/[ \t]*\bno\b[ \t]*/[ \t]*\S[^\n]*\s*\z",
        response: Response::Affirm,
    },
];

fn expand(expression: &str) -> String {
    expression
        .replace("{MENU}", MENU)
        .replace("{P}", POINTER)
}

/// One recognizable prompt shape.
#[derive(Debug, Clone)]
pub struct ApprovalPattern {
    name: &'static str,
    expression: Regex,
    response: Response,
}

impl ApprovalPattern {
    pub fn new(name: &'static str, expression: &str, response: Response) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            expression: Regex::new(expression)?,
            response,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn regex(&self) -> &Regex {
        &self.expression
    }

    pub fn response(&self) -> Response {
        self.response
    }
}

/// Ordered, immutable list of approval patterns.
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<ApprovalPattern>,
}

impl PatternSet {
    /// Build the compiled-in catalog.
    pub fn builtin() -> Self {
        let patterns = CATALOG
            .iter()
            .map(|source| {
                ApprovalPattern::new(source.name, &expand(source.expression), source.response)
                    .expect("built-in approval pattern is valid")
            })
            .collect();
        Self { patterns }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ApprovalPattern> {
        self.patterns.iter()
    }

}

impl Default for PatternSet {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fires(name: &str, text: &str) -> bool {
        let set = PatternSet::builtin();
        let pattern = set
            .iter()
            .find(|p| p.name() == name)
            .expect("pattern exists");
        pattern.regex().is_match(text)
    }

    #[test]
    fn builtin_catalog_compiles_in_order() {
        let set = PatternSet::builtin();
        let names: Vec<_> = set.iter().map(|p| p.name()).collect();
        assert_eq!(
            names,
            vec![
                "question_menu",
                "numbered_menu",
                "inline_yes_no",
                "enter_value",
                "choice_list",
                "bare_yes_no",
                "yes_no_always",
            ]
        );
    }

    #[test]
    fn menu_accepts_pointer_glyphs() {
        assert!(fires("numbered_menu", "› 1. Yes\n  2. No"));
        assert!(fires("numbered_menu", "❯ 1) yes\n  2) no"));
        assert!(fires("numbered_menu", "1. Yes\n2. No"));
        assert!(fires("numbered_menu", "> 1. Yes\n  2. Yes, and don't ask again"));
    }

    #[test]
    fn menu_needs_both_options() {
        assert!(!fires("numbered_menu", "› 1. Yes"));
        assert!(!fires("numbered_menu", "1. No\n2. Yes"));
    }

    #[test]
    fn question_menu_needs_question_line() {
        assert!(fires("question_menu", "Do you want to proceed?\n› 1. Yes\n  2. No"));
        assert!(!fires("question_menu", "Pick one\n› 1. Yes\n  2. No"));
    }

    #[test]
    fn inline_yes_no_variants() {
        assert!(fires("inline_yes_no", "Continue? (y/n) "));
        assert!(fires("inline_yes_no", "Overwrite file [Y/n]"));
        assert!(fires("inline_yes_no", "Are you sure (yes/no)?"));
        assert!(!fires("inline_yes_no", "Continue? (y/n)\nalready answered"));
    }

    #[test]
    fn enter_value_variants() {
        assert!(fires("enter_value", "Enter a value: "));
        assert!(fires("enter_value", "Press Enter to continue..."));
        assert!(!fires("enter_value", "Enter a value: yes\nApplying"));
    }

    #[test]
    fn choice_list_takes_extra_options() {
        assert!(fires("choice_list", "Apply this hunk? (y/n/a) "));
        assert!(fires("choice_list", "Overwrite config.toml? [yes/no/all]"));
        assert!(fires("choice_list", "Stage this hunk [y/n/q/a/d/e/?]? "));
        assert!(!fires("choice_list", "Continue? (y/n) "));
        assert!(!fires("choice_list", "Apply? (y/n/a)\nApplied."));
    }

    #[test]
    fn bare_yes_no_needs_question_mark() {
        assert!(fires("bare_yes_no", "Continue? y/n "));
        assert!(fires("bare_yes_no", "Remove 3 files? yes / no"));
        assert!(!fires("bare_yes_no", "answer y/n below"));
        assert!(!fires("bare_yes_no", "Continue? y/n\nok"));
    }

    #[test]
    fn yes_no_always_variants() {
        assert!(fires("yes_no_always", "Trust this folder: Yes / No / Always"));
        assert!(fires("yes_no_always", "Run tool? yes/no/always ask"));
        assert!(!fires("yes_no_always", "Yes/No"));
    }

    #[test]
    fn responses_are_enter_based() {
        assert_eq!(Response::Enter.bytes(), b"\r");
        assert_eq!(Response::Affirm.bytes(), b"y\r");
    }
}
