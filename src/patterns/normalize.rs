//! Control-sequence stripping and line-ending canonicalization.
//!
//! Handles:
//! - CSI sequences, including DEC private forms (`ESC [ ? 25 h`)
//! - OSC sequences terminated by BEL or ST (`ESC \`)
//! - DCS strings terminated by ST
//! - two-byte escapes (`ESC 7`, `ESC ( B`) and stray ESC bytes
//!
//! Other C0 controls are dropped except `\n` and `\t`, then `\r\n` and lone
//! `\r` become `\n`. The result contains no ESC or CR, so normalizing twice
//! is the same as normalizing once.

use regex::Regex;
use std::sync::OnceLock;

fn escape_sequence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"\x1b(?:",
            r"\[[0-?]*[ -/]*[@-~]",
            r"|\][^\x07\x1b]*(?:\x07|\x1b\\)",
            r"|P[^\x1b]*\x1b\\",
            r"|[ -/]*[0-~]",
            r")?",
        ))
        .expect("escape sequence pattern is valid")
    })
}

fn control_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[\x00-\x08\x0b\x0c\x0e-\x1f\x7f]").expect("control pattern is valid")
    })
}

fn carriage_returns() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\r\n?").expect("line ending pattern is valid"))
}

/// Strip terminal control sequences and canonicalize line endings.
pub fn normalize(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let text = escape_sequence().replace_all(&text, "");
    let text = control_chars().replace_all(&text, "");
    carriage_returns().replace_all(&text, "\n").into_owned()
}
