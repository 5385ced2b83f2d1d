use crossterm::cursor::{MoveDown, MoveToColumn, RestorePosition, SavePosition};
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use crossterm::queue;
use std::io::{self, IsTerminal, Write};

const TAG: &str = "[AutoYes]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Enabled,
    Disabled,
    Notice,
}

impl Tone {
    fn color(self) -> Color {
        match self {
            Tone::Enabled => Color::Green,
            Tone::Disabled => Color::Red,
            Tone::Notice => Color::Yellow,
        }
    }
}

/// Renders status notifications on the bottom row of the terminal without
/// moving the child's cursor.
pub struct StatusLine {
    out: Option<Box<dyn Write + Send>>,
}

impl StatusLine {
    /// Draw on stderr when it is a terminal that understands cursor movement.
    pub fn stderr() -> Self {
        if supports_status_line(io::stderr().is_terminal(), std::env::var("TERM").ok().as_deref()) {
            Self::to_writer(Box::new(io::stderr()))
        } else {
            Self::hidden()
        }
    }

    pub fn to_writer(out: Box<dyn Write + Send>) -> Self {
        Self { out: Some(out) }
    }

    pub fn hidden() -> Self {
        Self { out: None }
    }

    pub fn is_visible(&self) -> bool {
        self.out.is_some()
    }

    pub fn show(&mut self, message: &str, tone: Tone) -> io::Result<()> {
        let Some(out) = self.out.as_mut() else {
            return Ok(());
        };
        queue!(
            out,
            SavePosition,
            MoveDown(999),
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            SetForegroundColor(tone.color()),
            SetAttribute(Attribute::Bold),
            Print(TAG),
            SetAttribute(Attribute::Reset),
            SetForegroundColor(tone.color()),
            Print(" "),
            Print(message),
            ResetColor,
            RestorePosition,
        )?;
        out.flush()
    }
}

fn supports_status_line(is_terminal: bool, term: Option<&str>) -> bool {
    is_terminal && !matches!(term, None | Some("") | Some("dumb"))
}

/// Plain one-line status message for use outside raw mode.
pub fn banner(message: &str) -> String {
    format!("{} {}", TAG, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Spy(Arc<Mutex<Vec<u8>>>);

    impl Write for Spy {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn hidden_line_writes_nothing() {
        let mut line = StatusLine::hidden();
        assert!(!line.is_visible());
        line.show("Auto-approve mode: ON", Tone::Enabled).unwrap();
    }

    #[test]
    fn visible_line_draws_tagged_message() {
        let spy = Spy::default();
        let mut line = StatusLine::to_writer(Box::new(spy.clone()));
        line.show("Auto-approve mode: OFF", Tone::Disabled).unwrap();

        let written = spy.0.lock().unwrap().clone();
        let text = String::from_utf8_lossy(&written);
        assert!(text.starts_with('\x1b'));
        assert!(text.contains("[AutoYes]"));
        assert!(text.contains("Auto-approve mode: OFF"));
    }

    #[test]
    fn dumb_terminals_get_no_status_line() {
        assert!(supports_status_line(true, Some("xterm-256color")));
        assert!(!supports_status_line(true, Some("dumb")));
        assert!(!supports_status_line(true, None));
        assert!(!supports_status_line(false, Some("xterm")));
    }

    #[test]
    fn banner_is_tagged() {
        assert_eq!(banner("Session ended"), "[AutoYes] Session ended");
    }
}
