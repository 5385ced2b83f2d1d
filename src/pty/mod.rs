mod select;
mod session;
mod terminal_mode;

pub use select::{wait_readable, Readiness};
pub use session::Session;
pub use terminal_mode::{snapshot, TerminalMode};

/// Current size of the controlling terminal as `(cols, rows)`.
pub fn terminal_size() -> Option<(u16, u16)> {
    crossterm::terminal::size()
        .ok()
        .filter(|(cols, rows)| *cols > 0 && *rows > 0)
}
