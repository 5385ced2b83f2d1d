use std::fmt;

use crate::error::ProxyError;

/// Exit status used when teardown was caused by a termination signal.
pub const INTERRUPTED_EXIT_STATUS: i32 = 130;
/// Exit status used when a fatal I/O error ended the session.
pub const FAILURE_EXIT_STATUS: i32 = 1;

/// Lifecycle of the proxy loop. Auto-approve is a flag inside `Running`,
/// not a state of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Closing,
    Closed,
}

/// Whether detected prompts are answered automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoApprove {
    enabled: bool,
}

impl AutoApprove {
    fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Flip the flag and return the new value.
    pub fn toggle(&mut self) -> bool {
        self.enabled = !self.enabled;
        self.enabled
    }
}

impl Default for AutoApprove {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Why the loop left `Running`.
#[derive(Debug)]
pub enum ExitReason {
    /// The PTY reported end-of-stream.
    ChildExited,
    /// A termination signal arrived.
    Interrupted,
    /// Unexpected I/O failure on one of the handles.
    Failed(ProxyError),
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::ChildExited => write!(f, "child exited"),
            ExitReason::Interrupted => write!(f, "interrupted"),
            ExitReason::Failed(err) => write!(f, "error: {}", err),
        }
    }
}

/// Result of a finished session.
#[derive(Debug)]
pub struct Outcome {
    pub reason: ExitReason,
    /// Exit code of the wrapped command, when it could be collected.
    pub child_exit_code: Option<u32>,
}

impl Outcome {
    /// Status the proxy process should exit with.
    pub fn exit_status(&self) -> i32 {
        match &self.reason {
            ExitReason::ChildExited => self
                .child_exit_code
                .map(|code| code as i32)
                .unwrap_or(FAILURE_EXIT_STATUS),
            ExitReason::Interrupted => INTERRUPTED_EXIT_STATUS,
            ExitReason::Failed(_) => FAILURE_EXIT_STATUS,
        }
    }
}
