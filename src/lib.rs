//! AutoYes wraps an interactive command in a pseudo-terminal, passes its
//! I/O through unchanged and answers approval prompts on the user's behalf.
//!
//! Ctrl-Y toggles auto-approve at any time.

pub mod config;
pub mod debug_log;
pub mod error;
pub mod logging;
pub mod patterns;
pub mod proxy;
pub mod pty;
pub mod shutdown;
pub mod window;
