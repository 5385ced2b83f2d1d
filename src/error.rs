//! Error types for the proxy engine.

use std::io;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures while setting up or tearing down the PTY session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The pseudo-terminal pair could not be allocated.
    #[error("failed to allocate pseudo-terminal: {source}")]
    PtyOpen {
        #[source]
        source: BoxError,
    },

    /// The wrapped command could not be started.
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: BoxError,
    },

    /// A master-side handle (reader, writer, descriptor) was unavailable.
    #[error("pseudo-terminal handle unavailable: {0}")]
    Handle(String),

    /// Reading or changing the controlling terminal's mode failed.
    #[error("terminal mode error: {0}")]
    TerminalMode(#[from] io::Error),
}

/// Fatal conditions raised while the proxy loop is running.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Unexpected failure on one of the two handles.
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ProxyError {
    pub(crate) fn io(context: &'static str, source: io::Error) -> Self {
        Self::Io { context, source }
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;
