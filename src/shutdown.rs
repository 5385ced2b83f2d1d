use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM, SIGWINCH};
use signal_hook::SigId;

/// Signals that end the session.
const TERMINATION_SIGNALS: [i32; 3] = [SIGINT, SIGTERM, SIGHUP];

/// Process signal state observed by the proxy loop between readiness waits.
///
/// Handlers only set flags; the loop acts on them on its next tick.
pub struct ShutdownSignals {
    terminate: Arc<AtomicBool>,
    resize: Arc<AtomicBool>,
    registered: Vec<SigId>,
}

impl ShutdownSignals {
    /// Register handlers for SIGINT, SIGTERM, SIGHUP and SIGWINCH.
    pub fn install() -> io::Result<Self> {
        let mut signals = Self::detached();
        for signal in TERMINATION_SIGNALS {
            let id = signal_hook::flag::register(signal, Arc::clone(&signals.terminate))?;
            signals.registered.push(id);
        }
        let id = signal_hook::flag::register(SIGWINCH, Arc::clone(&signals.resize))?;
        signals.registered.push(id);
        Ok(signals)
    }

    /// Flags with no OS handlers attached. Only [`ShutdownHandle::signal`]
    /// can trigger them.
    pub fn detached() -> Self {
        Self {
            terminate: Arc::new(AtomicBool::new(false)),
            resize: Arc::new(AtomicBool::new(false)),
            registered: Vec::new(),
        }
    }

    /// Check if a termination signal has arrived.
    pub fn is_shutting_down(&self) -> bool {
        self.terminate.load(Ordering::SeqCst)
    }

    /// Consume a pending window-size change, if any.
    pub fn take_resize(&self) -> bool {
        self.resize.swap(false, Ordering::Relaxed)
    }

    /// Create a handle for sharing
    pub fn handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            terminate: Arc::clone(&self.terminate),
        }
    }
}

impl Drop for ShutdownSignals {
    fn drop(&mut self) {
        for id in self.registered.drain(..) {
            signal_hook::low_level::unregister(id);
        }
    }
}

/// Lightweight handle for requesting teardown from elsewhere.
#[derive(Clone)]
pub struct ShutdownHandle {
    terminate: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn signal(&self) {
        if !self.terminate.swap(true, Ordering::SeqCst) {
            tracing::debug!("teardown requested");
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.terminate.load(Ordering::SeqCst)
    }
}
