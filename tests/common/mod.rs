//! Shared helpers for driving the proxy against real pseudo-terminals.

#![allow(dead_code)]

use autoyes::config::ProxyConfig;
use parking_lot::Mutex;
use std::io::{self, Write};
use std::os::fd::{FromRawFd, OwnedFd};
use std::sync::Arc;
use std::time::Duration;

pub type SpyBuffer = Arc<Mutex<Vec<u8>>>;

/// Writer that records everything written to it.
#[derive(Clone, Default)]
pub struct SpyWriter {
    pub buffer: SpyBuffer,
}

impl SpyWriter {
    pub fn contents(&self) -> Vec<u8> {
        self.buffer.lock().clone()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }
}

impl Write for SpyWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A terminal pair standing in for the user's controlling terminal.
///
/// Tests hand `slave` to the session so the real stdin of the test runner
/// is never switched to raw mode.
pub struct FakeTerminal {
    pub master: OwnedFd,
    pub slave: OwnedFd,
}

impl FakeTerminal {
    pub fn open() -> io::Result<Self> {
        let mut master = -1;
        let mut slave = -1;
        let rc = unsafe {
            libc::openpty(
                &mut master,
                &mut slave,
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                std::ptr::null_mut(),
            )
        };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(Self {
            master: unsafe { OwnedFd::from_raw_fd(master) },
            slave: unsafe { OwnedFd::from_raw_fd(slave) },
        })
    }
}

/// Engine configuration with no settle delay, for fast tests.
pub fn quick_config() -> ProxyConfig {
    ProxyConfig {
        settle_delay: Duration::ZERO,
        tick: Duration::from_millis(20),
        ..ProxyConfig::default()
    }
}

pub fn sh(script: &str) -> Vec<String> {
    vec!["-c".to_string(), script.to_string()]
}
