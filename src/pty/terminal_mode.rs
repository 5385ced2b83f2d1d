use std::io;
use std::mem::MaybeUninit;
use std::os::unix::io::RawFd;

/// Snapshot of a terminal's mode, taken before switching it to raw.
///
/// Restores the snapshot on [`TerminalMode::restore`] or on drop, whichever
/// comes first.
pub struct TerminalMode {
    fd: RawFd,
    saved: libc::termios,
    restored: bool,
}

impl TerminalMode {
    /// Save `fd`'s current mode and put it into raw mode: no canonical line
    /// editing, no echo, no signal characters, no output post-processing.
    ///
    /// Returns `Ok(None)` when `fd` is not a terminal.
    pub fn enter_raw(fd: RawFd) -> io::Result<Option<Self>> {
        if unsafe { libc::isatty(fd) } != 1 {
            return Ok(None);
        }
        let saved = snapshot(fd)?;
        let mut raw = saved;
        unsafe { libc::cfmakeraw(&mut raw) };
        raw.c_cc[libc::VMIN] = 1;
        raw.c_cc[libc::VTIME] = 0;
        set(fd, &raw)?;
        Ok(Some(Self {
            fd,
            saved,
            restored: false,
        }))
    }

    /// Put the saved mode back. Safe to call more than once.
    pub fn restore(&mut self) -> io::Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        set(self.fd, &self.saved)
    }
}

impl Drop for TerminalMode {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

/// Read the current mode of `fd`.
pub fn snapshot(fd: RawFd) -> io::Result<libc::termios> {
    let mut termios = MaybeUninit::<libc::termios>::uninit();
    if unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(unsafe { termios.assume_init() })
}

fn set(fd: RawFd, termios: &libc::termios) -> io::Result<()> {
    if unsafe { libc::tcsetattr(fd, libc::TCSAFLUSH, termios) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::io::AsRawFd;

    #[test]
    fn non_terminal_is_left_alone() {
        let file = tempfile::tempfile().expect("temp file");
        let mode = TerminalMode::enter_raw(file.as_raw_fd()).expect("no error");
        assert!(mode.is_none());
    }
}
