use crate::error::SessionError;
use crate::pty::terminal_mode::TerminalMode;
use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};
use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::BorrowedFd;
use std::os::unix::io::RawFd;
use std::thread;
use std::time::{Duration, Instant};

/// How long teardown waits for the child to exit on its own before killing it.
const REAP_GRACE: Duration = Duration::from_millis(500);

/// A wrapped command running on a fresh pseudo-terminal, plus the saved mode
/// of the controlling terminal.
///
/// Every handle is released exactly once by [`Session::close`], which also
/// runs from `Drop`.
pub struct Session {
    command: String,
    args: Vec<String>,
    child: Box<dyn Child + Send + Sync>,
    master: Option<Box<dyn MasterPty + Send>>,
    reader: Option<Box<dyn Read + Send>>,
    /// Duplicate of the master descriptor. portable-pty's own writer sends
    /// `\n` and VEOF to the child when dropped, which would answer a pending
    /// prompt during teardown.
    writer: Option<File>,
    master_fd: RawFd,
    terminal: Option<TerminalMode>,
    exit_code: Option<u32>,
    closed: bool,
}

impl Session {
    /// Spawn `command` on a new PTY and put stdin into raw mode.
    pub fn open(command: &str, args: &[String]) -> Result<Self, SessionError> {
        Self::open_on(command, args, libc::STDIN_FILENO)
    }

    /// Like [`Session::open`], but treats `control_fd` as the controlling
    /// terminal whose mode is saved and switched to raw.
    pub fn open_on(command: &str, args: &[String], control_fd: RawFd) -> Result<Self, SessionError> {
        let pty_system = native_pty_system();
        let (cols, rows) = crossterm::terminal::size().unwrap_or((80, 24));
        let pair = pty_system
            .openpty(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|err| SessionError::PtyOpen { source: err.into() })?;

        let mut cmd = CommandBuilder::new(command);
        cmd.args(args);
        if let Ok(cwd) = std::env::current_dir() {
            cmd.cwd(cwd);
        }

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|err| SessionError::Spawn {
                command: command.to_string(),
                source: err.into(),
            })?;
        drop(pair.slave);

        let master = pair.master;
        let reader = master
            .try_clone_reader()
            .map_err(|err| SessionError::Handle(format!("reader: {}", err)))?;
        let master_fd = master
            .as_raw_fd()
            .ok_or_else(|| SessionError::Handle("master has no file descriptor".to_string()))?;
        let writer = duplicate_fd(master_fd)
            .map_err(|err| SessionError::Handle(format!("writer: {}", err)))?;

        tracing::debug!(
            command,
            pid = child.process_id(),
            cols,
            rows,
            "spawned wrapped command"
        );

        let mut session = Self {
            command: command.to_string(),
            args: args.to_vec(),
            child,
            master: Some(master),
            reader: Some(reader),
            writer: Some(writer),
            master_fd,
            terminal: None,
            exit_code: None,
            closed: false,
        };
        // On failure `session` drops here, which reaps the child.
        session.terminal = TerminalMode::enter_raw(control_fd)?;
        Ok(session)
    }

    /// Command followed by its arguments.
    pub fn command_line(&self) -> Vec<String> {
        std::iter::once(self.command.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }

    /// Descriptor of the PTY master, for readiness waiting.
    pub fn master_fd(&self) -> RawFd {
        self.master_fd
    }

    /// Whether the controlling terminal was switched to raw mode.
    pub fn is_raw(&self) -> bool {
        self.terminal.is_some()
    }

    /// Read child output. `Ok(0)` means the child side is gone; Linux reports
    /// that as `EIO` once the last subordinate handle closes.
    pub fn read_output(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(0);
        };
        match reader.read(buf) {
            Err(err) if err.raw_os_error() == Some(libc::EIO) => Ok(0),
            other => other,
        }
    }

    pub fn resize(&self, cols: u16, rows: u16) -> io::Result<()> {
        let Some(master) = self.master.as_ref() else {
            return Ok(());
        };
        master
            .resize(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|err| io::Error::other(err.to_string()))
    }

    /// Restore the terminal, close the master and reap the child.
    ///
    /// Idempotent. Returns the child's exit code when it could be collected.
    pub fn close(&mut self) -> Option<u32> {
        if self.closed {
            return self.exit_code;
        }
        self.closed = true;

        if let Some(mut terminal) = self.terminal.take() {
            if let Err(err) = terminal.restore() {
                tracing::warn!(error = %err, "failed to restore terminal mode");
            }
        }

        self.writer.take();
        self.reader.take();
        self.master.take();

        self.exit_code = self.reap();
        tracing::debug!(command = %self.command, exit_code = ?self.exit_code, "session closed");
        self.exit_code
    }

    fn reap(&mut self) -> Option<u32> {
        let deadline = Instant::now() + REAP_GRACE;
        loop {
            match self.child.try_wait() {
                Ok(Some(status)) => return Some(status.exit_code()),
                Ok(None) if Instant::now() < deadline => thread::sleep(Duration::from_millis(10)),
                Ok(None) => break,
                Err(err) => {
                    tracing::warn!(error = %err, "failed to poll child status");
                    break;
                }
            }
        }

        if let Err(err) = self.child.kill() {
            tracing::debug!(error = %err, "kill after grace period failed");
        }
        match self.child.wait() {
            Ok(status) => Some(status.exit_code()),
            Err(err) => {
                tracing::warn!(error = %err, "failed to wait for child");
                None
            }
        }
    }
}

fn duplicate_fd(fd: RawFd) -> io::Result<File> {
    // The master outlives this call; the clone is owned independently.
    let borrowed = unsafe { BorrowedFd::borrow_raw(fd) };
    Ok(File::from(borrowed.try_clone_to_owned()?))
}

/// Writes go to the child's input through the PTY master.
impl Write for Session {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.writer.as_mut() {
            Some(writer) => writer.write(buf),
            None => Err(io::Error::new(io::ErrorKind::BrokenPipe, "session closed")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}
