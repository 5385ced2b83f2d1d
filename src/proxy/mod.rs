//! The single-threaded proxy loop.
//!
//! One loop instance owns the output window and the auto-approve flag, so
//! every mutation of either happens on the loop thread in the order the
//! bytes arrived. Output always reaches the terminal before it is matched,
//! and a response is only injected after that output has been flushed.

mod state;
mod status;

pub use state::{
    AutoApprove, ExitReason, LoopState, Outcome, FAILURE_EXIT_STATUS, INTERRUPTED_EXIT_STATUS,
};
pub use status::{banner, StatusLine, Tone};

use std::borrow::Cow;
use std::fs::File;
use std::io::{self, Read, Write};
use std::os::unix::io::{AsRawFd, RawFd};
use std::thread;

use crate::config::ProxyConfig;
use crate::debug_log::{DebugEvent, DebugLog};
use crate::error::{ProxyError, Result};
use crate::patterns::{normalize, MatchResult, PatternSet, PromptMatcher};
use crate::pty::{terminal_size, wait_readable, Session};
use crate::shutdown::ShutdownSignals;
use crate::window::OutputWindow;

/// Install signal handlers, then spawn `command` with `control_fd` as the
/// controlling terminal.
///
/// Handlers go in first: a termination signal arriving once the terminal is
/// raw must set a flag rather than kill the process.
pub fn start_session(
    command: &str,
    args: &[String],
    control_fd: RawFd,
) -> Result<(Session, ShutdownSignals)> {
    let signals =
        ShutdownSignals::install().map_err(|err| ProxyError::io("installing signal handlers", err))?;
    let session = Session::open_on(command, args, control_fd)?;
    Ok((session, signals))
}

pub struct ProxyLoop {
    config: ProxyConfig,
    matcher: PromptMatcher,
    window: OutputWindow,
    auto_approve: AutoApprove,
    state: LoopState,
    status: StatusLine,
    log: DebugLog,
    responses_sent: usize,
}

impl ProxyLoop {
    pub fn new(config: ProxyConfig, status: StatusLine, log: DebugLog) -> Self {
        let matcher = PromptMatcher::new(PatternSet::builtin(), config.match_lines);
        let window = OutputWindow::new(config.window_capacity);
        Self {
            config,
            matcher,
            window,
            auto_approve: AutoApprove::default(),
            state: LoopState::Running,
            status,
            log,
            responses_sent: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn auto_approve_enabled(&self) -> bool {
        self.auto_approve.is_enabled()
    }

    pub fn window(&self) -> &OutputWindow {
        &self.window
    }

    /// Number of auto-responses injected so far.
    pub fn responses_sent(&self) -> usize {
        self.responses_sent
    }

    /// Handle bytes typed on the controlling terminal.
    ///
    /// Each toggle byte flips auto-approve once and is dropped; everything
    /// else goes to the child unchanged and in order.
    pub fn handle_input<W: Write>(&mut self, data: &[u8], child: &mut W) -> Result<()> {
        if self.log.is_enabled() {
            self.log.record(DebugEvent::Input {
                raw: String::from_utf8_lossy(data).into_owned(),
            });
        }

        let toggle = self.config.toggle_byte;
        let toggles = data.iter().filter(|&&byte| byte == toggle).count();
        for _ in 0..toggles {
            self.toggle_auto_approve();
        }

        let forward: Cow<'_, [u8]> = if toggles == 0 {
            Cow::Borrowed(data)
        } else {
            Cow::Owned(data.iter().copied().filter(|&byte| byte != toggle).collect())
        };
        if forward.is_empty() {
            return Ok(());
        }

        child
            .write_all(&forward)
            .and_then(|_| child.flush())
            .map_err(|err| ProxyError::io("forwarding input to child", err))
    }

    /// Handle a chunk of child output: record it, show it, then answer a
    /// detected prompt if auto-approve is on.
    ///
    /// Returns the match that triggered a response, if any.
    pub fn handle_output<T: Write, W: Write>(
        &mut self,
        data: &[u8],
        terminal: &mut T,
        child: &mut W,
    ) -> Result<Option<MatchResult>> {
        self.window.extend(data);

        terminal
            .write_all(data)
            .and_then(|_| terminal.flush())
            .map_err(|err| ProxyError::io("writing output to terminal", err))?;

        if self.log.is_enabled() {
            self.log.record(DebugEvent::Output {
                raw: String::from_utf8_lossy(data).into_owned(),
                clean: normalize(data),
            });
        }

        if !self.auto_approve.is_enabled() {
            return Ok(None);
        }

        let evaluation = self.matcher.evaluate(self.window.as_slice());
        if self.log.is_enabled() {
            self.log.record(DebugEvent::Evaluation {
                tail: evaluation.tail.clone(),
                matched: evaluation.result.is_some(),
            });
        }
        let Some(found) = evaluation.result else {
            return Ok(None);
        };

        tracing::debug!(
            pattern = found.pattern_name,
            index = found.pattern_index,
            matched = %found.matched,
            "approval prompt detected"
        );
        if self.log.is_enabled() {
            self.log.record(DebugEvent::Matched {
                pattern_index: found.pattern_index,
                pattern: found.pattern_name.to_string(),
                matched: found.matched.clone(),
                response: found.response.label().to_string(),
            });
        }

        if !self.config.settle_delay.is_zero() {
            thread::sleep(self.config.settle_delay);
        }
        child
            .write_all(found.response.bytes())
            .and_then(|_| child.flush())
            .map_err(|err| ProxyError::io("injecting auto-response", err))?;
        self.window.clear();
        self.responses_sent += 1;
        self.log.record(DebugEvent::Response {
            bytes: String::from_utf8_lossy(found.response.bytes()).into_owned(),
        });

        let message = format!("Auto-responding: YES ({})", found.response.label());
        self.notify(&message, Tone::Notice, false);
        Ok(Some(found))
    }

    /// Proxy between `input`/`terminal` and the session until the child
    /// exits, a termination signal arrives or a handle fails, then close the
    /// session.
    ///
    /// `input` is the controlling terminal's input; `None` proxies output
    /// only.
    pub fn run<T: Write>(
        &mut self,
        session: &mut Session,
        input: Option<File>,
        terminal: &mut T,
        signals: &ShutdownSignals,
    ) -> Outcome {
        self.state = LoopState::Running;
        self.log.record(DebugEvent::SessionStart {
            command: session.command_line(),
        });

        let mut input = input;
        let reason = self.pump(session, &mut input, terminal, signals);

        self.state = LoopState::Closing;
        tracing::debug!(%reason, "closing session");
        drop(input);
        let child_exit_code = session.close();
        self.state = LoopState::Closed;

        self.log.record(DebugEvent::SessionEnd {
            reason: reason.to_string(),
            exit_code: child_exit_code,
        });
        self.log.close();

        Outcome {
            reason,
            child_exit_code,
        }
    }

    fn pump<T: Write>(
        &mut self,
        session: &mut Session,
        input: &mut Option<File>,
        terminal: &mut T,
        signals: &ShutdownSignals,
    ) -> ExitReason {
        let mut buf = vec![0u8; self.config.read_chunk.max(1)];
        loop {
            if signals.is_shutting_down() {
                return ExitReason::Interrupted;
            }
            if signals.take_resize() {
                resize_to_terminal(session);
            }

            let input_fd = input.as_ref().map(|file| file.as_raw_fd());
            let ready = match wait_readable(input_fd, session.master_fd(), self.config.tick) {
                Ok(ready) => ready,
                Err(err) => return ExitReason::Failed(ProxyError::io("waiting for readiness", err)),
            };
            if signals.is_shutting_down() {
                return ExitReason::Interrupted;
            }

            if ready.input {
                if let Some(file) = input.as_mut() {
                    match file.read(&mut buf) {
                        Ok(0) => {
                            tracing::debug!("controlling input closed");
                            *input = None;
                        }
                        Ok(count) => {
                            if let Err(err) = self.handle_input(&buf[..count], session) {
                                return ExitReason::Failed(err);
                            }
                        }
                        Err(err) if is_transient(&err) => {}
                        Err(err) => {
                            return ExitReason::Failed(ProxyError::io(
                                "reading controlling input",
                                err,
                            ))
                        }
                    }
                }
            }

            if ready.output {
                match session.read_output(&mut buf) {
                    Ok(0) => return ExitReason::ChildExited,
                    Ok(count) => {
                        tracing::trace!(bytes = count, "child output");
                        if let Err(err) = self.handle_output(&buf[..count], terminal, session) {
                            return ExitReason::Failed(err);
                        }
                    }
                    Err(err) if is_transient(&err) => {}
                    Err(err) => {
                        return ExitReason::Failed(ProxyError::io("reading child output", err))
                    }
                }
            }
        }
    }

    fn toggle_auto_approve(&mut self) {
        if self.auto_approve.toggle() {
            self.notify("Auto-approve mode: ON", Tone::Enabled, true);
        } else {
            self.notify("Auto-approve mode: OFF", Tone::Disabled, true);
        }
    }

    /// Report a status change to the logs and, when `visible`, the status line.
    fn notify(&mut self, message: &str, tone: Tone, visible: bool) {
        tracing::info!("{}", message);
        self.log.record(DebugEvent::Status {
            message: message.to_string(),
        });
        if visible {
            if let Err(err) = self.status.show(message, tone) {
                tracing::debug!(error = %err, "status line write failed");
            }
        }
    }
}

fn resize_to_terminal(session: &Session) {
    let Some((cols, rows)) = terminal_size() else {
        return;
    };
    match session.resize(cols, rows) {
        Ok(()) => tracing::debug!(cols, rows, "resized pty"),
        Err(err) => tracing::warn!(error = %err, "failed to resize pty"),
    }
}

fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
    )
}
