use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use tracing_subscriber::fmt;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::state_dir;

const DEFAULT_FILTER: &str = "warn";
const TRACE_FILE: &str = "trace.log";

/// Install the global subscriber.
///
/// With `debug` on, events go to `~/.autoyes/trace.log` at `debug` level
/// unless `RUST_LOG` says otherwise, so the raw-mode terminal stays clean.
/// Otherwise only warnings and errors reach stderr, with `\r\n` line endings
/// because the terminal does no output translation while raw.
pub fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { DEFAULT_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    if debug {
        if let Some(dir) = state_dir() {
            match open_trace_file(&dir.join(TRACE_FILE)) {
                Ok(file) => {
                    let file_layer = fmt::layer()
                        .with_writer(file)
                        .with_ansi(false)
                        .with_target(true)
                        .with_timer(UtcTime::rfc_3339());
                    let _ = tracing_subscriber::registry()
                        .with(filter)
                        .with(file_layer)
                        .try_init();
                    return;
                }
                Err(err) => {
                    eprintln!("Warning: failed to open trace log: {}", err);
                }
            }
        }
    }

    let stderr_layer = fmt::layer()
        .with_writer(|| CrlfWriter::new(io::stderr()))
        .with_target(false)
        .without_time();
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init();
}

/// Expands bare `\n` to `\r\n`.
struct CrlfWriter<W> {
    inner: W,
}

impl<W: Write> CrlfWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner }
    }
}

impl<W: Write> Write for CrlfWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut start = 0;
        for (index, &byte) in buf.iter().enumerate() {
            if byte == b'\n' && (index == 0 || buf[index - 1] != b'\r') {
                self.inner.write_all(&buf[start..index])?;
                self.inner.write_all(b"\r\n")?;
                start = index + 1;
            }
        }
        self.inner.write_all(&buf[start..])?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

fn open_trace_file(path: &Path) -> io::Result<std::fs::File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn through_crlf(input: &[u8]) -> Vec<u8> {
        let mut writer = CrlfWriter::new(Vec::new());
        writer.write_all(input).unwrap();
        writer.flush().unwrap();
        writer.inner
    }

    #[test]
    fn bare_newlines_gain_carriage_returns() {
        assert_eq!(
            through_crlf(b" WARN failed to resize pty\n"),
            b" WARN failed to resize pty\r\n"
        );
        assert_eq!(through_crlf(b"a\nb\n"), b"a\r\nb\r\n");
        assert_eq!(through_crlf(b"\n"), b"\r\n");
    }

    #[test]
    fn existing_crlf_is_left_alone() {
        assert_eq!(through_crlf(b"a\r\nb"), b"a\r\nb");
        assert_eq!(through_crlf(b"no newline"), b"no newline");
    }
}
