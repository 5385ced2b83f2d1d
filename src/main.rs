use std::fs::File;
use std::io::{self, IsTerminal};
use std::os::fd::AsFd;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use autoyes::config::{debug_from_env, default_log_path, ProxyConfig};
use autoyes::debug_log::DebugLog;
use autoyes::error::ProxyError;
use autoyes::logging::init_tracing;
use autoyes::proxy::{banner, start_session, ExitReason, ProxyLoop, StatusLine};

/// Exit status when the wrapped command could not be started.
const SPAWN_FAILURE_EXIT_STATUS: i32 = 127;

#[derive(Debug, Parser)]
#[command(
    name = "autoyes",
    version,
    about = "Run a command in a pseudo-terminal and answer its approval prompts automatically",
    after_help = "Controls:\n  Ctrl-Y  toggle auto-approve (starts ON)\n\nSet AUTOYES_DEBUG=1 to enable the debug log."
)]
struct Cli {
    /// Write a JSON-lines debug log of output, matches and responses
    #[arg(long)]
    debug: bool,

    /// Debug log location (default: ~/.autoyes/autoyes.log)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Command to run, followed by its arguments (passed through unchanged)
    #[arg(required = true, num_args = 1.., trailing_var_arg = true, value_name = "COMMAND")]
    command: Vec<String>,
}

impl Cli {
    fn debug_enabled(&self) -> bool {
        self.debug || debug_from_env()
    }

    fn program(&self) -> &str {
        self.command.first().map(String::as_str).unwrap_or_default()
    }

    fn program_args(&self) -> &[String] {
        self.command.get(1..).unwrap_or_default()
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let debug = cli.debug_enabled();
    init_tracing(debug);

    let log = if debug {
        let path = cli.log_file.clone().unwrap_or_else(default_log_path);
        DebugLog::open(&path)
            .with_context(|| format!("failed to open debug log {}", path.display()))?
    } else {
        DebugLog::disabled()
    };

    let status = StatusLine::stderr();
    tracing::debug!(visible = status.is_visible(), "status line");
    let config = ProxyConfig::default();

    eprintln!(
        "{}",
        banner(&format!("Running: {} (Ctrl-Y toggles auto-approve)", cli.program()))
    );

    let (mut session, signals) =
        match start_session(cli.program(), cli.program_args(), libc::STDIN_FILENO) {
            Ok(started) => started,
            Err(ProxyError::Session(err)) => {
                eprintln!("Error: {}", err);
                std::process::exit(SPAWN_FAILURE_EXIT_STATUS);
            }
            Err(err) => return Err(err).context("failed to start session"),
        };
    let input = controlling_input();

    let mut proxy = ProxyLoop::new(config, status, log);
    let outcome = {
        let mut stdout = io::stdout().lock();
        proxy.run(&mut session, input, &mut stdout, &signals)
    };
    drop(session);

    eprintln!("\r\n{}", banner("Session ended"));
    if let ExitReason::Failed(err) = &outcome.reason {
        eprintln!("Error: {}", err);
    }
    tracing::debug!(reason = %outcome.reason, exit_code = ?outcome.child_exit_code, "exiting");

    std::process::exit(outcome.exit_status());
}

/// A private handle on stdin so the loop can read it without going through
/// the buffered `Stdin` lock.
fn controlling_input() -> Option<File> {
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        tracing::debug!("stdin is not a terminal; forwarding it as-is");
    }
    match stdin.as_fd().try_clone_to_owned() {
        Ok(fd) => Some(File::from(fd)),
        Err(err) => {
            tracing::warn!(error = %err, "cannot duplicate stdin; input will not be forwarded");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Cli;
    use clap::Parser;

    #[test]
    fn parses_command_and_passes_args_through() {
        let cli = Cli::try_parse_from(["autoyes", "claude", "--model", "opus", "-p"]).unwrap();
        assert_eq!(cli.program(), "claude");
        assert_eq!(cli.program_args(), ["--model", "opus", "-p"]);
        assert!(!cli.debug);
    }

    #[test]
    fn flags_before_command_belong_to_autoyes() {
        let cli = Cli::try_parse_from([
            "autoyes",
            "--debug",
            "--log-file",
            "/tmp/x.log",
            "npm",
            "install",
        ])
        .unwrap();
        assert!(cli.debug);
        assert_eq!(cli.log_file.as_ref().unwrap().to_str(), Some("/tmp/x.log"));
        assert_eq!(cli.program(), "npm");
        assert_eq!(cli.program_args(), ["install"]);
    }

    #[test]
    fn flags_after_command_belong_to_child() {
        let cli = Cli::try_parse_from(["autoyes", "tool", "--debug"]).unwrap();
        assert!(!cli.debug);
        assert_eq!(cli.program(), "tool");
        assert_eq!(cli.program_args(), ["--debug"]);
    }

    #[test]
    fn command_is_required() {
        assert!(Cli::try_parse_from(["autoyes"]).is_err());
    }
}
