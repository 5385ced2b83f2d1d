//! Runtime tunables for the proxy engine.
//!
//! There is no configuration file: values come from the command line and
//! the environment, and everything else uses the defaults below.

use std::path::PathBuf;
use std::time::Duration;

/// Ctrl-Y.
pub const DEFAULT_TOGGLE_BYTE: u8 = 0x19;
pub const DEFAULT_WINDOW_CAPACITY: usize = 4096;
pub const DEFAULT_MATCH_LINES: usize = 10;
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(150);
pub const DEFAULT_READ_CHUNK: usize = 4096;
pub const DEFAULT_TICK: Duration = Duration::from_millis(100);

/// Environment variable that enables the debug log when set to `1`.
pub const DEBUG_ENV_VAR: &str = "AUTOYES_DEBUG";

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Byte that toggles auto-approve. Never forwarded to the child.
    pub toggle_byte: u8,
    /// Capacity of the raw output tail used for matching.
    pub window_capacity: usize,
    /// Number of trailing logical lines the matcher looks at.
    pub match_lines: usize,
    /// Pause between detecting a prompt and injecting the response.
    pub settle_delay: Duration,
    /// Maximum bytes read from either side per readiness event.
    pub read_chunk: usize,
    /// Upper bound on a single readiness wait, so signal flags are observed.
    pub tick: Duration,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            toggle_byte: DEFAULT_TOGGLE_BYTE,
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            match_lines: DEFAULT_MATCH_LINES,
            settle_delay: DEFAULT_SETTLE_DELAY,
            read_chunk: DEFAULT_READ_CHUNK,
            tick: DEFAULT_TICK,
        }
    }
}

/// Returns `~/.autoyes`, or `None` when the home directory is unknown.
pub fn state_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".autoyes"))
}

/// Default location of the debug event log.
pub fn default_log_path() -> PathBuf {
    state_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("autoyes.log")
}

/// Whether the debug log was requested through the environment.
pub fn debug_from_env() -> bool {
    debug_flag_enabled(std::env::var(DEBUG_ENV_VAR).ok().as_deref())
}

fn debug_flag_enabled(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some("1"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_engine_constants() {
        let config = ProxyConfig::default();
        assert_eq!(config.toggle_byte, 0x19);
        assert_eq!(config.window_capacity, 4096);
        assert_eq!(config.match_lines, 10);
        assert_eq!(config.settle_delay, Duration::from_millis(150));
    }

    #[test]
    fn debug_flag_requires_exactly_one() {
        assert!(debug_flag_enabled(Some("1")));
        assert!(debug_flag_enabled(Some(" 1 ")));
        assert!(!debug_flag_enabled(Some("0")));
        assert!(!debug_flag_enabled(Some("true")));
        assert!(!debug_flag_enabled(None));
    }

    #[test]
    fn log_path_lives_in_state_dir() {
        let path = default_log_path();
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("autoyes.log"));
    }
}
