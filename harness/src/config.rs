//! Teardown policy flags
//!
//! The teardown pipeline is steered by a handful of process-wide flags, read
//! from the environment at teardown time so a value exported mid-run still
//! takes effect. `keep_volumes_on_failure` additionally has a programmatic
//! setter for embedding programs that do not want to go through the
//! environment.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

/// Non-empty ⇒ retain volumes when the test failed.
pub const SKIP_FAILURE_CLEANUP_ENV: &str = "ICTEST_SKIP_FAILURE_CLEANUP";

/// Host root directory for exported coverage data.
pub const COVERAGE_OUTPUT_ENV: &str = "ICTEST_GOCOVERDIR";

/// Unset ⇒ capture container logs only on failure; `"always"` ⇒ always.
pub const SHOW_CONTAINER_LOGS_ENV: &str = "SHOW_CONTAINER_LOGS";

/// Override for the default log tail length.
pub const CONTAINER_LOG_TAIL_ENV: &str = "CONTAINER_LOG_TAIL";

/// Non-empty ⇒ skip the entire stop/remove/prune path.
pub const KEEP_CONTAINERS_ENV: &str = "KEEP_CONTAINERS";

/// In-container variable naming the directory that holds coverage
/// artifacts. Chain-node images are Go binaries, so this is the Go runtime's
/// coverage variable.
pub const CONTAINER_COVERAGE_ENV: &str = "GOCOVERDIR";

const DEFAULT_LOG_TAIL: &str = "1000";

static KEEP_VOLUMES_ON_FAILURE: OnceLock<AtomicBool> = OnceLock::new();

fn keep_volumes_flag() -> &'static AtomicBool {
    KEEP_VOLUMES_ON_FAILURE.get_or_init(|| {
        let from_env = std::env::var(SKIP_FAILURE_CLEANUP_ENV)
            .map(|v| !v.is_empty())
            .unwrap_or(false);
        AtomicBool::new(from_env)
    })
}

/// Programmatic override for volume retention on failure, equivalent to
/// setting [`SKIP_FAILURE_CLEANUP_ENV`] before the process started.
pub fn keep_volumes_on_failure(keep: bool) {
    keep_volumes_flag().store(keep, Ordering::Relaxed);
}

/// When container logs are captured during teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    /// Capture only when the test failed (variable unset).
    OnFailure,
    /// Capture unconditionally (`SHOW_CONTAINER_LOGS=always`).
    Always,
    /// Never capture (any other value).
    Never,
}

impl LogMode {
    fn parse(raw: &str) -> Self {
        match raw {
            "" => LogMode::OnFailure,
            "always" => LogMode::Always,
            _ => LogMode::Never,
        }
    }
}

/// Resolved teardown flags for one reaper run.
#[derive(Debug, Clone)]
pub struct TeardownPolicy {
    pub keep_volumes_on_failure: bool,
    pub keep_containers: bool,
    pub log_mode: LogMode,
    /// Tail length handed to the engine verbatim (Docker also accepts "all").
    pub log_tail: String,
}

impl TeardownPolicy {
    /// Read the current flags from the process environment.
    pub fn from_env() -> Self {
        let show_logs = std::env::var(SHOW_CONTAINER_LOGS_ENV).unwrap_or_default();
        let log_tail = match std::env::var(CONTAINER_LOG_TAIL_ENV) {
            Ok(tail) if !tail.is_empty() => tail,
            _ => DEFAULT_LOG_TAIL.to_string(),
        };
        Self {
            keep_volumes_on_failure: keep_volumes_flag().load(Ordering::Relaxed),
            keep_containers: std::env::var(KEEP_CONTAINERS_ENV)
                .map(|v| !v.is_empty())
                .unwrap_or(false),
            log_mode: LogMode::parse(&show_logs),
            log_tail,
        }
    }

    /// Whether container logs should be captured for a test in this state.
    pub fn should_capture_logs(&self, test_failed: bool) -> bool {
        match self.log_mode {
            LogMode::Always => true,
            LogMode::OnFailure => test_failed,
            LogMode::Never => false,
        }
    }
}

impl Default for TeardownPolicy {
    fn default() -> Self {
        Self {
            keep_volumes_on_failure: false,
            keep_containers: false,
            log_mode: LogMode::OnFailure,
            log_tail: DEFAULT_LOG_TAIL.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_capture_decision() {
        let mut policy = TeardownPolicy::default();
        assert!(policy.should_capture_logs(true), "failed test captures by default");
        assert!(!policy.should_capture_logs(false), "passing test stays quiet");

        policy.log_mode = LogMode::Always;
        assert!(policy.should_capture_logs(false));

        policy.log_mode = LogMode::Never;
        assert!(!policy.should_capture_logs(true));
    }

    #[test]
    fn test_default_tail_length() {
        assert_eq!(TeardownPolicy::default().log_tail, "1000");
    }

    // Single test for everything environment-backed; the environment is
    // process-global and tests run in parallel threads.
    #[test]
    fn test_policy_from_env() {
        std::env::set_var(SHOW_CONTAINER_LOGS_ENV, "always");
        std::env::set_var(CONTAINER_LOG_TAIL_ENV, "50");
        std::env::set_var(KEEP_CONTAINERS_ENV, "1");

        let policy = TeardownPolicy::from_env();
        assert_eq!(policy.log_mode, LogMode::Always);
        assert_eq!(policy.log_tail, "50");
        assert!(policy.keep_containers);

        std::env::remove_var(SHOW_CONTAINER_LOGS_ENV);
        std::env::remove_var(CONTAINER_LOG_TAIL_ENV);
        std::env::remove_var(KEEP_CONTAINERS_ENV);

        let policy = TeardownPolicy::from_env();
        assert_eq!(policy.log_mode, LogMode::OnFailure);
        assert_eq!(policy.log_tail, "1000");
        assert!(!policy.keep_containers);

        keep_volumes_on_failure(true);
        assert!(TeardownPolicy::from_env().keep_volumes_on_failure);
        keep_volumes_on_failure(false);
        assert!(!TeardownPolicy::from_env().keep_volumes_on_failure);
    }
}
