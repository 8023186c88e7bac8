//! Shared logging bootstrap for consistent tracing across the workspace
//!
//! Test binaries and embedding programs call [`init_tracing`] once; repeat
//! initialisation is a no-op so parallel test binaries can call it freely.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the tracing subscriber with an optional explicit log level.
///
/// Level priority: explicit argument > `RUST_LOG` > `"info"`.
pub fn init_tracing_with_level(log_level: Option<&str>) {
    let level_filter = if let Some(level) = log_level {
        level.to_string()
    } else {
        EnvFilter::try_from_default_env()
            .map(|f| f.to_string())
            .unwrap_or_else(|_| "info".to_string())
    };

    let _ = fmt()
        .with_env_filter(EnvFilter::new(&level_filter))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

/// Initialize the tracing subscriber from the environment.
pub fn init_tracing() {
    init_tracing_with_level(None);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeat_initialisation_is_harmless() {
        init_tracing();
        init_tracing_with_level(Some("debug"));
        init_tracing();
    }
}
