//! Logging configuration for the kiln compiler.
//!
//! This module provides utilities for initializing and configuring logging
//! using the `log` and `env_logger` crates.
//!
//! # Usage
//!
//! ```rust,ignore
//! use compiler::logging;
//!
//! logging::init();
//! logging::init_from_env();
//! logging::init_with_level(log::LevelFilter::Debug);
//! ```
//!
//! # Log Levels
//!
//! - `error!` - compilation failures
//! - `warn!`  - recoverable oddities (unused import, shadowed name)
//! - `info!`  - pipeline phases (resolve, lower, emit)
//! - `debug!` - per-function lowering
//! - `trace!` - per-expression lowering, type details
//!
//! # Environment Variable
//!
//! ```bash
//! RUST_LOG=info ./kilnc compile main.kiln
//! RUST_LOG=compiler::walker=trace ./kilnc compile main.kiln
//! ```

use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize logging with sensible defaults (Warn level).
///
/// This only initializes once; subsequent calls are no-ops.
pub fn init() {
    init_with_level(LevelFilter::Warn);
}

/// Initialize logging with a specific level.
pub fn init_with_level(level: LevelFilter) {
    INIT.call_once(|| {
        Builder::new()
            .filter_level(level)
            .format(|buf, record| {
                writeln!(
                    buf,
                    "[{:5}] {}:{} - {}",
                    record.level(),
                    record.file().unwrap_or("unknown"),
                    record.line().unwrap_or(0),
                    record.args()
                )
            })
            .init();
    });
}

/// Initialize logging from the RUST_LOG environment variable.
///
/// If RUST_LOG is not set, defaults to Warn level.
pub fn init_from_env() {
    INIT.call_once(|| {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    });
}

/// Initialize logging for tests: quiet unless RUST_LOG is set explicitly.
pub fn init_test() {
    let _ = env_logger::builder()
        .filter_level(LevelFilter::Warn)
        .is_test(true)
        .try_init();
}

/// Check whether `init*` has been called. Doesn't guarantee output will
/// actually appear — only that initialization was attempted.
pub fn is_initialized() -> bool {
    INIT.is_completed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_test();
        init_test();
        init_test();
    }

    #[test]
    fn log_levels_do_not_panic() {
        init_test();
        log::error!("test error message");
        log::warn!("test warning message");
        log::info!("test info message");
        log::debug!("test debug message");
        log::trace!("test trace message");
    }
}
