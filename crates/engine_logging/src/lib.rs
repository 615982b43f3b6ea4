#![deny(missing_docs)]
//! Shared logging utilities for the grabber workspace.
//!
//! This crate provides the `engine_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger. Every macro accepts
//! an optional `worker = <index>;` prefix which tags the line with the poll
//! worker that produced it:
//!
//! ```ignore
//! engine_info!("started {} workers", 4);
//! engine_warn!(worker = 2; "list request failed: {}", err);
//! ```

#[doc(hidden)]
pub use log as __log;

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! engine_trace {
    (worker = $worker:expr; $($arg:tt)*) => {{
        $crate::__log::trace!("[worker {}] {}", $worker, format_args!($($arg)*));
    }};
    ($($arg:tt)*) => {{
        $crate::__log::trace!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! engine_info {
    (worker = $worker:expr; $($arg:tt)*) => {{
        $crate::__log::info!("[worker {}] {}", $worker, format_args!($($arg)*));
    }};
    ($($arg:tt)*) => {{
        $crate::__log::info!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! engine_debug {
    (worker = $worker:expr; $($arg:tt)*) => {{
        $crate::__log::debug!("[worker {}] {}", $worker, format_args!($($arg)*));
    }};
    ($($arg:tt)*) => {{
        $crate::__log::debug!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! engine_warn {
    (worker = $worker:expr; $($arg:tt)*) => {{
        $crate::__log::warn!("[worker {}] {}", $worker, format_args!($($arg)*));
    }};
    ($($arg:tt)*) => {{
        $crate::__log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! engine_error {
    (worker = $worker:expr; $($arg:tt)*) => {{
        $crate::__log::error!("[worker {}] {}", $worker, format_args!($($arg)*));
    }};
    ($($arg:tt)*) => {{
        $crate::__log::error!($($arg)*);
    }};
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized, so
/// every test may call it.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, ConfigBuilder, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Keep reqwest/hyper internals out of test output.
    let config = ConfigBuilder::new()
        .add_filter_ignore_str("hyper")
        .add_filter_ignore_str("reqwest")
        .add_filter_ignore_str("wiremock")
        .build();

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        config,
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
