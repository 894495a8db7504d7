#![deny(missing_docs)]
//! Shared logging utilities for the sniffer workspace.
//!
//! The engine logs through the `log` facade and stays silent unless the
//! embedding application installs a backend. This crate provides the
//! `simplelog` terminal backend used by front-ends and tests.

use log::LevelFilter;
use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

/// Initializes a terminal logger at the given level.
///
/// Returns `false` if a global logger was already installed, in which case
/// the existing logger is left untouched.
pub fn init_terminal(level: LevelFilter) -> bool {
    CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )])
    .is_ok()
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = init_terminal(level);
}
