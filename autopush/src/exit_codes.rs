//! Stable exit codes for the autopush binary.
//!
//! The loop itself never exits; only startup can fail. Malformed flags are
//! rejected by clap with its own usage exit code.

/// Startup failed: unreadable or invalid config, or the directory is not a repository.
pub const INVALID: i32 = 1;
