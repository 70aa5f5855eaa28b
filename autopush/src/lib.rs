//! Stage, commit and push a git working directory on a loop.
//!
//! Each iteration checks the working directory, stages everything, gives the
//! operator a bounded window to type a commit message, commits and pushes.
//! The architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (idle durations, commit output
//!   classification, outcome types). No I/O.
//! - **[`io`]**: Side-effecting operations (git subprocesses, stdin prompt,
//!   sleeping, config file). Behind traits so tests can script them.
//!
//! Orchestration modules ([`step`], [`looping`]) coordinate the two.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod looping;
pub mod step;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
