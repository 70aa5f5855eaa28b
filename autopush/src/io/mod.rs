//! I/O helpers for the autopush loop.

pub mod config;
pub mod gateway;
pub mod git;
pub mod idler;
pub mod prompt;
