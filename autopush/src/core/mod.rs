//! Deterministic, pure logic shared by the loop.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! values (captured git output, configured durations) and return
//! deterministic results suitable for tests.

pub mod commit;
pub mod idle;
pub mod types;
