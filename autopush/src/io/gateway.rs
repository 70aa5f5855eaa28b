//! Version-control gateway abstraction.
//!
//! The [`Gateway`] trait decouples the loop from the actual `git` subprocess
//! calls. Tests use scripted gateways that record calls and return
//! predetermined outputs without touching a repository.

use anyhow::Result;

use crate::core::types::GitOutput;

/// Stage/commit/push primitives plus the read-only queries the loop needs.
///
/// `Err` means the command could not be run at all. A command that ran and
/// exited non-zero is reported as `Ok` with `success == false`. No method
/// retries.
pub trait Gateway {
    /// True if there are no tracked or untracked changes.
    fn is_clean(&self) -> Result<bool>;

    /// Stage every change in the working directory.
    fn stage_all(&self) -> Result<GitOutput>;

    /// True if the index differs from `HEAD`.
    fn has_staged_changes(&self) -> Result<bool>;

    /// Record the staged changes. `message` is passed as a single argument.
    fn commit(&self, message: &str) -> Result<GitOutput>;

    /// Push the current branch to its upstream.
    fn push(&self) -> Result<GitOutput>;

    /// Number of local commits not yet on the upstream branch.
    fn commits_ahead(&self) -> Result<u32>;
}
