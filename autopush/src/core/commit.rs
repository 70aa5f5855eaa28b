//! Classification of `git commit` results.

use crate::core::types::{CommitClass, GitOutput};

/// Phrases git prints when a commit had nothing new to record.
const NOOP_MARKERS: [&str; 3] = ["nothing to commit", "up to date", "no changes added to commit"];

/// True if the captured output says there was nothing to record.
pub fn is_noop_output(text: &str) -> bool {
    let lower = text.to_lowercase();
    NOOP_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Classify a finished commit invocation.
///
/// Exit status 0 is always a commit; the echoed subject may contain a marker.
/// Markers only separate git's non-zero "nothing to commit" exit from a real
/// failure.
pub fn classify_commit(output: &GitOutput) -> CommitClass {
    if output.success {
        CommitClass::Committed
    } else if is_noop_output(&output.text) {
        CommitClass::NothingToCommit
    } else {
        CommitClass::Failed
    }
}
