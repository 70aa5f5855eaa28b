//! Core type definitions shared across the loop.

/// Captured result of a git invocation that ran to completion.
///
/// `text` holds stdout followed by stderr, trimmed. Launch failures (missing
/// executable, unreadable workdir) are reported as errors instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitOutput {
    pub success: bool,
    pub text: String,
}

impl GitOutput {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            success: true,
            text: text.into(),
        }
    }

    pub fn failed(text: impl Into<String>) -> Self {
        Self {
            success: false,
            text: text.into(),
        }
    }
}

/// How a single commit attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitClass {
    Committed,
    /// Nothing new to record. Benign, never reported as an error.
    NothingToCommit,
    Failed,
}

/// Result of one loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationOutcome {
    /// Working directory was clean; nothing was staged.
    Clean,
    /// Changes were staged but there was nothing to record.
    NothingToCommit,
    StageFailed,
    CommitFailed,
    /// Local revisions reached the remote.
    Pushed,
    /// A commit exists locally but the push failed.
    PushFailed,
}

impl IterationOutcome {
    /// Only a completed push re-checks immediately; everything else idles.
    pub fn should_idle(self) -> bool {
        self != IterationOutcome::Pushed
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IterationOutcome::Clean => "clean",
            IterationOutcome::NothingToCommit => "nothing_to_commit",
            IterationOutcome::StageFailed => "stage_failed",
            IterationOutcome::CommitFailed => "commit_failed",
            IterationOutcome::Pushed => "pushed",
            IterationOutcome::PushFailed => "push_failed",
        }
    }
}
