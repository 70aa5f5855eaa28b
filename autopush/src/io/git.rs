//! Git adapter for the autopush loop.
//!
//! Every call is a blocking `git` subprocess in the configured working
//! directory. Arguments are passed verbatim; nothing goes through a shell.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument, warn};

use crate::core::types::GitOutput;
use crate::io::gateway::Gateway;

/// Parsed `git status --porcelain` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    /// 2-letter XY code, or "??" for untracked.
    pub code: String,
    /// Path for the changed file.
    pub path: String,
}

/// Wrapper for executing git commands in a working directory.
#[derive(Debug, Clone)]
pub struct Git {
    workdir: PathBuf,
}

impl Git {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Fail unless the working directory is inside a git work tree.
    pub fn ensure_repository(&self) -> Result<()> {
        let out = self.run_capture(&["rev-parse", "--is-inside-work-tree"])?;
        if out.trim() != "true" {
            return Err(anyhow!(
                "{} is not inside a git work tree",
                self.workdir.display()
            ));
        }
        Ok(())
    }

    /// Return the current branch name (errors on detached HEAD).
    #[instrument(skip_all)]
    pub fn current_branch(&self) -> Result<String> {
        let out = self.run_capture(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        let name = out.trim().to_string();
        if name == "HEAD" {
            warn!("detached HEAD detected");
            return Err(anyhow!("detached HEAD"));
        }
        debug!(branch = %name, "current branch");
        Ok(name)
    }

    /// Get status entries (including untracked) in porcelain format.
    pub fn status_porcelain(&self) -> Result<Vec<StatusEntry>> {
        let out = self.run_capture(&["status", "--porcelain=v1", "-uall"])?;
        let mut entries = Vec::new();
        for line in out.lines() {
            if line.trim().is_empty() {
                continue;
            }
            entries.push(parse_status_line(line)?);
        }
        Ok(entries)
    }

    fn run_capture(&self, args: &[&str]) -> Result<String> {
        let output = self.run_checked(args)?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn run_checked(&self, args: &[&str]) -> Result<Output> {
        let output = self.run(args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("git {} failed: {}", args.join(" "), stderr.trim()));
        }
        Ok(output)
    }

    /// Run a mutating command and keep its output for the caller to judge.
    fn run_captured(&self, args: &[&str]) -> Result<GitOutput> {
        let output = self.run(args)?;
        let result = GitOutput {
            success: output.status.success(),
            text: combined_text(&output),
        };
        debug!(
            command = %args.first().copied().unwrap_or_default(),
            exit_code = ?output.status.code(),
            "git finished"
        );
        Ok(result)
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .with_context(|| format!("spawn git {}", args.join(" ")))
    }
}

impl Gateway for Git {
    #[instrument(skip_all)]
    fn is_clean(&self) -> Result<bool> {
        let entries = self.status_porcelain()?;
        debug!(changed = entries.len(), "worktree status");
        Ok(entries.is_empty())
    }

    fn stage_all(&self) -> Result<GitOutput> {
        self.run_captured(&["add", "-A"])
    }

    fn has_staged_changes(&self) -> Result<bool> {
        let out = self.run_capture(&["diff", "--cached", "--name-only"])?;
        Ok(!out.trim().is_empty())
    }

    #[instrument(skip_all)]
    fn commit(&self, message: &str) -> Result<GitOutput> {
        self.run_captured(&["commit", "-m", message])
    }

    #[instrument(skip_all)]
    fn push(&self) -> Result<GitOutput> {
        self.run_captured(&["push"])
    }

    fn commits_ahead(&self) -> Result<u32> {
        let out = self.run_capture(&["rev-list", "--count", "@{upstream}..HEAD"])?;
        out.trim()
            .parse()
            .with_context(|| format!("parse commit count '{}'", out.trim()))
    }
}

fn combined_text(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let mut text = stdout.trim().to_string();
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(stderr);
    }
    text
}

fn parse_status_line(line: &str) -> Result<StatusEntry> {
    if let Some(path) = line.strip_prefix("?? ") {
        return Ok(StatusEntry {
            code: "??".to_string(),
            path: path.trim().to_string(),
        });
    }
    let (Some(code), Some(rest)) = (line.get(..2), line.get(3..)) else {
        return Err(anyhow!("unexpected porcelain line: '{line}'"));
    };
    if rest.trim().is_empty() {
        return Err(anyhow!("unexpected porcelain line: '{line}'"));
    }
    let mut path = rest.trim().to_string();
    if let Some((_, new)) = path.split_once("->") {
        path = new.trim().to_string();
    }
    Ok(StatusEntry {
        code: code.to_string(),
        path,
    })
}
