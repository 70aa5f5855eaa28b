//! Test-only fakes for the loop seams, plus a throwaway git repository.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tempfile::TempDir;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context as LayerContext, Layer, SubscriberExt};

use crate::core::types::GitOutput;
use crate::io::gateway::Gateway;
use crate::io::idler::Idler;
use crate::io::prompt::MessagePrompt;

/// Gateway call recorded by [`ScriptedGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    IsClean,
    StageAll,
    HasStagedChanges,
    Commit(String),
    Push,
    CommitsAhead,
}

#[derive(Debug)]
struct Script {
    /// Popped per `is_clean`; `None` is a query error. Clean once exhausted.
    statuses: VecDeque<Option<bool>>,
    stage: GitOutput,
    stage_invocation_error: bool,
    staged: bool,
    commit: GitOutput,
    push: GitOutput,
    ahead: u32,
}

/// Gateway that records calls and answers from a script.
///
/// Mutating calls succeed unless told otherwise. A successful push also
/// clears the ahead counter, the way a real remote would.
#[derive(Debug)]
pub struct ScriptedGateway {
    script: RefCell<Script>,
    calls: RefCell<Vec<Call>>,
}

impl ScriptedGateway {
    /// Answer `is_clean` with each value in turn, then report clean.
    pub fn with_statuses(statuses: Vec<bool>) -> Self {
        Self {
            script: RefCell::new(Script {
                statuses: statuses.into_iter().map(Some).collect(),
                stage: GitOutput::ok(""),
                stage_invocation_error: false,
                staged: true,
                commit: GitOutput::ok("[main 0000000] commit\n 1 file changed"),
                push: GitOutput::ok(""),
                ahead: 0,
            }),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn clean() -> Self {
        Self::with_statuses(Vec::new())
    }

    /// Dirty for one iteration, clean afterwards.
    pub fn dirty() -> Self {
        Self::with_statuses(vec![false])
    }

    /// The next `is_clean` call fails.
    pub fn fail_status(&self) {
        self.script.borrow_mut().statuses.push_front(None);
    }

    pub fn set_stage(&self, out: GitOutput) {
        self.script.borrow_mut().stage = out;
    }

    pub fn fail_stage_invocation(&self) {
        self.script.borrow_mut().stage_invocation_error = true;
    }

    pub fn set_staged(&self, staged: bool) {
        self.script.borrow_mut().staged = staged;
    }

    pub fn set_commit(&self, out: GitOutput) {
        self.script.borrow_mut().commit = out;
    }

    pub fn set_push(&self, out: GitOutput) {
        self.script.borrow_mut().push = out;
    }

    pub fn set_ahead(&self, ahead: u32) {
        self.script.borrow_mut().ahead = ahead;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn commit_messages(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::Commit(msg) => Some(msg.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls.borrow().iter().filter(|c| *c == call).count()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl Gateway for ScriptedGateway {
    fn is_clean(&self) -> Result<bool> {
        self.record(Call::IsClean);
        match self.script.borrow_mut().statuses.pop_front() {
            Some(Some(clean)) => Ok(clean),
            Some(None) => Err(anyhow!("scripted status failure")),
            None => Ok(true),
        }
    }

    fn stage_all(&self) -> Result<GitOutput> {
        self.record(Call::StageAll);
        let script = self.script.borrow();
        if script.stage_invocation_error {
            return Err(anyhow!("spawn git add -A: No such file or directory"));
        }
        Ok(script.stage.clone())
    }

    fn has_staged_changes(&self) -> Result<bool> {
        self.record(Call::HasStagedChanges);
        Ok(self.script.borrow().staged)
    }

    fn commit(&self, message: &str) -> Result<GitOutput> {
        self.record(Call::Commit(message.to_string()));
        let mut script = self.script.borrow_mut();
        if script.commit.success {
            script.ahead += 1;
        }
        Ok(script.commit.clone())
    }

    fn push(&self) -> Result<GitOutput> {
        self.record(Call::Push);
        let mut script = self.script.borrow_mut();
        if script.push.success {
            script.ahead = 0;
        }
        Ok(script.push.clone())
    }

    fn commits_ahead(&self) -> Result<u32> {
        self.record(Call::CommitsAhead);
        Ok(self.script.borrow().ahead)
    }
}

/// Prompt that replays operator answers; `None` means nobody typed anything.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    replies: VecDeque<Option<String>>,
    asked: Cell<usize>,
}

impl ScriptedPrompt {
    /// Every window expires without input.
    pub fn silent() -> Self {
        Self::default()
    }

    /// The first window gets `reply`; later windows expire.
    pub fn replying(reply: &str) -> Self {
        Self::with_replies(vec![Some(reply.to_string())])
    }

    pub fn with_replies(replies: Vec<Option<String>>) -> Self {
        Self {
            replies: replies.into(),
            asked: Cell::new(0),
        }
    }

    pub fn asked(&self) -> usize {
        self.asked.get()
    }
}

impl MessagePrompt for ScriptedPrompt {
    fn commit_message(&mut self, default: &str) -> String {
        self.asked.set(self.asked.get() + 1);
        match self.replies.pop_front().flatten() {
            Some(reply) => reply,
            None => default.to_string(),
        }
    }
}

/// Idler that records requested durations instead of sleeping.
#[derive(Debug, Default)]
pub struct RecordingIdler {
    idles: RefCell<Vec<Duration>>,
}

impl RecordingIdler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn idles(&self) -> Vec<Duration> {
        self.idles.borrow().clone()
    }
}

impl Idler for RecordingIdler {
    fn idle(&self, duration: Duration) {
        self.idles.borrow_mut().push(duration);
    }
}

/// Layer that counts `ERROR` events.
#[derive(Debug, Clone, Default)]
struct ErrorCounter(Arc<AtomicUsize>);

impl<S: Subscriber> Layer<S> for ErrorCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: LayerContext<'_, S>) {
        if *event.metadata().level() == Level::ERROR {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Run `f` under a thread-local subscriber and count the errors it logs.
pub fn count_errors<T>(f: impl FnOnce() -> T) -> (T, usize) {
    let counter = ErrorCounter::default();
    let subscriber = tracing_subscriber::registry().with(counter.clone());
    let out = tracing::subscriber::with_default(subscriber, f);
    (out, counter.0.load(Ordering::SeqCst))
}

/// Work tree cloned from a local bare remote, with one pushed commit.
pub struct TestRepo {
    _temp: TempDir,
    work: PathBuf,
    remote: PathBuf,
}

impl TestRepo {
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir().context("tempdir")?;
        let remote = temp.path().join("remote.git");
        let work = temp.path().join("work");

        run_git(temp.path(), &["init", "--bare", "-q", "remote.git"])?;
        run_git(temp.path(), &["clone", "-q", "remote.git", "work"])?;
        run_git(&work, &["config", "user.name", "Autopush Test"])?;
        run_git(&work, &["config", "user.email", "autopush@example.com"])?;
        run_git(&work, &["config", "commit.gpgsign", "false"])?;

        fs::write(work.join("README.md"), "seed\n").context("write seed file")?;
        run_git(&work, &["add", "-A"])?;
        run_git(&work, &["commit", "-q", "-m", "seed"])?;
        run_git(&work, &["push", "-q", "-u", "origin", "HEAD"])?;

        Ok(Self {
            _temp: temp,
            work,
            remote,
        })
    }

    pub fn path(&self) -> &Path {
        &self.work
    }

    pub fn write(&self, rel: &str, contents: &str) -> Result<()> {
        let path = self.work.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))
    }

    /// Run git in the work tree and return trimmed stdout.
    pub fn git(&self, args: &[&str]) -> Result<String> {
        run_git(&self.work, args)
    }

    pub fn last_message(&self) -> Result<String> {
        self.git(&["log", "-1", "--pretty=%B"])
    }

    pub fn remote_last_message(&self) -> Result<String> {
        run_git(&self.remote, &["log", "-1", "--pretty=%B"])
    }
}

fn run_git(dir: &Path, args: &[&str]) -> Result<String> {
    let out = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .with_context(|| format!("spawn git {}", args.join(" ")))?;
    if !out.status.success() {
        return Err(anyhow!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&out.stderr).trim()
        ));
    }
    Ok(String::from_utf8_lossy(&out.stdout).trim().to_string())
}
