//! Deadline-bounded prompt for a custom commit message.
//!
//! A reader thread blocks on one line of input and hands it over through a
//! single-slot channel. The caller waits on that channel until the window
//! closes. Whichever happens first decides the message: the operator's line,
//! or the configured default.
//!
//! The reader is never interrupted. If the window closes first it stays
//! blocked; a line it reads later lands in the slot and is dropped. Readers
//! are reclaimed at process exit.

use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{error, info};

/// Fixed window the operator has to type a message.
pub const PROMPT_WINDOW: Duration = Duration::from_secs(60);

/// How a prompt window ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome {
    /// A line arrived before the deadline (terminator removed).
    Provided(String),
    /// The deadline fired first.
    TimedOut,
    /// The input stream failed or closed; the window was waited out.
    InputFailed,
}

/// Source of the commit message for one commit attempt.
pub trait MessagePrompt {
    /// Return the message to commit with, falling back to `default`.
    fn commit_message(&mut self, default: &str) -> String;
}

/// Spawn a thread that reads one line from the reader built by `open`.
///
/// Only a complete, terminated line is sent. Read errors and end of input
/// (including a partial last line) are logged and nothing is sent, so the
/// receiver disconnects without a value.
pub fn spawn_line_reader<F, R>(open: F) -> Receiver<String>
where
    F: FnOnce() -> R + Send + 'static,
    R: BufRead + 'static,
{
    let (tx, rx) = mpsc::sync_channel(1);
    thread::spawn(move || {
        let mut reader = open();
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => error!("input closed before a message was entered"),
            Ok(_) if !line.ends_with('\n') => {
                error!("input closed before the message line was finished");
            }
            Ok(_) => {
                // Nobody may be listening any more; a late line is dropped.
                let _ = tx.try_send(strip_line_terminator(line));
            }
            Err(err) => error!(err = %err, "failed to read commit message"),
        }
    });
    rx
}

/// Wait on `rx` until `window` has elapsed since `start`.
pub fn await_line(rx: &Receiver<String>, start: Instant, window: Duration) -> PromptOutcome {
    let deadline = start + window;
    let remaining = deadline.saturating_duration_since(Instant::now());
    match rx.recv_timeout(remaining) {
        Ok(line) => PromptOutcome::Provided(line),
        Err(RecvTimeoutError::Timeout) => PromptOutcome::TimedOut,
        Err(RecvTimeoutError::Disconnected) => {
            // Only the deadline may end the window.
            thread::sleep(deadline.saturating_duration_since(Instant::now()));
            PromptOutcome::InputFailed
        }
    }
}

/// Turn a prompt outcome into the message to commit with.
pub fn resolve_message(outcome: PromptOutcome, default: &str) -> String {
    match outcome {
        PromptOutcome::Provided(line) if !line.trim().is_empty() => line,
        PromptOutcome::Provided(_) => {
            info!("empty message entered");
            info!("falling back to default: {default:?}");
            default.to_string()
        }
        PromptOutcome::TimedOut | PromptOutcome::InputFailed => {
            info!("no message provided.");
            info!("falling back to default: {default:?}");
            default.to_string()
        }
    }
}

/// Prompt on stdin/stdout with the fixed [`PROMPT_WINDOW`].
///
/// A reader left blocked by an expired window is reused for the next one, so
/// two threads never compete for the same input line.
pub struct StdinPrompt {
    window: Duration,
    pending: Option<Receiver<String>>,
}

impl StdinPrompt {
    pub fn new() -> Self {
        Self {
            window: PROMPT_WINDOW,
            pending: None,
        }
    }

    fn reader(&mut self) -> Receiver<String> {
        if let Some(rx) = self.pending.take() {
            match rx.try_recv() {
                Err(TryRecvError::Empty) => return rx,
                Ok(late) => info!(line = %late, "discarding message entered after its window"),
                Err(TryRecvError::Disconnected) => {}
            }
        }
        spawn_line_reader(|| io::stdin().lock())
    }
}

impl Default for StdinPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl MessagePrompt for StdinPrompt {
    fn commit_message(&mut self, default: &str) -> String {
        let start = Instant::now();
        println!(
            "enter a commit message ({}s, default {default:?}): ",
            self.window.as_secs()
        );
        let _ = io::stdout().flush();

        let rx = self.reader();
        let outcome = await_line(&rx, start, self.window);
        if outcome == PromptOutcome::TimedOut {
            self.pending = Some(rx);
        }
        resolve_message(outcome, default)
    }
}

fn strip_line_terminator(mut line: String) -> String {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}
