//! Unbounded iteration loop for `autopush`.

use std::ops::ControlFlow;

use tracing::{debug, info};

use crate::core::types::IterationOutcome;
use crate::io::config::AutopushConfig;
use crate::io::gateway::Gateway;
use crate::io::idler::Idler;
use crate::io::prompt::MessagePrompt;
use crate::step::run_iteration;

/// Summary returned once `on_iteration` asks the loop to stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopOutcome {
    pub iterations: u64,
    pub last: Option<IterationOutcome>,
}

/// Run iterations back to back, idling after every outcome except a push.
///
/// `on_iteration` sees each outcome after its idle (if any) has finished and
/// decides whether to keep going. The binary always continues, so the loop
/// only ends when the process is killed.
pub fn run_loop<G, P, I, F>(
    gateway: &G,
    prompt: &mut P,
    idler: &I,
    config: &AutopushConfig,
    mut on_iteration: F,
) -> LoopOutcome
where
    G: Gateway,
    P: MessagePrompt,
    I: Idler,
    F: FnMut(IterationOutcome) -> ControlFlow<()>,
{
    let idle = config.idle_duration();
    info!(
        idle = ?idle,
        unit = config.unit().as_str(),
        "watching for changes"
    );

    let mut iterations = 0u64;
    loop {
        let outcome = run_iteration(gateway, prompt, config);
        iterations += 1;
        debug!(iteration = iterations, outcome = outcome.as_str(), "iteration finished");

        if outcome.should_idle() {
            idler.idle(idle);
        }

        if on_iteration(outcome).is_break() {
            return LoopOutcome {
                iterations,
                last: Some(outcome),
            };
        }
    }
}
