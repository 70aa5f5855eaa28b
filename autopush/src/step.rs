//! Orchestration for a single stage → prompt → commit → push iteration.

use tracing::{error, info, instrument, warn};

use crate::core::commit::classify_commit;
use crate::core::types::{CommitClass, GitOutput, IterationOutcome};
use crate::io::config::AutopushConfig;
use crate::io::gateway::Gateway;
use crate::io::prompt::MessagePrompt;

/// Execute one iteration against the working directory.
///
/// Never returns an error: every failure is logged and folded into the
/// outcome so the caller can idle and try again.
#[instrument(skip_all)]
pub fn run_iteration<G: Gateway, P: MessagePrompt>(
    gateway: &G,
    prompt: &mut P,
    config: &AutopushConfig,
) -> IterationOutcome {
    let clean = match gateway.is_clean() {
        Ok(clean) => clean,
        Err(err) => {
            // Prefer attempting work over silently idling.
            error!("failed to query working directory: {err:#}");
            false
        }
    };
    if clean {
        return handle_clean(gateway, config);
    }

    match gateway.stage_all() {
        Ok(out) if out.success => {}
        Ok(out) => {
            report_failure("failed to stage files", &out);
            return IterationOutcome::StageFailed;
        }
        Err(err) => {
            error!("failed to stage files: {err:#}");
            return IterationOutcome::StageFailed;
        }
    }

    match gateway.has_staged_changes() {
        Ok(false) => {
            info!("nothing staged after add, skipping commit");
            return IterationOutcome::NothingToCommit;
        }
        Ok(true) => {}
        Err(err) => warn!("failed to inspect staged changes, committing anyway: {err:#}"),
    }

    info!("changes detected");
    let message = prompt.commit_message(&config.message);

    match gateway.commit(&message) {
        Ok(out) => match classify_commit(&out) {
            CommitClass::Committed => info!(message = %message, "changes committed"),
            CommitClass::NothingToCommit => return IterationOutcome::NothingToCommit,
            CommitClass::Failed => {
                report_failure("failed to commit changes", &out);
                return IterationOutcome::CommitFailed;
            }
        },
        Err(err) => {
            error!("failed to commit changes: {err:#}");
            return IterationOutcome::CommitFailed;
        }
    }

    push(gateway)
}

/// A clean tree idles, unless unpushed commits should be pushed first.
fn handle_clean<G: Gateway>(gateway: &G, config: &AutopushConfig) -> IterationOutcome {
    if !config.push_when_ahead {
        return IterationOutcome::Clean;
    }
    match gateway.commits_ahead() {
        Ok(0) => IterationOutcome::Clean,
        Ok(ahead) => {
            info!(ahead, "unpushed commits found");
            push(gateway)
        }
        Err(err) => {
            warn!("failed to count unpushed commits: {err:#}");
            IterationOutcome::Clean
        }
    }
}

fn push<G: Gateway>(gateway: &G) -> IterationOutcome {
    match gateway.push() {
        Ok(out) if out.success => {
            info!("changes pushed");
            IterationOutcome::Pushed
        }
        Ok(out) => {
            report_failure("failed to push changes", &out);
            IterationOutcome::PushFailed
        }
        Err(err) => {
            error!("failed to push changes: {err:#}");
            IterationOutcome::PushFailed
        }
    }
}

fn report_failure(what: &str, out: &GitOutput) {
    error!("{what}");
    if !out.text.is_empty() {
        error!("{}", out.text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Call, ScriptedGateway, ScriptedPrompt, count_errors};

    fn config() -> AutopushConfig {
        AutopushConfig {
            message: "default msg".to_string(),
            ..AutopushConfig::default()
        }
    }

    #[test]
    fn clean_tree_makes_no_mutating_calls() {
        let gateway = ScriptedGateway::clean();
        let mut prompt = ScriptedPrompt::silent();

        let outcome = run_iteration(&gateway, &mut prompt, &config());

        assert_eq!(outcome, IterationOutcome::Clean);
        assert_eq!(gateway.calls(), vec![Call::IsClean]);
        assert_eq!(prompt.asked(), 0);
    }

    #[test]
    fn status_error_is_treated_as_dirty() {
        let gateway = ScriptedGateway::dirty();
        gateway.fail_status();
        let mut prompt = ScriptedPrompt::silent();

        let outcome = run_iteration(&gateway, &mut prompt, &config());

        assert_eq!(outcome, IterationOutcome::Pushed);
        assert!(gateway.calls().contains(&Call::StageAll));
    }

    #[test]
    fn stage_failure_skips_prompt_commit_and_push() {
        let gateway = ScriptedGateway::dirty();
        gateway.set_stage(GitOutput::failed("fatal: index.lock exists"));
        let mut prompt = ScriptedPrompt::replying("never used");

        let outcome = run_iteration(&gateway, &mut prompt, &config());

        assert_eq!(outcome, IterationOutcome::StageFailed);
        assert_eq!(gateway.calls(), vec![Call::IsClean, Call::StageAll]);
        assert_eq!(prompt.asked(), 0);
    }

    #[test]
    fn stage_invocation_error_is_a_failed_step() {
        let gateway = ScriptedGateway::dirty();
        gateway.fail_stage_invocation();
        let mut prompt = ScriptedPrompt::silent();

        let outcome = run_iteration(&gateway, &mut prompt, &config());

        assert_eq!(outcome, IterationOutcome::StageFailed);
        assert_eq!(prompt.asked(), 0);
    }

    #[test]
    fn noop_commit_output_skips_push() {
        let gateway = ScriptedGateway::dirty();
        gateway.set_commit(GitOutput::failed(
            "On branch main\nnothing to commit, working tree clean",
        ));
        let mut prompt = ScriptedPrompt::silent();

        let (outcome, errors) = count_errors(|| run_iteration(&gateway, &mut prompt, &config()));

        assert_eq!(outcome, IterationOutcome::NothingToCommit);
        assert!(!gateway.calls().contains(&Call::Push));
        assert_eq!(errors, 0, "a no-op commit is not an error");
    }

    #[test]
    fn successful_commit_echoing_marker_is_pushed() {
        let gateway = ScriptedGateway::dirty();
        gateway.set_commit(GitOutput::ok(
            "[main 1a2b3c4] keep deps up to date\n 1 file changed",
        ));
        let mut prompt = ScriptedPrompt::replying("keep deps up to date");

        let outcome = run_iteration(&gateway, &mut prompt, &config());

        assert_eq!(outcome, IterationOutcome::Pushed);
        assert_eq!(gateway.count(&Call::Push), 1);
    }

    #[test]
    fn nothing_staged_skips_prompt() {
        let gateway = ScriptedGateway::dirty();
        gateway.set_staged(false);
        let mut prompt = ScriptedPrompt::replying("unused");

        let outcome = run_iteration(&gateway, &mut prompt, &config());

        assert_eq!(outcome, IterationOutcome::NothingToCommit);
        assert_eq!(prompt.asked(), 0);
        assert_eq!(gateway.commit_messages(), Vec::<String>::new());
    }

    #[test]
    fn commit_failure_skips_push() {
        let gateway = ScriptedGateway::dirty();
        gateway.set_commit(GitOutput::failed("error: gpg failed to sign the data"));
        let mut prompt = ScriptedPrompt::silent();

        let (outcome, errors) = count_errors(|| run_iteration(&gateway, &mut prompt, &config()));

        assert_eq!(outcome, IterationOutcome::CommitFailed);
        assert!(!gateway.calls().contains(&Call::Push));
        assert!(errors > 0);
    }

    #[test]
    fn operator_message_is_committed_and_pushed() {
        let gateway = ScriptedGateway::dirty();
        let mut prompt = ScriptedPrompt::replying("fix bug");

        let outcome = run_iteration(&gateway, &mut prompt, &config());

        assert_eq!(outcome, IterationOutcome::Pushed);
        assert_eq!(
            gateway.calls(),
            vec![
                Call::IsClean,
                Call::StageAll,
                Call::HasStagedChanges,
                Call::Commit("fix bug".to_string()),
                Call::Push,
            ]
        );
    }

    #[test]
    fn push_failure_is_reported() {
        let gateway = ScriptedGateway::dirty();
        gateway.set_push(GitOutput::failed("fatal: could not read from remote"));
        let mut prompt = ScriptedPrompt::silent();

        let outcome = run_iteration(&gateway, &mut prompt, &config());

        assert_eq!(outcome, IterationOutcome::PushFailed);
        assert_eq!(gateway.commit_messages(), vec!["default msg".to_string()]);
    }

    #[test]
    fn clean_but_ahead_pushes_when_enabled() {
        let gateway = ScriptedGateway::clean();
        gateway.set_ahead(2);
        let mut prompt = ScriptedPrompt::silent();
        let cfg = AutopushConfig {
            push_when_ahead: true,
            ..config()
        };

        let outcome = run_iteration(&gateway, &mut prompt, &cfg);

        assert_eq!(outcome, IterationOutcome::Pushed);
        assert_eq!(
            gateway.calls(),
            vec![Call::IsClean, Call::CommitsAhead, Call::Push]
        );
    }

    #[test]
    fn clean_but_ahead_is_ignored_by_default() {
        let gateway = ScriptedGateway::clean();
        gateway.set_ahead(2);
        let mut prompt = ScriptedPrompt::silent();

        let outcome = run_iteration(&gateway, &mut prompt, &config());

        assert_eq!(outcome, IterationOutcome::Clean);
        assert_eq!(gateway.calls(), vec![Call::IsClean]);
    }
}
