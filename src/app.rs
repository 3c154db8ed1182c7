//! Interaction controller.
//!
//! This module defines the [`App`] that walks a single request through
//! generation, confirmation, execution and reporting. Each step is an explicit
//! [`State`]; the run loop awaits one suspension point at a time (an inference
//! exchange, a subprocess, or a line read), so nothing ever overlaps.

use std::process::ExitCode;

use tracing::{debug, error, info};

use crate::ai::parser::{parse_command_proposal, parse_explanation};
use crate::ai::{CommandProposal, CompletionBackend, InferenceError, PromptBuilder, SafetyClass};
use crate::config::AppConfig;
use crate::shell::{CommandRunner, ExecutionResult};
use crate::ui::console::{indent, normalize_answer};
use crate::ui::{Console, Tone};
use crate::utils::signal::interrupted;

const CONFIRM_WITH_EXPLAIN: &str = "\n❓ Execute this command? (y/n/e for explain): ";
const CONFIRM_AGAIN: &str = "\n❓ Execute now? (y/n): ";
const OFFER_EXPLANATION: &str = "\n❓ Would you like an explanation? (y/n): ";

/// Final status of a run, mapped to the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Command succeeded, the user cancelled, or only an explanation was asked for.
    Success,
    /// The confirmed command ran and exited non-zero. The process exits 1 so
    /// scripts can see the failure, unlike assistants that exit 0 whenever
    /// the user's command ran at all.
    CommandFailed(i32),
    /// Generation failed; nothing was executed.
    Fatal,
}

impl RunStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, RunStatus::Success)
    }
}

impl From<RunStatus> for ExitCode {
    fn from(status: RunStatus) -> Self {
        if status.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}

/// Controller states. Only `ConfirmPrompt` is ever revisited, at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Generating,
    Presenting,
    ConfirmPrompt { explain_available: bool },
    ExplainRequested,
    Executing,
    Reporting,
    ErrorExplainOffer,
    ErrorExplaining,
    Cancelled,
    Done(RunStatus),
}

/// Transient per-run state. Nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub request: String,
    pub proposal: Option<CommandProposal>,
    pub result: Option<ExecutionResult>,
}

pub struct App<B, R, C> {
    config: AppConfig,
    prompts: PromptBuilder,
    backend: B,
    runner: R,
    console: C,
    session: Session,
}

impl<B, R, C> App<B, R, C>
where
    B: CompletionBackend,
    R: CommandRunner,
    C: Console,
{
    pub fn new(config: AppConfig, backend: B, runner: R, console: C) -> Self {
        Self {
            prompts: PromptBuilder::new(config.platform),
            config,
            backend,
            runner,
            console,
            session: Session::default(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    /// Turn `request` into a command, confirm it, run it, and report.
    pub async fn run(&mut self, request: &str) -> RunStatus {
        self.session = Session {
            request: request.trim().to_string(),
            ..Session::default()
        };
        info!("Handling request: {}", self.session.request);

        let mut state = State::Generating;
        loop {
            debug!(?state, "Entering state");
            state = match state {
                State::Generating => self.generate().await,
                State::Presenting => self.present(),
                State::ConfirmPrompt { explain_available } => self.confirm(explain_available).await,
                State::ExplainRequested => self.explain_proposal().await,
                State::Executing => self.execute().await,
                State::Reporting => self.report(),
                State::ErrorExplainOffer => self.offer_error_explanation().await,
                State::ErrorExplaining => self.explain_failure().await,
                State::Cancelled => {
                    self.console.show(Tone::Plain, "Cancelled.");
                    State::Done(RunStatus::Success)
                }
                State::Done(status) => {
                    info!(?status, "Run finished");
                    return status;
                }
            };
        }
    }

    /// Explain `command` without generating or executing anything.
    pub async fn explain_only(&mut self, command: &str) -> RunStatus {
        let command = command.trim();
        info!("Explaining command: {}", command);
        self.console
            .show(Tone::Status, &format!("\n🤔 Analyzing command: {}", command));
        self.explain(command, "").await;
        RunStatus::Success
    }

    async fn generate(&mut self) -> State {
        let request = self.session.request.clone();
        self.console
            .show(Tone::Status, &format!("\n🤖 Understanding: {}", request));

        let prompt = self.prompts.generation_prompt(&request);
        let completion = match self.complete(&prompt).await {
            None => return State::Cancelled,
            Some(Ok(completion)) => completion,
            Some(Err(e)) => {
                error!("Command generation failed: {}", e);
                self.console.show(Tone::Error, &format!("\n❌ Error: {}", e));
                return State::Done(RunStatus::Fatal);
            }
        };

        let decoded = parse_command_proposal(&request, &completion);
        debug!(structured = decoded.is_structured(), "Decoded completion");
        let proposal = decoded.into_proposal();

        if proposal.command.trim().is_empty() {
            error!("Proposal has no command to execute");
            self.console
                .show(Tone::Error, "\n❌ Error: the model did not return a command");
            return State::Done(RunStatus::Fatal);
        }

        info!(safety = %proposal.safety, "Proposed command: {}", proposal.command);
        self.session.proposal = Some(proposal);
        State::Presenting
    }

    fn present(&mut self) -> State {
        let Some(proposal) = self.session.proposal.as_ref() else {
            return State::Done(RunStatus::Fatal);
        };

        self.console.show(Tone::Success, "\n💡 Generated command:");
        self.console.show(Tone::Plain, &indent(&proposal.command));
        self.console.show(Tone::Explanation, "\n📝 Explanation:");
        self.console.show(Tone::Plain, &indent(&proposal.explanation));

        if proposal.safety == SafetyClass::Dangerous {
            self.console.show(
                Tone::Warning,
                "\n⚠️  Warning: This command may modify or delete files!",
            );
        }

        State::ConfirmPrompt {
            explain_available: true,
        }
    }

    async fn confirm(&mut self, explain_available: bool) -> State {
        let prompt = if explain_available {
            CONFIRM_WITH_EXPLAIN
        } else {
            CONFIRM_AGAIN
        };

        match self.ask(prompt).await.as_str() {
            "y" => State::Executing,
            "e" if explain_available => State::ExplainRequested,
            _ => State::Cancelled,
        }
    }

    async fn explain_proposal(&mut self) -> State {
        let command = self.proposal_command();
        self.console
            .show(Tone::Status, "\n🔍 Getting detailed explanation...");
        self.explain(&command, "").await;
        State::ConfirmPrompt {
            explain_available: false,
        }
    }

    async fn execute(&mut self) -> State {
        let command = self.proposal_command();
        if command.trim().is_empty() {
            return State::Done(RunStatus::Fatal);
        }

        self.console.show(Tone::Status, "\n⚡ Executing...");
        let result = self.runner.execute(&command, &self.config.execution).await;
        self.session.result = Some(result);
        State::Reporting
    }

    fn report(&mut self) -> State {
        let Some(result) = self.session.result.as_ref() else {
            return State::Done(RunStatus::Fatal);
        };

        if result.success() {
            self.console.show(Tone::Success, "\n✅ Success!");
            if !result.stdout.is_empty() {
                self.console.show(Tone::Plain, result.stdout.trim_end());
            }
            return State::Done(RunStatus::Success);
        }

        self.console.show(
            Tone::Error,
            &format!("\n❌ Command failed (exit code: {})", result.exit_code),
        );
        if !result.stderr.is_empty() {
            self.console.show(Tone::Error, "\nError output:");
            self.console.show(Tone::Plain, result.stderr.trim_end());
        }
        State::ErrorExplainOffer
    }

    async fn offer_error_explanation(&mut self) -> State {
        let failed = self.failed_status();
        if self.ask(OFFER_EXPLANATION).await == "y" {
            State::ErrorExplaining
        } else {
            State::Done(failed)
        }
    }

    async fn explain_failure(&mut self) -> State {
        let command = self.proposal_command();
        let stderr = self
            .session
            .result
            .as_ref()
            .map(|r| r.stderr.clone())
            .unwrap_or_default();

        self.console.show(Tone::Status, "\n🔍 Analyzing error...");
        self.explain(&command, &stderr).await;
        State::Done(self.failed_status())
    }

    /// Best-effort explanation round-trip. Failures are shown, never propagated.
    async fn explain(&mut self, command: &str, error_output: &str) {
        let prompt = self.prompts.explain_prompt(command, error_output);
        match self.complete(&prompt).await {
            None => {
                info!("Explanation request interrupted");
                self.console.show(Tone::Warning, "\nExplanation cancelled.");
            }
            Some(Ok(completion)) => {
                let text = parse_explanation(&completion);
                if text.is_empty() {
                    self.console
                        .show(Tone::Warning, "\nCould not generate explanation");
                } else {
                    self.console.show(Tone::Explanation, &format!("\n{}", text));
                }
            }
            Some(Err(e)) => {
                error!("Explanation request failed: {}", e);
                self.console
                    .show(Tone::Error, &format!("\nError getting explanation: {}", e));
            }
        }
    }

    /// One inference exchange, or `None` if the user pressed Ctrl-C first.
    async fn complete(&self, prompt: &str) -> Option<Result<String, InferenceError>> {
        tokio::select! {
            result = self.backend.generate(prompt, &self.config.inference) => Some(result),
            _ = interrupted() => None,
        }
    }

    /// Read one answer; an unreadable or missing line counts as "no".
    async fn ask(&mut self, prompt: &str) -> String {
        match self.console.read_line(prompt).await {
            Ok(Some(line)) => normalize_answer(&line),
            Ok(None) => String::new(),
            Err(e) => {
                error!("Failed to read input: {}", e);
                String::new()
            }
        }
    }

    fn proposal_command(&self) -> String {
        self.session
            .proposal
            .as_ref()
            .map(|p| p.command.clone())
            .unwrap_or_default()
    }

    fn failed_status(&self) -> RunStatus {
        match self.session.result.as_ref() {
            Some(result) if !result.success() => RunStatus::CommandFailed(result.exit_code),
            _ => RunStatus::Success,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_success() {
        assert!(RunStatus::Success.is_success());
        assert!(!RunStatus::CommandFailed(127).is_success());
        assert!(!RunStatus::Fatal.is_success());
    }
}
