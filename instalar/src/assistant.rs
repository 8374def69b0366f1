//! Conversation feedback loop
//!
//! Sends a user turn, streams the reply as a step, and while the user confirms
//! each step, reports its verification back to the model and streams the
//! next one. The loop ends when the model sends the termination marker, the
//! user declines a step, a reply carries no commands, or the transport fails.

use std::sync::Arc;

use eyre::{Context, Result};
use tracing::{debug, info};

use crate::config::Config;
use crate::console::{LiveView, Prompt};
use crate::context::SessionContext;
use crate::conversation::Conversation;
use crate::llm::{self, ChatRequest, LlmClient};
use crate::menu::TaskSelection;
use crate::prompts::{PromptLoader, StepPromptContext};
use crate::step::{StepConfirmation, StepResult, StreamOutcome, StreamingSession, VerificationRunner, follow_up_message};

/// Where the feedback loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// The model reported that all steps are done
    Complete,
    /// Control is back with the user at the command prompt
    AwaitingUser,
    /// The model sent nothing
    NoContent,
}

/// Drives steps for the selected task
pub struct Assistant<P: Prompt, V: LiveView> {
    llm: Arc<dyn LlmClient>,
    prompts: PromptLoader,
    conversation: Conversation,
    context: SessionContext,
    runner: VerificationRunner,
    prompt: P,
    view: V,
    max_tokens: u32,
    refresh_per_second: u32,
}

impl<P: Prompt, V: LiveView> Assistant<P, V> {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        config: &Config,
        context: SessionContext,
        prompts: PromptLoader,
        prompt: P,
        view: V,
    ) -> Self {
        Self {
            llm,
            prompts,
            conversation: Conversation::new(config.session.max_history),
            context,
            runner: VerificationRunner::new(std::time::Duration::from_secs(config.session.verify_timeout_secs)),
            prompt,
            view,
            max_tokens: config.llm.max_tokens,
            refresh_per_second: config.session.refresh_per_second,
        }
    }

    pub fn prompt_mut(&mut self) -> &mut P {
        &mut self.prompt
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Start a new task with an empty history
    pub fn select(&mut self, selection: TaskSelection) {
        info!("Task selected: {:?} {}", selection.operation, selection.target);
        self.conversation.clear();
        self.context.select(selection);
    }

    fn system_prompt(&self) -> Result<String> {
        let selection = self
            .context
            .selection()
            .ok_or_else(|| eyre::eyre!("No task selected"))?;

        let prompt_context = StepPromptContext {
            target: selection.target.clone(),
            operation: selection.operation.clone().unwrap_or_else(|| "Management".to_string()),
            system_context: self.context.system_info.facts.to_prompt_context(),
        };
        self.prompts.step_prompt(&prompt_context)
    }

    fn request(&self) -> Result<ChatRequest> {
        let system_prompt = self.system_prompt()?;
        Ok(self.conversation.request(system_prompt, self.max_tokens)?)
    }

    /// Send `message` and keep stepping until the user is needed again
    pub async fn send(&mut self, message: impl Into<String>) -> Result<StepStatus> {
        let mut next = message.into();
        let mut round = 0usize;

        loop {
            round += 1;
            debug!(%round, len = %next.len(), "send: starting step");
            self.conversation.add_user(next).context("Invalid message")?;

            let request = self.request()?;
            let fragments = llm::fragments(self.llm.clone(), request);
            let outcome = StreamingSession::new(&mut self.view, &mut self.context.commands, self.refresh_per_second)
                .consume(fragments)
                .await;

            let sections = match outcome {
                StreamOutcome::Terminated => {
                    info!("Task complete after {} step(s)", round);
                    self.context.finish_task();
                    return Ok(StepStatus::Complete);
                }
                StreamOutcome::Empty => return Ok(StepStatus::NoContent),
                StreamOutcome::Failed { text } => {
                    if let Err(e) = self.conversation.add_assistant(text) {
                        debug!(error = %e, "send: failed response not kept in history");
                    }
                    return Ok(StepStatus::AwaitingUser);
                }
                StreamOutcome::Finished { text, sections } => {
                    if let Err(e) = self.conversation.add_assistant(text) {
                        debug!(error = %e, "send: response not kept in history");
                    }
                    sections
                }
            };

            self.context.record_response(&sections);
            if !self.context.commands.any() {
                debug!("send: no commands captured, returning to prompt");
                return Ok(StepStatus::AwaitingUser);
            }

            let result = StepConfirmation::new(&self.runner)
                .run(&mut self.prompt, &self.context.commands)
                .await;

            match result {
                StepResult::NotConfirmed => return Ok(StepStatus::AwaitingUser),
                StepResult::Verified(outcome) => {
                    info!("Step {} verified: success={}", round, outcome.success);
                    self.context.record_verification(&outcome);
                    next = follow_up_message(&outcome, &self.context.commands);
                }
            }
        }
    }
}
