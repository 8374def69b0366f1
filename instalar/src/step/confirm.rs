//! Step confirmation - asks whether the command was run, then verifies it

use colored::Colorize;
use tracing::debug;

use super::{StepCommands, VerificationOutcome, VerificationRunner};
use crate::console::{Prompt, show_heading, show_output, show_warning};
use crate::protocol::{CommandKind, format_command_block};

const CONFIRM_LABEL: &str = "Executed the command? (Y)es/(N)o [Yes]: ";

/// A parsed yes/no reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
}

impl Answer {
    /// Empty input takes the default (yes); anything unrecognized is `None`
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "" | "y" | "yes" => Some(Self::Yes),
            "n" | "no" => Some(Self::No),
            _ => None,
        }
    }
}

/// How a confirmation round ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepResult {
    /// The user declined or cancelled; the step loop stops here
    NotConfirmed,
    /// The user confirmed and the verification command was run
    Verified(VerificationOutcome),
}

/// Awaiting-confirmation then verifying, for one step
pub struct StepConfirmation<'a> {
    runner: &'a VerificationRunner,
}

impl<'a> StepConfirmation<'a> {
    pub fn new(runner: &'a VerificationRunner) -> Self {
        Self { runner }
    }

    pub async fn run(&self, prompt: &mut (impl Prompt + ?Sized), commands: &StepCommands) -> StepResult {
        match ask(prompt) {
            Some(Answer::Yes) => {}
            Some(Answer::No) => {
                show_warning("Please execute the command before proceeding to the next step");
                return StepResult::NotConfirmed;
            }
            None => {
                debug!("run: confirmation cancelled");
                return StepResult::NotConfirmed;
            }
        }

        let verify = commands.last_verify_command.as_deref();
        if let Some(cmd) = verify {
            show_heading("Running verification...");
            show_output(&format_command_block(cmd, CommandKind::Verify));
        }

        let outcome = self.runner.run(verify).await;
        show_outcome(&outcome);
        StepResult::Verified(outcome)
    }
}

/// Ask until a recognized answer arrives; `None` when input is cancelled
fn ask(prompt: &mut (impl Prompt + ?Sized)) -> Option<Answer> {
    let label = CONFIRM_LABEL.cyan().to_string();
    loop {
        let line = prompt.read_line(&label)?;
        match Answer::parse(&line) {
            Some(answer) => return Some(answer),
            None => show_warning("Please answer Yes or No"),
        }
    }
}

fn show_outcome(outcome: &VerificationOutcome) {
    let status = if outcome.success {
        "✓ Verification succeeded".green().bold()
    } else {
        "✗ Verification failed".red().bold()
    };
    println!("\n{}\n{}\n", status, outcome.result_text);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::time::Duration;

    struct ScriptedPrompt {
        lines: VecDeque<Option<&'static str>>,
        asked: usize,
    }

    impl ScriptedPrompt {
        fn new(lines: Vec<Option<&'static str>>) -> Self {
            Self {
                lines: lines.into(),
                asked: 0,
            }
        }
    }

    impl Prompt for ScriptedPrompt {
        fn read_line(&mut self, _label: &str) -> Option<String> {
            self.asked += 1;
            self.lines.pop_front().flatten().map(str::to_string)
        }
    }

    fn commands(verify: Option<&str>) -> StepCommands {
        StepCommands {
            last_exec_command: Some("echo installing".to_string()),
            last_verify_command: verify.map(str::to_string),
        }
    }

    #[test]
    fn test_parse_answers() {
        assert_eq!(Answer::parse(""), Some(Answer::Yes));
        assert_eq!(Answer::parse("  "), Some(Answer::Yes));
        assert_eq!(Answer::parse("Y"), Some(Answer::Yes));
        assert_eq!(Answer::parse("yes"), Some(Answer::Yes));
        assert_eq!(Answer::parse("YES"), Some(Answer::Yes));
        assert_eq!(Answer::parse("n"), Some(Answer::No));
        assert_eq!(Answer::parse("No"), Some(Answer::No));
        assert_eq!(Answer::parse("maybe"), None);
        assert_eq!(Answer::parse("yess"), None);
    }

    #[tokio::test]
    async fn test_default_answer_runs_verification() {
        let runner = VerificationRunner::new(Duration::from_secs(5));
        let mut prompt = ScriptedPrompt::new(vec![Some("")]);

        let result = StepConfirmation::new(&runner)
            .run(&mut prompt, &commands(Some("echo ok")))
            .await;

        let StepResult::Verified(outcome) = result else {
            panic!("expected verification, got {:?}", result);
        };
        assert!(outcome.success);
        assert!(outcome.result_text.contains("ok"));
    }

    #[tokio::test]
    async fn test_no_stops_without_verifying() {
        let runner = VerificationRunner::new(Duration::from_secs(5));
        let mut prompt = ScriptedPrompt::new(vec![Some("n")]);

        let result = StepConfirmation::new(&runner)
            .run(&mut prompt, &commands(Some("echo ok")))
            .await;

        assert_eq!(result, StepResult::NotConfirmed);
        assert_eq!(prompt.asked, 1);
    }

    #[tokio::test]
    async fn test_unrecognized_answer_reprompts() {
        let runner = VerificationRunner::new(Duration::from_secs(5));
        let mut prompt = ScriptedPrompt::new(vec![Some("maybe"), Some("sure"), Some("y")]);

        let result = StepConfirmation::new(&runner).run(&mut prompt, &commands(None)).await;

        assert!(matches!(result, StepResult::Verified(ref o) if o.success));
        assert_eq!(prompt.asked, 3);
    }

    #[tokio::test]
    async fn test_cancelled_input_is_not_confirmed() {
        let runner = VerificationRunner::new(Duration::from_secs(5));
        let mut prompt = ScriptedPrompt::new(vec![None]);

        let result = StepConfirmation::new(&runner)
            .run(&mut prompt, &commands(Some("echo ok")))
            .await;

        assert_eq!(result, StepResult::NotConfirmed);
    }

    #[tokio::test]
    async fn test_failed_verification_is_reported() {
        let runner = VerificationRunner::new(Duration::from_secs(5));
        let mut prompt = ScriptedPrompt::new(vec![Some("yes")]);

        let result = StepConfirmation::new(&runner)
            .run(&mut prompt, &commands(Some("exit 4")))
            .await;

        let StepResult::Verified(outcome) = result else {
            panic!("expected verification, got {:?}", result);
        };
        assert!(!outcome.success);
        assert!(outcome.result_text.contains("return code: 4"));
    }
}
