//! Follow-up turns built from verification results

use super::{StepCommands, VerificationOutcome};

const NONE: &str = "None";

/// The user turn that reports a step's verification back to the model
pub fn follow_up_message(outcome: &VerificationOutcome, commands: &StepCommands) -> String {
    let executed = commands.last_exec_command.as_deref().unwrap_or(NONE);
    let verification = commands.last_verify_command.as_deref().unwrap_or(NONE);

    if outcome.success {
        format!(
            "The previous step was successful. Here are the details:\n\n\
             Executed Command: {executed}\n\
             Verification Command: {verification}\n\
             Verification Result: {result}\n\n\
             Please provide the next step. However, if there are no more steps remaining, \
             include <TERMINATE></TERMINATE> in your response.",
            result = outcome.result_text,
        )
    } else {
        format!(
            "The previous step failed. Here are the details:\n\n\
             Executed Command: {executed}\n\
             Verification Command: {verification}\n\
             Error Output: {result}\n\n\
             Please analyze the output and provide specific troubleshooting steps to resolve this issue.",
            result = outcome.result_text,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commands() -> StepCommands {
        StepCommands {
            last_exec_command: Some("apt install foo".to_string()),
            last_verify_command: Some("foo --version".to_string()),
        }
    }

    #[test]
    fn test_success_asks_for_next_step() {
        let outcome = VerificationOutcome {
            success: true,
            result_text: "Output:\nfoo 1.0\nStatus: Success (return code: 0)".to_string(),
        };
        let msg = follow_up_message(&outcome, &commands());

        assert!(msg.starts_with("The previous step was successful."));
        assert!(msg.contains("Executed Command: apt install foo\n"));
        assert!(msg.contains("Verification Command: foo --version\n"));
        assert!(msg.contains("Verification Result: Output:\nfoo 1.0"));
        assert!(msg.contains("<TERMINATE></TERMINATE>"));
    }

    #[test]
    fn test_failure_asks_for_troubleshooting() {
        let outcome = VerificationOutcome {
            success: false,
            result_text: "Timeout Error: Command timed out after 30 seconds".to_string(),
        };
        let msg = follow_up_message(&outcome, &commands());

        assert!(msg.starts_with("The previous step failed."));
        assert!(msg.contains("Error Output: Timeout Error"));
        assert!(msg.contains("troubleshooting steps"));
        assert!(!msg.contains("TERMINATE"));
    }

    #[test]
    fn test_missing_commands_are_named() {
        let outcome = VerificationOutcome {
            success: true,
            result_text: "No verification command provided".to_string(),
        };
        let msg = follow_up_message(&outcome, &StepCommands::default());
        assert!(msg.contains("Executed Command: None\n"));
        assert!(msg.contains("Verification Command: None\n"));
    }
}
