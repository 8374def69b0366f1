//! One assistant step: stream it in, confirm it was run, verify it
//!
//! A step is a single structured model response. [`stream`] renders it while
//! it arrives and captures its commands, [`confirm`] asks the user whether the
//! command was executed and runs the verification, and [`feedback`] turns the
//! verification result into the next user turn.

use serde::Serialize;

use crate::protocol::ResponseSections;

pub mod confirm;
pub mod feedback;
pub mod stream;
pub mod verify;

pub use confirm::{Answer, StepConfirmation, StepResult};
pub use feedback::follow_up_message;
pub use stream::{StreamOutcome, StreamingSession};
pub use verify::{VerificationOutcome, VerificationRunner};

/// Commands captured from the most recent responses
///
/// Values only move forward: a response without an execution or verification
/// section leaves the previous command in place. They are cleared when a task
/// finishes or a new task is selected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StepCommands {
    pub last_exec_command: Option<String>,
    pub last_verify_command: Option<String>,
}

impl StepCommands {
    /// Take any non-empty command found in `sections`
    pub fn update(&mut self, sections: &ResponseSections) {
        if !sections.execution.is_empty() {
            self.last_exec_command = Some(sections.execution.clone());
        }
        if !sections.verification.is_empty() {
            self.last_verify_command = Some(sections.verification.clone());
        }
    }

    /// True once either command has been seen
    pub fn any(&self) -> bool {
        self.last_exec_command.is_some() || self.last_verify_command.is_some()
    }

    pub fn clear(&mut self) {
        self.last_exec_command = None;
        self.last_verify_command = None;
    }
}
