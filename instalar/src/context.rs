//! Per-process session state passed to the components that need it

use tracing::debug;

use crate::menu::TaskSelection;
use crate::protocol::ResponseSections;
use crate::step::{StepCommands, VerificationOutcome};
use crate::sysinfo::SystemInfo;

/// State shared across steps of the current task
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub system_info: SystemInfo,
    pub commands: StepCommands,
}

impl SessionContext {
    pub fn new(system_info: SystemInfo) -> Self {
        Self {
            system_info,
            commands: StepCommands::default(),
        }
    }

    /// Start a new task, forgetting the previous one's commands
    pub fn select(&mut self, selection: TaskSelection) {
        debug!(?selection, "SessionContext::select: called");
        self.commands.clear();
        self.system_info.reset_task(Some(selection));
    }

    pub fn selection(&self) -> Option<&TaskSelection> {
        self.system_info.user_select_info.as_ref()
    }

    /// Keep the latest response and the commands captured so far
    pub fn record_response(&mut self, sections: &ResponseSections) {
        self.system_info.last_llm_response = Some(sections.clone());
        self.system_info.record_commands(&self.commands);
    }

    pub fn record_verification(&mut self, outcome: &VerificationOutcome) {
        self.system_info.record_verification(outcome);
    }

    /// The model reported that no steps remain
    pub fn finish_task(&mut self) {
        debug!("SessionContext::finish_task: clearing step commands");
        self.commands.clear();
    }
}
