//! Host detection and the system info side record

use std::collections::BTreeMap;
use std::io::IsTerminal;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::menu::TaskSelection;
use crate::protocol::ResponseSections;
use crate::step::{StepCommands, VerificationOutcome};

/// Tools whose presence changes which commands the model should propose
pub const DETECTED_TOOLS: &[&str] = &["kubectl", "helm", "docker"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OsInfo {
    pub system: String,
    pub arch: String,
    pub family: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distro: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codename: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TerminalInfo {
    pub terminal_type: Option<String>,
    pub terminal_program: Option<String>,
    pub shell: Option<String>,
    pub terminal_size: Option<String>,
    pub is_interactive: bool,
}

/// Facts about the host, shared with the model in the system prompt
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SystemFacts {
    pub os_info: OsInfo,
    pub terminal_info: TerminalInfo,
    /// Tool name to whether it was found on `PATH`
    pub tools: BTreeMap<String, bool>,
}

impl SystemFacts {
    /// Collect facts about the running host
    pub fn detect() -> Self {
        debug!("SystemFacts::detect: called");
        let mut os_info = OsInfo {
            system: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            family: std::env::consts::FAMILY.to_string(),
            ..Default::default()
        };
        if let Ok(content) = std::fs::read_to_string("/etc/os-release") {
            apply_os_release(&mut os_info, &content);
        }

        let terminal_info = TerminalInfo {
            terminal_type: std::env::var("TERM").ok(),
            terminal_program: std::env::var("TERM_PROGRAM").ok(),
            shell: std::env::var("SHELL").ok(),
            terminal_size: crossterm::terminal::size()
                .ok()
                .map(|(cols, rows)| format!("{}x{}", cols, rows)),
            is_interactive: std::io::stdin().is_terminal(),
        };

        let tools = DETECTED_TOOLS
            .iter()
            .map(|tool| (tool.to_string(), tool_available(tool)))
            .collect();

        Self {
            os_info,
            terminal_info,
            tools,
        }
    }

    /// Pretty JSON for the system prompt
    pub fn to_prompt_context(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }
}

/// Fill distro fields from the contents of an os-release file
fn apply_os_release(os_info: &mut OsInfo, content: &str) {
    let mut fields: BTreeMap<&str, String> = BTreeMap::new();
    for line in content.lines() {
        if let Some((key, value)) = line.trim().split_once('=') {
            fields.insert(key, value.trim().trim_matches('"').to_string());
        }
    }

    os_info.distro = fields.remove("PRETTY_NAME").or_else(|| fields.remove("NAME"));
    os_info.version = fields.remove("VERSION_ID");
    os_info.codename = fields.remove("VERSION_CODENAME").filter(|c| !c.is_empty());
}

/// Whether `name` can be run from the current `PATH`
pub fn tool_available(name: &str) -> bool {
    which::which(name).is_ok()
}

/// Last commands and verification result of the current task
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecVerifyInfo {
    pub last_exec_command: Option<String>,
    pub last_verify_command: Option<String>,
    pub last_verification_success: Option<bool>,
    pub last_verification_result: Option<String>,
}

/// Everything the `system` command shows
#[derive(Debug, Clone, Default, Serialize)]
pub struct SystemInfo {
    pub collected_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub facts: SystemFacts,
    pub user_select_info: Option<TaskSelection>,
    pub exec_verify_info: ExecVerifyInfo,
    pub last_llm_response: Option<ResponseSections>,
}

impl SystemInfo {
    pub fn detect() -> Self {
        Self {
            collected_at: Some(Utc::now()),
            facts: SystemFacts::detect(),
            ..Default::default()
        }
    }

    pub fn record_commands(&mut self, commands: &StepCommands) {
        self.exec_verify_info.last_exec_command = commands.last_exec_command.clone();
        self.exec_verify_info.last_verify_command = commands.last_verify_command.clone();
    }

    pub fn record_verification(&mut self, outcome: &VerificationOutcome) {
        self.exec_verify_info.last_verification_success = Some(outcome.success);
        self.exec_verify_info.last_verification_result = Some(outcome.result_text.clone());
    }

    /// Forget the previous task's progress
    pub fn reset_task(&mut self, selection: Option<TaskSelection>) {
        self.user_select_info = selection;
        self.exec_verify_info = ExecVerifyInfo::default();
        self.last_llm_response = None;
    }

    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
