//! Task selection menus

use colored::Colorize;
use serde::Serialize;
use tracing::debug;

use crate::console::{Prompt, show_error, show_heading};

/// Observability agents that can be installed or managed
pub const VENDORS: &[&str] = &[
    "AppDynamics Server Agent",
    "DataDog Agent",
    "Dynatrace OneAgent",
    "Grafana Agent",
    "Splunk OpenTelemetry Collector",
];

/// Managed Kubernetes platforms
pub const PLATFORMS: &[&str] = &["Amazon EKS", "Azure AKS", "Google GKE", "Red Hat OpenShift"];

/// Operations offered for a vendor
pub const OPERATIONS: &[&str] = &["Install", "Upgrade", "Migrate", "Configure", "Troubleshoot", "Uninstall"];

/// Which kind of target was picked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeType {
    Vendor,
    Platform,
}

/// The task the user chose from the menus
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskSelection {
    pub mode_type: ModeType,
    /// Display name, e.g. "DataDog Agent"
    pub target: String,
    /// Only set for vendors
    pub operation: Option<String>,
}

impl TaskSelection {
    pub fn vendor(target: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            mode_type: ModeType::Vendor,
            target: target.into(),
            operation: Some(operation.into()),
        }
    }

    pub fn platform(target: impl Into<String>) -> Self {
        Self {
            mode_type: ModeType::Platform,
            target: target.into(),
            operation: None,
        }
    }

    /// Lowercase, underscore-separated form of the target
    pub fn slug(&self) -> String {
        slugify(&self.target)
    }

    /// Label for the command prompt, e.g. `install_datadog_agent> `
    pub fn prompt_label(&self) -> String {
        match &self.operation {
            Some(op) => format!("{}_{}> ", slugify(op), self.slug()),
            None => format!("{}> ", self.slug()),
        }
    }

    /// First user turn sent when the task starts, if any
    pub fn initial_message(&self) -> Option<String> {
        self.operation
            .as_ref()
            .map(|op| format!("Please provide instructions for {} operation of {}", op, self.target))
    }
}

fn slugify(text: &str) -> String {
    text.trim().to_lowercase().split_whitespace().collect::<Vec<_>>().join("_")
}

/// A numbered menu entry
enum Choice {
    Vendor(&'static str),
    Platform(&'static str),
}

fn main_choices() -> Vec<Choice> {
    VENDORS
        .iter()
        .copied()
        .map(Choice::Vendor)
        .chain(PLATFORMS.iter().copied().map(Choice::Platform))
        .collect()
}

/// What a numbered menu read produced
enum MenuInput {
    Picked(usize),
    Exit,
    Redraw,
}

/// Read a 1-based choice among `count` entries
fn read_choice(prompt: &mut (impl Prompt + ?Sized), count: usize, help: &str) -> MenuInput {
    let label = format!("Enter number (1-{}): ", count);
    loop {
        let Some(line) = prompt.read_line(&label) else {
            return MenuInput::Exit;
        };
        let input = line.trim().to_lowercase();
        match input.as_str() {
            "" => continue,
            "exit" | "quit" => return MenuInput::Exit,
            "help" => {
                println!("{}", help);
                return MenuInput::Redraw;
            }
            _ => {}
        }
        match input.parse::<usize>() {
            Ok(n) if (1..=count).contains(&n) => return MenuInput::Picked(n - 1),
            _ => show_error(&format!("Invalid choice. Please enter a number between 1 and {}", count)),
        }
    }
}

const MAIN_HELP: &str = "Pick a vendor to install or manage its agent, or a platform to ask \
free-form questions about it. Type 'exit' to quit.";

const OPERATION_HELP: &str = "Pick the operation to perform. Choose 'Back' to return to the main menu.";

/// Show the main menu and, for vendors, the operation menu
///
/// Returns `None` when the user exits.
pub fn select_task(prompt: &mut (impl Prompt + ?Sized)) -> Option<TaskSelection> {
    let choices = main_choices();
    loop {
        show_heading("Observability Agents");
        for (i, vendor) in VENDORS.iter().enumerate() {
            println!("  {}. {}", (i + 1).to_string().cyan(), vendor);
        }
        show_heading("Infrastructure Platforms");
        for (i, platform) in PLATFORMS.iter().enumerate() {
            println!("  {}. {}", (VENDORS.len() + i + 1).to_string().cyan(), platform);
        }
        println!();

        let index = match read_choice(prompt, choices.len(), MAIN_HELP) {
            MenuInput::Picked(i) => i,
            MenuInput::Exit => return None,
            MenuInput::Redraw => continue,
        };

        match choices[index] {
            Choice::Platform(name) => {
                debug!(%name, "select_task: platform picked");
                return Some(TaskSelection::platform(name));
            }
            Choice::Vendor(name) => {
                debug!(%name, "select_task: vendor picked");
                match select_operation(prompt, name) {
                    OperationPick::Picked(op) => return Some(TaskSelection::vendor(name, op)),
                    OperationPick::Back => continue,
                    OperationPick::Exit => return None,
                }
            }
        }
    }
}

enum OperationPick {
    Picked(&'static str),
    Back,
    Exit,
}

fn select_operation(prompt: &mut (impl Prompt + ?Sized), vendor: &str) -> OperationPick {
    loop {
        show_heading(&format!("{} Operations", vendor));
        for (i, op) in OPERATIONS.iter().enumerate() {
            println!("  {}. {}", (i + 1).to_string().cyan(), op);
        }
        println!("  {}. Back", (OPERATIONS.len() + 1).to_string().cyan());
        println!();

        match read_choice(prompt, OPERATIONS.len() + 1, OPERATION_HELP) {
            MenuInput::Picked(i) if i < OPERATIONS.len() => return OperationPick::Picked(OPERATIONS[i]),
            MenuInput::Picked(_) => return OperationPick::Back,
            MenuInput::Exit => return OperationPick::Exit,
            MenuInput::Redraw => continue,
        }
    }
}
