//! CLI definitions

use clap::Parser;
use std::path::PathBuf;
use tracing::debug;

use crate::sysinfo::{DETECTED_TOOLS, tool_available};

/// Instalar - step-by-step guided installs of observability agents
#[derive(Debug, Parser)]
#[command(
    name = "instalar",
    about = "Step-by-step LLM guided installer for observability agents and infrastructure platforms",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(short = 'l', long = "log-level", help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)")]
    pub log_level: Option<String>,

    /// Disable colored output
    #[arg(long = "no-color", help = "Disable colored output")]
    pub no_color: bool,
}

/// Where the log file is written
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("instalar")
        .join("logs")
        .join("instalar.log")
}

/// Generate the after_help text with detected tools and the log location
pub fn generate_after_help() -> String {
    debug!("generate_after_help: called");
    let mut help = String::new();

    help.push_str("Detected Tools:\n");
    for tool in DETECTED_TOOLS {
        let icon = if tool_available(tool) { "\u{2705}" } else { "\u{274C}" };
        help.push_str(&format!("  {} {}\n", icon, tool));
    }

    help.push('\n');
    help.push_str(&format!("Logs are written to: {}\n", get_log_path().display()));
    help
}
