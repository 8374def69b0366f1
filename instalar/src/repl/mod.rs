//! Interactive command loop
//!
//! Picks a task from the menus, starts it, then reads commands until the
//! user returns to the menu or exits.

mod session;

pub use session::{ReplCommand, ReplSession};

use eyre::{Context, Result};
use tracing::info;

use crate::assistant::Assistant;
use crate::config::Config;
use crate::console::{ReadlinePrompt, TerminalView};
use crate::context::SessionContext;
use crate::llm::create_client;
use crate::prompts::PromptLoader;
use crate::sysinfo::SystemInfo;

/// Run the interactive session on the terminal
pub async fn run_interactive(config: &Config) -> Result<()> {
    let llm = create_client(&config.llm).context("Failed to create LLM client")?;

    println!("Collecting system information...");
    let system_info = SystemInfo::detect();
    info!("Detected system: {:?}", system_info.facts.os_info);

    let workdir = std::env::current_dir().context("Failed to read current directory")?;
    let prompts = PromptLoader::new(&workdir);
    let prompt = ReadlinePrompt::new(config.session.history_path())?;

    let assistant = Assistant::new(
        llm,
        config,
        SessionContext::new(system_info),
        prompts,
        prompt,
        TerminalView::new(),
    );

    let mut session = ReplSession::new(assistant);
    session.run().await
}
