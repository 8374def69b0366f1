//! REPL session management

use std::io;

use colored::Colorize;
use crossterm::{cursor, execute, terminal};
use eyre::Result;
use tracing::{debug, warn};

use crate::assistant::Assistant;
use crate::console::{LiveView, Prompt, show_error, show_output};
use crate::menu::{self, TaskSelection};

/// A line typed at the command prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplCommand<'a> {
    Help,
    Exit,
    Clear,
    System,
    Menu,
    /// Anything else goes to the model
    Message(&'a str),
}

impl<'a> ReplCommand<'a> {
    pub fn parse(input: &'a str) -> Self {
        let input = input.trim();
        match input.to_lowercase().as_str() {
            "help" => Self::Help,
            "exit" | "close" | "end" => Self::Exit,
            "clear" => Self::Clear,
            "system" => Self::System,
            "menu" | "main" | "home" => Self::Menu,
            _ => Self::Message(input),
        }
    }
}

/// How the command loop for one task ended
enum LoopExit {
    Menu,
    Quit,
}

/// Interactive session: menus, then a command loop per task
pub struct ReplSession<P: Prompt, V: LiveView> {
    assistant: Assistant<P, V>,
}

impl<P: Prompt, V: LiveView> ReplSession<P, V> {
    pub fn new(assistant: Assistant<P, V>) -> Self {
        Self { assistant }
    }

    pub fn assistant(&self) -> &Assistant<P, V> {
        &self.assistant
    }

    /// Run until the user exits
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();

        loop {
            let Some(selection) = menu::select_task(self.assistant.prompt_mut()) else {
                break;
            };

            self.assistant.select(selection.clone());
            if let Some(message) = selection.initial_message() {
                self.process_input(&message).await;
            } else {
                println!(
                    "\nAsk anything about {}. Type {} for commands.\n",
                    selection.target.bright_white(),
                    "help".yellow()
                );
            }

            match self.command_loop(&selection).await {
                LoopExit::Menu => continue,
                LoopExit::Quit => break,
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    async fn command_loop(&mut self, selection: &TaskSelection) -> LoopExit {
        let label = selection.prompt_label().bright_green().to_string();
        loop {
            let Some(line) = self.assistant.prompt_mut().read_line(&label) else {
                if self.assistant.prompt_mut().at_eof() {
                    return LoopExit::Quit;
                }
                continue;
            };

            match ReplCommand::parse(&line) {
                ReplCommand::Message("") => continue,
                ReplCommand::Help => self.print_help(),
                ReplCommand::Exit => return LoopExit::Quit,
                ReplCommand::Menu => return LoopExit::Menu,
                ReplCommand::Clear => {
                    if let Err(e) = clear_screen() {
                        warn!(error = %e, "command_loop: clear failed");
                    }
                }
                ReplCommand::System => self.print_system_info(),
                ReplCommand::Message(text) => self.process_input(text).await,
            }
        }
    }

    /// Send input to the model and report where the step loop stopped
    async fn process_input(&mut self, input: &str) {
        debug!(len = %input.len(), "process_input: called");
        match self.assistant.send(input).await {
            Ok(status) => debug!(?status, "process_input: step loop stopped"),
            Err(e) => show_error(&format!("Error processing command: {:#}", e)),
        }
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "Instalar".bright_cyan().bold());
        println!("Guided installs of observability agents and infrastructure platforms.");
        println!("Type {} at any prompt for help, {} to quit", "help".yellow(), "exit".yellow());
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Available Commands:".bright_cyan());
        println!("  {:14} Show this help", "help".yellow());
        println!("  {:14} Exit the program", "exit".yellow());
        println!("  {:14} Clear the screen", "clear".yellow());
        println!("  {:14} Show detected system information", "system".yellow());
        println!("  {:14} Return to the main menu", "menu".yellow());
        println!();
        println!("Anything else is sent to the assistant as a question.");
        println!();
    }

    fn print_system_info(&self) {
        match self.assistant.context().system_info.to_pretty_json() {
            Ok(json) => show_output(&json),
            Err(e) => show_error(&format!("Error displaying system information: {}", e)),
        }
    }
}

fn clear_screen() -> io::Result<()> {
    execute!(io::stdout(), terminal::Clear(terminal::ClearType::All), cursor::MoveTo(0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(ReplCommand::parse("help"), ReplCommand::Help);
        assert_eq!(ReplCommand::parse("  EXIT "), ReplCommand::Exit);
        assert_eq!(ReplCommand::parse("close"), ReplCommand::Exit);
        assert_eq!(ReplCommand::parse("end"), ReplCommand::Exit);
        assert_eq!(ReplCommand::parse("clear"), ReplCommand::Clear);
        assert_eq!(ReplCommand::parse("system"), ReplCommand::System);
        assert_eq!(ReplCommand::parse("menu"), ReplCommand::Menu);
        assert_eq!(ReplCommand::parse("main"), ReplCommand::Menu);
        assert_eq!(ReplCommand::parse("Home"), ReplCommand::Menu);
    }

    #[test]
    fn test_parse_free_text() {
        assert_eq!(
            ReplCommand::parse("  how do I check the agent logs? "),
            ReplCommand::Message("how do I check the agent logs?")
        );
        assert_eq!(ReplCommand::parse("help me"), ReplCommand::Message("help me"));
        assert_eq!(ReplCommand::parse("   "), ReplCommand::Message(""));
    }
}
