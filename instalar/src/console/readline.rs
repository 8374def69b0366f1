//! rustyline-backed prompt with command completion and persistent history

use std::path::PathBuf;

use eyre::Result;
use rustyline::completion::Completer;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tracing::debug;

use super::{Prompt, show_error, show_warning};

/// Words offered by tab completion at the command prompt
pub const COMMAND_WORDS: &[&str] = &[
    "help", "exit", "close", "end", "clear", "system", "menu", "main", "home",
];

/// Completes the word under the cursor from a fixed list
struct CommandCompleter {
    words: &'static [&'static str],
}

impl Completer for CommandCompleter {
    type Candidate = String;

    fn complete(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> rustyline::Result<(usize, Vec<String>)> {
        let start = line[..pos].rfind(char::is_whitespace).map(|i| i + 1).unwrap_or(0);
        let word = &line[start..pos];
        let candidates = self
            .words
            .iter()
            .filter(|w| w.starts_with(word))
            .map(|w| w.to_string())
            .collect();
        Ok((start, candidates))
    }
}

impl Hinter for CommandCompleter {
    type Hint = String;
}

impl Highlighter for CommandCompleter {}

impl Validator for CommandCompleter {}

impl Helper for CommandCompleter {}

/// Interactive prompt reading from the terminal
pub struct ReadlinePrompt {
    editor: Editor<CommandCompleter, DefaultHistory>,
    history_path: Option<PathBuf>,
    eof: bool,
}

impl ReadlinePrompt {
    pub fn new(history_path: Option<PathBuf>) -> Result<Self> {
        let mut editor: Editor<CommandCompleter, DefaultHistory> =
            Editor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;
        editor.set_helper(Some(CommandCompleter { words: COMMAND_WORDS }));

        if let Some(ref path) = history_path
            && path.exists()
            && let Err(e) = editor.load_history(path)
        {
            debug!(?path, error = %e, "ReadlinePrompt::new: could not load history");
        }

        Ok(Self {
            editor,
            history_path,
            eof: false,
        })
    }
}

impl Prompt for ReadlinePrompt {
    fn read_line(&mut self, label: &str) -> Option<String> {
        match self.editor.readline(label) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Some(line)
            }
            Err(ReadlineError::Interrupted) => {
                show_warning("\nOperation cancelled by user");
                None
            }
            Err(ReadlineError::Eof) => {
                show_warning("\nExit signal received");
                self.eof = true;
                None
            }
            Err(e) => {
                show_error(&format!("Input error: {}", e));
                None
            }
        }
    }

    fn at_eof(&self) -> bool {
        self.eof
    }
}

impl Drop for ReadlinePrompt {
    fn drop(&mut self) {
        let Some(ref path) = self.history_path else {
            return;
        };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Err(e) = self.editor.save_history(path) {
            debug!(?path, error = %e, "ReadlinePrompt::drop: could not save history");
        }
    }
}
