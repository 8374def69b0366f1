//! Terminal collaborators
//!
//! The step machinery only talks to the terminal through [`Prompt`] and
//! [`LiveView`], so tests can script input and record what was drawn.

use std::io;

use colored::Colorize;

mod live;
mod readline;

pub use live::TerminalView;
pub use readline::{COMMAND_WORDS, ReadlinePrompt};

/// Line-oriented user input
pub trait Prompt {
    /// Read one line; `None` on interrupt or end of input
    fn read_line(&mut self, label: &str) -> Option<String>;

    /// Whether input has reached its end and no more lines will come
    fn at_eof(&self) -> bool {
        false
    }
}

/// A region of the terminal that is redrawn in place while a response streams in
pub trait LiveView {
    /// Replace the current contents with `rendered`
    fn update(&mut self, rendered: &str) -> io::Result<()>;

    /// Show text as is, used when the formatted view cannot be drawn
    fn show_raw(&mut self, text: &str);

    /// Announce that the model reported the task as finished
    fn complete(&mut self);

    /// Leave the current contents on screen and stop redrawing them
    fn finish(&mut self);

    /// Report a failure below the current contents
    fn show_error(&mut self, message: &str) {
        show_error(message);
    }
}

pub fn show_error(message: &str) {
    println!("{}", message.red());
}

pub fn show_warning(message: &str) {
    println!("{}", message.yellow());
}

pub fn show_heading(message: &str) {
    println!("\n{}", message.bold());
}

pub fn show_output(message: &str) {
    println!("{}", message);
}
