//! In-place terminal redraw for streamed responses

use std::io::{self, Write};
use std::sync::LazyLock;

use colored::Colorize;
use crossterm::{cursor, queue, terminal};
use regex::Regex;
use tracing::debug;

use super::LiveView;

static ANSI_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*m").expect("ANSI pattern is valid"));

/// Visible width of a line once color codes are removed
fn visible_width(line: &str) -> usize {
    ANSI_RE.replace_all(line, "").chars().count()
}

/// Terminal rows `text` occupies at the given width
fn rows_for(text: &str, columns: u16) -> u16 {
    let columns = usize::from(columns.max(1));
    let rows: usize = text
        .split('\n')
        .map(|line| visible_width(line).div_ceil(columns).max(1))
        .sum();
    u16::try_from(rows).unwrap_or(u16::MAX)
}

/// Rows to move up before the next redraw
///
/// The cursor cannot move above the top of the screen, so a render taller
/// than the terminal is only erased up to its visible part.
fn rows_to_erase(text: &str, columns: u16, screen_rows: u16) -> u16 {
    rows_for(text, columns)
        .saturating_sub(1)
        .min(screen_rows.saturating_sub(1))
}

/// Redraws the most recent render over the previous one on stdout
#[derive(Debug, Default)]
pub struct TerminalView {
    /// Rows above the cursor that belong to the last render
    drawn_rows: u16,
    /// Something was drawn since the last finish
    dirty: bool,
}

impl TerminalView {
    pub fn new() -> Self {
        Self::default()
    }

    fn erase_previous(&self, out: &mut impl Write) -> io::Result<()> {
        queue!(out, cursor::MoveToColumn(0))?;
        if self.drawn_rows > 0 {
            queue!(out, cursor::MoveUp(self.drawn_rows))?;
        }
        queue!(out, terminal::Clear(terminal::ClearType::FromCursorDown))?;
        Ok(())
    }
}

impl LiveView for TerminalView {
    fn update(&mut self, rendered: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        self.erase_previous(&mut out)?;
        write!(out, "{}", rendered)?;
        out.flush()?;

        let (columns, rows) = terminal::size().unwrap_or((80, 24));
        self.drawn_rows = rows_to_erase(rendered, columns, rows);
        self.dirty = true;
        Ok(())
    }

    fn show_raw(&mut self, text: &str) {
        debug!(len = %text.len(), "show_raw: falling back to plain text");
        let mut out = io::stdout().lock();
        let _ = self.erase_previous(&mut out);
        let _ = writeln!(out, "{}", text);
        let _ = out.flush();
        self.drawn_rows = 0;
        self.dirty = false;
    }

    fn complete(&mut self) {
        println!("\n{}", "🎉 Operation Complete!".green().bold());
        println!("{}", "All steps have been successfully completed.".green());
        println!("Type 'menu' to pick another task or 'exit' to quit.\n");
    }

    fn finish(&mut self) {
        if self.dirty {
            println!();
        }
        self.drawn_rows = 0;
        self.dirty = false;
    }
}
