//! Step response protocol
//!
//! The model answers with one step at a time, wrapped in XML-like section tags:
//!
//! ```text
//! <title_section>...</title_section>
//! <execution_section>...</execution_section>
//! <verification_section>...</verification_section>
//! ```
//!
//! and signals the end of a task with `<TERMINATE></TERMINATE>`.

mod formatter;
mod sections;

pub use formatter::{CommandKind, format_command_block, format_sections};
pub use sections::{ResponseSections, Section, TERMINATE_SENTINEL, extract, extract_all, is_terminated};
