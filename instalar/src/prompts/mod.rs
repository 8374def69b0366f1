//! Prompt Template System
//!
//! Loads and renders the `.pmt` system prompt that tells the model how to
//! format each step.
//!
//! Template loading chain:
//! 1. `.instalar/prompts/{name}.pmt` in the working directory
//! 2. `~/.config/instalar/prompts/{name}.pmt`
//! 3. Embedded fallback in code
//!
//! Templates use Handlebars syntax for variable substitution.

pub mod embedded;
mod loader;

pub use loader::{PromptLoader, StepPromptContext};
