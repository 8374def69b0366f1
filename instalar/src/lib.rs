//! Instalar - LLM guided installs, one verified step at a time
//!
//! The model answers in tagged sections. Each answer is rendered live as it
//! streams in, the user confirms they ran the proposed command, a verification
//! command checks the result, and the outcome is reported back to the model
//! for the next step until it signals that the task is done.
//!
//! # Modules
//!
//! - [`protocol`] - Section extraction and formatting
//! - [`step`] - Streaming session, confirmation and verification
//! - [`assistant`] - Feedback loop driving steps for a task
//! - [`llm`] - Streaming chat client
//! - [`repl`] - Menus and the interactive command loop
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod assistant;
pub mod cli;
pub mod config;
pub mod console;
pub mod context;
pub mod conversation;
pub mod llm;
pub mod menu;
pub mod prompts;
pub mod protocol;
pub mod repl;
pub mod step;
pub mod sysinfo;

// Re-export commonly used types
pub use assistant::{Assistant, StepStatus};
pub use config::{Config, LlmConfig, SessionConfig};
pub use console::{LiveView, Prompt};
pub use context::SessionContext;
pub use conversation::{Conversation, ConversationError};
pub use llm::{ChatRequest, LlmClient, LlmError, Message, OpenAIClient, Role, create_client};
pub use menu::TaskSelection;
pub use prompts::{PromptLoader, StepPromptContext};
pub use protocol::{ResponseSections, extract, extract_all, format_sections, is_terminated};
pub use step::{StepCommands, StreamOutcome, StreamingSession, VerificationOutcome, VerificationRunner};
pub use sysinfo::SystemInfo;
