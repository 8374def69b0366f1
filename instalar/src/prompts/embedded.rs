//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// System prompt describing the tagged step format
pub const STEP: &str = include_str!("../../prompts/step.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "step" => Some(STEP),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}
