//! Section extraction for tag-delimited model responses
//!
//! Runs on every fragment against the whole accumulated buffer, so every
//! function here must tolerate arbitrary, possibly truncated, prefixes.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

/// Value returned by [`extract`] for the `terminate` tag when the marker is present
pub const TERMINATE_SENTINEL: &str = "true";

static TERMINATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<terminate>.*?</terminate>").expect("terminate pattern is valid")
});

// An info string only counts as a language tag when the fence line ends right after it,
// so a single-line block like ```apt install foo``` keeps its first word.
static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:[\w.+-]*[ \t]*\r?\n)?(.*?)```").expect("fence pattern is valid")
});

/// The tagged regions a step response is made of
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Think,
    Title,
    Description,
    Execution,
    Expected,
    Verification,
    Conclusion,
}

impl Section {
    pub const ALL: [Section; 7] = [
        Section::Think,
        Section::Title,
        Section::Description,
        Section::Execution,
        Section::Expected,
        Section::Verification,
        Section::Conclusion,
    ];

    /// Tag name as emitted by the model
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Think => "think",
            Self::Title => "title_section",
            Self::Description => "description_section",
            Self::Execution => "execution_section",
            Self::Expected => "expected_section",
            Self::Verification => "verification_section",
            Self::Conclusion => "conclusion_section",
        }
    }
}

/// Every known section of one response, recomputed from scratch per fragment
///
/// An empty string means the section is absent or not yet closed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResponseSections {
    pub think: String,
    pub title: String,
    pub description: String,
    pub execution: String,
    pub expected: String,
    pub verification: String,
    pub conclusion: String,
}

impl ResponseSections {
    /// Value of a single section
    pub fn get(&self, section: Section) -> &str {
        match section {
            Section::Think => &self.think,
            Section::Title => &self.title,
            Section::Description => &self.description,
            Section::Execution => &self.execution,
            Section::Expected => &self.expected,
            Section::Verification => &self.verification,
            Section::Conclusion => &self.conclusion,
        }
    }

    /// True when no section has any content yet
    pub fn is_empty(&self) -> bool {
        Section::ALL.iter().all(|s| self.get(*s).is_empty())
    }
}

/// Extract the trimmed body of the first `<tag>...</tag>` pair in `text`
///
/// Returns an empty string when the pair is not complete. A fenced code block
/// inside the body wins over the raw body. The `terminate` tag is matched
/// case-insensitively and yields [`TERMINATE_SENTINEL`] when present.
pub fn extract(text: &str, tag: &str) -> String {
    if tag.eq_ignore_ascii_case("terminate") {
        return if is_terminated(text) {
            TERMINATE_SENTINEL.to_string()
        } else {
            String::new()
        };
    }

    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);

    let Some(start) = text.find(&open) else {
        return String::new();
    };
    let body_start = start + open.len();
    let Some(len) = text[body_start..].find(&close) else {
        debug!(%tag, "extract: opening tag without close");
        return String::new();
    };

    let body = text[body_start..body_start + len].trim();
    match FENCE_RE.captures(body).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim().to_string(),
        None => body.to_string(),
    }
}

/// Extract all known sections from the accumulated text
pub fn extract_all(text: &str) -> ResponseSections {
    ResponseSections {
        think: extract(text, Section::Think.tag()),
        title: extract(text, Section::Title.tag()),
        description: extract(text, Section::Description.tag()),
        execution: extract(text, Section::Execution.tag()),
        expected: extract(text, Section::Expected.tag()),
        verification: extract(text, Section::Verification.tag()),
        conclusion: extract(text, Section::Conclusion.tag()),
    }
}

/// Whether the text carries a closed termination marker
pub fn is_terminated(text: &str) -> bool {
    TERMINATE_RE.is_match(text)
}
