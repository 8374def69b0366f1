//! Renders extracted sections into the live step view

use colored::Colorize;

use super::sections::ResponseSections;

/// Width of the rule drawn around command blocks
const RULE_WIDTH: usize = 80;

/// Which command a block shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Execute,
    Verify,
}

impl CommandKind {
    fn label(&self) -> &'static str {
        match self {
            Self::Execute => "Execute Command:",
            Self::Verify => "Verify Command:",
        }
    }
}

/// Render one command between two separator rules
pub fn format_command_block(command: &str, kind: CommandKind) -> String {
    let rule = "─".repeat(RULE_WIDTH);
    format!(
        "\n{}\n{}\n\n{}\n{}\n",
        rule.dimmed(),
        kind.label().cyan().bold(),
        command.white().bold().on_black(),
        rule.dimmed()
    )
}

/// Render every non-empty section in display order
///
/// `think` is private reasoning and never shown.
pub fn format_sections(sections: &ResponseSections) -> String {
    let mut out = String::new();

    if !sections.title.is_empty() {
        out.push_str(&format!("\n{}\n\n", format!("## {}", sections.title).cyan().bold()));
    }

    if !sections.description.is_empty() {
        out.push_str(&format!("{}\n\n", sections.description));
    }

    if !sections.execution.is_empty() {
        out.push_str(&format_command_block(&sections.execution, CommandKind::Execute));
    }

    if !sections.expected.is_empty() {
        out.push_str(&format!("\n{}\n{}\n", "Expected Outcome:".yellow().bold(), sections.expected));
    }

    if !sections.verification.is_empty() {
        out.push_str(&format_command_block(&sections.verification, CommandKind::Verify));
    }

    if !sections.conclusion.is_empty() {
        out.push_str(&format!("\n{}\n", sections.conclusion.italic()));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sections() -> ResponseSections {
        ResponseSections {
            think: "secret reasoning".to_string(),
            title: "Install".to_string(),
            description: "Installs the agent".to_string(),
            execution: "apt install foo".to_string(),
            expected: "foo is installed".to_string(),
            verification: "dpkg -s foo".to_string(),
            conclusion: "Next step follows".to_string(),
        }
    }

    #[test]
    fn test_format_renders_in_order() {
        let out = format_sections(&sections());
        let order = [
            "Install",
            "Installs the agent",
            "Execute Command:",
            "apt install foo",
            "Expected Outcome:",
            "Verify Command:",
            "dpkg -s foo",
            "Next step follows",
        ];
        let mut last = 0;
        for needle in order {
            let pos = out[last..].find(needle).map(|p| p + last);
            assert!(pos.is_some(), "missing or out of order: {needle}");
            last = pos.unwrap_or(last);
        }
    }

    #[test]
    fn test_think_is_never_rendered() {
        assert!(!format_sections(&sections()).contains("secret reasoning"));
    }

    #[test]
    fn test_empty_sections_render_nothing() {
        assert!(format_sections(&ResponseSections::default()).is_empty());
    }

    #[test]
    fn test_command_block_has_rules() {
        let block = format_command_block("ls", CommandKind::Verify);
        assert!(block.contains("Verify Command:"));
        assert_eq!(block.matches(&"─".repeat(RULE_WIDTH)).count(), 2);
    }

    #[test]
    fn test_format_is_deterministic() {
        assert_eq!(format_sections(&sections()), format_sections(&sections()));
    }
}
