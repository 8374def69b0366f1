//! Verification runner - executes a step's verification command

use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

/// Captured output beyond this many bytes is cut
const MAX_OUTPUT_CHARS: usize = 30_000;

/// Exit status `sh` uses when it cannot find the command
const SHELL_NOT_FOUND: i32 = 127;

/// Result of one verification run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationOutcome {
    pub success: bool,
    pub result_text: String,
}

impl VerificationOutcome {
    fn success(result_text: impl Into<String>) -> Self {
        Self {
            success: true,
            result_text: result_text.into(),
        }
    }

    fn failure(result_text: impl Into<String>) -> Self {
        Self {
            success: false,
            result_text: result_text.into(),
        }
    }
}

/// Ways a verification can fail before producing a normal exit status
#[derive(Debug, Error)]
enum VerifyError {
    #[error("Command timed out after {}", describe(.0))]
    Timeout(Duration),

    #[error("Command not found: {program}")]
    NotFound { program: String, stderr: String },

    #[error("Error executing command: {0}")]
    Execution(String),
}

impl VerifyError {
    fn label(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "Timeout Error",
            Self::NotFound { .. } => "Command Not Found",
            Self::Execution(_) => "Execution Error",
        }
    }

    fn into_outcome(self) -> VerificationOutcome {
        let mut text = format!("{}: {}", self.label(), self);
        if let Self::NotFound { stderr, .. } = &self
            && !stderr.trim().is_empty()
        {
            text.push_str(&format!("\nErrors:\n{}", stderr.trim_end()));
        }
        VerificationOutcome::failure(text)
    }
}

fn describe(d: &Duration) -> String {
    if d.subsec_millis() == 0 {
        format!("{} seconds", d.as_secs())
    } else {
        format!("{} ms", d.as_millis())
    }
}

fn truncate(text: &str) -> String {
    if text.len() <= MAX_OUTPUT_CHARS {
        return text.to_string();
    }
    let mut end = MAX_OUTPUT_CHARS;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...\n[truncated, {} chars total]", &text[..end], text.len())
}

/// First word of a shell command, used to name a missing program
fn program_name(command: &str) -> String {
    command.split_whitespace().next().unwrap_or(command).to_string()
}

/// Runs verification commands through a shell with a bounded timeout
#[derive(Debug, Clone)]
pub struct VerificationRunner {
    shell: String,
    timeout: Duration,
}

impl VerificationRunner {
    pub fn new(timeout: Duration) -> Self {
        Self {
            shell: "sh".to_string(),
            timeout,
        }
    }

    /// Use a different interpreter than `sh`
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    /// Run the verification command, if any
    ///
    /// A missing or blank command verifies trivially. Every failure class is
    /// reported through the outcome; this never returns an error.
    pub async fn run(&self, command: Option<&str>) -> VerificationOutcome {
        let Some(command) = command.map(str::trim).filter(|c| !c.is_empty()) else {
            debug!("run: no verification command, nothing to check");
            return VerificationOutcome::success("No verification command provided");
        };

        match self.execute(command).await {
            Ok(outcome) => outcome,
            Err(e) => {
                debug!(error = %e, "run: verification failed to complete");
                e.into_outcome()
            }
        }
    }

    async fn execute(&self, command: &str) -> Result<VerificationOutcome, VerifyError> {
        debug!(%command, shell = %self.shell, timeout = ?self.timeout, "execute: spawning");
        let child = tokio::process::Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(VerifyError::NotFound {
                    program: self.shell.clone(),
                    stderr: String::new(),
                });
            }
            Ok(Err(e)) => return Err(VerifyError::Execution(e.to_string())),
            Err(_) => return Err(VerifyError::Timeout(self.timeout)),
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let code = output.status.code();
        debug!(?code, stdout_len = %stdout.len(), stderr_len = %stderr.len(), "execute: completed");

        if code == Some(SHELL_NOT_FOUND) {
            return Err(VerifyError::NotFound {
                program: program_name(command),
                stderr: truncate(&stderr),
            });
        }

        let mut text = String::new();
        if !stdout.is_empty() {
            text.push_str(&format!("Output:\n{}\n", truncate(&stdout)));
        }
        if !stderr.is_empty() {
            text.push_str(&format!("Errors:\n{}\n", truncate(&stderr)));
        }

        let success = output.status.success();
        text.push_str(&format!(
            "Status: {} (return code: {})",
            if success { "Success" } else { "Failed" },
            code.unwrap_or(-1)
        ));

        Ok(if success {
            VerificationOutcome::success(text)
        } else {
            VerificationOutcome::failure(text)
        })
    }
}
