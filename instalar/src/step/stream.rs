//! Streaming session - accumulates response fragments and renders them live

use std::time::{Duration, Instant};

use futures::{Stream, StreamExt};
use tracing::{debug, warn};

use super::StepCommands;
use crate::console::LiveView;
use crate::llm::LlmError;
use crate::protocol::{ResponseSections, extract_all, format_sections, is_terminated};

/// How a streamed response ended
#[derive(Debug, Clone, PartialEq)]
pub enum StreamOutcome {
    /// The model signalled that no steps remain
    Terminated,
    /// The stream ran to its end
    Finished { text: String, sections: ResponseSections },
    /// The transport failed part way; `text` ends with the error message
    Failed { text: String },
    /// No content arrived at all
    Empty,
}

/// Consumes one response stream into a live view
///
/// The whole buffer is re-parsed after every fragment, so tags split across
/// fragments are picked up once they complete. Redraws are throttled to the
/// configured rate; the final state is always drawn. A transport failure
/// puts the commands back to what they were before the response started.
pub struct StreamingSession<'a, V: LiveView + ?Sized> {
    view: &'a mut V,
    commands: &'a mut StepCommands,
    min_interval: Duration,
}

impl<'a, V: LiveView + ?Sized> StreamingSession<'a, V> {
    pub fn new(view: &'a mut V, commands: &'a mut StepCommands, refresh_per_second: u32) -> Self {
        let min_interval = if refresh_per_second == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs(1) / refresh_per_second
        };
        Self {
            view,
            commands,
            min_interval,
        }
    }

    pub async fn consume<S, T>(mut self, mut fragments: S) -> StreamOutcome
    where
        S: Stream<Item = Result<T, LlmError>> + Unpin,
        T: AsRef<str>,
    {
        let mut buffer = String::new();
        let mut sections = ResponseSections::default();
        let mut last_draw: Option<Instant> = None;
        let mut pending = false;
        let saved_commands = self.commands.clone();

        while let Some(fragment) = fragments.next().await {
            let fragment = match fragment {
                Ok(fragment) => fragment,
                Err(e) => {
                    warn!(error = %e, len = %buffer.len(), "consume: transport failed");
                    if pending {
                        self.draw(&sections, &buffer);
                    }
                    self.view.finish();
                    *self.commands = saved_commands;

                    let message = e.to_fragment();
                    self.view.show_error(message.trim_start());
                    buffer.push_str(&message);
                    return StreamOutcome::Failed { text: buffer };
                }
            };
            buffer.push_str(fragment.as_ref());

            if is_terminated(&buffer) {
                debug!(len = %buffer.len(), "consume: termination marker seen");
                self.view.finish();
                self.view.complete();
                return StreamOutcome::Terminated;
            }

            sections = extract_all(&buffer);
            self.commands.update(&sections);

            if last_draw.is_none_or(|t| t.elapsed() >= self.min_interval) {
                self.draw(&sections, &buffer);
                last_draw = Some(Instant::now());
                pending = false;
            } else {
                pending = true;
            }
        }

        if buffer.is_empty() {
            debug!("consume: stream produced no content");
            self.view.show_error("No content received from the model");
            return StreamOutcome::Empty;
        }

        if pending {
            self.draw(&sections, &buffer);
        }
        self.view.finish();

        debug!(len = %buffer.len(), "consume: stream finished");
        StreamOutcome::Finished { text: buffer, sections }
    }

    fn draw(&mut self, sections: &ResponseSections, buffer: &str) {
        // Untagged text (free-form answers) is shown as is
        let rendered = if sections.is_empty() {
            buffer.to_string()
        } else {
            format_sections(sections)
        };

        if let Err(e) = self.view.update(&rendered) {
            warn!(error = %e, "draw: live view failed, showing raw text");
            self.view.show_raw(buffer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct RecordingView {
        updates: Vec<String>,
        raw: Vec<String>,
        completed: bool,
        finished: usize,
        errors: Vec<String>,
        fail_updates: bool,
    }

    impl LiveView for RecordingView {
        fn update(&mut self, rendered: &str) -> io::Result<()> {
            if self.fail_updates {
                return Err(io::Error::other("terminal gone"));
            }
            self.updates.push(rendered.to_string());
            Ok(())
        }

        fn show_raw(&mut self, text: &str) {
            self.raw.push(text.to_string());
        }

        fn complete(&mut self) {
            self.completed = true;
        }

        fn finish(&mut self) {
            self.finished += 1;
        }

        fn show_error(&mut self, message: &str) {
            self.errors.push(message.to_string());
        }
    }

    fn fragments(parts: &[&str]) -> impl Stream<Item = Result<String, LlmError>> + Unpin {
        futures::stream::iter(parts.iter().map(|p| Ok(p.to_string())).collect::<Vec<_>>())
    }

    #[tokio::test]
    async fn test_split_tags_are_assembled() {
        let mut view = RecordingView::default();
        let mut commands = StepCommands::default();

        let outcome = StreamingSession::new(&mut view, &mut commands, 0)
            .consume(fragments(&[
                "<title_section>Inst",
                "all</title_section><execution_section>```apt install foo```</execution_section>",
            ]))
            .await;

        let StreamOutcome::Finished { sections, .. } = outcome else {
            panic!("expected a finished stream, got {:?}", outcome);
        };
        assert_eq!(sections.title, "Install");
        assert_eq!(commands.last_exec_command.as_deref(), Some("apt install foo"));
        assert_eq!(commands.last_verify_command, None);

        let last = view.updates.last().unwrap();
        assert!(last.contains("Install"));
        assert!(last.contains("Execute Command:"));
        assert!(!last.contains("Verify Command:"));
        assert_eq!(view.finished, 1);
        assert!(!view.completed);
    }

    #[tokio::test]
    async fn test_termination_stops_consumption() {
        let pulled = Arc::new(AtomicUsize::new(0));
        let counter = pulled.clone();
        let stream = futures::stream::iter(vec!["Done. <TERMINATE>", "</TERMINATE>", "more", "and more"]).map(move |f| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, LlmError>(f)
        });

        let mut view = RecordingView::default();
        let mut commands = StepCommands::default();
        let outcome = StreamingSession::new(&mut view, &mut commands, 0)
            .consume(Box::pin(stream))
            .await;

        assert_eq!(outcome, StreamOutcome::Terminated);
        assert!(view.completed);
        assert_eq!(pulled.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_stream() {
        let mut view = RecordingView::default();
        let mut commands = StepCommands::default();
        let outcome = StreamingSession::new(&mut view, &mut commands, 0)
            .consume(fragments(&[]))
            .await;

        assert_eq!(outcome, StreamOutcome::Empty);
        assert!(view.updates.is_empty());
    }

    #[tokio::test]
    async fn test_untagged_text_is_shown_as_is() {
        let mut view = RecordingView::default();
        let mut commands = StepCommands::default();
        StreamingSession::new(&mut view, &mut commands, 0)
            .consume(fragments(&["EKS uses managed node groups."]))
            .await;

        assert_eq!(view.updates.last().unwrap(), "EKS uses managed node groups.");
        assert!(!commands.any());
    }

    #[tokio::test]
    async fn test_transport_failure_after_tagged_text_is_shown() {
        let stream = futures::stream::iter(vec![
            Ok("<title_section>Install</title_section><execution_section>apt install foo</execution_section>"),
            Err(LlmError::ApiError {
                status: 503,
                message: "upstream connection lost".to_string(),
            }),
        ]);

        let mut view = RecordingView::default();
        let mut commands = StepCommands {
            last_exec_command: Some("apt update".to_string()),
            last_verify_command: None,
        };
        let outcome = StreamingSession::new(&mut view, &mut commands, 0)
            .consume(stream)
            .await;

        let StreamOutcome::Failed { text } = outcome else {
            panic!("expected a failed outcome");
        };
        assert!(text.starts_with("<title_section>Install</title_section>"));
        assert!(text.ends_with("API error occurred - upstream connection lost"));
        assert_eq!(view.errors, vec!["Error: API error occurred - upstream connection lost"]);
        assert_eq!(view.finished, 1);
        assert_eq!(commands.last_exec_command.as_deref(), Some("apt update"));
    }

    #[tokio::test]
    async fn test_transport_failure_before_any_text() {
        let stream = futures::stream::iter(vec![Err::<String, _>(LlmError::RateLimited {
            retry_after: Duration::from_secs(5),
        })]);

        let mut view = RecordingView::default();
        let mut commands = StepCommands::default();
        let outcome = StreamingSession::new(&mut view, &mut commands, 0)
            .consume(stream)
            .await;

        assert!(matches!(outcome, StreamOutcome::Failed { .. }));
        assert!(view.updates.is_empty());
        assert!(view.errors[0].starts_with("Error: Rate limit reached"));
    }

    #[tokio::test]
    async fn test_view_failure_falls_back_to_raw() {
        let mut view = RecordingView {
            fail_updates: true,
            ..Default::default()
        };
        let mut commands = StepCommands::default();
        let outcome = StreamingSession::new(&mut view, &mut commands, 0)
            .consume(fragments(&["<title_section>T</title_section>"]))
            .await;

        assert!(matches!(outcome, StreamOutcome::Finished { .. }));
        assert_eq!(view.raw.last().unwrap(), "<title_section>T</title_section>");
    }

    #[tokio::test]
    async fn test_throttled_updates_still_draw_final_state() {
        let mut view = RecordingView::default();
        let mut commands = StepCommands::default();
        StreamingSession::new(&mut view, &mut commands, 1)
            .consume(fragments(&[
                "<title_section>A</title_section>",
                "<description_section>B</description_section>",
                "<conclusion_section>C</conclusion_section>",
            ]))
            .await;

        assert_eq!(view.updates.len(), 2);
        let last = view.updates.last().unwrap();
        assert!(last.contains('A') && last.contains('B') && last.contains('C'));
    }

    #[tokio::test]
    async fn test_commands_survive_later_fragments() {
        let mut view = RecordingView::default();
        let mut commands = StepCommands {
            last_exec_command: None,
            last_verify_command: Some("systemctl status foo".to_string()),
        };
        StreamingSession::new(&mut view, &mut commands, 0)
            .consume(fragments(&["<execution_section>start foo</execution_section>"]))
            .await;

        assert_eq!(commands.last_exec_command.as_deref(), Some("start foo"));
        assert_eq!(commands.last_verify_command.as_deref(), Some("systemctl status foo"));
    }
}
