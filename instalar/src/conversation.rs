//! Bounded conversation history

use std::collections::VecDeque;

use thiserror::Error;
use tracing::debug;

use crate::llm::{ChatRequest, Message, Role};

/// Rejections when adding to or reading from the history
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversationError {
    #[error("Message content must be a non-empty string")]
    EmptyContent,

    #[error("Conversation has no messages to send")]
    NoMessages,
}

/// Ordered user/assistant turns, oldest dropped past capacity
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: VecDeque<Message>,
    max_history: usize,
}

impl Conversation {
    pub fn new(max_history: usize) -> Self {
        let max_history = max_history.max(1);
        Self {
            messages: VecDeque::with_capacity(max_history),
            max_history,
        }
    }

    /// Append a message, evicting the oldest once over capacity
    pub fn push(&mut self, message: Message) -> Result<(), ConversationError> {
        if message.content.trim().is_empty() {
            return Err(ConversationError::EmptyContent);
        }

        self.messages.push_back(message);
        while self.messages.len() > self.max_history {
            self.messages.pop_front();
        }
        debug!(len = %self.messages.len(), "push: message added");
        Ok(())
    }

    pub fn add_user(&mut self, content: impl Into<String>) -> Result<(), ConversationError> {
        self.push(Message::user(content))
    }

    pub fn add_assistant(&mut self, content: impl Into<String>) -> Result<(), ConversationError> {
        self.push(Message::assistant(content))
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Build a request with `system_prompt` first and the history after it
    ///
    /// System entries stored in the history are not forwarded; the system
    /// prompt is the only one the model sees.
    pub fn request(&self, system_prompt: String, max_tokens: u32) -> Result<ChatRequest, ConversationError> {
        let messages: Vec<Message> = self
            .messages
            .iter()
            .filter(|m| m.role != Role::System)
            .cloned()
            .collect();

        if messages.is_empty() {
            return Err(ConversationError::NoMessages);
        }

        Ok(ChatRequest {
            system_prompt,
            messages,
            max_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_content() {
        let mut conversation = Conversation::new(10);
        assert_eq!(conversation.add_user(""), Err(ConversationError::EmptyContent));
        assert_eq!(conversation.add_user("  \n\t"), Err(ConversationError::EmptyContent));
        assert!(conversation.is_empty());
    }

    #[test]
    fn test_evicts_oldest_first() {
        let mut conversation = Conversation::new(3);
        for i in 0..5 {
            conversation.add_user(format!("message {}", i)).unwrap();
        }

        let contents: Vec<&str> = conversation.messages().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["message 2", "message 3", "message 4"]);
    }

    #[test]
    fn test_zero_capacity_keeps_one() {
        let mut conversation = Conversation::new(0);
        conversation.add_user("a").unwrap();
        conversation.add_user("b").unwrap();
        assert_eq!(conversation.len(), 1);
    }

    #[test]
    fn test_request_skips_system_entries() {
        let mut conversation = Conversation::new(10);
        conversation.push(Message::system("stale prompt")).unwrap();
        conversation.add_user("install it").unwrap();
        conversation.add_assistant("<title_section>Step 1</title_section>").unwrap();

        let request = conversation.request("You are helpful".to_string(), 1000).unwrap();
        assert_eq!(request.system_prompt, "You are helpful");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::User);
        assert_eq!(request.messages[1].role, Role::Assistant);
    }

    #[test]
    fn test_request_requires_messages() {
        let conversation = Conversation::new(10);
        assert_eq!(
            conversation.request(String::new(), 10).unwrap_err(),
            ConversationError::NoMessages
        );
    }
}
