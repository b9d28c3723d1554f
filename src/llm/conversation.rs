//! Caller-owned conversation history.

use super::{ChatMessage, Role, StreamEvent, APOLOGY_MESSAGE, EMPTY_REPLY_MESSAGE};

const DEFAULT_MAX_MESSAGES: usize = 20;

/// Ordered chat history for one user session.
///
/// Messages are never edited once complete. The only mutable message is
/// the in-progress assistant reply opened by [`Conversation::begin_assistant`],
/// which grows as stream fragments arrive.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    max_messages: usize,
    in_progress: bool,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self::with_max_messages(DEFAULT_MAX_MESSAGES)
    }

    /// Keep at most `max_messages` messages.
    ///
    /// Trimming drops whole exchanges from the front, so the kept history
    /// always opens with a user message.
    pub fn with_max_messages(max_messages: usize) -> Self {
        Self {
            messages: Vec::new(),
            max_messages: max_messages.max(2),
            in_progress: false,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::user(content));
        self.trim();
    }

    /// Open an empty assistant message for a streamed reply.
    pub fn begin_assistant(&mut self) {
        self.messages.push(ChatMessage::assistant(String::new()));
        self.in_progress = true;
    }

    /// Extend the in-progress assistant message. Ignored when none is open.
    pub fn append_fragment(&mut self, fragment: &str) {
        if let Some(message) = self.current_reply() {
            message.content.push_str(fragment);
        }
    }

    /// Close the in-progress reply.
    pub fn finish_assistant(&mut self) {
        if let Some(message) = self.current_reply() {
            if message.content.is_empty() {
                message.content = EMPTY_REPLY_MESSAGE.to_string();
            }
        }
        self.in_progress = false;
        self.trim();
    }

    /// Close the in-progress reply with the user-facing apology.
    pub fn fail_assistant(&mut self) {
        if let Some(message) = self.current_reply() {
            if message.content.is_empty() {
                message.content = APOLOGY_MESSAGE.to_string();
            } else {
                message.content.push_str("\n\n");
                message.content.push_str(APOLOGY_MESSAGE);
            }
        } else {
            self.messages.push(ChatMessage::assistant(APOLOGY_MESSAGE));
        }
        self.in_progress = false;
        self.trim();
    }

    /// Record a completed, non-streamed assistant reply.
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::assistant(content));
        self.trim();
    }

    /// Fold one stream event into the history.
    pub fn apply(&mut self, event: &StreamEvent) {
        match event {
            StreamEvent::Fragment(text) => self.append_fragment(text),
            StreamEvent::Done => self.finish_assistant(),
            StreamEvent::Error(_) => self.fail_assistant(),
        }
    }

    /// The message list to send: `system` followed by the history.
    ///
    /// An open, still-empty assistant message is left out.
    pub fn request(&self, system: ChatMessage) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.messages.len() + 1);
        messages.push(system);
        messages.extend(
            self.messages
                .iter()
                .filter(|m| !(m.role == Role::Assistant && m.content.is_empty()))
                .cloned(),
        );
        messages
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.in_progress = false;
    }

    fn current_reply(&mut self) -> Option<&mut ChatMessage> {
        if !self.in_progress {
            return None;
        }
        self.messages
            .last_mut()
            .filter(|m| m.role == Role::Assistant)
    }

    fn trim(&mut self) {
        if self.in_progress || self.messages.len() <= self.max_messages {
            return;
        }

        let mut cut = self.messages.len() - self.max_messages;
        while cut < self.messages.len() && self.messages[cut].role != Role::User {
            cut += 1;
        }
        self.messages.drain(..cut);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streamed_reply_grows_in_place() {
        let mut conversation = Conversation::new();
        conversation.push_user("Tell me about Shaw University");
        conversation.begin_assistant();

        for event in [
            StreamEvent::Fragment("Hel".into()),
            StreamEvent::Fragment("lo".into()),
            StreamEvent::Done,
        ] {
            conversation.apply(&event);
        }

        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.messages()[1], ChatMessage::assistant("Hello"));

        // Fragments after completion do not touch the closed message.
        conversation.append_fragment("late");
        assert_eq!(conversation.messages()[1].content, "Hello");
    }

    #[test]
    fn test_failure_appends_apology() {
        let mut conversation = Conversation::new();
        conversation.push_user("Hi");
        conversation.begin_assistant();
        conversation.apply(&StreamEvent::Error("connection refused".into()));

        assert_eq!(conversation.messages()[1].content, APOLOGY_MESSAGE);

        conversation.push_user("Again");
        conversation.begin_assistant();
        conversation.apply(&StreamEvent::Fragment("Part".into()));
        conversation.apply(&StreamEvent::Error("reset".into()));
        assert_eq!(
            conversation.messages()[3].content,
            format!("Part\n\n{}", APOLOGY_MESSAGE)
        );
    }

    #[test]
    fn test_fail_without_open_reply_pushes_apology() {
        let mut conversation = Conversation::new();
        conversation.push_user("Hi");
        conversation.fail_assistant();
        assert_eq!(conversation.messages()[1], ChatMessage::assistant(APOLOGY_MESSAGE));
    }

    #[test]
    fn test_empty_stream_uses_fallback_text() {
        let mut conversation = Conversation::new();
        conversation.push_user("Hi");
        conversation.begin_assistant();
        conversation.apply(&StreamEvent::Done);
        assert_eq!(conversation.messages()[1].content, EMPTY_REPLY_MESSAGE);
    }

    #[test]
    fn test_request_prepends_system_and_skips_open_reply() {
        let mut conversation = Conversation::new();
        conversation.push_user("First");
        conversation.push_assistant("Answer");
        conversation.push_user("Second");
        conversation.begin_assistant();

        let request = conversation.request(ChatMessage::system("ctx"));
        let roles: Vec<Role> = request.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User]
        );
    }

    #[test]
    fn test_history_is_trimmed() {
        let mut conversation = Conversation::with_max_messages(4);
        for i in 0..5 {
            conversation.push_user(format!("q{}", i));
            conversation.push_assistant(format!("a{}", i));
        }

        assert_eq!(conversation.len(), 4);
        assert_eq!(conversation.messages()[0].content, "q3");
        assert_eq!(conversation.messages()[3].content, "a4");

        conversation.clear();
        assert!(conversation.is_empty());
    }

    #[test]
    fn test_trim_never_leaves_leading_reply() {
        let mut conversation = Conversation::with_max_messages(3);
        conversation.push_user("q0");
        conversation.push_assistant("a0");
        conversation.push_user("q1");
        conversation.push_assistant("a1");

        // A plain count cut would keep [a0, q1, a1].
        let contents: Vec<&str> = conversation
            .messages()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["q1", "a1"]);
        assert_eq!(conversation.messages()[0].role, Role::User);

        // Consecutive replies are dropped together with their question.
        let mut conversation = Conversation::with_max_messages(3);
        conversation.push_user("q0");
        conversation.push_assistant("a0");
        conversation.push_assistant("a0 again");
        conversation.push_user("q1");
        assert_eq!(conversation.messages()[0].content, "q1");
        assert_eq!(conversation.len(), 1);
    }
}
