use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub text: String,
    pub revealing: bool,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    fn new(role: Role, text: impl Into<String>, revealing: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            text: text.into(),
            revealing,
            timestamp: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text, false)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text, false)
    }

    /// Empty assistant message inserted optimistically while a request is in
    /// flight. The revealer fills in its text once the answer arrives.
    pub fn placeholder() -> Self {
        Self::new(Role::Assistant, "", true)
    }
}

/// Ordered conversation history. Insertion order is display order; messages
/// are never reordered or deduplicated.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message and returns its id.
    pub fn push(&mut self, message: ChatMessage) -> String {
        let id = message.id.clone();
        self.messages.push(message);
        id
    }

    /// Removes the message with the given id. Returns whether it was present.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.messages.len();
        self.messages.retain(|m| m.id != id);
        self.messages.len() != before
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ChatMessage> {
        self.messages.iter_mut().find(|m| m.id == id)
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Id of the message currently being revealed, if any. At most one
    /// message reveals at a time.
    pub fn revealing_id(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.revealing)
            .map(|m| m.id.as_str())
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_preserves_insertion_order() {
        let mut transcript = Transcript::new();
        transcript.push(ChatMessage::user("first"));
        transcript.push(ChatMessage::assistant("second"));
        transcript.push(ChatMessage::user("third"));

        let texts: Vec<&str> = transcript
            .messages()
            .iter()
            .map(|m| m.text.as_str())
            .collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn placeholder_starts_empty_and_revealing() {
        let message = ChatMessage::placeholder();
        assert_eq!(message.role, Role::Assistant);
        assert!(message.text.is_empty());
        assert!(message.revealing);
    }

    #[test]
    fn remove_drops_only_the_matching_message() {
        let mut transcript = Transcript::new();
        let keep = transcript.push(ChatMessage::user("keep"));
        let gone = transcript.push(ChatMessage::placeholder());

        assert!(transcript.remove(&gone));
        assert!(!transcript.remove(&gone));
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.messages()[0].id, keep);
    }

    #[test]
    fn revealing_id_tracks_the_active_placeholder() {
        let mut transcript = Transcript::new();
        assert!(transcript.revealing_id().is_none());

        transcript.push(ChatMessage::user("hi"));
        let placeholder = transcript.push(ChatMessage::placeholder());
        assert_eq!(transcript.revealing_id(), Some(placeholder.as_str()));

        if let Some(m) = transcript.get_mut(&placeholder) {
            m.revealing = false;
        }
        assert!(transcript.revealing_id().is_none());
    }
}
