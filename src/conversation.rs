use serde::{Deserialize, Serialize};

/// Author of a chat turn. Closed set, serialized in the lowercase form the
/// chat-completions API expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One (role, content) entry of the chat history.
///
/// Fields are private: a turn cannot be edited after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    role: Role,
    content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Ordered chat history sent in full on every completion call.
///
/// Append-only. `push` is crate-private so only the driver, which owns the
/// turn budget, can grow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    /// Seed a conversation with the system prompt and the first user request.
    ///
    /// Empty seed text is a programming error; config validation rejects it
    /// before this point.
    pub fn new(system_prompt: impl Into<String>, user_message: impl Into<String>) -> Self {
        let system = Turn::system(system_prompt);
        let user = Turn::user(user_message);
        assert!(!system.content.is_empty(), "seed system prompt must not be empty");
        assert!(!user.content.is_empty(), "seed user message must not be empty");

        Self {
            turns: vec![system, user],
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Always false: a conversation holds its two seed turns from creation.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub(crate) fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_holds_system_then_user() {
        let conversation = Conversation::new("You are an assistant.", "Hello");
        assert_eq!(conversation.len(), 2);

        let roles: Vec<Role> = conversation.turns().iter().map(Turn::role).collect();
        assert_eq!(roles, vec![Role::System, Role::User]);
        assert_eq!(conversation.turns()[0].content(), "You are an assistant.");
        assert_eq!(conversation.turns()[1].content(), "Hello");
    }

    #[test]
    #[should_panic(expected = "seed system prompt must not be empty")]
    fn empty_system_prompt_panics() {
        let _ = Conversation::new("", "Hello");
    }

    #[test]
    #[should_panic(expected = "seed user message must not be empty")]
    fn empty_user_message_panics() {
        let _ = Conversation::new("You are an assistant.", "");
    }

    #[test]
    fn push_appends_in_order() {
        let mut conversation = Conversation::new("sys", "hi");
        conversation.push(Turn::assistant("{}"));
        conversation.push(Turn::user("more"));

        assert_eq!(conversation.len(), 4);
        assert_eq!(conversation.turns()[2], Turn::assistant("{}"));
        assert_eq!(conversation.last(), Some(&Turn::user("more")));
    }

    #[test]
    fn turn_serializes_as_chat_message() {
        let json = serde_json::to_value(Turn::assistant("ok")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "assistant", "content": "ok"}));
    }
}
