//! Typing tracker.
//!
//! Ephemeral per-conversation "who is typing" state, written only by the
//! session's inbound channel handlers. A participant's flag clears when they
//! stop typing, when one of their messages arrives (the message supersedes
//! the indicator), or when the conversation is dropped. Nothing here is
//! persisted or fetched; a reconnect simply starts everyone as not typing.

use std::collections::{HashMap, HashSet};

use marketchat_proto::{ConversationId, UserId};

/// Per-conversation set of participants currently typing.
#[derive(Debug, Default)]
pub struct TypingTracker {
    typing: HashMap<ConversationId, HashSet<UserId>>,
}

impl TypingTracker {
    /// Create a tracker with nobody typing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a typing change for a participant in a conversation.
    pub fn set_typing(&mut self, conversation_id: &ConversationId, user_id: &UserId, typing: bool) {
        if typing {
            self.typing.entry(conversation_id.clone()).or_default().insert(user_id.clone());
        } else if let Some(users) = self.typing.get_mut(conversation_id) {
            users.remove(user_id);
            if users.is_empty() {
                self.typing.remove(conversation_id);
            }
        }
    }

    /// Whether a participant is currently typing in a conversation.
    pub fn is_typing(&self, conversation_id: &ConversationId, user_id: &UserId) -> bool {
        self.typing.get(conversation_id).is_some_and(|users| users.contains(user_id))
    }

    /// Drop all typing state for a conversation.
    pub fn clear(&mut self, conversation_id: &ConversationId) {
        self.typing.remove(conversation_id);
    }
}
