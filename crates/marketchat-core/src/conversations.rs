//! Conversation store.
//!
//! Authoritative in-memory collection of the current user's conversations.
//! All mutation goes through the methods here so channel events and user
//! actions share one code path; callers read through immutable accessors and
//! never touch the collection directly.

use std::collections::HashMap;

use marketchat_proto::{
    Conversation, ConversationId, ConversationStatus, Message, ParticipantType, UserId,
};

use crate::{admission, error::StoreError};

/// Outcome of a status transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusChange {
    /// Status updated in place.
    Updated,
    /// Transition was to `Declined`; the conversation has been removed from
    /// the store. Callers must clear any active selection pointing at it.
    Removed(Conversation),
    /// The store already held this status (replayed event).
    Unchanged,
}

/// In-memory conversation collection, keyed by id.
#[derive(Debug, Default)]
pub struct ConversationStore {
    conversations: HashMap<ConversationId, Conversation>,
}

impl ConversationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of conversations held.
    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    /// Whether the store holds no conversations.
    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    /// Look up a conversation by id.
    pub fn get(&self, id: &ConversationId) -> Option<&Conversation> {
        self.conversations.get(id)
    }

    /// Whether a conversation with this id exists.
    pub fn contains(&self, id: &ConversationId) -> bool {
        self.conversations.contains_key(id)
    }

    /// The existing conversation for a (participant, type) pair, if any.
    ///
    /// Exactly one conversation exists per pair; creation flows must reuse
    /// the match instead of creating a duplicate.
    pub fn find_by_participant(
        &self,
        participant_id: &UserId,
        participant_type: ParticipantType,
    ) -> Option<&Conversation> {
        self.conversations
            .values()
            .find(|c| c.participant_id == *participant_id && c.participant_type == participant_type)
    }

    /// All conversations, most recently active first.
    ///
    /// Conversations without any message yet sort last, in stable id order so
    /// the list does not jitter between renders.
    pub fn all(&self) -> Vec<&Conversation> {
        let mut all: Vec<&Conversation> = self.conversations.values().collect();
        all.sort_by(|a, b| {
            b.last_message_time.cmp(&a.last_message_time).then_with(|| a.id.cmp(&b.id))
        });
        all
    }

    /// Insert a conversation, or merge it into an existing entry with the
    /// same id.
    ///
    /// Server-owned fields are taken from the incoming value; locally
    /// maintained bookkeeping (`unread_count`, `is_online`) survives the
    /// merge since conversation list snapshots do not carry it.
    pub fn upsert_conversation(&mut self, conversation: Conversation) {
        match self.conversations.entry(conversation.id.clone()) {
            std::collections::hash_map::Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                let unread_count = existing.unread_count.max(conversation.unread_count);
                let is_online = existing.is_online || conversation.is_online;
                *existing = Conversation { unread_count, is_online, ..conversation };
            },
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(conversation);
            },
        }
    }

    /// Update the denormalized preview for an inbound counterpart message.
    ///
    /// Increments `unread_count` only when the conversation is not the
    /// active one; the active conversation stays at zero. The current
    /// user's own messages go through [`Self::apply_own_preview`] instead.
    pub fn apply_message_preview(
        &mut self,
        conversation_id: &ConversationId,
        message: &Message,
        is_active: bool,
    ) -> Result<(), StoreError> {
        let conversation = self.conversations.get_mut(conversation_id).ok_or_else(|| {
            StoreError::UnknownConversation { conversation_id: conversation_id.clone() }
        })?;

        conversation.last_message = Some(preview_text(message));
        conversation.last_message_time = Some(message.created_at);

        if is_active {
            conversation.unread_count = 0;
        } else {
            conversation.unread_count = conversation.unread_count.saturating_add(1);
        }

        Ok(())
    }

    /// Update the denormalized preview for one of the current user's own
    /// messages.
    ///
    /// Never touches `unread_count`: only inbound counterpart messages and
    /// activation may move it. Skipped when the stored preview is already
    /// newer, so a slow server echo cannot roll the preview back over a
    /// counterpart message that arrived in the meantime.
    pub fn apply_own_preview(
        &mut self,
        conversation_id: &ConversationId,
        message: &Message,
    ) -> Result<(), StoreError> {
        let conversation = self.conversations.get_mut(conversation_id).ok_or_else(|| {
            StoreError::UnknownConversation { conversation_id: conversation_id.clone() }
        })?;

        if conversation.last_message_time.is_some_and(|t| t > message.created_at) {
            return Ok(());
        }

        conversation.last_message = Some(preview_text(message));
        conversation.last_message_time = Some(message.created_at);
        Ok(())
    }

    /// Transition a conversation's admission status.
    ///
    /// A transition to `Declined` removes the conversation entirely and
    /// returns it; the caller clears the active selection and message list
    /// if they pointed at it. Replayed events (same status) are absorbed.
    pub fn set_status(
        &mut self,
        conversation_id: &ConversationId,
        status: ConversationStatus,
    ) -> Result<StatusChange, StoreError> {
        let current = self
            .conversations
            .get(conversation_id)
            .ok_or_else(|| StoreError::UnknownConversation {
                conversation_id: conversation_id.clone(),
            })?
            .status;

        if current == status {
            return Ok(StatusChange::Unchanged);
        }

        if !admission::can_transition(current, status) {
            return Err(StoreError::InvalidTransition {
                conversation_id: conversation_id.clone(),
                from: current,
                to: status,
            });
        }

        if status == ConversationStatus::Declined {
            return Ok(match self.conversations.remove(conversation_id) {
                Some(removed) => StatusChange::Removed(removed),
                None => StatusChange::Unchanged,
            });
        }

        if let Some(conversation) = self.conversations.get_mut(conversation_id) {
            conversation.status = status;
        }
        Ok(StatusChange::Updated)
    }

    /// Reset the unread counter, used when a conversation becomes active.
    pub fn mark_read(&mut self, conversation_id: &ConversationId) -> Result<(), StoreError> {
        let conversation = self.conversations.get_mut(conversation_id).ok_or_else(|| {
            StoreError::UnknownConversation { conversation_id: conversation_id.clone() }
        })?;
        conversation.unread_count = 0;
        Ok(())
    }

    /// Update presence on every conversation with this participant.
    pub fn set_presence(&mut self, participant_id: &UserId, is_online: bool) {
        for conversation in self.conversations.values_mut() {
            if conversation.participant_id == *participant_id {
                conversation.is_online = is_online;
            }
        }
    }

    /// Replace the whole collection from a server snapshot.
    ///
    /// Used after (re)connect; merges entry-by-entry so local unread
    /// bookkeeping survives, then drops conversations the server no longer
    /// reports.
    pub fn replace_all(&mut self, snapshot: Vec<Conversation>) {
        let keep: std::collections::HashSet<ConversationId> =
            snapshot.iter().map(|c| c.id.clone()).collect();
        self.conversations.retain(|id, _| keep.contains(id));

        for conversation in snapshot {
            self.upsert_conversation(conversation);
        }
    }
}

/// Preview line for the contact list.
fn preview_text(message: &Message) -> String {
    if message.content.trim().is_empty() && !message.attachments.is_empty() {
        "Sent an attachment".to_string()
    } else {
        message.content.clone()
    }
}
