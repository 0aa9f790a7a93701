//! Message store and reconciliation engine.
//!
//! Per-conversation message lists in channel-arrival order, which is the
//! authoritative order for reconciliation; `created_at` is client-stamped and
//! used only for display ordering and date grouping, because client clocks
//! are not trusted for ordering decisions.
//!
//! Optimistic sends insert a `Pending` entry under a locally generated id and
//! record that id in a per-conversation FIFO queue. When the server echoes
//! the confirmed message back, [`MessageStore::reconcile`] replaces the
//! oldest outstanding local entry in place. Each send tracks its own id, so
//! several sends can be in flight in one conversation and reconcile
//! independently.

use std::collections::{HashMap, VecDeque};

use chrono::NaiveDate;
use marketchat_proto::{ConversationId, Message, MessageId, MessageStatus, UserId};

use crate::error::StoreError;

/// Outcome of reconciling a server-confirmed echo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// The confirmed message replaced this optimistic entry in place.
    Replaced(MessageId),
    /// No outstanding optimistic entry matched; the confirmed message was
    /// appended as a new entry. Fail-open: a duplicate visual entry is
    /// preferred over silent data loss.
    Appended,
}

/// Per-conversation ordered message lists with optimistic-send tracking.
#[derive(Debug, Default)]
pub struct MessageStore {
    /// Messages in channel-arrival order, keyed by conversation.
    by_conversation: HashMap<ConversationId, Vec<Message>>,
    /// Outstanding optimistic ids per conversation, oldest first.
    outstanding: HashMap<ConversationId, VecDeque<MessageId>>,
}

impl MessageStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages for a conversation in arrival order.
    pub fn messages(&self, conversation_id: &ConversationId) -> &[Message] {
        self.by_conversation.get(conversation_id).map_or(&[], Vec::as_slice)
    }

    /// Number of optimistic sends still awaiting confirmation.
    pub fn outstanding_count(&self, conversation_id: &ConversationId) -> usize {
        self.outstanding.get(conversation_id).map_or(0, VecDeque::len)
    }

    /// Insert an optimistic message and track its id for reconciliation.
    ///
    /// The draft must carry a locally generated id and `Pending` status, and
    /// must not be empty. Returns the tracked id.
    pub fn append_optimistic(&mut self, draft: Message) -> Result<MessageId, StoreError> {
        if draft.is_empty() {
            return Err(StoreError::EmptyMessage);
        }
        if !draft.id.is_local() || draft.status != MessageStatus::Pending {
            return Err(StoreError::NotOptimistic { message_id: draft.id });
        }

        let id = draft.id.clone();
        self.outstanding.entry(draft.conversation_id.clone()).or_default().push_back(id.clone());
        self.by_conversation.entry(draft.conversation_id.clone()).or_default().push(draft);
        Ok(id)
    }

    /// Reconcile a server-confirmed echo of one of our own sends.
    ///
    /// Replaces the oldest outstanding optimistic entry in place, keeping its
    /// position in arrival order. If nothing is outstanding (for example the
    /// channel reconnected and replayed), the confirmed message is appended
    /// as a new entry instead of being dropped.
    pub fn reconcile(&mut self, confirmed: Message) -> Reconciliation {
        let conversation_id = confirmed.conversation_id.clone();

        let local_id = self
            .outstanding
            .get_mut(&conversation_id)
            .and_then(VecDeque::pop_front);

        if let Some(local_id) = local_id {
            if let Some(messages) = self.by_conversation.get_mut(&conversation_id) {
                if let Some(slot) = messages.iter_mut().find(|m| m.id == local_id) {
                    *slot = confirmed;
                    return Reconciliation::Replaced(local_id);
                }
            }
        }

        self.by_conversation.entry(conversation_id).or_default().push(confirmed);
        Reconciliation::Appended
    }

    /// Append an inbound message from the other participant.
    pub fn append_remote(&mut self, message: Message) {
        self.by_conversation.entry(message.conversation_id.clone()).or_default().push(message);
    }

    /// Advance a message's delivery status, monotonically.
    ///
    /// A status that would move the message backward is ignored; the final
    /// status is returned. Unknown ids return `None`.
    pub fn advance_status(
        &mut self,
        conversation_id: &ConversationId,
        message_id: &MessageId,
        status: MessageStatus,
    ) -> Option<MessageStatus> {
        let message = self
            .by_conversation
            .get_mut(conversation_id)?
            .iter_mut()
            .find(|m| m.id == *message_id)?;

        message.status = message.status.max(status);
        Some(message.status)
    }

    /// Advance every message from one sender in a conversation.
    ///
    /// Used when the counterpart marks the conversation as read: all of the
    /// current user's confirmed messages move to `Read`. Monotonic per
    /// message; `Pending` entries are skipped because they have no confirmed
    /// server copy to have been read.
    pub fn advance_from_sender(
        &mut self,
        conversation_id: &ConversationId,
        sender_id: &UserId,
        status: MessageStatus,
    ) {
        if let Some(messages) = self.by_conversation.get_mut(conversation_id) {
            for message in messages.iter_mut() {
                if message.sender_id == *sender_id && message.status != MessageStatus::Pending {
                    message.status = message.status.max(status);
                }
            }
        }
    }

    /// Replace a conversation's history from a server fetch.
    ///
    /// Outstanding optimistic ids that no longer appear in the list are
    /// dropped; their echoes, if they ever arrive, fail open into appends.
    pub fn replace_history(&mut self, conversation_id: &ConversationId, history: Vec<Message>) {
        if let Some(queue) = self.outstanding.get_mut(conversation_id) {
            queue.retain(|id| history.iter().any(|m| m.id == *id));
        }
        self.by_conversation.insert(conversation_id.clone(), history);
    }

    /// Drop a conversation's messages and outstanding ids.
    ///
    /// Used when a conversation is declined or deselected for good.
    pub fn clear(&mut self, conversation_id: &ConversationId) {
        self.by_conversation.remove(conversation_id);
        self.outstanding.remove(conversation_id);
    }

    /// Messages in display order: stable sort by `created_at`, so entries
    /// with equal timestamps keep arrival order.
    pub fn ordered(&self, conversation_id: &ConversationId) -> Vec<&Message> {
        let mut ordered: Vec<&Message> = self.messages(conversation_id).iter().collect();
        ordered.sort_by_key(|m| m.created_at);
        ordered
    }

    /// Display-ordered messages grouped by calendar date.
    pub fn grouped_by_date(
        &self,
        conversation_id: &ConversationId,
    ) -> Vec<(NaiveDate, Vec<&Message>)> {
        let mut groups: Vec<(NaiveDate, Vec<&Message>)> = Vec::new();

        for message in self.ordered(conversation_id) {
            let date = message.created_at.date_naive();
            match groups.last_mut() {
                Some((last, bucket)) if *last == date => bucket.push(message),
                _ => groups.push((date, vec![message])),
            }
        }

        groups
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use marketchat_proto::ParticipantType;

    use super::*;

    const CONV: &str = "c1";

    fn conv_id() -> ConversationId {
        ConversationId::new(CONV)
    }

    fn draft(local: u128, content: &str, at_secs: i64) -> Message {
        Message {
            id: MessageId::local_from_u128(local),
            conversation_id: conv_id(),
            content: content.to_string(),
            sender_id: UserId::new("me"),
            sender_name: "Me".to_string(),
            sender_type: ParticipantType::Buyer,
            attachments: Vec::new(),
            created_at: Utc.timestamp_opt(at_secs, 0).unwrap(),
            status: MessageStatus::Pending,
        }
    }

    fn confirmed(id: &str, content: &str, at_secs: i64) -> Message {
        Message {
            id: MessageId::new(id),
            status: MessageStatus::Sent,
            ..draft(0, content, at_secs)
        }
    }

    #[test]
    fn optimistic_then_reconcile_leaves_one_message() {
        let mut store = MessageStore::new();
        store.append_optimistic(draft(1, "hello", 10)).unwrap();

        let outcome = store.reconcile(confirmed("m123", "hello", 10));
        assert!(matches!(outcome, Reconciliation::Replaced(_)));

        let messages = store.messages(&conv_id());
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, MessageId::new("m123"));
        assert_eq!(messages[0].status, MessageStatus::Sent);
        assert_eq!(store.outstanding_count(&conv_id()), 0);
    }

    #[test]
    fn concurrent_sends_reconcile_in_fifo_order() {
        let mut store = MessageStore::new();
        store.append_optimistic(draft(1, "first", 10)).unwrap();
        store.append_optimistic(draft(2, "second", 11)).unwrap();
        assert_eq!(store.outstanding_count(&conv_id()), 2);

        store.reconcile(confirmed("m1", "first", 10));
        store.reconcile(confirmed("m2", "second", 11));

        let ids: Vec<&str> = store.messages(&conv_id()).iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2"]);
        assert_eq!(store.outstanding_count(&conv_id()), 0);
    }

    #[test]
    fn reconcile_without_outstanding_appends() {
        let mut store = MessageStore::new();
        let outcome = store.reconcile(confirmed("m9", "replayed", 10));
        assert_eq!(outcome, Reconciliation::Appended);
        assert_eq!(store.messages(&conv_id()).len(), 1);
    }

    #[test]
    fn reconcile_preserves_position() {
        let mut store = MessageStore::new();
        store.append_optimistic(draft(1, "mine", 10)).unwrap();
        store.append_remote(confirmed("m2", "theirs", 11));

        store.reconcile(confirmed("m1", "mine", 10));
        let ids: Vec<&str> = store.messages(&conv_id()).iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2"]);
    }

    #[test]
    fn append_optimistic_rejects_confirmed_shapes() {
        let mut store = MessageStore::new();

        let result = store.append_optimistic(confirmed("m1", "hi", 10));
        assert!(matches!(result, Err(StoreError::NotOptimistic { .. })));

        let mut not_pending = draft(1, "hi", 10);
        not_pending.status = MessageStatus::Sent;
        let result = store.append_optimistic(not_pending);
        assert!(matches!(result, Err(StoreError::NotOptimistic { .. })));

        let result = store.append_optimistic(draft(2, "   ", 10));
        assert!(matches!(result, Err(StoreError::EmptyMessage)));
    }

    #[test]
    fn advance_status_is_monotonic() {
        let mut store = MessageStore::new();
        store.append_remote(confirmed("m1", "hi", 10));

        let id = MessageId::new("m1");
        assert_eq!(
            store.advance_status(&conv_id(), &id, MessageStatus::Read),
            Some(MessageStatus::Read)
        );
        // Delivered after Read must not move backward
        assert_eq!(
            store.advance_status(&conv_id(), &id, MessageStatus::Delivered),
            Some(MessageStatus::Read)
        );
    }

    #[test]
    fn advance_from_sender_skips_pending_and_other_senders() {
        let mut store = MessageStore::new();
        store.append_remote(confirmed("m1", "mine", 10));
        let mut theirs = confirmed("m2", "theirs", 11);
        theirs.sender_id = UserId::new("them");
        store.append_remote(theirs);
        store.append_optimistic(draft(1, "in flight", 12)).unwrap();

        store.advance_from_sender(&conv_id(), &UserId::new("me"), MessageStatus::Read);

        let messages = store.messages(&conv_id());
        assert_eq!(messages[0].status, MessageStatus::Read);
        assert_eq!(messages[1].status, MessageStatus::Sent);
        assert_eq!(messages[2].status, MessageStatus::Pending);
    }

    #[test]
    fn ordered_is_stable_for_equal_timestamps() {
        let mut store = MessageStore::new();
        store.append_remote(confirmed("m1", "a", 10));
        store.append_remote(confirmed("m2", "b", 10));
        store.append_remote(confirmed("m0", "earlier", 5));

        let ids: Vec<&str> = store.ordered(&conv_id()).iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m0", "m1", "m2"]);
    }

    #[test]
    fn groups_by_calendar_date() {
        let mut store = MessageStore::new();
        store.append_remote(confirmed("m1", "day one", 0));
        store.append_remote(confirmed("m2", "also day one", 3600));
        store.append_remote(confirmed("m3", "day two", 90_000));

        let groups = store.grouped_by_date(&conv_id());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].1.len(), 1);
    }

    #[test]
    fn replace_history_prunes_stale_outstanding_ids() {
        let mut store = MessageStore::new();
        store.append_optimistic(draft(1, "hello", 10)).unwrap();

        store.replace_history(&conv_id(), vec![confirmed("m1", "from server", 9)]);
        assert_eq!(store.outstanding_count(&conv_id()), 0);
        assert_eq!(store.messages(&conv_id()).len(), 1);
    }

    #[test]
    fn clear_drops_messages_and_outstanding() {
        let mut store = MessageStore::new();
        store.append_optimistic(draft(1, "hello", 10)).unwrap();
        store.clear(&conv_id());

        assert!(store.messages(&conv_id()).is_empty());
        assert_eq!(store.outstanding_count(&conv_id()), 0);
    }
}
