//! Error types for the domain stores.
//!
//! Strongly-typed errors so callers can distinguish "the caller broke an
//! invariant" (invalid transition, non-optimistic insert) from "the caller
//! referenced state we do not have" (unknown conversation). Stale or
//! out-of-order channel events are generally absorbed by the stores, not
//! reported as errors; these variants cover genuine contract violations.

use marketchat_proto::{ConversationId, ConversationStatus, MessageId};
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Referenced conversation is not in the store.
    #[error("unknown conversation: {conversation_id}")]
    UnknownConversation {
        /// Conversation that was referenced.
        conversation_id: ConversationId,
    },

    /// Attempted an admission transition the state machine forbids.
    #[error("invalid status transition for {conversation_id}: {from:?} -> {to:?}")]
    InvalidTransition {
        /// Conversation whose status was being changed.
        conversation_id: ConversationId,
        /// Status before the attempted transition.
        from: ConversationStatus,
        /// Status that was requested.
        to: ConversationStatus,
    },

    /// An optimistic insert was given a message that is not a local pending
    /// draft.
    #[error("message {message_id} is not an optimistic draft")]
    NotOptimistic {
        /// Offending message id.
        message_id: MessageId,
    },

    /// A message with neither content nor attachments was offered for
    /// insertion.
    #[error("message carries no content and no attachments")]
    EmptyMessage,
}
