//! Error types for the session state machine.
//!
//! These cover caller contract violations (sending where gating forbids it,
//! acting without an active conversation). Stale or out-of-order channel
//! events are absorbed by the session with a log action, not surfaced here.

use marketchat_core::StoreError;
use marketchat_proto::{ConversationId, ConversationStatus};
use thiserror::Error;

/// Errors that can occur while handling a session event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// An action required an active conversation and none is selected.
    #[error("no active conversation selected")]
    NoActiveConversation,

    /// The active conversation's history has not finished loading; sending
    /// into an invisible history would desync ordering.
    #[error("history for {conversation_id} is still loading")]
    HistoryLoading {
        /// Conversation whose history is in flight.
        conversation_id: ConversationId,
    },

    /// Send gating refused: the conversation is declined, blocked, or
    /// pending with someone else as initiator.
    #[error("sending is not permitted in conversation {conversation_id}")]
    SendNotPermitted {
        /// Conversation the send targeted.
        conversation_id: ConversationId,
    },

    /// Accept/decline attempted by the conversation's initiator.
    #[error("only the recipient may accept or decline {conversation_id}")]
    NotRecipient {
        /// Conversation the decision targeted.
        conversation_id: ConversationId,
    },

    /// Accept/decline attempted on a conversation that is not pending.
    #[error("conversation {conversation_id} is {status:?}, not pending")]
    NotPending {
        /// Conversation the decision targeted.
        conversation_id: ConversationId,
        /// Its current status.
        status: ConversationStatus,
    },

    /// A store invariant was violated.
    #[error(transparent)]
    Store(#[from] StoreError),
}
