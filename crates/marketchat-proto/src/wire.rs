//! Event-channel envelope.
//!
//! Commands and events travel as JSON objects of the form
//! `{"event": "<name>", "data": {...}}`. The event name is the serde tag and
//! selects the payload shape, the same way a frame opcode selects a payload
//! type in a binary protocol: a payload that does not match its event name
//! fails to decode instead of producing a partially valid value.
//!
//! # Invariants
//!
//! - Each variant maps to exactly one event name (enforced by the serde tag).
//! - Unknown inbound event names produce a [`ProtocolError::Decode`], never a
//!   panic or a silently dropped event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::ProtocolError,
    ids::{ConversationId, UserId},
    model::{ConversationStatus, Message, ParticipantType},
};

/// Outbound commands (client to server).
///
/// Commands are fire-and-forget: the client renders optimistically and
/// reconciles against the server's echo rather than blocking on an ack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Bind this channel to a user for targeted delivery. Sent once per
    /// (re)connect.
    Identify {
        /// User to bind the channel to.
        #[serde(rename = "userId")]
        user_id: UserId,
    },

    /// Send a message into a conversation.
    #[serde(rename_all = "camelCase")]
    SendMessage {
        /// Target conversation.
        conversation_id: ConversationId,
        /// Text content. May be empty only when `attachments` is non-empty.
        content: String,
        /// Sender's user id.
        sender_id: UserId,
        /// Sender's display name.
        sender_name: String,
        /// Sender's role.
        sender_type: ParticipantType,
        /// Attachment URLs from the upload collaborator.
        attachments: Vec<String>,
        /// Client-stamped composition time.
        created_at: DateTime<Utc>,
    },

    /// Mark a conversation as read. Sent when it becomes the active one.
    #[serde(rename_all = "camelCase")]
    MarkAsRead {
        /// Conversation that was read.
        conversation_id: ConversationId,
    },

    /// The user started typing in a conversation. Fire-and-forget; the
    /// server relays it to the other participant as `user_typing`.
    #[serde(rename_all = "camelCase")]
    Typing {
        /// Conversation being typed into.
        conversation_id: ConversationId,
    },

    /// The user stopped typing in a conversation.
    #[serde(rename_all = "camelCase")]
    StopTyping {
        /// Conversation the typing stopped in.
        conversation_id: ConversationId,
    },
}

/// Inbound events (server to client).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A message was accepted and broadcast. Received both as the sender's
    /// own echo (confirms an optimistic entry) and for counterpart messages.
    NewMessage(Message),

    /// A participant went online or offline.
    #[serde(rename_all = "camelCase")]
    UserStatusChange {
        /// Participant whose presence changed.
        user_id: UserId,
        /// New presence state.
        is_online: bool,
    },

    /// A conversation's admission status changed.
    #[serde(rename_all = "camelCase")]
    ConversationUpdated {
        /// Conversation that changed.
        conversation_id: ConversationId,
        /// New admission status.
        status: ConversationStatus,
        /// User who triggered the change.
        updated_by: UserId,
    },

    /// The counterpart marked a conversation as read.
    #[serde(rename_all = "camelCase")]
    MessagesRead {
        /// Conversation that was read.
        conversation_id: ConversationId,
        /// User who read it.
        read_by: UserId,
    },

    /// A participant started typing in a conversation.
    #[serde(rename_all = "camelCase")]
    UserTyping {
        /// Conversation being typed into.
        conversation_id: ConversationId,
        /// Participant who is typing.
        user_id: UserId,
    },

    /// A participant stopped typing in a conversation.
    #[serde(rename_all = "camelCase")]
    UserStopTyping {
        /// Conversation the typing stopped in.
        conversation_id: ConversationId,
        /// Participant who stopped typing.
        user_id: UserId,
    },

    /// Server-side failure. Surfaced to the user, never retried
    /// automatically.
    Error {
        /// Human-readable description.
        message: String,
    },
}

impl ClientCommand {
    /// Encode this command as a JSON envelope.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self)
            .map_err(|e| ProtocolError::Encode { what: "ClientCommand", reason: e.to_string() })
    }

    /// Decode a command from a JSON envelope.
    pub fn decode(raw: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(raw)
            .map_err(|e| ProtocolError::Decode { what: "ClientCommand", reason: e.to_string() })
    }
}

impl ServerEvent {
    /// Encode this event as a JSON envelope.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self)
            .map_err(|e| ProtocolError::Encode { what: "ServerEvent", reason: e.to_string() })
    }

    /// Decode an event from a JSON envelope.
    pub fn decode(raw: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(raw)
            .map_err(|e| ProtocolError::Decode { what: "ServerEvent", reason: e.to_string() })
    }
}
