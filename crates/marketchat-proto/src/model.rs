//! Data model for conversations, messages, and communication blocks.
//!
//! These are the shapes exchanged with the server (camelCase on the wire) and
//! held by the client stores. Statuses are closed enumerations:
//! [`ConversationStatus`] drives the admission state machine and
//! [`MessageStatus`] is totally ordered so delivery progress can only move
//! forward.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ConversationId, MessageId, UserId};

/// Role of a chat participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ParticipantType {
    /// Marketplace buyer.
    Buyer,
    /// Marketplace seller.
    Seller,
    /// Platform administrator.
    Admin,
}

impl ParticipantType {
    /// The role on the other side of a buyer/seller conversation.
    ///
    /// Admins converse with both roles, so their counterpart is `None`.
    pub fn counterpart(self) -> Option<Self> {
        match self {
            Self::Buyer => Some(Self::Seller),
            Self::Seller => Some(Self::Buyer),
            Self::Admin => None,
        }
    }
}

/// Admission state of a conversation.
///
/// `Pending` conversations await the recipient's decision; `Declined` is
/// terminal. There is no path back to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConversationStatus {
    /// Created, awaiting accept/decline by the non-initiator.
    Pending,
    /// Both sides may exchange messages.
    Accepted,
    /// Terminal; the conversation is removed from both lists.
    Declined,
}

impl ConversationStatus {
    /// Whether this status admits no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Declined)
    }
}

/// Delivery progress of a message.
///
/// The derived ordering (`Pending < Sent < Delivered < Read`) is load-bearing:
/// stores advance status with `max`, so a stale or out-of-order event can
/// never move a message backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    /// Optimistic local entry, not yet confirmed by the server.
    Pending,
    /// Server accepted the message.
    Sent,
    /// Counterpart's channel received it.
    Delivered,
    /// Counterpart marked the conversation as read.
    Read,
}

/// A 1:1 conversation, viewed from the current user's perspective.
///
/// `participant_*` fields describe the other side. `unread_count` and
/// `last_message*` are denormalized preview state maintained by the
/// conversation store; `is_online` is derived from presence events and never
/// persisted server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Server-assigned conversation id.
    pub id: ConversationId,
    /// The other participant's user id.
    pub participant_id: UserId,
    /// The other participant's display name.
    pub participant_name: String,
    /// The other participant's role.
    pub participant_type: ParticipantType,
    /// Admission state.
    pub status: ConversationStatus,
    /// User who created the conversation; only they may send while `Pending`.
    pub initiated_by: UserId,
    /// Preview of the most recent message, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
    /// Timestamp of the most recent message, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_time: Option<DateTime<Utc>>,
    /// Messages received while the conversation was not active.
    #[serde(default)]
    pub unread_count: u32,
    /// Whether the other participant is currently online.
    #[serde(default)]
    pub is_online: bool,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Server-assigned id, or a local id while optimistic.
    pub id: MessageId,
    /// Conversation this message belongs to.
    pub conversation_id: ConversationId,
    /// Text content. May be empty only when `attachments` is non-empty.
    pub content: String,
    /// Sender's user id.
    pub sender_id: UserId,
    /// Sender's display name.
    pub sender_name: String,
    /// Sender's role.
    pub sender_type: ParticipantType,
    /// Attachment URLs, uploaded before the message was emitted.
    #[serde(default)]
    pub attachments: Vec<String>,
    /// Client-stamped composition time. Display ordering/grouping only;
    /// arrival order over the channel is authoritative for reconciliation.
    pub created_at: DateTime<Utc>,
    /// Delivery progress.
    pub status: MessageStatus,
}

impl Message {
    /// A message with neither content nor attachments carries nothing and
    /// must not be sent.
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty() && self.attachments.is_empty()
    }
}

/// An administrator-imposed communication block between two users.
///
/// Stored as a directed pair but symmetric in effect: neither party may
/// message the other. Blocklist checks must test both id orderings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedCommunication {
    /// User recorded as the block's initiator side.
    pub initiator_id: UserId,
    /// User recorded as the block's target side.
    pub target_id: UserId,
    /// Administrator-supplied reason, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Administrator who imposed the block.
    pub blocked_by: UserId,
    /// When the block was imposed.
    pub created_at: DateTime<Utc>,
}
