//! Wire contract
//!
//! Shared data model and event-channel envelope for the marketplace chat
//! engine. The server speaks JSON over a persistent bidirectional channel;
//! every payload here is a `serde` type with an event-name tag that selects
//! the payload shape, so mismatched name/payload pairs fail to decode instead
//! of producing half-parsed values.
//!
//! # Components
//!
//! - [`ConversationId`], [`MessageId`], [`UserId`]: opaque identifiers
//! - [`Conversation`], [`Message`], [`BlockedCommunication`]: data model
//! - [`ClientCommand`]: outbound commands (client to server)
//! - [`ServerEvent`]: inbound events (server to client)
//!
//! Field names on the wire are camelCase to match the server contract;
//! statuses are closed enumerations so invalid states are unrepresentable.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod error;
mod ids;
mod model;
mod wire;

pub use error::ProtocolError;
pub use ids::{ConversationId, MessageId, UserId};
pub use model::{
    BlockedCommunication, Conversation, ConversationStatus, Message, MessageStatus,
    ParticipantType,
};
pub use wire::{ClientCommand, ServerEvent};
