//! View-composition contracts for the contact list.
//!
//! The surrounding UI renders conversations under role tabs (buyer/seller
//! counterpart vs. admin) and splits each tab into accepted conversations and
//! incoming "Message Requests". These helpers derive those views from store
//! state; they hold no state of their own and are recomputed per render.

use marketchat_proto::{Conversation, ConversationStatus, ParticipantType, UserId};

/// Contact-list tab selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleTab {
    /// Conversations with the user's market counterpart (sellers for a
    /// buyer, buyers for a seller).
    Counterpart,
    /// Conversations with platform administrators.
    Admin,
}

/// Whether a conversation belongs under a tab for a user of the given role.
pub fn belongs_to_tab(conversation: &Conversation, user_role: ParticipantType, tab: RoleTab) -> bool {
    match tab {
        RoleTab::Admin => conversation.participant_type == ParticipantType::Admin,
        RoleTab::Counterpart => match user_role.counterpart() {
            Some(counterpart) => conversation.participant_type == counterpart,
            // Admins see every non-admin conversation under one tab
            None => conversation.participant_type != ParticipantType::Admin,
        },
    }
}

/// Whether a conversation renders as an incoming message request: pending,
/// initiated by the other side, so the user sees accept/decline instead of a
/// composer.
pub fn is_message_request(conversation: &Conversation, current_user: &UserId) -> bool {
    conversation.status == ConversationStatus::Pending
        && conversation.initiated_by != *current_user
}

/// Split a tab's conversations into (accepted-or-outgoing, incoming
/// requests), both preserving input order.
pub fn split_requests<'a>(
    conversations: &[&'a Conversation],
    current_user: &UserId,
) -> (Vec<&'a Conversation>, Vec<&'a Conversation>) {
    conversations.iter().partition(|c| !is_message_request(c, current_user))
}
