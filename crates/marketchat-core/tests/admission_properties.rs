//! Property-based tests for the admission state machine.
//!
//! Verifies the lifecycle invariants for ALL transition sequences, not just
//! specific examples: a conversation only ever moves `PENDING -> ACCEPTED` or
//! `PENDING -> DECLINED`, and send eligibility can never be true for a
//! declined or blocked conversation.

#![allow(clippy::unwrap_used)]

use marketchat_core::{ConversationStore, StatusChange, admission};
use marketchat_proto::{
    Conversation, ConversationId, ConversationStatus, ParticipantType, UserId,
};
use proptest::prelude::*;

/// Strategy for generating arbitrary target statuses
fn arbitrary_status() -> impl Strategy<Value = ConversationStatus> {
    prop_oneof![
        Just(ConversationStatus::Pending),
        Just(ConversationStatus::Accepted),
        Just(ConversationStatus::Declined),
    ]
}

fn pending_conversation() -> Conversation {
    Conversation {
        id: ConversationId::new("c1"),
        participant_id: UserId::new("seller-1"),
        participant_name: "Grace".to_string(),
        participant_type: ParticipantType::Seller,
        status: ConversationStatus::Pending,
        initiated_by: UserId::new("buyer-1"),
        last_message: None,
        last_message_time: None,
        unread_count: 0,
        is_online: false,
    }
}

#[test]
fn prop_status_never_escapes_the_lifecycle() {
    proptest!(|(transitions in prop::collection::vec(arbitrary_status(), 1..16))| {
        let mut store = ConversationStore::new();
        store.upsert_conversation(pending_conversation());
        let id = ConversationId::new("c1");

        let mut observed = ConversationStatus::Pending;
        for target in transitions {
            match store.set_status(&id, target) {
                Ok(StatusChange::Updated) => {
                    // PROPERTY: the only in-place update is Pending -> Accepted
                    prop_assert_eq!(observed, ConversationStatus::Pending);
                    prop_assert_eq!(target, ConversationStatus::Accepted);
                    observed = target;
                },
                Ok(StatusChange::Removed(conv)) => {
                    // PROPERTY: removal only happens on decline of a live
                    // conversation, and the store forgets it entirely
                    prop_assert_eq!(target, ConversationStatus::Declined);
                    prop_assert_ne!(conv.status, ConversationStatus::Declined);
                    prop_assert!(!store.contains(&id));
                    return Ok(());
                },
                Ok(StatusChange::Unchanged) => {
                    prop_assert_eq!(target, observed);
                },
                Err(_) => {
                    // Rejected transitions must leave the stored status alone
                    let current = store.get(&id).map(|c| c.status);
                    prop_assert_eq!(current, Some(observed));
                },
            }
        }
    });
}

#[test]
fn prop_declined_or_blocked_never_sends() {
    proptest!(|(status in arbitrary_status(), initiator_is_me: bool, blocked: bool)| {
        let mut conv = pending_conversation();
        conv.status = status;
        let me = if initiator_is_me { UserId::new("buyer-1") } else { UserId::new("seller-1") };

        let eligible = admission::can_send(&conv, &me, blocked);

        // PROPERTY: declined conversations and blocked pairs always refuse,
        // regardless of who initiated
        if status == ConversationStatus::Declined || blocked {
            prop_assert!(!eligible);
        }

        // PROPERTY: a pending conversation only admits the initiator
        if status == ConversationStatus::Pending && !blocked {
            prop_assert_eq!(eligible, initiator_is_me);
        }
    });
}
