//! Conversation admission state machine.
//!
//! Conversations are created `Pending` and move exactly once, by the
//! non-initiator: accept yields `Accepted`, decline yields the terminal
//! `Declined`. There is no path out of `Accepted` or `Declined` back to
//! `Pending`.
//!
//! While a conversation is `Pending`, only the initiator may send; the
//! recipient is shown an accept/decline choice instead of a composer. This
//! keeps unsolicited contact down to the opening message(s) and makes it
//! impossible to compose into a declined or blocked conversation.

use marketchat_proto::{Conversation, ConversationStatus, UserId};

/// Whether the state machine permits a transition.
///
/// Re-applying the current status is treated as permitted so replayed channel
/// events are absorbed without error.
pub fn can_transition(from: ConversationStatus, to: ConversationStatus) -> bool {
    use ConversationStatus::{Accepted, Declined, Pending};
    matches!((from, to), (Pending, Accepted) | (Pending, Declined)) || from == to
}

/// Send-eligibility predicate, evaluated per composition attempt.
///
/// Pure function of current store state; callers must re-evaluate it on
/// every render rather than caching the result.
pub fn can_send(conversation: &Conversation, current_user: &UserId, is_blocked: bool) -> bool {
    if is_blocked {
        return false;
    }

    match conversation.status {
        ConversationStatus::Accepted => true,
        ConversationStatus::Pending => conversation.initiated_by == *current_user,
        ConversationStatus::Declined => false,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use marketchat_proto::{ConversationId, ParticipantType};

    use super::*;

    fn conversation(status: ConversationStatus, initiated_by: &str) -> Conversation {
        Conversation {
            id: ConversationId::new("c1"),
            participant_id: UserId::new("seller-1"),
            participant_name: "Grace".to_string(),
            participant_type: ParticipantType::Seller,
            status,
            initiated_by: UserId::new(initiated_by),
            last_message: None,
            last_message_time: None,
            unread_count: 0,
            is_online: false,
        }
    }

    #[test]
    fn pending_moves_to_accepted_or_declined_only() {
        use ConversationStatus::{Accepted, Declined, Pending};

        assert!(can_transition(Pending, Accepted));
        assert!(can_transition(Pending, Declined));
        assert!(!can_transition(Accepted, Pending));
        assert!(!can_transition(Accepted, Declined));
        assert!(!can_transition(Declined, Pending));
        assert!(!can_transition(Declined, Accepted));
    }

    #[test]
    fn reapplying_current_status_is_permitted() {
        use ConversationStatus::{Accepted, Declined, Pending};

        assert!(can_transition(Pending, Pending));
        assert!(can_transition(Accepted, Accepted));
        assert!(can_transition(Declined, Declined));
    }

    #[test]
    fn initiator_may_send_while_pending() {
        let conv = conversation(ConversationStatus::Pending, "buyer-1");
        assert!(can_send(&conv, &UserId::new("buyer-1"), false));
        assert!(!can_send(&conv, &UserId::new("seller-1"), false));
    }

    #[test]
    fn anyone_may_send_once_accepted() {
        let conv = conversation(ConversationStatus::Accepted, "buyer-1");
        assert!(can_send(&conv, &UserId::new("buyer-1"), false));
        assert!(can_send(&conv, &UserId::new("seller-1"), false));
    }

    #[test]
    fn declined_and_blocked_always_refuse() {
        let declined = conversation(ConversationStatus::Declined, "buyer-1");
        assert!(!can_send(&declined, &UserId::new("buyer-1"), false));

        let accepted = conversation(ConversationStatus::Accepted, "buyer-1");
        assert!(!can_send(&accepted, &UserId::new("buyer-1"), true));
    }
}
