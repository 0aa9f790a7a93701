//! End-to-end session flows over two simulated participants.
//!
//! Each test drives one or two [`Session`]s by hand, playing the roles of
//! the channel transport and the REST collaborator: actions the sessions
//! emit are turned into the events the counterpart (or the same session)
//! would receive from the server.

#![allow(clippy::unwrap_used, clippy::panic)]

use chrono::Utc;
use marketchat_client::{
    CurrentUser, RoleTab, Session, SessionAction, SessionError, SessionEvent, Severity, view,
};
use marketchat_core::env::test_utils::MockEnv;
use marketchat_proto::{
    BlockedCommunication, ClientCommand, Conversation, ConversationId, ConversationStatus,
    Message, MessageId, MessageStatus, ParticipantType, ServerEvent, UserId,
};

fn buyer_session() -> Session<MockEnv> {
    Session::new(
        MockEnv::with_seed(7),
        CurrentUser::new(UserId::new("buyer-1"), "Ada", ParticipantType::Buyer),
    )
}

fn seller_session() -> Session<MockEnv> {
    Session::new(
        MockEnv::with_seed(11),
        CurrentUser::new(UserId::new("seller-1"), "Grace", ParticipantType::Seller),
    )
}

/// The conversation as the buyer's contact list sees it.
fn conversation_for_buyer(status: ConversationStatus) -> Conversation {
    Conversation {
        id: ConversationId::new("c1"),
        participant_id: UserId::new("seller-1"),
        participant_name: "Grace".to_string(),
        participant_type: ParticipantType::Seller,
        status,
        initiated_by: UserId::new("buyer-1"),
        last_message: None,
        last_message_time: None,
        unread_count: 0,
        is_online: false,
    }
}

/// The same conversation as the seller's contact list sees it.
fn conversation_for_seller(status: ConversationStatus) -> Conversation {
    Conversation {
        participant_id: UserId::new("buyer-1"),
        participant_name: "Ada".to_string(),
        participant_type: ParticipantType::Buyer,
        ..conversation_for_buyer(status)
    }
}

fn connect_with(session: &mut Session<MockEnv>, snapshot: Vec<Conversation>) {
    session.handle(SessionEvent::Connected).unwrap();
    session.handle(SessionEvent::ConversationsLoaded(snapshot)).unwrap();
    session.handle(SessionEvent::BlocklistLoaded(vec![])).unwrap();
}

fn open_conversation(session: &mut Session<MockEnv>, id: &str, history: Vec<Message>) {
    session
        .handle(SessionEvent::SelectConversation { conversation_id: ConversationId::new(id) })
        .unwrap();
    session
        .handle(SessionEvent::MessagesLoaded {
            conversation_id: ConversationId::new(id),
            messages: history,
        })
        .unwrap();
}

/// Extract the SendMessage command a send produced, as the server would
/// receive it.
fn sent_command(actions: &[SessionAction]) -> ClientCommand {
    actions
        .iter()
        .find_map(|a| match a {
            SessionAction::Send(command @ ClientCommand::SendMessage { .. }) => {
                Some(command.clone())
            },
            _ => None,
        })
        .unwrap()
}

/// Turn a received SendMessage command into the broadcast echo the server
/// would emit, with a server-assigned id.
fn server_echo(command: ClientCommand, server_id: &str) -> Message {
    let ClientCommand::SendMessage {
        conversation_id,
        content,
        sender_id,
        sender_name,
        sender_type,
        attachments,
        created_at,
    } = command
    else {
        panic!("expected a SendMessage command");
    };

    Message {
        id: MessageId::new(server_id),
        conversation_id,
        content,
        sender_id,
        sender_name,
        sender_type,
        attachments,
        created_at,
        status: MessageStatus::Sent,
    }
}

#[test]
fn request_then_decline_removes_conversation_for_both() {
    let mut buyer = buyer_session();
    let mut seller = seller_session();
    connect_with(&mut buyer, vec![]);
    connect_with(&mut seller, vec![]);

    // Buyer starts a conversation with the seller; no pair exists yet so the
    // session requests a creation.
    let actions = buyer
        .handle(SessionEvent::StartConversation {
            participant_id: UserId::new("seller-1"),
            participant_type: ParticipantType::Seller,
        })
        .unwrap();
    assert!(actions.iter().any(|a| matches!(a, SessionAction::CreateViaApi { .. })));

    buyer
        .handle(SessionEvent::ConversationCreated(conversation_for_buyer(
            ConversationStatus::Pending,
        )))
        .unwrap();

    // As initiator the buyer may message into the pending conversation.
    assert!(buyer.can_send_messages());
    let actions = buyer
        .handle(SessionEvent::SendMessage {
            content: "Hello".to_string(),
            attachments: vec![],
            created_at: Utc::now(),
        })
        .unwrap();
    let echo = server_echo(sent_command(&actions), "m1");

    // The seller's next snapshot carries the pending conversation, rendered
    // as an incoming message request.
    seller
        .handle(SessionEvent::ConversationsLoaded(vec![conversation_for_seller(
            ConversationStatus::Pending,
        )]))
        .unwrap();
    seller.handle(SessionEvent::EventReceived(ServerEvent::NewMessage(echo.clone()))).unwrap();
    buyer.handle(SessionEvent::EventReceived(ServerEvent::NewMessage(echo.clone()))).unwrap();

    let visible = seller.visible_conversations(RoleTab::Counterpart);
    let (regular, requests) = view::split_requests(&visible, &seller.user().id);
    assert!(regular.is_empty());
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].unread_count, 1);
    assert_eq!(requests[0].last_message.as_deref(), Some("Hello"));

    // The seller opens the request and declines. The decision goes through
    // the REST collaborator, never straight into the store.
    open_conversation(&mut seller, "c1", vec![echo]);
    assert!(!seller.can_send_messages());
    let actions = seller.handle(SessionEvent::DeclineActive).unwrap();
    assert!(actions.iter().any(|a| matches!(a, SessionAction::DeclineViaApi { .. })));

    // The server broadcasts the decline to both parties.
    let declined = ServerEvent::ConversationUpdated {
        conversation_id: ConversationId::new("c1"),
        status: ConversationStatus::Declined,
        updated_by: UserId::new("seller-1"),
    };
    let seller_actions = seller.handle(SessionEvent::EventReceived(declined.clone())).unwrap();
    let buyer_actions = buyer.handle(SessionEvent::EventReceived(declined)).unwrap();

    assert!(seller.conversations().is_empty());
    assert!(buyer.conversations().is_empty());
    assert!(seller.active_conversation().is_none());
    assert!(buyer.messages().is_empty());

    // Only the initiator is notified; the decider already knows.
    assert!(!seller_actions.iter().any(|a| matches!(a, SessionAction::Notify { .. })));
    assert!(buyer_actions.iter().any(|a| matches!(
        a,
        SessionAction::Notify { severity: Severity::Error, .. }
    )));
}

#[test]
fn attachment_send_reconciles_to_server_copy() {
    let mut buyer = buyer_session();
    connect_with(&mut buyer, vec![conversation_for_buyer(ConversationStatus::Accepted)]);
    open_conversation(&mut buyer, "c1", vec![]);

    let attachments = vec![
        "https://cdn.example/receipt.pdf".to_string(),
        "https://cdn.example/photo.jpg".to_string(),
    ];
    let actions = buyer
        .handle(SessionEvent::SendMessage {
            content: String::new(),
            attachments: attachments.clone(),
            created_at: Utc::now(),
        })
        .unwrap();

    // Optimistic entry is visible immediately under a local id.
    {
        let messages = buyer.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].id.is_local());
        assert_eq!(messages[0].status, MessageStatus::Pending);
        assert_eq!(messages[0].attachments, attachments);
    }

    // Attachment-only messages get the placeholder preview.
    assert_eq!(
        buyer.active_conversation().unwrap().last_message.as_deref(),
        Some("Sent an attachment")
    );

    let echo = server_echo(sent_command(&actions), "m123");
    buyer.handle(SessionEvent::EventReceived(ServerEvent::NewMessage(echo))).unwrap();

    // The echo replaced the optimistic entry in place, URLs intact.
    let messages = buyer.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].id, MessageId::new("m123"));
    assert_eq!(messages[0].status, MessageStatus::Sent);
    assert_eq!(messages[0].attachments, attachments);
}

#[test]
fn blocklist_disables_sending_in_accepted_conversation() {
    let mut buyer = buyer_session();
    connect_with(&mut buyer, vec![conversation_for_buyer(ConversationStatus::Accepted)]);
    open_conversation(&mut buyer, "c1", vec![]);
    assert!(buyer.can_send_messages());

    buyer
        .handle(SessionEvent::BlocklistLoaded(vec![BlockedCommunication {
            initiator_id: UserId::new("seller-1"),
            target_id: UserId::new("buyer-1"),
            reason: Some("dispute escalated".to_string()),
            blocked_by: UserId::new("admin-1"),
            created_at: Utc::now(),
        }]))
        .unwrap();

    // Gating applies regardless of which side the pair lists first.
    assert!(!buyer.can_send_messages());
    let result = buyer.handle(SessionEvent::SendMessage {
        content: "are you there?".to_string(),
        attachments: vec![],
        created_at: Utc::now(),
    });
    assert!(matches!(result, Err(SessionError::SendNotPermitted { .. })));
}

#[test]
fn accept_enables_composer_for_recipient() {
    let mut seller = seller_session();
    connect_with(&mut seller, vec![conversation_for_seller(ConversationStatus::Pending)]);
    open_conversation(&mut seller, "c1", vec![]);

    // Recipient of a pending request cannot compose, only decide.
    assert!(!seller.can_send_messages());
    let actions = seller.handle(SessionEvent::AcceptActive).unwrap();
    assert!(actions.iter().any(|a| matches!(a, SessionAction::AcceptViaApi { .. })));

    seller
        .handle(SessionEvent::EventReceived(ServerEvent::ConversationUpdated {
            conversation_id: ConversationId::new("c1"),
            status: ConversationStatus::Accepted,
            updated_by: UserId::new("seller-1"),
        }))
        .unwrap();

    assert!(seller.can_send_messages());
}

#[test]
fn unread_counts_track_activation_and_read_receipts() {
    let mut buyer = buyer_session();
    connect_with(
        &mut buyer,
        vec![
            conversation_for_buyer(ConversationStatus::Accepted),
            Conversation {
                id: ConversationId::new("c2"),
                participant_id: UserId::new("seller-2"),
                participant_name: "Hopper".to_string(),
                ..conversation_for_buyer(ConversationStatus::Accepted)
            },
        ],
    );
    open_conversation(&mut buyer, "c1", vec![]);

    let inbound = Message {
        id: MessageId::new("m1"),
        conversation_id: ConversationId::new("c2"),
        content: "still interested?".to_string(),
        sender_id: UserId::new("seller-2"),
        sender_name: "Hopper".to_string(),
        sender_type: ParticipantType::Seller,
        attachments: vec![],
        created_at: Utc::now(),
        status: MessageStatus::Sent,
    };
    buyer.handle(SessionEvent::EventReceived(ServerEvent::NewMessage(inbound))).unwrap();
    assert_eq!(buyer.total_unread(), 1);

    // Selecting the conversation zeroes the counter and tells the server.
    let actions = buyer
        .handle(SessionEvent::SelectConversation { conversation_id: ConversationId::new("c2") })
        .unwrap();
    assert!(actions.iter().any(|a| matches!(
        a,
        SessionAction::Send(ClientCommand::MarkAsRead { .. })
    )));
    assert_eq!(buyer.total_unread(), 0);
}
