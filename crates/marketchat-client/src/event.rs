//! Session events and actions.

use chrono::{DateTime, Utc};
use marketchat_proto::{
    BlockedCommunication, ClientCommand, Conversation, ConversationId, Message, ParticipantType,
    ServerEvent, UserId,
};

/// Events the caller feeds into the session.
///
/// The caller is responsible for:
/// - Receiving events from the channel transport
/// - Completing REST collaborator calls and feeding the results back
/// - Forwarding user intents (select, send, accept, decline)
///
/// Attachments are uploaded by the caller *before* a
/// [`SessionEvent::SendMessage`] is issued; an upload failure therefore
/// aborts the send before any optimistic state exists.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Channel (re)connected. Prior stream state must not be trusted.
    Connected,

    /// Channel dropped. The transport reconnects on its own; commands issued
    /// meanwhile are lost.
    Disconnected,

    /// Event received from the server over the channel.
    EventReceived(ServerEvent),

    /// Conversation list snapshot arrived from the REST collaborator.
    ConversationsLoaded(Vec<Conversation>),

    /// Message history arrived for a conversation.
    MessagesLoaded {
        /// Conversation the history belongs to.
        conversation_id: ConversationId,
        /// Messages in server order.
        messages: Vec<Message>,
    },

    /// Blocklist snapshot arrived from the administration API.
    BlocklistLoaded(Vec<BlockedCommunication>),

    /// User selected a conversation, making it the active one.
    SelectConversation {
        /// Conversation to activate.
        conversation_id: ConversationId,
    },

    /// User composed a message in the active conversation.
    SendMessage {
        /// Text content. May be empty only when `attachments` is non-empty.
        content: String,
        /// URLs already returned by the upload collaborator.
        attachments: Vec<String>,
        /// Composition time, stamped by the caller.
        created_at: DateTime<Utc>,
    },

    /// User started typing in the active conversation. Relayed to the
    /// counterpart; carries no state of its own.
    TypingStarted,

    /// User stopped typing in the active conversation (cleared the composer
    /// or went idle; debouncing is the caller's concern).
    TypingStopped,

    /// User accepted the active pending conversation.
    AcceptActive,

    /// User declined the active pending conversation.
    DeclineActive,

    /// User wants to start a conversation with a participant.
    ///
    /// If one already exists for the (participant, type) pair it is reused
    /// and activated; only otherwise is a creation requested.
    StartConversation {
        /// The other participant.
        participant_id: UserId,
        /// The other participant's role.
        participant_type: ParticipantType,
    },

    /// The REST collaborator confirmed a conversation creation.
    ConversationCreated(Conversation),
}

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Informational (new message, request accepted).
    Info,
    /// Failure the user should act on or at least see.
    Error,
}

/// Actions the session produces for the caller to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Emit a command over the channel. Fire-and-forget.
    Send(ClientCommand),

    /// Fetch the conversation list snapshot and feed it back as
    /// [`SessionEvent::ConversationsLoaded`].
    FetchConversations,

    /// Fetch a conversation's history and feed it back as
    /// [`SessionEvent::MessagesLoaded`].
    FetchMessages {
        /// Conversation to fetch.
        conversation_id: ConversationId,
    },

    /// Fetch the blocklist snapshot and feed it back as
    /// [`SessionEvent::BlocklistLoaded`].
    FetchBlocklist,

    /// Accept a pending conversation via the REST collaborator. The status
    /// change arrives back over the channel as `conversation_updated`.
    AcceptViaApi {
        /// Conversation to accept.
        conversation_id: ConversationId,
    },

    /// Decline a pending conversation via the REST collaborator.
    DeclineViaApi {
        /// Conversation to decline.
        conversation_id: ConversationId,
    },

    /// Create a conversation via the REST collaborator and feed the result
    /// back as [`SessionEvent::ConversationCreated`].
    CreateViaApi {
        /// The other participant.
        participant_id: UserId,
        /// The other participant's role.
        participant_type: ParticipantType,
    },

    /// Show a transient notification to the user.
    Notify {
        /// Severity of the notification.
        severity: Severity,
        /// Short title.
        title: String,
        /// Body text.
        body: String,
    },

    /// Log message for debugging.
    Log {
        /// Log message.
        message: String,
    },
}
