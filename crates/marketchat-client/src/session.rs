//! Session state machine.
//!
//! The `Session` is the top-level state machine that owns the conversation,
//! message, blocklist, and presence stores and orchestrates the event
//! channel. It receives [`SessionEvent`]s, mutates store state through the
//! documented entry points, and returns [`SessionAction`]s for the caller to
//! execute. All mutation happens on the caller's event-dispatch thread; the
//! stores need no locking because nothing else writes to them.

use chrono::{DateTime, Utc};
use marketchat_core::{
    BlocklistCache, ConversationStore, MessageStore, PresenceTracker, Reconciliation, StatusChange,
    StoreError, TypingTracker, admission, env::Environment,
};
use marketchat_proto::{
    ClientCommand, Conversation, ConversationId, ConversationStatus, Message, MessageId,
    MessageStatus, ParticipantType, ServerEvent, UserId,
};

use crate::{
    error::SessionError,
    event::{SessionAction, SessionEvent, Severity},
    view::{self, RoleTab},
};

/// Maximum preview length in a new-message notification.
const NOTIFY_PREVIEW_CHARS: usize = 30;

/// Identity of the current user, from the authentication collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    /// Stable user id.
    pub id: UserId,
    /// Display name, stamped onto outgoing messages.
    pub name: String,
    /// Marketplace role.
    pub role: ParticipantType,
}

impl CurrentUser {
    /// Create a user identity.
    pub fn new(id: UserId, name: impl Into<String>, role: ParticipantType) -> Self {
        Self { id, name: name.into(), role }
    }
}

/// Session for one user's live chat state.
pub struct Session<E: Environment> {
    /// Environment for local id randomness.
    env: E,

    /// Current user identity.
    user: CurrentUser,

    /// Conversation collection and previews.
    conversations: ConversationStore,

    /// Per-conversation message lists.
    messages: MessageStore,

    /// Administrator-imposed communication blocks.
    blocklist: BlocklistCache,

    /// Participant presence.
    presence: PresenceTracker,

    /// Who is typing, per conversation.
    typing: TypingTracker,

    /// Currently active conversation, if any.
    active: Option<ConversationId>,

    /// Channel connectivity, as last reported by the transport.
    connected: bool,

    /// Conversation list snapshot still in flight.
    loading_conversations: bool,

    /// Active conversation's history still in flight. Composition is gated
    /// until it lands so a send never targets an invisible history.
    loading_messages: bool,
}

impl<E: Environment> Session<E> {
    /// Create a session for the given user.
    pub fn new(env: E, user: CurrentUser) -> Self {
        Self {
            env,
            user,
            conversations: ConversationStore::new(),
            messages: MessageStore::new(),
            blocklist: BlocklistCache::new(),
            presence: PresenceTracker::new(),
            typing: TypingTracker::new(),
            active: None,
            connected: false,
            loading_conversations: true,
            loading_messages: false,
        }
    }

    /// Current user identity.
    pub fn user(&self) -> &CurrentUser {
        &self.user
    }

    /// Whether the channel is currently connected.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Whether the conversation list snapshot is still in flight.
    pub fn is_loading_conversations(&self) -> bool {
        self.loading_conversations
    }

    /// Whether the active conversation's history is still in flight.
    pub fn is_loading_messages(&self) -> bool {
        self.loading_messages
    }

    /// All conversations, most recently active first.
    pub fn conversations(&self) -> Vec<&Conversation> {
        self.conversations.all()
    }

    /// Conversations under a contact-list tab, most recently active first.
    pub fn visible_conversations(&self, tab: RoleTab) -> Vec<&Conversation> {
        self.conversations
            .all()
            .into_iter()
            .filter(|c| view::belongs_to_tab(c, self.user.role, tab))
            .collect()
    }

    /// The active conversation, if one is selected and still present.
    pub fn active_conversation(&self) -> Option<&Conversation> {
        self.active.as_ref().and_then(|id| self.conversations.get(id))
    }

    /// The active conversation's messages in display order.
    pub fn messages(&self) -> Vec<&Message> {
        self.active.as_ref().map(|id| self.messages.ordered(id)).unwrap_or_default()
    }

    /// The active conversation's messages grouped by calendar date.
    pub fn messages_by_date(&self) -> Vec<(chrono::NaiveDate, Vec<&Message>)> {
        self.active.as_ref().map(|id| self.messages.grouped_by_date(id)).unwrap_or_default()
    }

    /// Whether the composer should be enabled for the active conversation.
    ///
    /// Pure function of current store state; re-evaluate per render, never
    /// cache.
    pub fn can_send_messages(&self) -> bool {
        let Some(conversation) = self.active_conversation() else {
            return false;
        };
        if self.loading_messages {
            return false;
        }
        let blocked = self.blocklist.is_blocked(&self.user.id, &conversation.participant_id);
        admission::can_send(conversation, &self.user.id, blocked)
    }

    /// Whether a participant is currently online.
    pub fn is_online(&self, user_id: &UserId) -> bool {
        self.presence.is_online(user_id)
    }

    /// Whether the active conversation's counterpart is currently typing.
    pub fn is_participant_typing(&self) -> bool {
        self.active_conversation()
            .is_some_and(|c| self.typing.is_typing(&c.id, &c.participant_id))
    }

    /// Unread messages across all conversations.
    pub fn total_unread(&self) -> u32 {
        self.conversations.all().iter().map(|c| c.unread_count).sum()
    }

    /// Process an event and return resulting actions.
    pub fn handle(&mut self, event: SessionEvent) -> Result<Vec<SessionAction>, SessionError> {
        match event {
            SessionEvent::Connected => self.handle_connected(),
            SessionEvent::Disconnected => self.handle_disconnected(),
            SessionEvent::EventReceived(server_event) => self.handle_server_event(server_event),
            SessionEvent::ConversationsLoaded(snapshot) => {
                self.handle_conversations_loaded(snapshot)
            },
            SessionEvent::MessagesLoaded { conversation_id, messages } => {
                self.handle_messages_loaded(conversation_id, messages)
            },
            SessionEvent::BlocklistLoaded(blocks) => {
                self.blocklist.refresh(&blocks);
                Ok(vec![SessionAction::Log {
                    message: format!("blocklist refreshed: {} pairs", blocks.len()),
                }])
            },
            SessionEvent::SelectConversation { conversation_id } => {
                self.handle_select(conversation_id)
            },
            SessionEvent::SendMessage { content, attachments, created_at } => {
                self.handle_send(content, attachments, created_at)
            },
            SessionEvent::TypingStarted => self.handle_typing(true),
            SessionEvent::TypingStopped => self.handle_typing(false),
            SessionEvent::AcceptActive => self.handle_decision(false),
            SessionEvent::DeclineActive => self.handle_decision(true),
            SessionEvent::StartConversation { participant_id, participant_type } => {
                self.handle_start_conversation(participant_id, participant_type)
            },
            SessionEvent::ConversationCreated(conversation) => {
                self.handle_conversation_created(conversation)
            },
        }
    }

    /// On (re)connect: bind the channel to this user and refresh snapshots.
    ///
    /// Reconnection must not assume prior stream state is still valid, so
    /// both the conversation list and the blocklist are refetched.
    fn handle_connected(&mut self) -> Result<Vec<SessionAction>, SessionError> {
        self.connected = true;
        self.loading_conversations = true;

        Ok(vec![
            SessionAction::Send(ClientCommand::Identify { user_id: self.user.id.clone() }),
            SessionAction::FetchConversations,
            SessionAction::FetchBlocklist,
            SessionAction::Log { message: format!("channel connected as {}", self.user.id) },
        ])
    }

    fn handle_disconnected(&mut self) -> Result<Vec<SessionAction>, SessionError> {
        self.connected = false;
        Ok(vec![SessionAction::Log {
            message: "channel disconnected, awaiting transport reconnect".to_string(),
        }])
    }

    fn handle_server_event(
        &mut self,
        event: ServerEvent,
    ) -> Result<Vec<SessionAction>, SessionError> {
        match event {
            ServerEvent::NewMessage(message) => self.handle_new_message(message),
            ServerEvent::UserStatusChange { user_id, is_online } => {
                self.presence.set_online(&user_id, is_online);
                self.conversations.set_presence(&user_id, is_online);
                Ok(vec![])
            },
            ServerEvent::ConversationUpdated { conversation_id, status, updated_by } => {
                self.handle_conversation_updated(conversation_id, status, &updated_by)
            },
            ServerEvent::UserTyping { conversation_id, user_id } => {
                self.typing.set_typing(&conversation_id, &user_id, true);
                Ok(vec![])
            },
            ServerEvent::UserStopTyping { conversation_id, user_id } => {
                self.typing.set_typing(&conversation_id, &user_id, false);
                Ok(vec![])
            },
            ServerEvent::MessagesRead { conversation_id, read_by } => {
                if read_by != self.user.id {
                    self.messages.advance_from_sender(
                        &conversation_id,
                        &self.user.id,
                        MessageStatus::Read,
                    );
                }
                Ok(vec![])
            },
            ServerEvent::Error { message } => Ok(vec![
                SessionAction::Notify {
                    severity: Severity::Error,
                    title: "Chat error".to_string(),
                    body: message.clone(),
                },
                SessionAction::Log { message: format!("server error: {message}") },
            ]),
        }
    }

    /// Route an inbound message: own echo confirms an optimistic entry,
    /// anything else appends as a counterpart message.
    fn handle_new_message(
        &mut self,
        message: Message,
    ) -> Result<Vec<SessionAction>, SessionError> {
        let conversation_id = message.conversation_id.clone();
        let is_active = self.active.as_ref() == Some(&conversation_id);

        if message.sender_id == self.user.id {
            let outcome = self.messages.reconcile(message.clone());
            if self.conversations.contains(&conversation_id) {
                // Own message: preview may update, the unread counter must
                // not. A slow echo landing after a counterpart message would
                // otherwise zero a counter it never earned.
                self.conversations.apply_own_preview(&conversation_id, &message)?;
            }

            let log = match outcome {
                Reconciliation::Replaced(local_id) => {
                    format!("confirmed {local_id} as {} in {conversation_id}", message.id)
                },
                Reconciliation::Appended => format!(
                    "no outstanding send matched echo {} in {conversation_id}, appended",
                    message.id
                ),
            };
            return Ok(vec![SessionAction::Log { message: log }]);
        }

        self.messages.append_remote(message.clone());
        // The message supersedes any typing indicator from its sender
        self.typing.set_typing(&conversation_id, &message.sender_id, false);

        let mut actions = Vec::new();
        if self.conversations.contains(&conversation_id) {
            self.conversations.apply_message_preview(&conversation_id, &message, is_active)?;
        } else {
            // Opening message of a conversation we have not fetched yet
            actions.push(SessionAction::Log {
                message: format!("message for unknown conversation {conversation_id}"),
            });
            actions.push(SessionAction::FetchConversations);
        }

        if !is_active {
            actions.push(SessionAction::Notify {
                severity: Severity::Info,
                title: format!("New message from {}", message.sender_name),
                body: notify_preview(&message.content),
            });
        }

        Ok(actions)
    }

    /// Apply an admission transition pushed over the channel.
    ///
    /// A decline removes the conversation and its messages; if it was the
    /// active one the selection is cleared. Stale or out-of-order events are
    /// absorbed with a log, never an error.
    fn handle_conversation_updated(
        &mut self,
        conversation_id: ConversationId,
        status: ConversationStatus,
        updated_by: &UserId,
    ) -> Result<Vec<SessionAction>, SessionError> {
        let participant_name = self
            .conversations
            .get(&conversation_id)
            .map(|c| c.participant_name.clone())
            .unwrap_or_default();

        match self.conversations.set_status(&conversation_id, status) {
            Ok(StatusChange::Updated) => {
                let mut actions = vec![SessionAction::Log {
                    message: format!("conversation {conversation_id} is now {status:?}"),
                }];

                if status == ConversationStatus::Accepted && *updated_by != self.user.id {
                    actions.push(SessionAction::Notify {
                        severity: Severity::Info,
                        title: "Conversation accepted".to_string(),
                        body: format!("{participant_name} accepted your message request"),
                    });
                }

                Ok(actions)
            },
            Ok(StatusChange::Removed(_)) => {
                self.messages.clear(&conversation_id);
                self.typing.clear(&conversation_id);
                if self.active.as_ref() == Some(&conversation_id) {
                    self.active = None;
                    self.loading_messages = false;
                }

                let mut actions = vec![SessionAction::Log {
                    message: format!("conversation {conversation_id} declined and removed"),
                }];

                if *updated_by != self.user.id {
                    actions.push(SessionAction::Notify {
                        severity: Severity::Error,
                        title: "Conversation declined".to_string(),
                        body: format!("{participant_name} declined your message request"),
                    });
                }

                Ok(actions)
            },
            Ok(StatusChange::Unchanged) => Ok(vec![]),
            // The conversation may simply not have been fetched yet, for
            // example an accept pushed while the initial snapshot is still
            // in flight. Refetch rather than waiting for the next reconnect.
            Err(e @ StoreError::UnknownConversation { .. }) => Ok(vec![
                SessionAction::Log { message: format!("update for missing conversation: {e}") },
                SessionAction::FetchConversations,
            ]),
            Err(e) => Ok(vec![SessionAction::Log {
                message: format!("ignoring stale conversation update: {e}"),
            }]),
        }
    }

    fn handle_conversations_loaded(
        &mut self,
        snapshot: Vec<Conversation>,
    ) -> Result<Vec<SessionAction>, SessionError> {
        for conversation in &snapshot {
            self.presence.set_online(&conversation.participant_id, conversation.is_online);
        }

        let count = snapshot.len();
        self.conversations.replace_all(snapshot);
        self.loading_conversations = false;

        // The active conversation may have vanished from the snapshot
        if let Some(active) = self.active.clone() {
            if !self.conversations.contains(&active) {
                self.active = None;
                self.loading_messages = false;
                self.messages.clear(&active);
                self.typing.clear(&active);
            }
        }

        Ok(vec![SessionAction::Log { message: format!("loaded {count} conversations") }])
    }

    fn handle_messages_loaded(
        &mut self,
        conversation_id: ConversationId,
        messages: Vec<Message>,
    ) -> Result<Vec<SessionAction>, SessionError> {
        let count = messages.len();
        self.messages.replace_history(&conversation_id, messages);

        if self.active.as_ref() == Some(&conversation_id) {
            self.loading_messages = false;
        }

        Ok(vec![SessionAction::Log {
            message: format!("loaded {count} messages for {conversation_id}"),
        }])
    }

    /// Activate a conversation: reset its unread counter, fetch its history,
    /// and tell the server it has been read.
    fn handle_select(
        &mut self,
        conversation_id: ConversationId,
    ) -> Result<Vec<SessionAction>, SessionError> {
        if !self.conversations.contains(&conversation_id) {
            return Err(StoreError::UnknownConversation { conversation_id }.into());
        }

        self.active = Some(conversation_id.clone());
        self.loading_messages = true;
        self.conversations.mark_read(&conversation_id)?;

        Ok(vec![
            SessionAction::FetchMessages { conversation_id: conversation_id.clone() },
            SessionAction::Send(ClientCommand::MarkAsRead { conversation_id }),
        ])
    }

    /// Compose a message in the active conversation.
    ///
    /// Gating runs first: loaded history, admission state, blocklist. The
    /// optimistic entry is inserted before the command is emitted, so the
    /// caller renders it immediately; confirmation arrives back as our own
    /// echo. Commands emitted while disconnected are lost by the transport
    /// and the entry simply stays `Pending`.
    fn handle_send(
        &mut self,
        content: String,
        attachments: Vec<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Vec<SessionAction>, SessionError> {
        let conversation_id = self.active.clone().ok_or(SessionError::NoActiveConversation)?;

        if self.loading_messages {
            return Err(SessionError::HistoryLoading { conversation_id });
        }

        let permitted = {
            let conversation = self.conversations.get(&conversation_id).ok_or_else(|| {
                StoreError::UnknownConversation { conversation_id: conversation_id.clone() }
            })?;
            let blocked = self.blocklist.is_blocked(&self.user.id, &conversation.participant_id);
            admission::can_send(conversation, &self.user.id, blocked)
        };
        if !permitted {
            return Err(SessionError::SendNotPermitted { conversation_id });
        }

        let draft = Message {
            id: MessageId::local_from_u128(self.env.random_u128()),
            conversation_id: conversation_id.clone(),
            content: content.trim().to_string(),
            sender_id: self.user.id.clone(),
            sender_name: self.user.name.clone(),
            sender_type: self.user.role,
            attachments: attachments.clone(),
            created_at,
            status: MessageStatus::Pending,
        };

        let local_id = self.messages.append_optimistic(draft.clone())?;
        self.conversations.apply_own_preview(&conversation_id, &draft)?;

        Ok(vec![
            SessionAction::Send(ClientCommand::SendMessage {
                conversation_id: conversation_id.clone(),
                content: draft.content,
                sender_id: self.user.id.clone(),
                sender_name: self.user.name.clone(),
                sender_type: self.user.role,
                attachments,
                created_at,
            }),
            SessionAction::Log {
                message: format!("optimistic send {local_id} in {conversation_id}"),
            },
        ])
    }

    /// Relay a composer typing change for the active conversation.
    ///
    /// Fire-and-forget like `send_message`; the server relays it to the
    /// counterpart and no local state is kept for the user's own typing.
    fn handle_typing(&mut self, started: bool) -> Result<Vec<SessionAction>, SessionError> {
        let conversation_id = self.active.clone().ok_or(SessionError::NoActiveConversation)?;

        let command = if started {
            ClientCommand::Typing { conversation_id }
        } else {
            ClientCommand::StopTyping { conversation_id }
        };
        Ok(vec![SessionAction::Send(command)])
    }

    /// Accept or decline the active pending conversation.
    ///
    /// Only the recipient of a pending request may decide. The decision goes
    /// through the REST collaborator; the resulting status change arrives
    /// back over the channel as `conversation_updated` for both parties.
    fn handle_decision(&mut self, decline: bool) -> Result<Vec<SessionAction>, SessionError> {
        let conversation_id = self.active.clone().ok_or(SessionError::NoActiveConversation)?;
        let conversation = self.conversations.get(&conversation_id).ok_or_else(|| {
            StoreError::UnknownConversation { conversation_id: conversation_id.clone() }
        })?;

        if conversation.status != ConversationStatus::Pending {
            return Err(SessionError::NotPending {
                conversation_id,
                status: conversation.status,
            });
        }
        if conversation.initiated_by == self.user.id {
            return Err(SessionError::NotRecipient { conversation_id });
        }

        let action = if decline {
            SessionAction::DeclineViaApi { conversation_id }
        } else {
            SessionAction::AcceptViaApi { conversation_id }
        };
        Ok(vec![action])
    }

    /// Start (or resume) a conversation with a participant.
    ///
    /// Exactly one conversation exists per (participant, type) pair; an
    /// existing one is activated instead of creating a duplicate.
    fn handle_start_conversation(
        &mut self,
        participant_id: UserId,
        participant_type: ParticipantType,
    ) -> Result<Vec<SessionAction>, SessionError> {
        if let Some(existing) =
            self.conversations.find_by_participant(&participant_id, participant_type)
        {
            let existing_id = existing.id.clone();
            let mut actions = vec![SessionAction::Log {
                message: format!("reusing existing conversation {existing_id}"),
            }];
            actions.extend(self.handle_select(existing_id)?);
            return Ok(actions);
        }

        Ok(vec![SessionAction::CreateViaApi { participant_id, participant_type }])
    }

    fn handle_conversation_created(
        &mut self,
        conversation: Conversation,
    ) -> Result<Vec<SessionAction>, SessionError> {
        let conversation_id = conversation.id.clone();

        self.conversations.upsert_conversation(conversation);
        self.messages.replace_history(&conversation_id, Vec::new());
        self.active = Some(conversation_id.clone());
        self.loading_messages = false;

        Ok(vec![SessionAction::Log {
            message: format!("created conversation {conversation_id}"),
        }])
    }
}

/// Truncated message preview for a notification body.
fn notify_preview(content: &str) -> String {
    if content.chars().count() > NOTIFY_PREVIEW_CHARS {
        let truncated: String = content.chars().take(NOTIFY_PREVIEW_CHARS).collect();
        format!("{truncated}...")
    } else {
        content.to_string()
    }
}
