//! Client
//!
//! Action-based session state machine for the marketplace chat engine.
//! Manages conversation admission, optimistic message sends, unread counters,
//! blocklist gating, and presence.
//!
//! # Architecture
//!
//! The session follows the same Sans-IO and Action-Based patterns as
//! [`marketchat_core`]. It receives events ([`SessionEvent`]), processes them
//! through pure state machine logic, and returns actions ([`SessionAction`])
//! for the caller to execute: channel commands, REST fetches, notifications.
//!
//! # Components
//!
//! - [`Session`]: Top-level state machine over the core stores
//! - [`SessionEvent`]: Events fed into the session
//! - [`SessionAction`]: Actions produced by the session
//! - [`view`]: Contact-list tab and message-request derivations
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides:
//! - [`transport::ConnectedChannel`]: WebSocket channel with auto-reconnect
//! - [`transport::connect`]: Connect to a chat server

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod error;
mod event;
mod session;
pub mod view;

#[cfg(feature = "transport")]
pub mod transport;

pub use error::SessionError;
pub use event::{SessionAction, SessionEvent, Severity};
pub use marketchat_core::env::Environment;
pub use session::{CurrentUser, Session};
pub use view::RoleTab;
