//! Domain state
//!
//! Pure, synchronous state for the marketplace chat engine. Everything here
//! is plain data plus invariants: no I/O, no clocks, no async. The session
//! layer feeds events in and reads snapshots out; all mutation funnels
//! through the documented entry points so optimistic and server-confirmed
//! updates share one code path.
//!
//! # Components
//!
//! - [`ConversationStore`]: authoritative conversation collection + previews
//! - [`MessageStore`]: per-conversation message lists with optimistic
//!   reconciliation
//! - [`admission`]: the PENDING/ACCEPTED/DECLINED state machine and the
//!   send-eligibility predicate
//! - [`BlocklistCache`]: administrator-imposed communication blocks
//! - [`PresenceTracker`]: participant online/offline state
//! - [`TypingTracker`]: ephemeral per-conversation typing indicators
//! - [`env::Environment`]: randomness abstraction for deterministic tests

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod admission;
mod blocklist;
mod conversations;
pub mod env;
mod error;
mod messages;
mod presence;
mod typing;

pub use blocklist::BlocklistCache;
pub use conversations::{ConversationStore, StatusChange};
pub use error::StoreError;
pub use messages::{MessageStore, Reconciliation};
pub use presence::PresenceTracker;
pub use typing::TypingTracker;
