//! Opaque identifier newtypes.
//!
//! The server assigns ids as opaque strings; the client never inspects their
//! structure except to distinguish locally generated (optimistic) message ids
//! from server-assigned ones. Local ids carry a fixed prefix plus 128 bits of
//! randomness, so collisions within a session are not a practical concern and
//! a stale local id can never be mistaken for a confirmed one.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix carried by locally generated message ids.
const LOCAL_ID_PREFIX: &str = "local-";

macro_rules! opaque_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw id string.
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// The raw id string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_string())
            }
        }
    };
}

opaque_id!(
    /// Server-assigned user identifier.
    UserId
);

opaque_id!(
    /// Server-assigned conversation identifier.
    ConversationId
);

opaque_id!(
    /// Message identifier.
    ///
    /// Server-assigned for confirmed messages; locally generated (see
    /// [`MessageId::local_from_u128`]) for optimistic messages awaiting
    /// confirmation.
    MessageId
);

impl MessageId {
    /// Build a local (optimistic) message id from 128 bits of randomness.
    ///
    /// The caller supplies the randomness so id generation stays
    /// deterministic under a seeded test environment.
    pub fn local_from_u128(raw: u128) -> Self {
        Self(format!("{LOCAL_ID_PREFIX}{raw:032x}"))
    }

    /// Whether this id was generated locally and is awaiting confirmation.
    pub fn is_local(&self) -> bool {
        self.0.starts_with(LOCAL_ID_PREFIX)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn local_ids_are_detectable() {
        let local = MessageId::local_from_u128(0xdead_beef);
        assert!(local.is_local());

        let confirmed = MessageId::new("m123");
        assert!(!confirmed.is_local());
    }

    #[test]
    fn local_ids_differ_per_randomness() {
        assert_ne!(MessageId::local_from_u128(1), MessageId::local_from_u128(2));
    }

    #[test]
    fn ids_serialize_transparently() {
        let id = ConversationId::new("c42");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"c42\"");

        let back: ConversationId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
