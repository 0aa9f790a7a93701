//! Presence tracker.
//!
//! Participant online/offline state, written only by the session's inbound
//! channel handlers and read by everything else.

use std::collections::HashSet;

use marketchat_proto::UserId;

/// Online/offline state per participant.
#[derive(Debug, Default)]
pub struct PresenceTracker {
    online: HashSet<UserId>,
}

impl PresenceTracker {
    /// Create a tracker with everyone offline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a presence change.
    pub fn set_online(&mut self, user_id: &UserId, is_online: bool) {
        if is_online {
            self.online.insert(user_id.clone());
        } else {
            self.online.remove(user_id);
        }
    }

    /// Whether a participant is currently online.
    pub fn is_online(&self, user_id: &UserId) -> bool {
        self.online.contains(user_id)
    }

    /// Number of participants currently online.
    pub fn online_count(&self) -> usize {
        self.online.len()
    }
}
