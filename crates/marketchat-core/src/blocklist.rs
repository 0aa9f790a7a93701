//! Blocklist cache.
//!
//! Read-only gate over administrator-imposed communication blocks. Blocks are
//! stored server-side as directed pairs but are symmetric in effect, so the
//! cache normalizes each pair to a canonical ordering and a lookup checks a
//! single key. Refreshed wholesale from the administration API snapshot; the
//! engine never mutates it mid-session.

use std::collections::HashSet;

use marketchat_proto::{BlockedCommunication, UserId};

/// Canonical unordered pair.
fn key(a: &UserId, b: &UserId) -> (UserId, UserId) {
    if a <= b { (a.clone(), b.clone()) } else { (b.clone(), a.clone()) }
}

/// Set of user pairs forbidden from exchanging messages.
#[derive(Debug, Default)]
pub struct BlocklistCache {
    pairs: HashSet<(UserId, UserId)>,
}

impl BlocklistCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blocked pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether no pairs are blocked.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Replace the cache from an administration API snapshot.
    pub fn refresh(&mut self, blocks: &[BlockedCommunication]) {
        self.pairs = blocks.iter().map(|b| key(&b.initiator_id, &b.target_id)).collect();
    }

    /// Whether communication between two users is blocked, in either
    /// direction.
    pub fn is_blocked(&self, a: &UserId, b: &UserId) -> bool {
        self.pairs.contains(&key(a, b))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn block(initiator: &str, target: &str) -> BlockedCommunication {
        BlockedCommunication {
            initiator_id: UserId::new(initiator),
            target_id: UserId::new(target),
            reason: Some("spam".to_string()),
            blocked_by: UserId::new("admin-1"),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn block_is_symmetric() {
        let mut cache = BlocklistCache::new();
        cache.refresh(&[block("a", "b")]);

        assert!(cache.is_blocked(&UserId::new("a"), &UserId::new("b")));
        assert!(cache.is_blocked(&UserId::new("b"), &UserId::new("a")));
        assert!(!cache.is_blocked(&UserId::new("a"), &UserId::new("c")));
    }

    #[test]
    fn refresh_replaces_previous_snapshot() {
        let mut cache = BlocklistCache::new();
        cache.refresh(&[block("a", "b")]);
        cache.refresh(&[block("c", "d")]);

        assert!(!cache.is_blocked(&UserId::new("a"), &UserId::new("b")));
        assert!(cache.is_blocked(&UserId::new("d"), &UserId::new("c")));
        assert_eq!(cache.len(), 1);
    }
}
