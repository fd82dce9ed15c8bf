//! Per-connection subscription manager.
//!
//! Tracks which sessions a WebSocket client is subscribed to and
//! provides server-side event filtering.

use std::collections::HashSet;

use crate::domain::SessionId;

/// Manages the set of session subscriptions for a single WebSocket
/// connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Subscribed session IDs. If `subscribe_all` is true, this set is
    /// ignored.
    session_ids: HashSet<SessionId>,
    /// Whether the client subscribes to all sessions (wildcard `"*"`).
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds session IDs to the subscription set.
    pub fn subscribe(&mut self, ids: &[SessionId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = true;
        }
        self.session_ids.extend(ids.iter().copied());
    }

    /// Removes session IDs from the subscription set. `wildcard` turns off
    /// the catch-all subscription.
    pub fn unsubscribe(&mut self, ids: &[SessionId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = false;
        }
        for id in ids {
            self.session_ids.remove(id);
        }
    }

    /// Returns `true` if events of `session_id` should be forwarded.
    #[must_use]
    pub fn matches(&self, session_id: SessionId) -> bool {
        self.subscribe_all || self.session_ids.contains(&session_id)
    }

    /// Returns the number of explicitly subscribed sessions.
    #[must_use]
    pub fn count(&self) -> usize {
        self.session_ids.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}

/// Splits raw subscription targets into session IDs and the wildcard
/// flag. Unparsable entries are returned separately.
#[must_use]
pub fn parse_targets(raw: &[String]) -> (Vec<SessionId>, bool, Vec<String>) {
    let mut ids = Vec::new();
    let mut wildcard = false;
    let mut invalid = Vec::new();
    for target in raw {
        let target = target.trim();
        if target == "*" {
            wildcard = true;
        } else if let Ok(uuid) = target.parse::<uuid::Uuid>() {
            ids.push(SessionId::from_uuid(uuid));
        } else {
            invalid.push(target.to_string());
        }
    }
    (ids, wildcard, invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_matches_nothing() {
        let mgr = SubscriptionManager::new();
        assert!(!mgr.matches(SessionId::new()));
    }

    #[test]
    fn subscribe_specific_session() {
        let mut mgr = SubscriptionManager::new();
        let id = SessionId::new();
        mgr.subscribe(&[id], false);
        assert!(mgr.matches(id));
        assert!(!mgr.matches(SessionId::new()));
    }

    #[test]
    fn wildcard_can_be_revoked() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&[], true);
        assert!(mgr.matches(SessionId::new()));
        mgr.unsubscribe(&[], true);
        assert!(!mgr.is_subscribed_all());
        assert!(!mgr.matches(SessionId::new()));
    }

    #[test]
    fn parse_targets_separates_invalid_entries() {
        let id = SessionId::new();
        let raw = vec![id.to_string(), "*".to_string(), "nope".to_string()];
        let (ids, wildcard, invalid) = parse_targets(&raw);
        assert_eq!(ids, vec![id]);
        assert!(wildcard);
        assert_eq!(invalid, vec!["nope".to_string()]);
    }
}
