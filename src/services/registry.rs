//! Identity-map registries for clients and parties.
//!
//! Ids are allocated by clients, not the broker, so both registries are
//! pure get-or-create maps: the first use of an id materializes the entity
//! and every later use resolves to the same `Arc`.

use crate::state::{Client, Party};
use dashmap::DashMap;
use std::sync::Arc;

/// All clients ever seen, keyed by client id.
#[derive(Default)]
pub struct ClientRegistry {
    clients: DashMap<u64, Arc<Client>>,
}

impl ClientRegistry {
    /// Resolve a client id, creating the client on first use.
    pub fn get_or_create(&self, client_id: u64) -> Arc<Client> {
        self.clients
            .entry(client_id)
            .or_insert_with(|| Arc::new(Client::new(client_id)))
            .clone()
    }

    /// Number of known clients.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Whether no client has been seen yet.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

/// All parties ever referenced, keyed by party id.
///
/// Parties are never garbage-collected; an id once used stays resolvable,
/// possibly with zero members.
#[derive(Default)]
pub struct PartyRegistry {
    parties: DashMap<u64, Arc<Party>>,
}

impl PartyRegistry {
    /// Resolve a party id, creating an empty party on first use.
    pub fn get_or_create(&self, party_id: u64) -> Arc<Party> {
        self.parties
            .entry(party_id)
            .or_insert_with(|| Arc::new(Party::new(party_id)))
            .clone()
    }

    /// Number of known parties.
    pub fn len(&self) -> usize {
        self.parties.len()
    }

    /// Whether no party has been referenced yet.
    pub fn is_empty(&self) -> bool {
        self.parties.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create_returns_same_entity() {
        let registry = ClientRegistry::default();
        let first = registry.get_or_create(7);
        let again = registry.get_or_create(7);
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_parties_persist_when_empty() {
        let registry = PartyRegistry::default();
        let party = registry.get_or_create(999);
        assert_eq!(party.member_count(), 0);
        let again = registry.get_or_create(999);
        assert!(Arc::ptr_eq(&party, &again));
    }
}
