//! Concurrent map of peer id to last advertised chain status.

use std::collections::{HashMap, HashSet};

use chainsync_primitives::{PeerStatus, SyncPeerId};
use parking_lot::RwLock;
use tracing::trace;

/// Peers excluded from selection for the rest of one sync attempt sequence.
pub type SkipSet<Id> = HashSet<Id>;

/// Last-known status of every connected peer (all operations RwLock-protected).
///
/// Entries are upserted by id with last-write-wins semantics. Reads take a single
/// read lock, so a scan never observes a half-applied mutation.
#[derive(Debug)]
pub struct PeerStatusTable<Id: SyncPeerId> {
    peers: RwLock<HashMap<Id, PeerStatus<Id>>>,
}

impl<Id: SyncPeerId> Default for PeerStatusTable<Id> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Id: SyncPeerId> PeerStatusTable<Id> {
    /// Empty table.
    pub fn new() -> Self {
        Self {
            peers: RwLock::new(HashMap::new()),
        }
    }

    /// Upsert each status by peer id. Later statuses in the batch win.
    pub fn put(&self, statuses: impl IntoIterator<Item = PeerStatus<Id>>) {
        let mut peers = self.peers.write();
        for status in statuses {
            trace!(peer = ?status.id, number = status.number, "peer status updated");
            peers.insert(status.id.clone(), status);
        }
    }

    /// Drop the entry for `id`, returning it if present.
    pub fn remove(&self, id: &Id) -> Option<PeerStatus<Id>> {
        self.peers.write().remove(id)
    }

    /// Replace the whole table in one step.
    pub fn reset(&self, statuses: impl IntoIterator<Item = PeerStatus<Id>>) {
        let fresh: HashMap<_, _> = statuses
            .into_iter()
            .map(|status| (status.id.clone(), status))
            .collect();
        *self.peers.write() = fresh;
    }

    /// Highest advertised status among peers not in `skip`.
    ///
    /// Equal heights resolve to the lowest peer id. A selected peer that fails is
    /// skip-listed by the caller, so the next tied peer gets its turn.
    pub fn best_peer(&self, skip: &SkipSet<Id>) -> Option<PeerStatus<Id>> {
        self.peers
            .read()
            .values()
            .filter(|status| !skip.contains(&status.id))
            .max_by(|a, b| a.number.cmp(&b.number).then_with(|| b.id.cmp(&a.id)))
            .cloned()
    }

    /// Last status stored for `id`.
    pub fn get(&self, id: &Id) -> Option<PeerStatus<Id>> {
        self.peers.read().get(id).cloned()
    }

    /// Whether `id` has an entry.
    pub fn contains(&self, id: &Id) -> bool {
        self.peers.read().contains_key(id)
    }

    /// Number of peers with an entry.
    pub fn len(&self) -> usize {
        self.peers.read().len()
    }

    /// Whether no peer has an entry.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids of all peers with an entry, in no particular order.
    pub fn ids(&self) -> Vec<Id> {
        self.peers.read().keys().cloned().collect()
    }
}
