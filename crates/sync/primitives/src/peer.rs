//! Peer identity and advertised chain status.

use std::fmt::Debug;
use std::hash::Hash;

use alloy_primitives::B256;

use crate::block::BlockNumber;

/// Blanket-implemented for any type with Clone + Eq + Hash + Ord + Send + Sync + Debug.
///
/// `Ord` gives best-peer selection a deterministic tie-break.
pub trait SyncPeerId: Clone + Eq + Hash + Ord + Send + Sync + Debug + 'static {}

impl<T> SyncPeerId for T where T: Clone + Eq + Hash + Ord + Send + Sync + Debug + 'static {}

/// Chain height a peer last advertised. A hint for picking sync targets, never authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerStatus<Id: SyncPeerId> {
    pub id: Id,
    pub number: BlockNumber,
    pub hash: Option<B256>,
}

impl<Id: SyncPeerId> PeerStatus<Id> {
    pub fn new(id: Id, number: BlockNumber) -> Self {
        Self {
            id,
            number,
            hash: None,
        }
    }

    /// Attach the advertised head hash.
    pub fn with_hash(mut self, hash: B256) -> Self {
        self.hash = Some(hash);
        self
    }
}

/// Kind of a peer connection change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEventKind {
    Connected,
    Disconnected,
}

/// Connection change reported by the peer client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerConnectionEvent<Id: SyncPeerId> {
    pub id: Id,
    pub kind: ConnectionEventKind,
}

impl<Id: SyncPeerId> PeerConnectionEvent<Id> {
    pub fn connected(id: Id) -> Self {
        Self {
            id,
            kind: ConnectionEventKind::Connected,
        }
    }

    pub fn disconnected(id: Id) -> Self {
        Self {
            id,
            kind: ConnectionEventKind::Disconnected,
        }
    }
}
