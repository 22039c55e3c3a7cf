//! Peer-facing side of block sync: statuses, connection events and block streams.

use std::time::Duration;

use async_trait::async_trait;
use chainsync_primitives::{BlockNumber, PeerConnectionEvent, PeerStatus, SyncBlock, SyncPeerId};
use tokio::sync::{broadcast, mpsc};

use crate::PeerClientError;

/// Client for the sync protocol of connected peers.
///
/// Feeds are broadcast channels: each call returns a fresh receiver, and the
/// feed is closed once the client is closed.
#[async_trait]
pub trait SyncPeerClient: Send + Sync + 'static {
    /// Peer identity.
    type Id: SyncPeerId;
    /// Block type served by peers.
    type Block: SyncBlock;

    /// Start the client.
    async fn start(&self) -> Result<(), PeerClientError>;

    /// Stop the client and close every feed.
    async fn close(&self) -> Result<(), PeerClientError>;

    /// Statuses of all currently-connected peers.
    async fn connected_peer_statuses(&self) -> Vec<PeerStatus<Self::Id>>;

    /// Live feed of status updates broadcast by peers.
    fn peer_status_updates(&self) -> broadcast::Receiver<PeerStatus<Self::Id>>;

    /// Live feed of peer connects and disconnects.
    fn peer_connection_events(&self) -> broadcast::Receiver<PeerConnectionEvent<Self::Id>>;

    /// Ask one peer for its current status.
    async fn peer_status(&self, peer: &Self::Id) -> Result<PeerStatus<Self::Id>, PeerClientError>;

    /// Open a block stream from `peer` starting at `from`.
    ///
    /// The channel closes when the peer has sent everything it has. The peer
    /// side gives up after `idle_timeout` without progress.
    async fn get_blocks(
        &self,
        peer: &Self::Id,
        from: BlockNumber,
        idle_timeout: Duration,
    ) -> Result<mpsc::Receiver<Self::Block>, PeerClientError>;

    /// Release the block stream opened with [`Self::get_blocks`].
    async fn close_stream(&self, peer: &Self::Id) -> Result<(), PeerClientError>;
}
