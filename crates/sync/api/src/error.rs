//! Error types reported by sync collaborators.
//!
//! Each collaborator has its own error so the syncer can tell a remote fault
//! (bad peer) from a local one (storage) when logging.

use chainsync_primitives::BlockNumber;

/// Error returned by a [`crate::ChainStore`].
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// The block does not extend the local chain.
    #[error("block {number} does not extend local head {head}")]
    NonContiguous {
        /// Number of the rejected block.
        number: BlockNumber,
        /// Local head at the time of the check.
        head: BlockNumber,
    },

    /// The block failed a local validity rule.
    #[error("invalid block {number}: {reason}")]
    InvalidBlock {
        /// Number of the rejected block.
        number: BlockNumber,
        /// Description of the failed rule.
        reason: String,
    },

    /// Storage operation failed.
    #[error("storage error: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
    },
}

/// Error returned by a [`crate::SyncPeerClient`].
#[derive(Debug, thiserror::Error)]
pub enum PeerClientError {
    /// The peer is not connected.
    #[error("peer not connected: {peer}")]
    NotConnected {
        /// Debug rendering of the peer identity.
        peer: String,
    },

    /// The peer rejected or failed the request.
    #[error("request failed: {reason}")]
    Request {
        /// Description of the failure.
        reason: String,
    },

    /// The client has been closed.
    #[error("client closed")]
    Closed,
}

/// Error returned by a [`crate::SyncPeerResponder`].
#[derive(Debug, thiserror::Error)]
pub enum ResponderError {
    /// The responder failed to shut down cleanly.
    #[error("responder shutdown failed: {message}")]
    Shutdown {
        /// Description of the failure.
        message: String,
    },
}
