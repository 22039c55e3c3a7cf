//! Errors raised while syncing.

use std::time::Duration;

use chainsync_api::{ChainError, PeerClientError, ResponderError};
use chainsync_primitives::BlockNumber;

/// Error type for sync operations.
///
/// Per-peer variants end one pull attempt and get the peer skip-listed; only
/// [`SyncError::ClientStart`] and [`SyncError::ResponderClose`] reach the host.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The block stream to the peer could not be opened.
    #[error("failed to open block stream: {source}")]
    StreamOpen {
        #[source]
        source: PeerClientError,
    },

    /// No block arrived within the idle timeout.
    #[error("timeout awaiting block from peer after {timeout:?}")]
    Timeout { timeout: Duration },

    /// The peer sent a block that fails local rules.
    #[error("unable to verify block {number}: {source}")]
    Verification {
        number: BlockNumber,
        #[source]
        source: ChainError,
    },

    /// The local chain failed to store a verified block.
    #[error("failed to write block {number} while syncing: {source}")]
    Write {
        number: BlockNumber,
        #[source]
        source: ChainError,
    },

    /// The peer client failed to start.
    #[error("failed to start sync peer client: {0}")]
    ClientStart(#[source] PeerClientError),

    /// The responder failed to shut down.
    #[error("failed to close sync responder: {0}")]
    ResponderClose(#[source] ResponderError),
}

impl SyncError {
    /// Short label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::StreamOpen { .. } => "stream_open",
            Self::Timeout { .. } => "timeout",
            Self::Verification { .. } => "verification",
            Self::Write { .. } => "write",
            Self::ClientStart(_) => "client_start",
            Self::ResponderClose(_) => "responder_close",
        }
    }

    /// Whether the fault lies with the local node rather than the remote peer.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::Write { .. } | Self::ClientStart(_) | Self::ResponderClose(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_vs_remote() {
        let verification = SyncError::Verification {
            number: 5,
            source: ChainError::InvalidBlock {
                number: 5,
                reason: "bad seal".to_string(),
            },
        };
        assert!(!verification.is_local());
        assert_eq!(verification.reason(), "verification");
        assert_eq!(
            verification.to_string(),
            "unable to verify block 5: invalid block 5: bad seal"
        );

        let write = SyncError::Write {
            number: 5,
            source: ChainError::Storage {
                message: "disk full".to_string(),
            },
        };
        assert!(write.is_local());
        assert_eq!(write.reason(), "write");
    }

    #[test]
    fn test_stream_open_keeps_source() {
        let err = SyncError::StreamOpen {
            source: PeerClientError::Closed,
        };
        assert!(!err.is_local());
        assert_eq!(err.reason(), "stream_open");
        assert_eq!(err.to_string(), "failed to open block stream: client closed");
        assert!(std::error::Error::source(&err).is_some());
    }
}
