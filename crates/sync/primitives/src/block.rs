//! Block, header and chain event types.

use std::fmt::Debug;

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

/// Height of a block in the chain.
pub type BlockNumber = u64;

/// A block as seen by the syncer.
///
/// Number 0 is never a valid sync target (genesis is never fetched), so blocks
/// reporting it are treated as filler by the pull loop.
pub trait SyncBlock: Clone + Debug + Send + Sync + 'static {
    fn number(&self) -> BlockNumber;

    fn hash(&self) -> B256;
}

/// Summary of a block, enough to identify the local head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Header {
    pub number: BlockNumber,
    pub hash: B256,
}

impl Header {
    pub const fn new(number: BlockNumber, hash: B256) -> Self {
        Self { number, hash }
    }
}

/// Locally-applied chain change, emitted by the chain store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainEvent {
    /// The canonical head advanced to this header.
    NewHead(Header),
    /// A side-chain block was stored; the head did not move.
    Fork(Header),
}

impl ChainEvent {
    pub fn header(&self) -> &Header {
        match self {
            Self::NewHead(header) | Self::Fork(header) => header,
        }
    }

    pub fn is_fork(&self) -> bool {
        matches!(self, Self::Fork(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_event_header() {
        let header = Header::new(7, B256::repeat_byte(7));

        let head = ChainEvent::NewHead(header);
        assert_eq!(head.header().number, 7);
        assert!(!head.is_fork());

        let fork = ChainEvent::Fork(header);
        assert_eq!(fork.header(), &header);
        assert!(fork.is_fork());
    }
}
