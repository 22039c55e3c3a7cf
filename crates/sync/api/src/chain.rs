//! Local chain storage as seen by the syncer.

use auto_impl::auto_impl;
use chainsync_primitives::{ChainEvent, Header, SyncBlock};
use tokio::sync::broadcast;

use crate::ChainError;

/// Local chain storage and verification.
///
/// The syncer assumes blocks it commits are final; implementations never need
/// to handle reorganisations triggered by the syncer.
#[auto_impl(Arc)]
pub trait ChainStore: Send + Sync + 'static {
    /// Block type stored by this chain.
    type Block: SyncBlock;

    /// Current local head, `None` before genesis is loaded.
    fn header(&self) -> Option<Header>;

    /// Subscribe to locally-applied chain events.
    fn subscribe_events(&self) -> broadcast::Receiver<ChainEvent>;

    /// Check the block against local rules without storing it.
    fn verify_finalized_block(&self, block: &Self::Block) -> Result<(), ChainError>;

    /// Commit a verified block.
    fn write_block(&self, block: &Self::Block) -> Result<(), ChainError>;
}
