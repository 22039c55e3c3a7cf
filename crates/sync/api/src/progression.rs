//! Sync progress bookkeeping.

use auto_impl::auto_impl;
use chainsync_primitives::{BlockNumber, ChainEvent};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Which sync mode a progression describes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncType {
    /// One-shot catch-up to the best known peer.
    #[default]
    Bulk,
    /// Event-driven syncing after catch-up.
    Watch,
}

/// Snapshot of a running sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression {
    /// Mode being tracked.
    pub sync_type: SyncType,
    /// First block the sync needed.
    pub starting_block: BlockNumber,
    /// Latest block applied locally.
    pub current_block: BlockNumber,
    /// Highest block advertised by the sync target.
    pub highest_block: BlockNumber,
}

/// Records sync start, target and stop.
#[auto_impl(Arc)]
pub trait ProgressionTracker: Send + Sync + 'static {
    /// Begin tracking from `starting_block`, following `events` for the current block.
    fn start_progression(
        &self,
        starting_block: BlockNumber,
        events: broadcast::Receiver<ChainEvent>,
    );

    /// Stop tracking and clear the snapshot.
    fn stop_progression(&self);

    /// Set the target height.
    fn update_highest_progression(&self, highest_block: BlockNumber);

    /// Snapshot of the running sync, `None` when idle.
    fn progression(&self) -> Option<Progression>;
}
