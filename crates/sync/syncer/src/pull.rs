//! Pulling a block stream from a single peer.

use std::sync::Arc;

use chainsync_api::{ChainStore, ProgressionTracker, SyncPeerClient, SyncPeerResponder};
use chainsync_primitives::{BlockNumber, SyncBlock};
use scopeguard::ScopeGuard;
use tokio::sync::mpsc;
use tracing::{debug, error, trace};

use crate::{SyncError, Syncer};

/// What a pull from one peer achieved, whether or not it ended in an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PullOutcome {
    /// Highest block committed from this peer, 0 if none.
    pub last_applied: BlockNumber,
    /// The block callback asked to stop syncing.
    pub should_terminate: bool,
}

impl<C, S, R, P> Syncer<C, S, R, P>
where
    C: SyncPeerClient,
    S: ChainStore<Block = C::Block>,
    R: SyncPeerResponder,
    P: ProgressionTracker,
{
    /// Stream blocks from `peer` starting at `from`, committing each one.
    ///
    /// Stops when the peer ends the stream, on the first verification or write
    /// failure, when no block arrives within the block timeout, or as soon as
    /// `callback` returns `true`. Blocks committed before a failure stay committed.
    ///
    /// The stream is closed on every exit path. When this future is dropped
    /// mid-pull, the close runs on a spawned task.
    pub(crate) async fn bulk_sync_with_peer<F>(
        &self,
        peer: &C::Id,
        from: BlockNumber,
        callback: &mut F,
    ) -> (PullOutcome, Result<(), SyncError>)
    where
        F: FnMut(&C::Block) -> bool + Send,
    {
        let mut outcome = PullOutcome::default();

        let blocks = match self.client.get_blocks(peer, from, self.block_timeout).await {
            Ok(blocks) => blocks,
            Err(source) => return (outcome, Err(SyncError::StreamOpen { source })),
        };

        let stream = scopeguard::guard(
            (Arc::clone(&self.client), peer.clone()),
            |(client, peer)| {
                debug!(peer = ?peer, "pull cancelled, closing block stream");
                self.executor.spawn(async move {
                    if let Err(e) = client.close_stream(&peer).await {
                        error!(peer = ?peer, error = %e, "failed to close block stream");
                    }
                });
            },
        );

        let result = self.apply_blocks(blocks, &mut outcome, callback).await;
        let _ = ScopeGuard::into_inner(stream);

        if let Err(e) = self.client.close_stream(peer).await {
            error!(peer = ?peer, error = %e, "failed to close block stream");
        }

        (outcome, result)
    }

    async fn apply_blocks<F>(
        &self,
        mut blocks: mpsc::Receiver<C::Block>,
        outcome: &mut PullOutcome,
        callback: &mut F,
    ) -> Result<(), SyncError>
    where
        F: FnMut(&C::Block) -> bool + Send,
    {
        loop {
            let block = match tokio::time::timeout(self.block_timeout, blocks.recv()).await {
                Ok(Some(block)) => block,
                Ok(None) => return Ok(()),
                Err(_) => {
                    return Err(SyncError::Timeout {
                        timeout: self.block_timeout,
                    });
                }
            };

            let number = block.number();
            if number == 0 {
                trace!("skipping height-0 block in stream");
                self.metrics.inc_zero_height_blocks();
                continue;
            }

            self.chain
                .verify_finalized_block(&block)
                .map_err(|source| SyncError::Verification { number, source })?;
            self.chain
                .write_block(&block)
                .map_err(|source| SyncError::Write { number, source })?;

            self.metrics.inc_blocks_applied();
            outcome.last_applied = number;
            trace!(number, hash = %block.hash(), "applied block");

            if callback(&block) {
                outcome.should_terminate = true;
                return Ok(());
            }
        }
    }
}
