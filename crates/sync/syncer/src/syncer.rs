//! Sync orchestrator: lifecycle, peer selection and the two sync modes.

use std::sync::Arc;
use std::time::Duration;

use chainsync_api::{
    ChainStore, Progression, ProgressionTracker, SyncPeerClient, SyncPeerResponder, SyncType,
};
use chainsync_peers::{PeerStatusTable, SkipSet, StatusSignal};
use chainsync_primitives::BlockNumber;
use chainsync_progress::SyncProgression;
use chainsync_tasks::TaskExecutor;
use tracing::{debug, error, info, warn};

use crate::listener::{ListenerContext, run_connection_listener, run_status_listener};
use crate::{SyncArgs, SyncError, SyncMetrics};

/// Keeps the local chain in step with the best connected peer.
///
/// # Type Parameters
///
/// - `C`: peer client fetching statuses and block streams
/// - `S`: local chain store, sharing `C`'s block type
/// - `R`: responder serving other peers (lifecycle only)
/// - `P`: progression tracker, [`SyncProgression`] by default
///
/// # Examples
///
/// ```ignore
/// let syncer = Syncer::new(client, chain, responder, &SyncArgs::default(), executor);
/// syncer.start().await?;
///
/// syncer.bulk_sync(|block| { debug!(number = block.number(), "synced"); false }).await?;
/// syncer.watch_sync(|_| false).await?;
/// ```
pub struct Syncer<C, S, R, P = SyncProgression>
where
    C: SyncPeerClient,
{
    pub(crate) client: Arc<C>,
    pub(crate) chain: S,
    responder: R,
    progression: P,
    peers: Arc<PeerStatusTable<C::Id>>,
    /// Woken whenever the peer table changes.
    status_signal: Arc<StatusSignal>,
    pub(crate) executor: TaskExecutor,
    pub(crate) block_timeout: Duration,
    pub(crate) metrics: SyncMetrics,
}

impl<C, S, R> Syncer<C, S, R, SyncProgression>
where
    C: SyncPeerClient,
    S: ChainStore<Block = C::Block>,
    R: SyncPeerResponder,
{
    /// Create a syncer tracking bulk progression in memory.
    ///
    /// Nothing runs until [`Self::start`] is called.
    pub fn new(client: C, chain: S, responder: R, args: &SyncArgs, executor: TaskExecutor) -> Self {
        let progression = SyncProgression::new(SyncType::Bulk, executor.clone());
        Self::with_progression(client, chain, responder, progression, args, executor)
    }
}

impl<C, S, R, P> Syncer<C, S, R, P>
where
    C: SyncPeerClient,
    S: ChainStore<Block = C::Block>,
    R: SyncPeerResponder,
    P: ProgressionTracker,
{
    /// Create a syncer reporting to a custom progression tracker.
    pub fn with_progression(
        client: C,
        chain: S,
        responder: R,
        progression: P,
        args: &SyncArgs,
        executor: TaskExecutor,
    ) -> Self {
        Self {
            client: Arc::new(client),
            chain,
            responder,
            progression,
            peers: Arc::new(PeerStatusTable::new()),
            status_signal: Arc::new(StatusSignal::new()),
            executor,
            block_timeout: args.block_timeout(),
            metrics: SyncMetrics::default(),
        }
    }

    /// Start the peer client and responder, then the peer table listeners.
    ///
    /// A client start failure is returned before anything else is started.
    pub async fn start(&self) -> Result<(), SyncError> {
        self.client.start().await.map_err(SyncError::ClientStart)?;
        self.responder.start();

        // Subscribe before returning so no event emitted after start is missed.
        let connection_events = self.client.peer_connection_events();
        let status_updates = self.client.peer_status_updates();

        let ctx = ListenerContext {
            client: Arc::clone(&self.client),
            peers: Arc::clone(&self.peers),
            status_signal: Arc::clone(&self.status_signal),
            metrics: self.metrics.clone(),
        };
        self.executor.spawn_critical(
            "sync-peer-status",
            run_status_listener(ctx.clone(), status_updates),
        );
        self.executor.spawn_critical(
            "sync-peer-connections",
            run_connection_listener(ctx, connection_events, self.executor.clone()),
        );

        info!(block_timeout = ?self.block_timeout, "syncer started");
        Ok(())
    }

    /// Stop syncing and shut down the responder and peer client.
    ///
    /// Closing the status signal ends a running [`Self::watch_sync`]. A responder
    /// error is returned and leaves the client open. A client error is only
    /// logged: by then shutdown has to go ahead regardless.
    pub async fn close(&self) -> Result<(), SyncError> {
        self.status_signal.close();

        self.responder.close().map_err(SyncError::ResponderClose)?;

        if let Err(e) = self.client.close().await {
            warn!(error = %e, "failed to close sync peer client");
        }

        info!("syncer closed");
        Ok(())
    }

    /// Snapshot of the running bulk sync, `None` when idle.
    pub fn sync_progression(&self) -> Option<Progression> {
        self.progression.progression()
    }

    /// Whether some known peer advertises a chain longer than ours.
    pub fn has_sync_peer(&self) -> bool {
        self.peers
            .best_peer(&SkipSet::new())
            .is_some_and(|best| best.number > self.local_head())
    }

    /// Peer status table maintained by the listeners.
    pub fn peers(&self) -> &PeerStatusTable<C::Id> {
        &self.peers
    }

    /// Idle timeout applied to each block of a pull.
    pub fn block_timeout(&self) -> Duration {
        self.block_timeout
    }

    /// Catch up once with the best known peers.
    ///
    /// Pulls from the highest peer first. A peer that fails or stops short of its
    /// advertised height is skipped and the next best one is tried, until the
    /// local chain reaches a peer's advertised head or no peer is ahead of it.
    /// `callback` runs for every committed block; returning `true` ends the sync.
    ///
    /// Per-peer failures are logged, never returned.
    pub async fn bulk_sync<F>(&self, mut callback: F) -> Result<(), SyncError>
    where
        F: FnMut(&C::Block) -> bool + Send,
    {
        let mut local_latest = self.local_head();

        self.progression
            .start_progression(local_latest.saturating_add(1), self.chain.subscribe_events());
        let _progression = scopeguard::guard(&self.progression, |progression| {
            progression.stop_progression();
        });

        let mut skip = SkipSet::new();

        while let Some(best) = self.peers.best_peer(&skip) {
            if best.number <= local_latest {
                break;
            }

            self.progression.update_highest_progression(best.number);
            let from = local_latest.saturating_add(1);
            debug!(peer = ?best.id, from, target = best.number, "bulk syncing with peer");

            let (outcome, result) = self
                .bulk_sync_with_peer(&best.id, from, &mut callback)
                .await;
            if let Err(e) = &result {
                self.log_peer_failure(&best.id, e);
            }

            if outcome.should_terminate {
                debug!(number = outcome.last_applied, "bulk sync stopped by callback");
                break;
            }

            if result.is_ok() && outcome.last_applied >= best.number {
                info!(peer = ?best.id, number = outcome.last_applied, "bulk sync complete");
                break;
            }

            local_latest = self.local_head();
            skip.insert(best.id);
        }

        Ok(())
    }

    /// Keep syncing as peers advertise new blocks, until `callback` returns `true`
    /// or the syncer is closed.
    ///
    /// Each peer table change triggers one attempt against the best peer not yet
    /// skipped. Once every known peer is skipped, the skip set is cleared so they
    /// all get another chance.
    pub async fn watch_sync<F>(&self, mut callback: F) -> Result<(), SyncError>
    where
        F: FnMut(&C::Block) -> bool + Send,
    {
        let mut skip = SkipSet::new();

        while self.status_signal.wait().await {
            let local_latest = self.local_head();

            let Some(best) = self.peers.best_peer(&skip) else {
                if !skip.is_empty() {
                    debug!(skipped = skip.len(), "all peers skipped, resetting skip set");
                }
                skip.clear();
                continue;
            };

            if best.number <= local_latest {
                continue;
            }

            let (outcome, result) = self
                .bulk_sync_with_peer(&best.id, local_latest.saturating_add(1), &mut callback)
                .await;
            if let Err(e) = &result {
                self.log_peer_failure(&best.id, e);
            }

            if outcome.should_terminate {
                debug!(number = outcome.last_applied, "watch sync stopped by callback");
                return Ok(());
            }

            if result.is_err() || outcome.last_applied < best.number {
                skip.insert(best.id);
            }
        }

        debug!("status signal closed, watch sync stopped");
        Ok(())
    }

    fn local_head(&self) -> BlockNumber {
        self.chain.header().map_or(0, |header| header.number)
    }

    fn log_peer_failure(&self, peer: &C::Id, err: &SyncError) {
        self.metrics.inc_peer_failures(err.reason());

        if err.is_local() {
            error!(peer = ?peer, error = %err, "local chain failure while syncing from peer, try next one");
        } else {
            warn!(peer = ?peer, error = %err, "failed to complete sync with peer, try next one");
        }
    }
}
