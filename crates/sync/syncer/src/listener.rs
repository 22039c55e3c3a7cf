//! Background loops keeping the peer status table current.
//!
//! Both feeds are subscribed by [`crate::Syncer::start`] before the loops are
//! spawned. Both loops run until the peer client closes its feeds:
//! - the status listener seeds the table from a snapshot, then applies every update
//! - the connection listener queries newly-connected peers and drops disconnected ones

use std::sync::Arc;

use chainsync_api::SyncPeerClient;
use chainsync_peers::{PeerStatusTable, StatusSignal};
use chainsync_primitives::{ConnectionEventKind, PeerConnectionEvent, PeerStatus};
use chainsync_tasks::TaskExecutor;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, trace, warn};

use crate::SyncMetrics;

/// State shared by the listeners and the per-connect status queries.
pub(crate) struct ListenerContext<C: SyncPeerClient> {
    pub(crate) client: Arc<C>,
    pub(crate) peers: Arc<PeerStatusTable<C::Id>>,
    pub(crate) status_signal: Arc<StatusSignal>,
    pub(crate) metrics: SyncMetrics,
}

impl<C: SyncPeerClient> Clone for ListenerContext<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            peers: Arc::clone(&self.peers),
            status_signal: Arc::clone(&self.status_signal),
            metrics: self.metrics.clone(),
        }
    }
}

impl<C: SyncPeerClient> ListenerContext<C> {
    fn table_changed(&self) {
        self.metrics.set_known_peers(self.peers.len());
        self.status_signal.notify();
    }
}

/// Seed the table from connected peers, then follow status updates.
///
/// `updates` must be subscribed before the snapshot is taken so no update falls
/// between the two.
pub(crate) async fn run_status_listener<C: SyncPeerClient>(
    ctx: ListenerContext<C>,
    mut updates: broadcast::Receiver<PeerStatus<C::Id>>,
) {
    let statuses = ctx.client.connected_peer_statuses().await;
    debug!(count = statuses.len(), "loaded connected peer statuses");
    ctx.peers.put(statuses);
    ctx.table_changed();

    loop {
        match updates.recv().await {
            Ok(status) => {
                trace!(peer = ?status.id, number = status.number, "peer status update");
                ctx.peers.put([status]);
                ctx.table_changed();
            }
            Err(RecvError::Lagged(skipped)) => {
                // Statuses are superseded by later ones; the next update catches up.
                warn!(skipped, "peer status listener lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }

    debug!("peer status feed closed");
}

/// Follow connects and disconnects.
pub(crate) async fn run_connection_listener<C: SyncPeerClient>(
    ctx: ListenerContext<C>,
    mut events: broadcast::Receiver<PeerConnectionEvent<C::Id>>,
    executor: TaskExecutor,
) {
    loop {
        match events.recv().await {
            Ok(PeerConnectionEvent {
                id,
                kind: ConnectionEventKind::Connected,
            }) => {
                // Off the loop: a slow peer must not hold up later events.
                executor.spawn(query_peer_status(ctx.clone(), id));
            }
            Ok(PeerConnectionEvent {
                id,
                kind: ConnectionEventKind::Disconnected,
            }) => {
                if ctx.peers.remove(&id).is_some() {
                    debug!(peer = ?id, "removed disconnected peer");
                }
                ctx.metrics.set_known_peers(ctx.peers.len());
            }
            Err(RecvError::Lagged(skipped)) => {
                // A missed disconnect would leave a stale entry behind; rebuild from scratch.
                warn!(skipped, "peer connection listener lagged, reloading peer statuses");
                let statuses = ctx.client.connected_peer_statuses().await;
                ctx.peers.reset(statuses);
                ctx.table_changed();
            }
            Err(RecvError::Closed) => break,
        }
    }

    debug!("peer connection feed closed");
}

async fn query_peer_status<C: SyncPeerClient>(ctx: ListenerContext<C>, id: C::Id) {
    match ctx.client.peer_status(&id).await {
        Ok(status) => {
            debug!(peer = ?id, number = status.number, "connected peer status");
            ctx.peers.put([status]);
            ctx.table_changed();
        }
        Err(e) => {
            warn!(peer = ?id, error = %e, "failed to get peer status, skip");
        }
    }
}
