//! Sync Metrics

use metrics::{Counter, Gauge};

/// Sync Metrics
#[derive(Clone, Debug)]
pub struct SyncMetrics {
    /// Number of blocks verified and committed
    blocks_applied_total: Counter,
    /// Number of height-0 entries dropped from block streams
    zero_height_blocks_total: Counter,
    /// Number of peers in the status table
    known_peers: Gauge,
}

impl Default for SyncMetrics {
    fn default() -> Self {
        Self {
            blocks_applied_total: metrics::counter!("sync.blocks_applied_total"),
            zero_height_blocks_total: metrics::counter!("sync.zero_height_blocks_total"),
            known_peers: metrics::gauge!("sync.known_peers"),
        }
    }
}

impl SyncMetrics {
    pub(crate) fn inc_blocks_applied(&self) {
        self.blocks_applied_total.increment(1);
    }

    pub(crate) fn inc_zero_height_blocks(&self) {
        self.zero_height_blocks_total.increment(1);
    }

    pub(crate) fn set_known_peers(&self, count: usize) {
        self.known_peers.set(count as f64);
    }

    /// Increments the per-peer failure counter for `reason`.
    pub(crate) fn inc_peer_failures(&self, reason: &'static str) {
        metrics::counter!("sync.peer_failures_total", "reason" => reason).increment(1);
    }
}
