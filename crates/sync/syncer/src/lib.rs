//! Block synchronization orchestrator.
//!
//! [`Syncer`] keeps the local chain up to date with connected peers:
//!
//! - two background listeners keep a [`PeerStatusTable`] current from the peer
//!   client's status and connection feeds
//! - [`Syncer::bulk_sync`] catches up once to the best advertised height
//! - [`Syncer::watch_sync`] keeps syncing as new statuses arrive
//!
//! Both modes pull from one peer at a time and skip-list peers that stall, send
//! invalid blocks or stop short of their advertised height. The syncer does not
//! resolve forks: blocks from peers are assumed final once they pass local checks.

mod args;
mod error;
mod listener;
mod metrics;
mod pull;
mod syncer;

pub use args::SyncArgs;
pub use error::SyncError;
pub use metrics::SyncMetrics;
pub use pull::PullOutcome;
pub use syncer::Syncer;

pub use chainsync_peers::{PeerStatusTable, SkipSet, StatusSignal};
