//! Peer status tracking for block sync.
//!
//! [`PeerStatusTable`] is the only mutable state shared between the sync modes and
//! the background listeners. [`StatusSignal`] wakes the watch mode when it changes.

pub mod signal;
pub mod table;

pub use signal::StatusSignal;
pub use table::{PeerStatusTable, SkipSet};
