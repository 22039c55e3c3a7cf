//! Service answering sync requests from other peers.

use auto_impl::auto_impl;

use crate::ResponderError;

/// Serves blocks and statuses to other peers. The syncer only manages its lifecycle.
#[auto_impl(Arc)]
pub trait SyncPeerResponder: Send + Sync + 'static {
    /// Start serving requests.
    fn start(&self);

    /// Stop serving requests.
    fn close(&self) -> Result<(), ResponderError>;
}
