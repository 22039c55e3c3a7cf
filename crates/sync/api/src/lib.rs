//! Interfaces the syncer consumes.
//!
//! The syncer drives these collaborators but never implements them:
//!
//! - [`ChainStore`] - local head, block verification and commit, applied-block feed
//! - [`SyncPeerClient`] - peer statuses, connection events and block streams
//! - [`SyncPeerResponder`] - the service answering other peers (lifecycle only)
//! - [`ProgressionTracker`] - sync progress bookkeeping for observability

#![warn(missing_docs)]

mod chain;
mod client;
mod error;
mod progression;
mod responder;

pub use chain::*;
pub use client::*;
pub use error::*;
pub use progression::*;
pub use responder::*;
