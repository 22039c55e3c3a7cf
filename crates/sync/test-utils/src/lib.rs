//! Test doubles for the sync collaborators.
//!
//! - [`TestBlock`] - minimal block with a deterministic hash
//! - [`MemoryChain`] - in-memory [`chainsync_api::ChainStore`] with failure injection
//! - [`MockPeerClient`] - scripted [`chainsync_api::SyncPeerClient`]
//! - [`MockResponder`] - [`chainsync_api::SyncPeerResponder`] recording its lifecycle

mod block;
mod chain;
mod client;
mod responder;

pub use block::TestBlock;
pub use chain::MemoryChain;
pub use client::{BlockScript, MockPeerClient, StreamEnd, TestPeerId};
pub use responder::MockResponder;
