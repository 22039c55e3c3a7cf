//! Types shared between the sync orchestrator and its collaborators.
//!
//! Nothing here knows about transports or storage backends: peer identities are
//! opaque, blocks are anything that can report a number and a hash.

mod block;
mod peer;

pub use block::{BlockNumber, ChainEvent, Header, SyncBlock};
pub use peer::{ConnectionEventKind, PeerConnectionEvent, PeerStatus, SyncPeerId};

pub use alloy_primitives::B256;
