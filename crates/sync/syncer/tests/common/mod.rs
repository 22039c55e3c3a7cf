#![allow(dead_code, unreachable_pub)]

use std::sync::Arc;
use std::time::Duration;

use chainsync::{SyncArgs, Syncer};
use chainsync_tasks::TaskExecutor;
use chainsync_test_utils::{MemoryChain, MockPeerClient, MockResponder};

pub type TestSyncer = Syncer<MockPeerClient, Arc<MemoryChain>, Arc<MockResponder>>;

pub struct Harness {
    pub client: MockPeerClient,
    pub chain: Arc<MemoryChain>,
    pub responder: Arc<MockResponder>,
    pub syncer: Arc<TestSyncer>,
}

impl Harness {
    pub fn new(chain: MemoryChain) -> Self {
        Self::with_client(MockPeerClient::new(), chain)
    }

    pub fn with_client(client: MockPeerClient, chain: MemoryChain) -> Self {
        let chain = Arc::new(chain);
        let responder = Arc::new(MockResponder::new());
        let syncer = Syncer::new(
            client.clone(),
            Arc::clone(&chain),
            Arc::clone(&responder),
            &SyncArgs::default(),
            TaskExecutor::current(),
        );

        Self {
            client,
            chain,
            responder,
            syncer: Arc::new(syncer),
        }
    }

    /// Harness with a started syncer whose listeners are subscribed.
    pub async fn started(chain: MemoryChain) -> Self {
        let harness = Self::new(chain);
        harness.syncer.start().await.expect("syncer starts");
        settle().await;
        harness
    }
}

/// Let spawned tasks run until they block.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

/// Poll `condition` on paused time until it holds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..1_000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached");
}
