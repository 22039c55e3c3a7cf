use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chainsync_api::{PeerClientError, SyncPeerClient};
use chainsync_primitives::{BlockNumber, PeerConnectionEvent, PeerStatus};
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::TestBlock;

/// Peer identity used by the mocks.
pub type TestPeerId = u64;

const FEED_CAPACITY: usize = 64;

fn advertised(id: TestPeerId, number: BlockNumber) -> PeerStatus<TestPeerId> {
    PeerStatus::new(id, number).with_hash(TestBlock::hash_for(number))
}

/// How a scripted block stream ends after its last block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The peer closes the stream.
    Close,
    /// The peer keeps the stream open without sending anything.
    Stall,
}

/// Response to the next `get_blocks` call for a peer.
#[derive(Debug, Clone)]
pub enum BlockScript {
    /// Fail to open the stream.
    Refuse,
    /// Send `blocks`, waiting `delay` before each one, then end as `end`.
    Stream {
        blocks: Vec<TestBlock>,
        delay: Duration,
        end: StreamEnd,
    },
}

impl BlockScript {
    /// Send `blocks` at once, then close.
    pub fn blocks(blocks: Vec<TestBlock>) -> Self {
        Self::Stream {
            blocks,
            delay: Duration::ZERO,
            end: StreamEnd::Close,
        }
    }

    /// Send `blocks` at once, then go silent.
    pub fn stalling(blocks: Vec<TestBlock>) -> Self {
        Self::Stream {
            blocks,
            delay: Duration::ZERO,
            end: StreamEnd::Stall,
        }
    }

    /// Send `blocks` one per `delay`, then close.
    pub fn paced(blocks: Vec<TestBlock>, delay: Duration) -> Self {
        Self::Stream {
            blocks,
            delay,
            end: StreamEnd::Close,
        }
    }
}

#[derive(Debug)]
struct Inner {
    started: AtomicBool,
    closed: AtomicBool,
    start_error: Mutex<Option<String>>,
    close_error: Mutex<Option<String>>,
    connected: Mutex<BTreeMap<TestPeerId, PeerStatus<TestPeerId>>>,
    status_failures: Mutex<HashSet<TestPeerId>>,
    status_delays: Mutex<HashMap<TestPeerId, Duration>>,
    scripts: Mutex<HashMap<TestPeerId, VecDeque<BlockScript>>>,
    requests: Mutex<Vec<(TestPeerId, BlockNumber)>>,
    open_streams: Mutex<HashMap<TestPeerId, oneshot::Sender<()>>>,
    closed_streams: Mutex<Vec<TestPeerId>>,
    status_tx: Mutex<Option<broadcast::Sender<PeerStatus<TestPeerId>>>>,
    connection_tx: Mutex<Option<broadcast::Sender<PeerConnectionEvent<TestPeerId>>>>,
}

/// Scripted peer client. Clones share state, so tests keep one to drive the syncer.
#[derive(Debug, Clone)]
pub struct MockPeerClient {
    inner: Arc<Inner>,
}

impl Default for MockPeerClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPeerClient {
    /// Client with no peers and default feed capacity.
    pub fn new() -> Self {
        Self::with_feed_capacity(FEED_CAPACITY)
    }

    /// Client whose feeds buffer at most `capacity` events per subscriber.
    pub fn with_feed_capacity(capacity: usize) -> Self {
        let (status_tx, _) = broadcast::channel(capacity);
        let (connection_tx, _) = broadcast::channel(capacity);

        Self {
            inner: Arc::new(Inner {
                started: AtomicBool::new(false),
                closed: AtomicBool::new(false),
                start_error: Mutex::new(None),
                close_error: Mutex::new(None),
                connected: Mutex::new(BTreeMap::new()),
                status_failures: Mutex::new(HashSet::new()),
                status_delays: Mutex::new(HashMap::new()),
                scripts: Mutex::new(HashMap::new()),
                requests: Mutex::new(Vec::new()),
                open_streams: Mutex::new(HashMap::new()),
                closed_streams: Mutex::new(Vec::new()),
                status_tx: Mutex::new(Some(status_tx)),
                connection_tx: Mutex::new(Some(connection_tx)),
            }),
        }
    }

    /// Register a peer as already connected, without emitting any event.
    pub fn add_peer(&self, id: TestPeerId, number: BlockNumber) {
        self.inner
            .connected
            .lock()
            .insert(id, advertised(id, number));
    }

    /// Connect a peer and emit a connection event.
    pub fn connect(&self, id: TestPeerId, number: BlockNumber) {
        self.add_peer(id, number);
        if let Some(tx) = self.inner.connection_tx.lock().as_ref() {
            let _ = tx.send(PeerConnectionEvent::connected(id));
        }
    }

    /// Disconnect a peer and emit a disconnection event.
    pub fn disconnect(&self, id: TestPeerId) {
        self.inner.connected.lock().remove(&id);
        self.emit_disconnect(id);
    }

    /// Emit a disconnection event while still listing the peer as connected.
    pub fn emit_disconnect(&self, id: TestPeerId) {
        if let Some(tx) = self.inner.connection_tx.lock().as_ref() {
            let _ = tx.send(PeerConnectionEvent::disconnected(id));
        }
    }

    /// Broadcast a new status for a peer.
    pub fn broadcast_status(&self, id: TestPeerId, number: BlockNumber) {
        let status = advertised(id, number);
        self.inner.connected.lock().insert(id, status.clone());
        if let Some(tx) = self.inner.status_tx.lock().as_ref() {
            let _ = tx.send(status);
        }
    }

    /// Delay answers to status queries for `id`.
    pub fn delay_status(&self, id: TestPeerId, delay: Duration) {
        self.inner.status_delays.lock().insert(id, delay);
    }

    /// Fail status queries for `id`.
    pub fn fail_status(&self, id: TestPeerId) {
        self.inner.status_failures.lock().insert(id);
    }

    /// Queue the response to the next block request to `id`.
    pub fn script(&self, id: TestPeerId, script: BlockScript) {
        self.inner
            .scripts
            .lock()
            .entry(id)
            .or_default()
            .push_back(script);
    }

    /// Make the next `start` fail with `message`.
    pub fn fail_start(&self, message: impl Into<String>) {
        *self.inner.start_error.lock() = Some(message.into());
    }

    /// Make the next `close` fail with `message`. Feeds are closed regardless.
    pub fn fail_close(&self, message: impl Into<String>) {
        *self.inner.close_error.lock() = Some(message.into());
    }

    /// Every `(peer, from)` block request made so far.
    pub fn requests(&self) -> Vec<(TestPeerId, BlockNumber)> {
        self.inner.requests.lock().clone()
    }

    /// Peers whose streams were closed, in order.
    pub fn closed_streams(&self) -> Vec<TestPeerId> {
        self.inner.closed_streams.lock().clone()
    }

    pub fn is_started(&self) -> bool {
        self.inner.started.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }
}

fn closed_feed<T: Clone>() -> broadcast::Receiver<T> {
    let (_, rx) = broadcast::channel(1);
    rx
}

#[async_trait]
impl SyncPeerClient for MockPeerClient {
    type Id = TestPeerId;
    type Block = TestBlock;

    async fn start(&self) -> Result<(), PeerClientError> {
        if let Some(reason) = self.inner.start_error.lock().take() {
            return Err(PeerClientError::Request { reason });
        }
        self.inner.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> Result<(), PeerClientError> {
        self.inner.closed.store(true, Ordering::SeqCst);
        // Dropping the senders closes every feed.
        self.inner.status_tx.lock().take();
        self.inner.connection_tx.lock().take();

        match self.inner.close_error.lock().take() {
            Some(reason) => Err(PeerClientError::Request { reason }),
            None => Ok(()),
        }
    }

    async fn connected_peer_statuses(&self) -> Vec<PeerStatus<TestPeerId>> {
        self.inner.connected.lock().values().cloned().collect()
    }

    fn peer_status_updates(&self) -> broadcast::Receiver<PeerStatus<TestPeerId>> {
        match self.inner.status_tx.lock().as_ref() {
            Some(tx) => tx.subscribe(),
            None => closed_feed(),
        }
    }

    fn peer_connection_events(&self) -> broadcast::Receiver<PeerConnectionEvent<TestPeerId>> {
        match self.inner.connection_tx.lock().as_ref() {
            Some(tx) => tx.subscribe(),
            None => closed_feed(),
        }
    }

    async fn peer_status(
        &self,
        peer: &TestPeerId,
    ) -> Result<PeerStatus<TestPeerId>, PeerClientError> {
        if self.is_closed() {
            return Err(PeerClientError::Closed);
        }

        let delay = self.inner.status_delays.lock().get(peer).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.inner.status_failures.lock().contains(peer) {
            return Err(PeerClientError::Request {
                reason: format!("status query to peer {peer} failed"),
            });
        }

        self.inner
            .connected
            .lock()
            .get(peer)
            .cloned()
            .ok_or_else(|| PeerClientError::NotConnected {
                peer: peer.to_string(),
            })
    }

    async fn get_blocks(
        &self,
        peer: &TestPeerId,
        from: BlockNumber,
        _idle_timeout: Duration,
    ) -> Result<mpsc::Receiver<TestBlock>, PeerClientError> {
        if self.is_closed() {
            return Err(PeerClientError::Closed);
        }
        self.inner.requests.lock().push((*peer, from));

        let script = self
            .inner
            .scripts
            .lock()
            .get_mut(peer)
            .and_then(VecDeque::pop_front);

        let (blocks, delay, end) = match script {
            Some(BlockScript::Stream { blocks, delay, end }) => (blocks, delay, end),
            Some(BlockScript::Refuse) => {
                return Err(PeerClientError::Request {
                    reason: format!("peer {peer} refused block stream"),
                });
            }
            None => {
                return Err(PeerClientError::Request {
                    reason: format!("no block stream scripted for peer {peer}"),
                });
            }
        };

        let (tx, rx) = mpsc::channel(blocks.len().max(1));
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        self.inner.open_streams.lock().insert(*peer, stop_tx);

        tokio::spawn(async move {
            for block in blocks {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                if tx.send(block).await.is_err() {
                    return;
                }
            }
            if end == StreamEnd::Stall {
                // Hold the sender until the stream is closed.
                let _ = stop_rx.await;
            }
        });

        Ok(rx)
    }

    async fn close_stream(&self, peer: &TestPeerId) -> Result<(), PeerClientError> {
        self.inner.open_streams.lock().remove(peer);
        self.inner.closed_streams.lock().push(*peer);
        Ok(())
    }
}
