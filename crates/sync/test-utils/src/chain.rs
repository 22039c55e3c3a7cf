use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use chainsync_api::{ChainError, ChainStore};
use chainsync_primitives::{BlockNumber, ChainEvent, Header};
use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::TestBlock;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// In-memory chain accepting only blocks that extend its head.
#[derive(Debug)]
pub struct MemoryChain {
    head: RwLock<Option<Header>>,
    written: RwLock<Vec<TestBlock>>,
    invalid: RwLock<HashSet<BlockNumber>>,
    failing_writes: RwLock<HashSet<BlockNumber>>,
    verify_calls: AtomicUsize,
    events: broadcast::Sender<ChainEvent>,
}

impl Default for MemoryChain {
    fn default() -> Self {
        Self::with_head(None)
    }
}

impl MemoryChain {
    /// Chain with no head at all.
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain whose head is block `number`.
    pub fn at(number: BlockNumber) -> Self {
        Self::with_head(Some(TestBlock::new(number).header()))
    }

    fn with_head(head: Option<Header>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            head: RwLock::new(head),
            written: RwLock::new(Vec::new()),
            invalid: RwLock::new(HashSet::new()),
            failing_writes: RwLock::new(HashSet::new()),
            verify_calls: AtomicUsize::new(0),
            events,
        }
    }

    /// Reject block `number` during verification.
    pub fn reject(&self, number: BlockNumber) {
        self.invalid.write().insert(number);
    }

    /// Fail the write of block `number`.
    pub fn fail_write(&self, number: BlockNumber) {
        self.failing_writes.write().insert(number);
    }

    pub fn head_number(&self) -> Option<BlockNumber> {
        self.head.read().map(|header| header.number)
    }

    /// Numbers of all committed blocks, in commit order.
    pub fn written_numbers(&self) -> Vec<BlockNumber> {
        self.written.read().iter().map(|block| block.number).collect()
    }

    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }
}

impl ChainStore for MemoryChain {
    type Block = TestBlock;

    fn header(&self) -> Option<Header> {
        *self.head.read()
    }

    fn subscribe_events(&self) -> broadcast::Receiver<ChainEvent> {
        self.events.subscribe()
    }

    fn verify_finalized_block(&self, block: &TestBlock) -> Result<(), ChainError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);

        if self.invalid.read().contains(&block.number) {
            return Err(ChainError::InvalidBlock {
                number: block.number,
                reason: "rejected by test".to_string(),
            });
        }

        let head = self.head_number().unwrap_or(0);
        if block.number != head + 1 {
            return Err(ChainError::NonContiguous {
                number: block.number,
                head,
            });
        }

        Ok(())
    }

    fn write_block(&self, block: &TestBlock) -> Result<(), ChainError> {
        if self.failing_writes.read().contains(&block.number) {
            return Err(ChainError::Storage {
                message: format!("write of block {} failed", block.number),
            });
        }

        self.written.write().push(block.clone());
        *self.head.write() = Some(block.header());
        let _ = self.events.send(ChainEvent::NewHead(block.header()));

        Ok(())
    }
}
