use chainsync_primitives::{B256, BlockNumber, Header, SyncBlock};

/// Block whose hash is derived from its number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestBlock {
    pub number: BlockNumber,
    pub hash: B256,
}

impl TestBlock {
    pub fn new(number: BlockNumber) -> Self {
        Self {
            number,
            hash: Self::hash_for(number),
        }
    }

    /// Consecutive blocks `from..=to`.
    pub fn range(from: BlockNumber, to: BlockNumber) -> Vec<Self> {
        (from..=to).map(Self::new).collect()
    }

    pub fn hash_for(number: BlockNumber) -> B256 {
        B256::left_padding_from(&number.to_be_bytes())
    }

    pub fn header(&self) -> Header {
        Header::new(self.number, self.hash)
    }
}

impl SyncBlock for TestBlock {
    fn number(&self) -> BlockNumber {
        self.number
    }

    fn hash(&self) -> B256 {
        self.hash
    }
}
