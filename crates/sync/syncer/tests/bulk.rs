mod common;

use std::time::Duration;

use chainsync_api::SyncType;
use chainsync_primitives::PeerStatus;
use chainsync_test_utils::{BlockScript, MemoryChain, TestBlock};
use common::{Harness, wait_until};

#[tokio::test(start_paused = true)]
async fn bulk_sync_applies_blocks_in_order() {
    let h = Harness::new(MemoryChain::new());
    h.syncer.peers().put([PeerStatus::new(1, 10)]);
    h.client.script(1, BlockScript::blocks(TestBlock::range(1, 10)));

    let mut seen = Vec::new();
    h.syncer
        .bulk_sync(|block| {
            seen.push(block.number);
            false
        })
        .await
        .unwrap();

    assert_eq!(seen, (1..=10).collect::<Vec<_>>());
    assert_eq!(h.chain.head_number(), Some(10));
    assert_eq!(h.client.requests(), vec![(1, 1)]);
    assert_eq!(h.client.closed_streams(), vec![1]);
}

#[tokio::test(start_paused = true)]
async fn bulk_sync_resumes_from_local_head() {
    let h = Harness::new(MemoryChain::at(5));
    h.syncer.peers().put([PeerStatus::new(1, 8)]);
    h.client.script(1, BlockScript::blocks(TestBlock::range(6, 8)));

    h.syncer.bulk_sync(|_| false).await.unwrap();

    assert_eq!(h.client.requests(), vec![(1, 6)]);
    assert_eq!(h.chain.written_numbers(), vec![6, 7, 8]);
}

#[tokio::test(start_paused = true)]
async fn bulk_sync_moves_on_from_peer_that_stops_short() {
    let h = Harness::new(MemoryChain::new());
    h.syncer
        .peers()
        .put([PeerStatus::new(1, 10), PeerStatus::new(2, 8)]);
    h.client.script(1, BlockScript::blocks(TestBlock::range(1, 5)));
    h.client.script(2, BlockScript::blocks(TestBlock::range(6, 8)));

    h.syncer.bulk_sync(|_| false).await.unwrap();

    assert_eq!(h.client.requests(), vec![(1, 1), (2, 6)]);
    assert_eq!(h.chain.written_numbers(), (1..=8).collect::<Vec<_>>());
}

#[tokio::test(start_paused = true)]
async fn bulk_sync_falls_back_when_stream_refused() {
    let h = Harness::new(MemoryChain::new());
    h.syncer
        .peers()
        .put([PeerStatus::new(2, 10), PeerStatus::new(1, 10)]);
    h.client.script(1, BlockScript::Refuse);
    h.client.script(2, BlockScript::blocks(TestBlock::range(1, 10)));

    h.syncer.bulk_sync(|_| false).await.unwrap();

    // Equal heights go to the lowest id first.
    assert_eq!(h.client.requests(), vec![(1, 1), (2, 1)]);
    // A stream that never opened is not closed.
    assert_eq!(h.client.closed_streams(), vec![2]);
    assert_eq!(h.chain.head_number(), Some(10));
}

#[tokio::test(start_paused = true)]
async fn bulk_sync_ignores_height_zero_blocks() {
    let h = Harness::new(MemoryChain::new());
    h.syncer.peers().put([PeerStatus::new(1, 3)]);
    let mut blocks = vec![TestBlock::new(0)];
    blocks.extend(TestBlock::range(1, 3));
    h.client.script(1, BlockScript::blocks(blocks));

    let mut calls = 0;
    h.syncer
        .bulk_sync(|_| {
            calls += 1;
            false
        })
        .await
        .unwrap();

    assert_eq!(calls, 3);
    assert_eq!(h.chain.verify_calls(), 3);
    assert_eq!(h.chain.written_numbers(), vec![1, 2, 3]);
}

#[tokio::test(start_paused = true)]
async fn bulk_sync_times_out_stalled_peer() {
    let h = Harness::new(MemoryChain::new());
    h.syncer
        .peers()
        .put([PeerStatus::new(1, 10), PeerStatus::new(2, 10)]);
    h.client.script(1, BlockScript::stalling(TestBlock::range(1, 4)));
    h.client.script(2, BlockScript::blocks(TestBlock::range(5, 10)));

    let started = tokio::time::Instant::now();
    h.syncer.bulk_sync(|_| false).await.unwrap();

    assert!(started.elapsed() >= h.syncer.block_timeout());
    assert_eq!(h.client.requests(), vec![(1, 1), (2, 5)]);
    assert_eq!(h.client.closed_streams(), vec![1, 2]);
    assert_eq!(h.chain.head_number(), Some(10));
}

#[tokio::test(start_paused = true)]
async fn cancelled_bulk_sync_closes_block_stream() {
    let h = Harness::new(MemoryChain::new());
    h.syncer.peers().put([PeerStatus::new(1, 10)]);
    h.client.script(1, BlockScript::stalling(TestBlock::range(1, 2)));

    // Cancel well before the block timeout fires.
    let cancelled =
        tokio::time::timeout(Duration::from_secs(1), h.syncer.bulk_sync(|_| false)).await;
    assert!(cancelled.is_err());

    wait_until(|| h.client.closed_streams() == vec![1]).await;
    assert_eq!(h.client.requests(), vec![(1, 1)]);
    assert_eq!(h.chain.written_numbers(), vec![1, 2]);
    assert!(h.syncer.sync_progression().is_none());
}

#[tokio::test(start_paused = true)]
async fn block_timeout_applies_per_block() {
    let h = Harness::new(MemoryChain::new());
    h.syncer.peers().put([PeerStatus::new(1, 5)]);
    h.client.script(
        1,
        BlockScript::paced(TestBlock::range(1, 5), Duration::from_secs(4)),
    );

    h.syncer.bulk_sync(|_| false).await.unwrap();

    assert_eq!(h.client.requests(), vec![(1, 1)]);
    assert_eq!(h.chain.head_number(), Some(5));
}

#[tokio::test(start_paused = true)]
async fn bulk_sync_keeps_blocks_before_verification_failure() {
    let h = Harness::new(MemoryChain::new());
    h.chain.reject(4);
    h.syncer.peers().put([PeerStatus::new(1, 10)]);
    h.client.script(1, BlockScript::blocks(TestBlock::range(1, 10)));

    let mut seen = Vec::new();
    h.syncer
        .bulk_sync(|block| {
            seen.push(block.number);
            false
        })
        .await
        .unwrap();

    assert_eq!(seen, vec![1, 2, 3]);
    assert_eq!(h.chain.written_numbers(), vec![1, 2, 3]);
    assert_eq!(h.client.closed_streams(), vec![1]);
}

#[tokio::test(start_paused = true)]
async fn bulk_sync_stops_pulling_on_write_failure() {
    let h = Harness::new(MemoryChain::new());
    h.chain.fail_write(3);
    h.syncer.peers().put([PeerStatus::new(1, 10)]);
    h.client.script(1, BlockScript::blocks(TestBlock::range(1, 10)));

    h.syncer.bulk_sync(|_| false).await.unwrap();

    assert_eq!(h.chain.written_numbers(), vec![1, 2]);
    assert_eq!(h.client.requests(), vec![(1, 1)]);
}

#[tokio::test(start_paused = true)]
async fn bulk_sync_stops_when_callback_terminates() {
    let h = Harness::new(MemoryChain::new());
    h.syncer
        .peers()
        .put([PeerStatus::new(1, 10), PeerStatus::new(2, 10)]);
    h.client.script(1, BlockScript::blocks(TestBlock::range(1, 10)));
    h.client.script(2, BlockScript::blocks(TestBlock::range(5, 10)));

    h.syncer
        .bulk_sync(|block| block.number == 4)
        .await
        .unwrap();

    assert_eq!(h.chain.written_numbers(), vec![1, 2, 3, 4]);
    assert_eq!(h.client.requests(), vec![(1, 1)]);
    assert_eq!(h.client.closed_streams(), vec![1]);
}

#[tokio::test(start_paused = true)]
async fn bulk_sync_is_noop_without_peer_ahead() {
    let h = Harness::new(MemoryChain::at(5));
    h.syncer.bulk_sync(|_| false).await.unwrap();

    h.syncer.peers().put([PeerStatus::new(1, 5)]);
    h.syncer.bulk_sync(|_| false).await.unwrap();

    assert!(h.client.requests().is_empty());
    assert_eq!(h.chain.head_number(), Some(5));
}

#[tokio::test(start_paused = true)]
async fn bulk_sync_at_max_height_is_noop() {
    let h = Harness::new(MemoryChain::at(u64::MAX));
    h.syncer.peers().put([PeerStatus::new(1, u64::MAX)]);

    h.syncer.bulk_sync(|_| false).await.unwrap();

    assert!(!h.syncer.has_sync_peer());
    assert!(h.client.requests().is_empty());
    assert!(h.syncer.sync_progression().is_none());
}

#[tokio::test(start_paused = true)]
async fn bulk_sync_reports_progression_while_running() {
    let h = Harness::new(MemoryChain::at(2));
    h.syncer.peers().put([PeerStatus::new(1, 6)]);
    h.client.script(1, BlockScript::blocks(TestBlock::range(3, 6)));

    let syncer = &h.syncer;
    let mut snapshots = Vec::new();
    syncer
        .bulk_sync(|_| {
            snapshots.push(syncer.sync_progression());
            false
        })
        .await
        .unwrap();

    assert_eq!(snapshots.len(), 4);
    for snapshot in snapshots {
        let progression = snapshot.expect("progression tracked during bulk sync");
        assert_eq!(progression.sync_type, SyncType::Bulk);
        assert_eq!(progression.starting_block, 3);
        assert_eq!(progression.highest_block, 6);
    }
    assert!(h.syncer.sync_progression().is_none());
}

#[tokio::test(start_paused = true)]
async fn has_sync_peer_compares_against_local_head() {
    let h = Harness::new(MemoryChain::at(5));
    assert!(!h.syncer.has_sync_peer());

    h.syncer.peers().put([PeerStatus::new(1, 5)]);
    assert!(!h.syncer.has_sync_peer());

    h.syncer.peers().put([PeerStatus::new(2, 6)]);
    assert!(h.syncer.has_sync_peer());

    h.syncer.peers().remove(&2);
    assert!(!h.syncer.has_sync_peer());
}

#[tokio::test(start_paused = true)]
async fn has_sync_peer_treats_missing_head_as_genesis() {
    let h = Harness::new(MemoryChain::new());
    h.syncer.peers().put([PeerStatus::new(1, 0)]);
    assert!(!h.syncer.has_sync_peer());

    h.syncer.peers().put([PeerStatus::new(1, 1)]);
    assert!(h.syncer.has_sync_peer());
}
