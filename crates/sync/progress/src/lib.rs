//! Default [`ProgressionTracker`]: keeps the sync snapshot in memory and follows the
//! local head through the chain event feed while a sync is running.

use std::sync::Arc;

use chainsync_api::{Progression, ProgressionTracker, SyncType};
use chainsync_primitives::{BlockNumber, ChainEvent};
use chainsync_tasks::TaskExecutor;
use parking_lot::{Mutex, RwLock};
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, trace};

#[derive(Debug, Default)]
struct State {
    /// Bumped on every start so a stale update loop cannot touch a newer run.
    generation: u64,
    progression: Option<Progression>,
}

/// In-memory progression tracker.
#[derive(Debug)]
pub struct SyncProgression {
    sync_type: SyncType,
    executor: TaskExecutor,
    state: Arc<RwLock<State>>,
    stop_tx: Mutex<Option<oneshot::Sender<()>>>,
}

impl SyncProgression {
    pub fn new(sync_type: SyncType, executor: TaskExecutor) -> Self {
        Self {
            sync_type,
            executor,
            state: Arc::new(RwLock::new(State::default())),
            stop_tx: Mutex::new(None),
        }
    }

    pub fn sync_type(&self) -> SyncType {
        self.sync_type
    }

    /// Set the latest applied block. No-op when not running.
    pub fn update_current_progression(&self, current_block: BlockNumber) {
        if let Some(progression) = self.state.write().progression.as_mut() {
            progression.current_block = current_block;
        }
    }

    fn stop_update_loop(&self) {
        if let Some(stop_tx) = self.stop_tx.lock().take() {
            let _ = stop_tx.send(());
        }
    }
}

impl ProgressionTracker for SyncProgression {
    fn start_progression(
        &self,
        starting_block: BlockNumber,
        events: broadcast::Receiver<ChainEvent>,
    ) {
        self.stop_update_loop();

        let generation = {
            let mut state = self.state.write();
            state.generation += 1;
            state.progression = Some(Progression {
                sync_type: self.sync_type,
                starting_block,
                ..Default::default()
            });
            state.generation
        };

        let (stop_tx, stop_rx) = oneshot::channel();
        *self.stop_tx.lock() = Some(stop_tx);

        debug!(starting_block, sync_type = ?self.sync_type, "sync progression started");
        self.executor.spawn(run_update_loop(
            Arc::clone(&self.state),
            generation,
            events,
            stop_rx,
        ));
    }

    fn stop_progression(&self) {
        self.stop_update_loop();
        self.state.write().progression = None;
        debug!("sync progression stopped");
    }

    fn update_highest_progression(&self, highest_block: BlockNumber) {
        if let Some(progression) = self.state.write().progression.as_mut() {
            progression.highest_block = highest_block;
        }
    }

    fn progression(&self) -> Option<Progression> {
        self.state.read().progression.clone()
    }
}

impl Drop for SyncProgression {
    fn drop(&mut self) {
        self.stop_update_loop();
    }
}

async fn run_update_loop(
    state: Arc<RwLock<State>>,
    generation: u64,
    mut events: broadcast::Receiver<ChainEvent>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            biased;

            _ = &mut stop_rx => break,

            result = events.recv() => match result {
                // Side-chain blocks do not move the head.
                Ok(event) if event.is_fork() => {}
                Ok(event) => {
                    let mut state = state.write();
                    if state.generation != generation {
                        break;
                    }
                    if let Some(progression) = state.progression.as_mut() {
                        progression.current_block = event.header().number;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // Only the latest head matters; the next event catches up.
                    trace!(skipped, "progression update loop lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }
}
