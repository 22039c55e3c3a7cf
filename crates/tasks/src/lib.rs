//! Task spawning for the sync services.
//!
//! [`TaskExecutor`] wraps a tokio runtime handle and counts spawned and finished
//! tasks. Critical tasks are long-lived loops whose panic is logged instead of
//! silently vanishing with the join handle.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{Instrument, error};

pub mod metrics;

use crate::metrics::{TaskExecutorMetrics, TaskKind};

/// Spawns tasks onto a tokio runtime and records executor metrics.
#[derive(Debug, Clone)]
pub struct TaskExecutor {
    handle: Handle,
    metrics: TaskExecutorMetrics,
}

impl TaskExecutor {
    /// Executor spawning onto `handle`.
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            metrics: TaskExecutorMetrics::default(),
        }
    }

    /// Executor for the runtime this is called from.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a tokio runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    /// Spawn a regular task.
    pub fn spawn<F>(&self, fut: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let finished = self.metrics.task_spawned(TaskKind::Regular);

        self.handle.spawn(async move {
            let _finished = finished;
            fut.await;
        })
    }

    /// Spawn a long-lived task. A panic inside it is logged with the task name.
    pub fn spawn_critical<F>(&self, name: &'static str, fut: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let finished = self.metrics.task_spawned(TaskKind::Critical);
        let metrics = self.metrics.clone();
        let span = tracing::debug_span!("task", task = name);

        let task = async move {
            let _finished = finished;
            if let Err(panic) = AssertUnwindSafe(fut).catch_unwind().await {
                metrics.task_panicked(name);
                error!(task = name, reason = panic_message(&*panic), "critical task panicked");
            }
        };

        self.handle.spawn(task.instrument(span))
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown"
    }
}
