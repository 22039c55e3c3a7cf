//! Executor metrics, labelled by task kind.

use metrics::{Counter, Gauge};

/// Kind of a spawned task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Short-lived work, e.g. a single peer query.
    Regular,
    /// Long-lived loop whose panic is reported.
    Critical,
}

impl TaskKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Critical => "critical",
        }
    }
}

#[derive(Clone, Debug)]
struct KindMetrics {
    spawned_total: Counter,
    finished_total: Counter,
    running: Gauge,
}

impl KindMetrics {
    fn new(kind: TaskKind) -> Self {
        let label = kind.as_str();
        Self {
            spawned_total: metrics::counter!("executor.tasks.spawned_total", "kind" => label),
            finished_total: metrics::counter!("executor.tasks.finished_total", "kind" => label),
            running: metrics::gauge!("executor.tasks.running", "kind" => label),
        }
    }
}

/// Executor metrics
#[derive(Clone, Debug)]
pub struct TaskExecutorMetrics {
    regular: KindMetrics,
    critical: KindMetrics,
}

impl Default for TaskExecutorMetrics {
    fn default() -> Self {
        Self {
            regular: KindMetrics::new(TaskKind::Regular),
            critical: KindMetrics::new(TaskKind::Critical),
        }
    }
}

impl TaskExecutorMetrics {
    fn kind(&self, kind: TaskKind) -> &KindMetrics {
        match kind {
            TaskKind::Regular => &self.regular,
            TaskKind::Critical => &self.critical,
        }
    }

    /// Record a spawn. The returned guard records the finish when dropped, so a
    /// task that panics or is aborted is still counted.
    pub(crate) fn task_spawned(&self, kind: TaskKind) -> TaskGuard {
        let metrics = self.kind(kind).clone();
        metrics.spawned_total.increment(1);
        metrics.running.increment(1.0);
        TaskGuard(metrics)
    }

    pub(crate) fn task_panicked(&self, name: &'static str) {
        metrics::counter!("executor.tasks.panicked_total", "task" => name).increment(1);
    }
}

/// Marks a task finished on drop.
#[derive(Debug)]
pub(crate) struct TaskGuard(KindMetrics);

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.0.finished_total.increment(1);
        self.0.running.decrement(1.0);
    }
}
