//! Bounded-retry scheduling over a virtual clock.
//!
//! A retry chain is an explicit task `(root, attempts_left, delay)` keyed
//! by id, not a bare timer callback: chains can be inspected, counted,
//! and cancelled by root when that root leaves the tree. The clock is
//! virtual, advanced by the host (`advance`) from whatever event loop it
//! runs, so the scheduler never blocks and tests drive time directly.

use std::collections::BTreeMap;

use bidifix_dom::NodeId;
use tracing::trace;

/// A pending re-attempt.
#[derive(Debug, Clone, Copy)]
pub struct RetryTask {
    pub root: NodeId,
    pub attempts_left: u32,
    pub delay_ms: u64,
    pub due_at: u64,
}

/// Fixed-delay retry chains, self-terminating on first success or on
/// attempt exhaustion.
#[derive(Debug, Default)]
pub struct RetryScheduler {
    now_ms: u64,
    next_task: u64,
    tasks: BTreeMap<u64, RetryTask>,
}

impl RetryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Number of armed (deferred) tasks.
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    pub fn tasks(&self) -> impl Iterator<Item = &RetryTask> {
        self.tasks.values()
    }

    /// Start a retry chain for `root`: run one attempt now, and if it
    /// found nothing arm up to `attempts - 1` deferred re-attempts spaced
    /// `delay_ms` apart. `attempts == 0` does nothing.
    pub fn schedule<F>(&mut self, root: NodeId, attempts: u32, delay_ms: u64, attempt: &mut F)
    where
        F: FnMut(NodeId) -> bool,
    {
        if attempts == 0 {
            return;
        }
        if attempt(root) {
            return;
        }
        if attempts > 1 {
            let id = self.next_task;
            self.next_task += 1;
            self.tasks.insert(
                id,
                RetryTask {
                    root,
                    attempts_left: attempts - 1,
                    delay_ms,
                    due_at: self.now_ms + delay_ms,
                },
            );
            trace!(?root, attempts_left = attempts - 1, "armed retry chain");
        }
    }

    /// Advance the clock and run every attempt that became due, including
    /// re-attempts that fall due within the same advancement.
    pub fn advance<F>(&mut self, elapsed_ms: u64, attempt: &mut F)
    where
        F: FnMut(NodeId) -> bool,
    {
        self.now_ms += elapsed_ms;
        loop {
            let due: Vec<u64> = self
                .tasks
                .iter()
                .filter(|(_, task)| task.due_at <= self.now_ms)
                .map(|(&id, _)| id)
                .collect();
            if due.is_empty() {
                return;
            }
            for id in due {
                let Some(mut task) = self.tasks.remove(&id) else {
                    continue;
                };
                if attempt(task.root) || task.attempts_left <= 1 {
                    continue;
                }
                task.attempts_left -= 1;
                // Keep the cadence relative to the missed deadline; the
                // minimum step guards a zero delay from spinning.
                task.due_at = task.due_at.saturating_add(task.delay_ms.max(1));
                self.tasks.insert(id, task);
            }
        }
    }

    /// Drop every chain rooted at `root`. Returns how many were dropped.
    pub fn cancel_root(&mut self, root: NodeId) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|_, task| task.root != root);
        let cancelled = before - self.tasks.len();
        if cancelled > 0 {
            trace!(?root, cancelled, "cancelled retry chains");
        }
        cancelled
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}
