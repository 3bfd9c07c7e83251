// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deferred tasks and the explicit settle pass.
//!
//! Building a subtree is synchronous and bottom-up, so a provider registered
//! while its node is still detached cannot yet know its eventual parent.
//! Work that depends on the finished tree (starting lifecycle observation,
//! electing the navigation root) is queued with
//! [`Runtime::defer`](crate::Runtime::defer) and runs only when the host calls
//! [`Runtime::settle`](crate::Runtime::settle).
//!
//! A settle call runs in rounds. Each round runs the tasks queued when the
//! round began, first scheduled first run, then delivers the pending mutation
//! batch to the lifecycle monitor. Rounds repeat until both are empty or
//! [`RuntimeConfig::max_rounds`] is reached.

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::fmt;

use crate::runtime::Runtime;
use crate::trace::{SettleSummary, TaskEvent};

/// The error type deferred tasks may return.
pub type TaskError = Box<dyn core::error::Error>;

/// A deferred unit of work.
pub type Task = Box<dyn FnOnce(&mut Runtime) -> Result<(), TaskError>>;

/// Runtime tuning knobs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Upper bound on rounds per settle call.
    pub max_rounds: u32,
    /// Destroy durably detached subtrees after reclaiming their providers.
    ///
    /// With `false`, detached nodes stay alive (without markers) so the host
    /// can inspect or reinsert them.
    pub destroy_detached: bool,
}

impl RuntimeConfig {
    /// Default configuration: 64 rounds, detached subtrees are destroyed.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_rounds: 64,
            destroy_detached: true,
        }
    }

    /// Like [`new`](Self::new), but detached subtrees are kept alive.
    #[must_use]
    pub const fn retain_detached() -> Self {
        Self {
            max_rounds: 64,
            destroy_detached: false,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// What a [`Runtime::settle`](crate::Runtime::settle) call did.
#[derive(Debug, Default)]
pub struct SettleReport {
    /// Rounds executed.
    pub rounds: u32,
    /// Tasks run across all rounds.
    pub tasks_run: u32,
    /// Mutation batches delivered.
    pub batches: u32,
    /// Registry entries reclaimed.
    pub reclaimed: u32,
    /// Errors returned by tasks, in execution order.
    pub errors: Vec<TaskError>,
    /// `true` if work was still pending when the round limit was hit.
    pub exhausted: bool,
}

impl SettleReport {
    /// Returns `true` if every task succeeded and the runtime is idle.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && !self.exhausted
    }

    fn summary(&self) -> SettleSummary {
        SettleSummary {
            rounds: self.rounds,
            tasks_run: self.tasks_run,
            batches: self.batches,
            reclaimed: self.reclaimed,
            failures: self.errors.len(),
            exhausted: self.exhausted,
        }
    }
}

struct Queued {
    seq: u64,
    label: &'static str,
    task: Task,
}

/// First-in-first-out queue of deferred tasks.
#[derive(Default)]
pub(crate) struct TaskQueue {
    queue: VecDeque<Queued>,
    next_seq: u64,
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue")
            .field("len", &self.queue.len())
            .field("next_seq", &self.next_seq)
            .finish()
    }
}

impl TaskQueue {
    pub(crate) fn push(&mut self, label: &'static str, task: Task) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push_back(Queued { seq, label, task });
        seq
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    fn pop(&mut self) -> Option<Queued> {
        self.queue.pop_front()
    }
}

impl Runtime {
    /// Queues a task for the next [`settle`](Self::settle) call.
    ///
    /// Returns the task's sequence number. Queued tasks cannot be cancelled;
    /// tasks addressing nodes must check
    /// [`NodeTree::is_alive`](crate::node::NodeTree::is_alive) themselves.
    pub fn defer(
        &mut self,
        label: &'static str,
        task: impl FnOnce(&mut Self) -> Result<(), TaskError> + 'static,
    ) -> u64 {
        self.queue.push(label, Box::new(task))
    }

    /// Returns the number of tasks waiting for the next settle call.
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.queue.len()
    }

    /// Returns `true` if no task and no structural change is pending.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty() && !self.tree.has_pending()
    }

    /// Runs deferred tasks and delivers structural changes until the runtime
    /// is idle.
    ///
    /// Task errors do not stop the pass; they are collected in the report.
    pub fn settle(&mut self) -> SettleReport {
        let mut report = SettleReport::default();
        while !self.is_idle() {
            if report.rounds >= self.config.max_rounds {
                report.exhausted = true;
                break;
            }
            report.rounds += 1;

            // Tasks queued by this round's tasks wait for the next round.
            let due = self.queue.len();
            for _ in 0..due {
                let Some(queued) = self.queue.pop() else {
                    break;
                };
                let result = (queued.task)(self);
                report.tasks_run += 1;
                self.tracer().task(&TaskEvent {
                    seq: queued.seq,
                    label: queued.label,
                    ok: result.is_ok(),
                });
                if let Err(err) = result {
                    report.errors.push(err);
                }
            }

            if self.tree.has_pending() {
                let batch = self.tree.take_batch();
                report.batches += 1;
                report.reclaimed += self.deliver(&batch) as u32;
            }
        }
        let summary = report.summary();
        self.tracer().settle(&summary);
        report
    }
}
