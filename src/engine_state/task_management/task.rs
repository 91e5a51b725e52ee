//! # Task System Core Traits
//!
//! This module defines the fundamental building blocks of the task system,
//! which provides a framework for executing work asynchronously across multiple threads.
//!
//! ## Core Components
//! - `Task`: Represents a unit of work that can be executed asynchronously
//! - `TaskResult`: Represents the result of a completed task
//!
//! ## Task Lifecycle
//! 1. A `Task` is created and scheduled via `TaskManager::publish_task()`
//! 2. The task's `process()` method is called on a worker thread, unless the
//!    task reports itself cancelled first, in which case it is skipped
//! 3. The task returns a boxed `TaskResult`; a panic inside `process()` is
//!    caught and turned into a result by `on_failure()`
//! 4. The result's `handle_result()` is called on the owning thread with
//!    mutable access to the [`World`]
//!
//! ## Thread Safety
//! - `Task` must be `Send` to be transferred between threads
//! - `TaskResult` must be `Send` to be transferred back to the owning thread
//! - Tasks own immutable snapshots of their inputs; nothing they read is
//!   mutated while they run

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use web_time::Instant;

use crate::engine_state::voxels::world::World;
use crate::error::GenerationFailure;

/// A trait representing a unit of work that can be executed asynchronously.
///
/// Tasks should be self-contained and own all the data they need to perform
/// their work.
pub trait Task: Send {
    /// Processes the task and returns a result.
    ///
    /// Runs on a background thread (or inline when the pool has no workers).
    ///
    /// # Returns
    /// A boxed `TaskResult` that will be processed on the owning thread.
    fn process(&self) -> Box<dyn TaskResult + Send>;

    /// Builds the result reported when `process()` did not complete.
    fn on_failure(&self, failure: GenerationFailure) -> Box<dyn TaskResult + Send>;

    /// Whether the task's output is no longer wanted.
    ///
    /// Cancelled tasks are dropped without running and produce no result.
    fn is_cancelled(&self) -> bool {
        false
    }

    /// Called once, just before the task is handed to a worker or run inline.
    fn on_started(&self) {}
}

/// A trait representing the result of processing a `Task`.
///
/// Results are applied on the owning thread, which is the only place world
/// state may be mutated.
pub trait TaskResult: Send {
    /// Applies the result to the world.
    ///
    /// # Arguments
    /// * `world` - The world that published the task
    fn handle_result(self: Box<Self>, world: &mut World);
}

/// Shared flag telling a queued or running task that its output is stale.
///
/// Cloning shares the flag. Cancellation is one-way.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Whether two tokens share the same flag.
    pub fn same_as(&self, other: &CancellationToken) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Shared record of when a task left the queue and started running.
///
/// Unset while the task waits for a worker. Only the first `mark` counts.
#[derive(Clone, Debug, Default)]
pub struct StartStamp(Arc<OnceLock<Instant>>);

impl StartStamp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&self) {
        let _ = self.0.set(Instant::now());
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.0.get().copied()
    }
}
