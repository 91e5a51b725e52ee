//! # Task Management System
//!
//! This module provides the worker pool that runs chunk generation off the
//! owning thread.
//!
//! ## Architecture Overview
//!
//! - `TaskManager`: Central coordinator for task distribution and worker management
//! - `Task`: A unit of work that can be executed asynchronously
//! - `TaskResult`: The result of a completed task, applied to the world
//! - `TaskChannel`: Communication channel between the owning thread and one worker
//!
//! Each worker is a `std::thread` with a dedicated pair of mpsc channels.
//! Tasks are handed out round-robin with at most [`MAX_TASKS_IN_FLIGHT`] per
//! worker; the rest wait in a FIFO queue. With zero workers the manager runs
//! every task inline on the calling thread, which keeps streaming fully
//! deterministic for tests and single-threaded hosts.
//!
//! ## Task Lifecycle
//! 1. Tasks are published via `TaskManager::publish_task()`
//! 2. The manager distributes tasks to available worker channels, calling
//!    `Task::on_started()` at hand-off
//! 3. Workers skip cancelled tasks, run the rest, and catch panics
//! 4. Results are collected on the owning thread by `process_completed_tasks()`
//!    and handed to the caller, which applies them
//!
//! ## Example Usage
//! ```ignore
//! let mut task_manager = TaskManager::new(2);
//! task_manager.publish_task(Box::new(task));
//!
//! // In the game loop:
//! for result in task_manager.process_completed_tasks() {
//!     result.handle_result(&mut world);
//! }
//! task_manager.process_queued_tasks();
//! ```

pub mod task;

use std::any::Any;
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};

use log::{debug, error, info, warn};
use task::{Task, TaskResult};

use crate::error::GenerationFailure;

/// Message sent back by a worker for every task it received. `None` marks a
/// cancelled task that was skipped.
type WorkerReply = Option<Box<dyn TaskResult + Send>>;

/// A communication channel between the owning thread and a worker thread.
///
/// # Fields
/// - `task_sender`: Sends tasks from the owning thread to the worker
/// - `result_receiver`: Receives task results from the worker
/// - `num_tasks_in_flight`: Tracks number of tasks currently being processed
/// - `_worker`: Handle to the worker thread
pub struct TaskChannel {
    task_sender: Sender<Box<dyn Task + Send>>,
    result_receiver: Receiver<WorkerReply>,
    num_tasks_in_flight: usize,
    _worker: JoinHandle<()>,
}

/// Manages a pool of worker threads and coordinates task execution.
///
/// # Fields
/// - `channels`: Set of active worker channels
/// - `queued_tasks`: Tasks waiting for an available worker
/// - `current_channel`: Index for round-robin scheduling
/// - `completed`: Results of tasks run inline, waiting to be collected
pub struct TaskManager {
    channels: Vec<TaskChannel>,
    queued_tasks: VecDeque<Box<dyn Task + Send>>,
    current_channel: usize,
    completed: VecDeque<Box<dyn TaskResult + Send>>,
}

/// Maximum number of tasks that can be in flight per worker channel.
pub const MAX_TASKS_IN_FLIGHT: usize = 1;

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Runs one task, converting a panic into a failure result.
fn run_task(task: &dyn Task) -> WorkerReply {
    if task.is_cancelled() {
        return None;
    }
    match catch_unwind(AssertUnwindSafe(|| task.process())) {
        Ok(result) => Some(result),
        Err(payload) => {
            let msg = panic_message(payload.as_ref());
            warn!("Task panicked: {}", msg);
            Some(task.on_failure(GenerationFailure::Panicked(msg)))
        }
    }
}

impl TaskManager {
    /// Creates a new `TaskManager` with the specified number of worker threads.
    ///
    /// # Arguments
    /// * `num_workers` - Number of worker threads to create. 0 runs every task
    ///   inline on the thread that publishes it.
    ///
    /// A worker that fails to spawn is logged and left out of the pool.
    pub fn new(num_workers: usize) -> Self {
        let mut channels = Vec::with_capacity(num_workers);

        for index in 0..num_workers {
            let (task_tx, task_rx) = channel::<Box<dyn Task + Send>>();
            let (result_tx, result_rx) = channel::<WorkerReply>();

            let task_closure = move || {
                while let Ok(task) = task_rx.recv() {
                    let reply = run_task(task.as_ref());
                    if result_tx.send(reply).is_err() {
                        break;
                    }
                }
            };

            match thread::Builder::new()
                .name(format!("chunk-worker-{index}"))
                .spawn(task_closure)
            {
                Ok(worker) => channels.push(TaskChannel {
                    task_sender: task_tx,
                    result_receiver: result_rx,
                    num_tasks_in_flight: 0,
                    _worker: worker,
                }),
                Err(e) => error!("Failed to spawn worker {}: {}", index, e),
            }
        }

        info!(
            "Task manager started with {} worker(s) (available parallelism: {:?})",
            channels.len(),
            thread::available_parallelism()
        );

        TaskManager {
            channels,
            queued_tasks: VecDeque::new(),
            current_channel: 0,
            completed: VecDeque::new(),
        }
    }

    /// Number of worker threads. 0 means tasks run inline.
    pub fn num_workers(&self) -> usize {
        self.channels.len()
    }

    /// Attempts to send a task to a specific worker channel.
    ///
    /// # Returns
    /// - `Ok(())` if the task was successfully sent to the worker
    /// - `Err(task)` if the send failed (e.g., worker disconnected)
    fn try_send_task(
        &mut self,
        task: Box<dyn Task + Send>,
        channel_idx: usize,
    ) -> Result<(), Box<dyn Task + Send>> {
        task.on_started();
        match self.channels[channel_idx].task_sender.send(task) {
            Ok(_) => {
                self.channels[channel_idx].num_tasks_in_flight += 1;
                Ok(())
            }
            Err(task) => Err(task.0),
        }
    }

    /// Finds an available worker channel using round-robin from the last
    /// used channel. Channels at [`MAX_TASKS_IN_FLIGHT`] are skipped.
    fn find_available_channel(&self) -> Option<usize> {
        if self.channels.is_empty() {
            return None;
        }

        let start_channel = self.current_channel % self.channels.len();
        let mut current = start_channel;

        loop {
            if self.channels[current].num_tasks_in_flight < MAX_TASKS_IN_FLIGHT {
                return Some(current);
            }
            current = (current + 1) % self.channels.len();
            if current == start_channel {
                return None;
            }
        }
    }

    /// Publishes a new task for execution.
    ///
    /// With no workers the task runs immediately and its result is held
    /// until the next `process_completed_tasks()`.
    ///
    /// # Returns
    /// - `true` if the task was run or handed to a worker
    /// - `false` if the task was queued because all workers are busy
    pub fn publish_task(&mut self, task: Box<dyn Task + Send>) -> bool {
        if self.channels.is_empty() {
            task.on_started();
            if let Some(result) = run_task(task.as_ref()) {
                self.completed.push_back(result);
            }
            return true;
        }

        match self.find_available_channel() {
            Some(channel_idx) => match self.try_send_task(task, channel_idx) {
                Ok(_) => {
                    self.current_channel = (channel_idx + 1) % self.channels.len();
                    true
                }
                Err(task) => {
                    warn!("Worker {} disconnected, queueing task", channel_idx);
                    self.queued_tasks.push_back(task);
                    false
                }
            },
            None => {
                self.queued_tasks.push_back(task);
                false
            }
        }
    }

    /// Hands queued tasks to workers as they become available.
    ///
    /// Cancelled tasks are dropped from the queue without running.
    pub fn process_queued_tasks(&mut self) {
        self.queued_tasks.retain(|task| {
            let keep = !task.is_cancelled();
            if !keep {
                debug!("Dropping cancelled task from queue");
            }
            keep
        });

        while let Some(channel_idx) = self.find_available_channel() {
            let Some(task) = self.queued_tasks.pop_front() else {
                break;
            };
            match self.try_send_task(task, channel_idx) {
                Ok(_) => self.current_channel = (channel_idx + 1) % self.channels.len(),
                Err(task) => {
                    self.queued_tasks.push_front(task);
                    break;
                }
            }
        }
    }

    /// Collects all completed task results.
    ///
    /// The caller applies each result with
    /// [`TaskResult::handle_result`]. Skipped cancelled tasks free their
    /// worker slot but produce nothing.
    pub fn process_completed_tasks(&mut self) -> Vec<Box<dyn TaskResult + Send>> {
        let mut results: Vec<Box<dyn TaskResult + Send>> = self.completed.drain(..).collect();
        for channel in &mut self.channels {
            while let Ok(reply) = channel.result_receiver.try_recv() {
                channel.num_tasks_in_flight = channel.num_tasks_in_flight.saturating_sub(1);
                if let Some(result) = reply {
                    results.push(result);
                }
            }
        }
        results
    }

    /// Tasks currently running on workers.
    pub fn tasks_in_flight(&self) -> usize {
        self.channels.iter().map(|c| c.num_tasks_in_flight).sum()
    }

    /// Tasks waiting for a worker.
    pub fn queued_len(&self) -> usize {
        self.queued_tasks.len()
    }
}
