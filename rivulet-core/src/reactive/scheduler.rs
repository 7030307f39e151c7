//! Update Scheduler
//!
//! Consumers that do not run synchronously queue themselves here when
//! notified. The queue is flushed in ascending id order so that a consumer
//! created earlier (a parent computation) runs before the ones it created.
//!
//! # Algorithm
//!
//! 1. `queue_job` ignores a job whose id is already queued.
//! 2. Outside a flush, jobs are appended; the flush sorts them.
//! 3. During a flush, a job is inserted after the current position at the
//!    slot its id dictates, so it still runs in this flush and in order.
//! 4. A job that keeps re-queuing itself more than [`MAX_UPDATE_COUNT`]
//!    times in one flush is reported and the flush is abandoned.
//!
//! With `async_updates` disabled the queue flushes as soon as the first job
//! arrives. Otherwise the owner of the event loop calls [`flush`].

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use super::SubscriberId;
use crate::config;
use crate::error::{warn, Warning};

/// Re-queues of a single job tolerated within one flush.
pub const MAX_UPDATE_COUNT: usize = 100;

/// A unit of deferred work.
pub trait Job: Send + Sync {
    /// Ordering and deduplication key.
    fn id(&self) -> SubscriberId;

    /// Perform the work.
    fn run(self: Arc<Self>);
}

#[derive(Default)]
struct QueueState {
    queue: Vec<Arc<dyn Job>>,
    has: HashSet<SubscriberId>,
    circular: HashMap<SubscriberId, usize>,
    waiting: bool,
    flushing: bool,
    index: usize,
}

impl QueueState {
    fn reset(&mut self) {
        self.queue.clear();
        self.has.clear();
        self.circular.clear();
        self.waiting = false;
        self.flushing = false;
        self.index = 0;
    }
}

thread_local! {
    static STATE: RefCell<QueueState> = RefCell::new(QueueState::default());
}

/// Queue a job for the next flush.
pub fn queue_job(job: Arc<dyn Job>) {
    let flush_now = STATE.with(|state| {
        let mut state = state.borrow_mut();
        let id = job.id();
        if !state.has.insert(id) {
            return false;
        }

        if state.flushing {
            let mut pos = state.queue.len();
            while pos > state.index && state.queue[pos - 1].id() > id {
                pos -= 1;
            }
            state.queue.insert(pos, job);
        } else {
            state.queue.push(job);
        }

        if state.waiting {
            return false;
        }
        state.waiting = true;
        !config::async_updates()
    });

    if flush_now {
        flush();
    }
}

/// Run every queued job. Does nothing if a flush is already running.
pub fn flush() {
    let started = STATE.with(|state| {
        let mut state = state.borrow_mut();
        if state.flushing {
            return false;
        }
        state.flushing = true;
        state.queue.sort_by_key(|job| job.id());
        state.index = 0;
        true
    });
    if !started {
        return;
    }

    // Resets the queue even if a job panics.
    let _reset = FlushGuard;

    loop {
        let next = STATE.with(|state| {
            let mut state = state.borrow_mut();
            let job = state.queue.get(state.index).cloned()?;
            state.index += 1;
            state.has.remove(&job.id());
            Some(job)
        });
        let Some(job) = next else { break };

        let id = job.id();
        job.run();

        let looping = STATE.with(|state| {
            let mut state = state.borrow_mut();
            if !state.has.contains(&id) {
                return false;
            }
            let count = state.circular.entry(id).or_insert(0);
            *count += 1;
            *count > MAX_UPDATE_COUNT
        });
        if looping {
            warn(Warning::InfiniteUpdateLoop { id: id.raw() });
            break;
        }
    }
}

struct FlushGuard;

impl Drop for FlushGuard {
    fn drop(&mut self) {
        let ran = STATE.with(|state| {
            let mut state = state.borrow_mut();
            let ran = state.index;
            state.reset();
            ran
        });
        debug!(jobs = ran, "scheduler flushed");
    }
}

/// Number of jobs waiting to run.
pub fn pending() -> usize {
    STATE.with(|state| {
        let state = state.borrow();
        state.queue.len() - state.index.min(state.queue.len())
    })
}
