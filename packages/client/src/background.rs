//! Fire-and-forget execution of record actions.
//!
//! Every submitted action runs exactly once, off the caller's thread, and
//! invokes at most one callback. There is no queue limit and no
//! cancellation. By default each task gets its own thread; a fixed pool of
//! workers fed through a channel can be configured instead.
//!
//! ```ignore
//! let score = docsync::shared(Record::new("GameScore"));
//! let handle = client.save_in_background(score.clone(), Some(Box::new(|record, result| {
//!     println!("saved: {:?}", result.is_ok());
//! })));
//! handle.join();
//! ```

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;

use crate::error::Result;

/// A value handed to background tasks.
///
/// Concurrent tasks on the same target take turns on the lock, but nothing
/// orders them: two saves submitted back to back may complete in either order.
pub type Shared<T> = Arc<Mutex<T>>;

/// Completion callback: the target and the action's outcome.
pub type Callback<T> = Box<dyn FnOnce(Shared<T>, Result<()>) + Send + 'static>;

type Job = Box<dyn FnOnce() + Send + 'static>;

pub fn shared<T>(value: T) -> Shared<T> {
    Arc::new(Mutex::new(value))
}

pub(crate) fn lock<T>(shared: &Shared<T>) -> MutexGuard<'_, T> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Lifecycle of one background task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    /// Submitted, not yet picked up.
    Idle,
    Running,
    Completed,
    /// The action failed; carries the error message.
    Failed(String),
}

impl TaskState {
    pub fn is_finished(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed(_))
    }
}

struct TaskSlot {
    state: Mutex<TaskState>,
    finished: Condvar,
}

impl TaskSlot {
    fn set(&self, state: TaskState) {
        let finished = state.is_finished();
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
        if finished {
            self.finished.notify_all();
        }
    }
}

/// Handle on a submitted task.
#[derive(Clone)]
pub struct TaskHandle {
    slot: Arc<TaskSlot>,
}

impl TaskHandle {
    fn new() -> Self {
        Self {
            slot: Arc::new(TaskSlot {
                state: Mutex::new(TaskState::Idle),
                finished: Condvar::new(),
            }),
        }
    }

    pub fn state(&self) -> TaskState {
        self.slot
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_finished(&self) -> bool {
        self.state().is_finished()
    }

    /// Block until the task has finished and its callback has returned.
    pub fn join(&self) -> TaskState {
        let mut state = self.slot.state.lock().unwrap_or_else(PoisonError::into_inner);
        while !state.is_finished() {
            state = self
                .slot
                .finished
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        state.clone()
    }
}

enum Dispatch {
    ThreadPerTask,
    Pool { sender: Mutex<Sender<Job>> },
}

/// Runs record actions in the background.
pub struct TaskRunner {
    dispatch: Dispatch,
}

impl TaskRunner {
    /// One new thread per task, exiting when the task is done.
    pub fn thread_per_task() -> Self {
        Self {
            dispatch: Dispatch::ThreadPerTask,
        }
    }

    /// A fixed pool of `workers` threads. Workers exit once the runner is
    /// dropped and the queue drains.
    ///
    /// Falls back to thread-per-task if no worker thread could be started.
    pub fn with_workers(workers: usize) -> Self {
        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));
        let mut started = 0;
        for index in 0..workers.max(1) {
            let receiver = Arc::clone(&receiver);
            let spawned = thread::Builder::new()
                .name(format!("docsync-worker-{index}"))
                .spawn(move || Self::worker_loop(receiver));
            match spawned {
                Ok(_) => started += 1,
                Err(e) => log::warn!("failed to spawn background worker {}: {}", index, e),
            }
        }
        if started == 0 {
            return Self::thread_per_task();
        }
        Self {
            dispatch: Dispatch::Pool {
                sender: Mutex::new(sender),
            },
        }
    }

    fn worker_loop(receiver: Arc<Mutex<Receiver<Job>>>) {
        loop {
            let next = receiver.lock().unwrap_or_else(PoisonError::into_inner).recv();
            match next {
                Ok(job) => job(),
                Err(_) => break,
            }
        }
    }

    /// Run `action` against `target` and report to `callback`.
    ///
    /// The target is locked only while the action runs; the callback gets it
    /// back unlocked. Without a callback a failure is logged and dropped.
    pub fn run<T, A>(
        &self,
        target: Shared<T>,
        action: A,
        callback: Option<Callback<T>>,
    ) -> TaskHandle
    where
        T: Send + 'static,
        A: FnOnce(&mut T) -> Result<()> + Send + 'static,
    {
        let handle = TaskHandle::new();
        let slot = Arc::clone(&handle.slot);

        let job: Job = Box::new(move || {
            slot.set(TaskState::Running);
            log::debug!("background task running");

            let outcome = catch_unwind(AssertUnwindSafe(move || {
                let result = {
                    let mut guard = lock(&target);
                    action(&mut guard)
                };
                let state = match &result {
                    Ok(()) => TaskState::Completed,
                    Err(e) => TaskState::Failed(e.to_string()),
                };
                match callback {
                    Some(callback) => callback(target, result),
                    None => {
                        if let Err(e) = result {
                            log::warn!("background task failed without a callback: {}", e);
                        }
                    }
                }
                state
            }));

            let state = outcome.unwrap_or_else(|_| TaskState::Failed("task panicked".to_string()));
            log::debug!("background task finished: {:?}", state);
            slot.set(state);
        });

        self.dispatch(job, &handle);
        handle
    }

    /// Run a job with no target and no callback.
    pub fn submit<F>(&self, job: F) -> TaskHandle
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.run(shared(()), move |_: &mut ()| job(), None)
    }

    fn dispatch(&self, job: Job, handle: &TaskHandle) {
        match &self.dispatch {
            Dispatch::ThreadPerTask => {
                let spawned = thread::Builder::new()
                    .name("docsync-task".to_string())
                    .spawn(job);
                if let Err(e) = spawned {
                    report_spawn_failure(handle, &e);
                }
            }
            Dispatch::Pool { sender } => {
                let sent = sender
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .send(job);
                if sent.is_err() {
                    handle
                        .slot
                        .set(TaskState::Failed("background workers have stopped".to_string()));
                }
            }
        }
    }
}

/// The job never ran, so its callback is dropped unrun.
fn report_spawn_failure(handle: &TaskHandle, error: &std::io::Error) {
    log::warn!("failed to spawn background task: {}", error);
    handle
        .slot
        .set(TaskState::Failed(format!("failed to spawn background task: {error}")));
}

impl Default for TaskRunner {
    fn default() -> Self {
        Self::thread_per_task()
    }
}
