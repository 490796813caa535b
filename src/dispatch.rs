//! Marshaling work onto the UI-owner thread.
//!
//! Rendering mutations are single-owner-threaded: exactly one thread may
//! touch the surface and the mode sub-components. [`UiDispatcher`] is the
//! seam through which the pipeline asks "am I on that thread?" and, if not,
//! hands the update cycle over as a queued task.
//!
//! Toolkit embedders implement [`UiDispatcher`] over their event loop.
//! [`UiThread`] is a ready-made owner context for everything else: a
//! dedicated thread draining scheduled tasks from a channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle, ThreadId};

use crate::error::UpdateError;

/// A unit of work scheduled onto the UI-owner context.
pub type UiTask = Box<dyn FnOnce() + Send + 'static>;

/// Owner-thread predicate plus non-blocking scheduling.
pub trait UiDispatcher: Send + Sync {
    /// `true` when the calling thread is the UI-owner thread.
    fn is_owner_thread(&self) -> bool;

    /// Queue `task` to run on the UI-owner thread and return immediately.
    ///
    /// Fails with [`UpdateError::DisposedTarget`] when the owner context has
    /// been torn down; the task is dropped in that case.
    fn schedule(&self, task: UiTask) -> Result<(), UpdateError>;
}

enum LoopMsg {
    Task(UiTask),
    Shutdown,
}

struct UiThreadDispatcher {
    tx: Mutex<Sender<LoopMsg>>,
    owner: ThreadId,
    disposed: AtomicBool,
}

impl UiDispatcher for UiThreadDispatcher {
    fn is_owner_thread(&self) -> bool {
        thread::current().id() == self.owner
    }

    fn schedule(&self, task: UiTask) -> Result<(), UpdateError> {
        if self.disposed.load(Ordering::Acquire) {
            return Err(UpdateError::DisposedTarget);
        }
        self.tx
            .lock()
            .unwrap()
            .send(LoopMsg::Task(task))
            .map_err(|_| UpdateError::DisposedTarget)
    }
}

/// A minimal UI-owner event loop: one dedicated thread draining tasks.
///
/// Tasks scheduled before [`shutdown`](UiThread::shutdown) still run;
/// scheduling afterwards fails with [`UpdateError::DisposedTarget`].
/// Dropping the handle shuts the loop down as well.
pub struct UiThread {
    dispatcher: Arc<UiThreadDispatcher>,
    handle: Option<JoinHandle<()>>,
}

impl UiThread {
    /// Spawn the owner thread and start draining tasks.
    pub fn spawn() -> Self {
        let (tx, rx) = channel::<LoopMsg>();
        let handle = thread::Builder::new()
            .name("plot-ui".into())
            .spawn(move || {
                while let Ok(msg) = rx.recv() {
                    match msg {
                        LoopMsg::Task(task) => task(),
                        LoopMsg::Shutdown => break,
                    }
                }
            })
            .expect("failed to spawn UI-owner thread");
        let dispatcher = Arc::new(UiThreadDispatcher {
            tx: Mutex::new(tx),
            owner: handle.thread().id(),
            disposed: AtomicBool::new(false),
        });
        Self {
            dispatcher,
            handle: Some(handle),
        }
    }

    /// A shareable dispatcher handle onto this loop.
    pub fn dispatcher(&self) -> Arc<dyn UiDispatcher> {
        self.dispatcher.clone()
    }

    /// Stop accepting tasks, drain what was already queued, and join.
    pub fn shutdown(mut self) {
        self.shutdown_inner();
    }

    fn shutdown_inner(&mut self) {
        self.dispatcher.disposed.store(true, Ordering::Release);
        let _ = self.dispatcher.tx.lock().unwrap().send(LoopMsg::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("UI-owner thread panicked");
            }
        }
    }
}

impl Drop for UiThread {
    fn drop(&mut self) {
        self.shutdown_inner();
    }
}
