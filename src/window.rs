//! The plot window façade: update submission, dispatch and lifecycle.
//!
//! [`PlotWindow`] ties the pieces together. Producers on any thread call
//! [`submit`](PlotWindow::submit); the window decides whether the caller is
//! the UI-owner thread, marshals the work over if not, and runs the cycle:
//!
//! acquire update lock → mode transition (if any) → apply payload →
//! release lock → broadcast to observers.
//!
//! At most one cycle is ever inside that protected section. Updates from
//! concurrent producers are not ordered; only mutual exclusion is
//! guaranteed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::bean::DataBean;
use crate::dispatch::UiDispatcher;
use crate::error::UpdateError;
use crate::lock::UpdateLock;
use crate::modes::{ModeMachine, PlotMode};
use crate::observers::{ObserverHub, ObserverId, UpdateEvent, UpdateObserver};
use crate::surface::{PlotUiFactory, RenderSurface};

struct WindowInner {
    name: String,
    gate: UpdateLock,
    machine: Mutex<ModeMachine>,
    last_bean: Mutex<Option<Arc<DataBean>>>,
    observers: ObserverHub,
    dispatcher: Arc<dyn UiDispatcher>,
    disposed: AtomicBool,
}

impl WindowInner {
    // A panicked cycle must not wedge every later one; recover the machine.
    fn machine(&self) -> std::sync::MutexGuard<'_, ModeMachine> {
        self.machine.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A plot window: serialized updates over a mode state machine.
///
/// Cheap to clone; clones share the same window state.
#[derive(Clone)]
pub struct PlotWindow {
    inner: Arc<WindowInner>,
}

impl PlotWindow {
    /// Create a window in [`PlotMode::Empty`].
    ///
    /// `surface` and `factory` are the toolkit collaborators; `dispatcher`
    /// names the UI-owner context that all rendering work runs on.
    pub fn new(
        name: impl Into<String>,
        surface: Box<dyn RenderSurface>,
        factory: Box<dyn PlotUiFactory>,
        dispatcher: Arc<dyn UiDispatcher>,
    ) -> Self {
        Self {
            inner: Arc::new(WindowInner {
                name: name.into(),
                gate: UpdateLock::new(),
                machine: Mutex::new(ModeMachine::new(surface, factory)),
                last_bean: Mutex::new(None),
                observers: ObserverHub::new(),
                dispatcher,
                disposed: AtomicBool::new(false),
            }),
        }
    }

    /// Create a window and immediately transition to `initial`.
    ///
    /// Call on the UI-owner thread: the initial sub-component is built
    /// synchronously.
    pub fn with_initial_mode(
        name: impl Into<String>,
        surface: Box<dyn RenderSurface>,
        factory: Box<dyn PlotUiFactory>,
        dispatcher: Arc<dyn UiDispatcher>,
        initial: PlotMode,
    ) -> Result<Self, UpdateError> {
        let window = Self::new(name, surface, factory, dispatcher);
        window.inner.machine().request_mode(initial)?;
        Ok(window)
    }

    /// The window's name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The currently active display mode.
    pub fn mode(&self) -> PlotMode {
        self.inner.machine().current()
    }

    /// The most recently fully-applied bean, if any.
    pub fn last_bean(&self) -> Option<Arc<DataBean>> {
        self.inner.last_bean.lock().unwrap().clone()
    }

    /// Whether [`dispose`](Self::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }

    // ── Observers ────────────────────────────────────────────────────────

    /// Register an update observer.
    pub fn add_observer(&self, observer: Arc<dyn UpdateObserver>) -> ObserverId {
        self.inner.observers.add(observer)
    }

    /// Remove an update observer.
    pub fn remove_observer(&self, id: ObserverId) -> bool {
        self.inner.observers.remove(id)
    }

    /// Remove every observer.
    pub fn clear_observers(&self) {
        self.inner.observers.clear()
    }

    /// Subscribe to update events over a channel.
    pub fn subscribe(&self) -> std::sync::mpsc::Receiver<UpdateEvent> {
        self.inner.observers.subscribe()
    }

    /// Broadcast a bare update-finished notification for the current state.
    pub fn notify_update_finished(&self) {
        let event = UpdateEvent {
            window: self.inner.name.clone(),
            mode: self.mode(),
            operation: None,
            error: None,
        };
        self.inner.observers.broadcast(&event);
    }

    // ── Submission ───────────────────────────────────────────────────────

    /// Submit one update.
    ///
    /// `mode` overrides the bean's own mode hint; with `None` the hint is
    /// taken from the bean, then from its GUI-parameter mode selector.
    ///
    /// On the UI-owner thread the cycle runs synchronously and its result is
    /// returned. From any other thread the cycle is scheduled onto the
    /// UI-owner context and `Ok(())` means "accepted": completion (and any
    /// failure) is only visible through observers and
    /// [`last_bean`](Self::last_bean).
    pub fn submit(&self, bean: DataBean, mode: Option<PlotMode>) -> Result<(), UpdateError> {
        let inner = &self.inner;
        if inner.disposed.load(Ordering::Acquire) {
            return Err(UpdateError::DisposedTarget);
        }
        let bean = Arc::new(bean);
        if inner.dispatcher.is_owner_thread() {
            Self::run_update(inner, &bean, mode)
        } else {
            let task_inner = Arc::clone(inner);
            let task_bean = Arc::clone(&bean);
            inner.dispatcher.schedule(Box::new(move || {
                if let Err(e) = Self::run_update(&task_inner, &task_bean, mode) {
                    log::error!("plot update for '{}' failed: {e}", task_inner.name);
                }
            }))
        }
    }

    /// One full update cycle on the UI-owner thread.
    fn run_update(
        inner: &WindowInner,
        bean: &Arc<DataBean>,
        mode: Option<PlotMode>,
    ) -> Result<(), UpdateError> {
        if inner.disposed.load(Ordering::Acquire) {
            return Err(UpdateError::DisposedTarget);
        }
        let op = bean.gui.as_ref().map(|gui| gui.operation()).unwrap_or_default();
        let resolved = Self::resolve_mode(bean, mode);

        let guard = inner.gate.acquire();
        let result = (|| {
            // Disposal may have won the gate race since the check above.
            if inner.disposed.load(Ordering::Acquire) {
                return Err(UpdateError::DisposedTarget);
            }
            let target = resolved?;
            let mut machine = inner.machine();
            if let Some(target) = target {
                machine.request_mode(target)?;
            }
            machine.apply(bean, op)
        })();
        if result.is_ok() {
            *inner.last_bean.lock().unwrap() = Some(Arc::clone(bean));
        }
        let mode_now = inner.machine().current();
        drop(guard);

        let event = UpdateEvent {
            window: inner.name.clone(),
            mode: mode_now,
            operation: Some(op),
            error: result.as_ref().err().map(ToString::to_string),
        };
        inner.observers.broadcast(&event);
        result
    }

    /// Mode precedence: explicit argument, bean hint, GUI-parameter selector.
    fn resolve_mode(
        bean: &DataBean,
        explicit: Option<PlotMode>,
    ) -> Result<Option<PlotMode>, UpdateError> {
        if let Some(mode) = explicit.or(bean.mode) {
            return Ok(Some(mode));
        }
        match bean.gui.as_ref().and_then(|gui| gui.plot_mode()) {
            Some(parsed) => parsed.map(Some),
            None => Ok(None),
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────────

    /// Tear the window down: dispose the active sub-component and surface,
    /// drop all observers. Idempotent. Later submits fail with
    /// [`UpdateError::DisposedTarget`].
    ///
    /// Call on the UI-owner thread, like every other rendering mutation.
    pub fn dispose(&self) {
        let inner = &self.inner;
        if inner.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        // Wait out any in-flight cycle so teardown never overlaps a render.
        let _guard = inner.gate.acquire();
        inner.machine().dispose();
        inner.observers.clear();
        log::debug!("plot window '{}' disposed", inner.name);
    }
}
