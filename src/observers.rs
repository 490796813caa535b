//! Update-finished notification fan-out.
//!
//! External listeners register with an [`ObserverHub`] and are told when an
//! update cycle completes (successfully or not). Broadcast iterates a
//! defensive snapshot of the observer set, so observers may add or remove
//! registrations — including their own — from inside a callback without
//! deadlocking or corrupting delivery.
//!
//! Alongside trait observers the hub offers channel subscriptions in the
//! same style as the rest of the crate's listeners; dead receivers are
//! pruned on the next broadcast.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::bean::PlotOperation;
use crate::modes::PlotMode;

/// Handle identifying one registered observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Completion notification for one update cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateEvent {
    /// Name of the window that finished the cycle.
    pub window: String,
    /// Display mode after the cycle.
    pub mode: PlotMode,
    /// Operation the cycle carried, `None` for bare finished notifications.
    pub operation: Option<PlotOperation>,
    /// Error text when the cycle failed; `None` on success.
    pub error: Option<String>,
}

impl UpdateEvent {
    /// Whether the cycle completed without error.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Receives completion notifications.
pub trait UpdateObserver: Send + Sync {
    /// Called on the UI-owner thread after each update cycle.
    fn update_finished(&self, event: &UpdateEvent);
}

impl<F> UpdateObserver for F
where
    F: Fn(&UpdateEvent) + Send + Sync,
{
    fn update_finished(&self, event: &UpdateEvent) {
        self(event)
    }
}

struct HubInner {
    next_id: u64,
    observers: Vec<(ObserverId, Arc<dyn UpdateObserver>)>,
    listeners: Vec<Sender<UpdateEvent>>,
}

/// Thread-safe observer set with snapshot broadcast.
#[derive(Clone)]
pub struct ObserverHub {
    inner: Arc<Mutex<HubInner>>,
}

impl ObserverHub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HubInner {
                next_id: 1,
                observers: Vec::new(),
                listeners: Vec::new(),
            })),
        }
    }

    /// Register an observer; the returned id removes it again.
    pub fn add(&self, observer: Arc<dyn UpdateObserver>) -> ObserverId {
        let mut inner = self.inner.lock().unwrap();
        let id = ObserverId(inner.next_id);
        inner.next_id += 1;
        inner.observers.push((id, observer));
        id
    }

    /// Remove one observer. Returns `false` if the id was not registered.
    pub fn remove(&self, id: ObserverId) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.observers.len();
        inner.observers.retain(|(oid, _)| *oid != id);
        inner.observers.len() != before
    }

    /// Remove every observer and channel listener.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.observers.clear();
        inner.listeners.clear();
    }

    /// Number of registered trait observers.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().observers.len()
    }

    /// Whether no trait observers are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscribe to events over a channel.
    pub fn subscribe(&self) -> Receiver<UpdateEvent> {
        let (tx, rx) = channel();
        self.inner.lock().unwrap().listeners.push(tx);
        rx
    }

    /// Deliver `event` to every observer registered at this instant.
    ///
    /// Channel listeners whose receiver was dropped are pruned; trait
    /// observers are invoked outside the hub lock from a snapshot, so
    /// concurrent mutation neither blocks delivery nor skips or duplicates
    /// anyone registered at broadcast time.
    pub fn broadcast(&self, event: &UpdateEvent) {
        let snapshot: Vec<Arc<dyn UpdateObserver>> = {
            let mut inner = self.inner.lock().unwrap();
            inner.listeners.retain(|tx| tx.send(event.clone()).is_ok());
            inner.observers.iter().map(|(_, o)| o.clone()).collect()
        };
        for observer in snapshot {
            observer.update_finished(event);
        }
    }
}

impl Default for ObserverHub {
    fn default() -> Self {
        Self::new()
    }
}
