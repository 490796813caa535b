//! Explicit registry of named plot windows.
//!
//! One registry typically lives for the whole session and is passed to the
//! code that opens and duplicates windows. It is deliberately an ordinary
//! object — the crate installs no process-wide instance.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::window::PlotWindow;

/// Session-scoped lookup of plot windows by name.
#[derive(Clone, Default)]
pub struct WindowRegistry {
    inner: Arc<Mutex<HashMap<String, PlotWindow>>>,
}

impl WindowRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a window under its name.
    ///
    /// Returns `false` (and leaves the registry unchanged) when the name is
    /// already taken; use [`unique_name`](Self::unique_name) to derive a
    /// free one first.
    pub fn register(&self, window: &PlotWindow) -> bool {
        let mut windows = self.inner.lock().unwrap();
        if windows.contains_key(window.name()) {
            log::warn!("plot window name '{}' already registered", window.name());
            return false;
        }
        windows.insert(window.name().to_string(), window.clone());
        true
    }

    /// Remove and return the window registered under `name`.
    pub fn unregister(&self, name: &str) -> Option<PlotWindow> {
        self.inner.lock().unwrap().remove(name)
    }

    /// Look up a window by name.
    pub fn get(&self, name: &str) -> Option<PlotWindow> {
        self.inner.lock().unwrap().get(name).cloned()
    }

    /// Names of all registered windows, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.lock().unwrap().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered windows.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }

    /// Derive a name not currently registered: `base`, then `base 2`,
    /// `base 3`, …
    pub fn unique_name(&self, base: &str) -> String {
        let windows = self.inner.lock().unwrap();
        if !windows.contains_key(base) {
            return base.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{base} {n}");
            if !windows.contains_key(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}
