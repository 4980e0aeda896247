//! Scripted module host for tests.
//!
//! Drives the [`ModuleHost`] trait by hand: tests append entries to the
//! module list and control exactly when load events fire.

use std::path::PathBuf;
use std::sync::Mutex;

use crate::host::{LoadObserver, ModuleEvent, ModuleHost};

/// A hand-driven module host.
///
/// Entries may be unnamed (`None`) to exercise the skip path for modules
/// without a resolvable path.
#[derive(Default)]
pub struct ScriptedHost {
    paths: Mutex<Vec<Option<PathBuf>>>,
    observers: Mutex<Vec<LoadObserver>>,
}

impl ScriptedHost {
    /// Creates an empty scripted host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a named module and fires a load event.
    pub fn append(&self, path: &str) {
        self.push(Some(PathBuf::from(path)));
        self.notify(path);
    }

    /// Appends a module with no resolvable path and fires a load event.
    pub fn append_unnamed(&self) {
        self.push(None);
        self.notify("");
    }

    /// Appends a named module without firing a load event.
    pub fn append_quiet(&self, path: &str) {
        self.push(Some(PathBuf::from(path)));
    }

    /// Fires a load event without touching the module list.
    pub fn notify(&self, path: &str) {
        let snapshot: Vec<LoadObserver> = {
            let observers = self.observers.lock().unwrap_or_else(|e| e.into_inner());
            observers.iter().cloned().collect()
        };
        let event = ModuleEvent {
            path: PathBuf::from(path),
        };
        for observer in &snapshot {
            observer(&event);
        }
    }

    /// Number of attached observers.
    pub fn observer_count(&self) -> usize {
        self.observers.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn push(&self, entry: Option<PathBuf>) {
        self.paths
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(entry);
    }
}

impl ModuleHost for ScriptedHost {
    fn module_count(&self) -> usize {
        self.paths.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn module_path(&self, index: usize) -> Option<PathBuf> {
        let paths = self.paths.lock().unwrap_or_else(|e| e.into_inner());
        paths.get(index).cloned().flatten()
    }

    fn observe_loads(&self, observer: LoadObserver) {
        self.observers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(observer);
    }
}

impl std::fmt::Debug for ScriptedHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedHost")
            .field("module_count", &self.module_count())
            .finish()
    }
}
