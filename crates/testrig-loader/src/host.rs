//! The module-host abstraction.
//!
//! The harness never talks to the system loader directly. Everything that
//! enumerates loaded modules or reacts to new loads goes through
//! [`ModuleHost`], so tests can drive the same code paths with synthetic
//! module lists.

use std::path::PathBuf;
use std::sync::Arc;

/// Data delivered with each module-load event.
///
/// The fan-out layer treats this as opaque; watchers rescan the host's
/// module list instead of relying on it.
#[derive(Debug, Clone)]
pub struct ModuleEvent {
    /// Absolute path of the module that finished loading.
    pub path: PathBuf,
}

/// Callback invoked whenever a module finishes loading.
///
/// May run on whatever thread triggered the load.
pub type LoadObserver = Arc<dyn Fn(&ModuleEvent) + Send + Sync>;

/// A source of loaded modules and load events.
///
/// The module list only ever grows; indices are stable once assigned.
pub trait ModuleHost: Send + Sync {
    /// Number of modules currently loaded.
    fn module_count(&self) -> usize;

    /// Absolute path of the module at `index`.
    ///
    /// Returns `None` for indices past the end or entries without a
    /// resolvable path; callers skip those.
    fn module_path(&self, index: usize) -> Option<PathBuf>;

    /// Attach a load observer.
    ///
    /// Observers are retained for the lifetime of the host and cannot be
    /// detached.
    fn observe_loads(&self, observer: LoadObserver);
}
