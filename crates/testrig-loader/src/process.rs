//! Production module host backed by `libloading`.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, RwLock};

use tracing::info;

use testrig_core::{AppError, AppResult};

use crate::host::{LoadObserver, ModuleEvent, ModuleHost};

/// Signature of the `extern "C"` entry point exported by runner modules.
pub type EntryFn = unsafe extern "C" fn();

/// A module opened into the process.
///
/// The library handle is retained so the module stays mapped for the
/// lifetime of the host.
struct LoadedModule {
    path: PathBuf,
    library: libloading::Library,
}

/// Module host for the running process.
///
/// Opens shared libraries through `libloading`, appends them to the
/// process's module list, and notifies observers after each load. Observers
/// run on the thread that triggered the load.
pub struct ProcessHost {
    /// Loaded modules, in load order. Only ever grows.
    modules: RwLock<Vec<LoadedModule>>,
    /// Load observers. Retained for the lifetime of the host.
    observers: RwLock<Vec<LoadObserver>>,
}

static GLOBAL: OnceLock<Arc<ProcessHost>> = OnceLock::new();

impl ProcessHost {
    /// Creates a new host with an empty module list.
    pub fn new() -> Self {
        Self {
            modules: RwLock::new(Vec::new()),
            observers: RwLock::new(Vec::new()),
        }
    }

    /// The process-wide host, created lazily on first access.
    pub fn global() -> &'static Arc<ProcessHost> {
        GLOBAL.get_or_init(|| Arc::new(Self::new()))
    }

    /// Opens a shared library and records it in the module list.
    ///
    /// # Safety
    /// Loading a library runs its initialization code. Only open trusted
    /// modules.
    pub unsafe fn open(&self, path: &Path) -> AppResult<()> {
        let library = unsafe { libloading::Library::new(path) }.map_err(|e| {
            AppError::loader(format!(
                "Failed to load module '{}': {}",
                path.display(),
                e
            ))
        })?;

        {
            let mut modules = self.modules.write().unwrap_or_else(|e| e.into_inner());
            modules.push(LoadedModule {
                path: path.to_path_buf(),
                library,
            });
        }

        info!(path = %path.display(), "Module loaded");

        // Snapshot first: an observer may trigger a nested open.
        let snapshot: Vec<LoadObserver> = {
            let observers = self.observers.read().unwrap_or_else(|e| e.into_inner());
            observers.iter().cloned().collect()
        };
        let event = ModuleEvent {
            path: path.to_path_buf(),
        };
        for observer in &snapshot {
            observer(&event);
        }

        Ok(())
    }

    /// Looks up the entry-point symbol in a previously opened module.
    ///
    /// The returned pointer stays valid because opened libraries are never
    /// dropped.
    ///
    /// # Safety
    /// The symbol must actually have the [`EntryFn`] signature.
    pub unsafe fn entry_point(&self, module_path: &Path, symbol: &str) -> AppResult<EntryFn> {
        let modules = self.modules.read().unwrap_or_else(|e| e.into_inner());
        let module = modules
            .iter()
            .find(|m| m.path == module_path)
            .ok_or_else(|| {
                AppError::not_found(format!("Module '{}' is not loaded", module_path.display()))
            })?;

        let sym: libloading::Symbol<'_, EntryFn> = unsafe {
            module.library.get(symbol.as_bytes()).map_err(|e| {
                AppError::symbol(format!(
                    "Symbol '{}' missing from '{}': {}",
                    symbol,
                    module.path.display(),
                    e
                ))
            })?
        };

        Ok(*sym)
    }
}

impl ModuleHost for ProcessHost {
    fn module_count(&self) -> usize {
        self.modules.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn module_path(&self, index: usize) -> Option<PathBuf> {
        let modules = self.modules.read().unwrap_or_else(|e| e.into_inner());
        modules.get(index).map(|m| m.path.clone())
    }

    fn observe_loads(&self, observer: LoadObserver) {
        let mut observers = self.observers.write().unwrap_or_else(|e| e.into_inner());
        observers.push(observer);
    }
}

impl Default for ProcessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProcessHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessHost")
            .field("loaded_count", &self.module_count())
            .finish()
    }
}
