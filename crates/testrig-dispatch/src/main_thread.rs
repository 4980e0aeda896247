//! Main-thread identity override.
//!
//! Callers of the observation center's observer operations assume they run
//! on the main thread. The override reports "main thread" to code executing
//! on the serial context and reroutes both observer operations through that
//! same context, so callers keep the serialization they relied on while the
//! actual caller may be on any thread.
//!
//! The identity-check interception is installed immediately on `setup()`;
//! the observer interceptions wait for the runner core module to finish
//! loading and its observation-center type to be registered.

use std::path::Path;
use std::sync::{Arc, Mutex, Once};

use tracing::{info, warn};

use testrig_core::config::main_thread::MainThreadConfig;
use testrig_loader::{LoadWatcher, LoaderEvents};

use crate::serial::SerialContext;
use crate::table::{DispatchTable, InterceptRecord, OpCall, OpReturn};

/// Where the override currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideState {
    /// `setup()` has not run.
    NotSetup,
    /// Waiting for the runner core module and its center type.
    WaitingForModule,
    /// All reachable interceptions are installed.
    Installed,
}

/// Reroutes main-thread-affine calls onto the serial context.
pub struct MainThreadOverride {
    table: Arc<DispatchTable>,
    events: Arc<LoaderEvents>,
    context: Arc<SerialContext>,
    config: MainThreadConfig,
    setup: Once,
    /// Installed interception records, retained for process lifetime.
    records: Arc<Mutex<Vec<InterceptRecord>>>,
    watcher: Mutex<Option<LoadWatcher>>,
}

impl MainThreadOverride {
    /// Creates an override over the given table, registry, and context.
    pub fn new(
        table: Arc<DispatchTable>,
        events: Arc<LoaderEvents>,
        context: Arc<SerialContext>,
        config: MainThreadConfig,
    ) -> Self {
        Self {
            table,
            events,
            context,
            config,
            setup: Once::new(),
            records: Arc::new(Mutex::new(Vec::new())),
            watcher: Mutex::new(None),
        }
    }

    /// Performs first-time setup; repeated calls are free.
    ///
    /// Installs the identity-check interception immediately and registers a
    /// watcher that installs the observer interceptions once the runner
    /// core is ready.
    pub fn setup(&self) {
        self.setup.call_once(|| {
            self.install_identity();
            self.watch_runner_core();
        });
    }

    /// Current lifecycle state.
    pub fn state(&self) -> OverrideState {
        if !self.setup.is_completed() {
            return OverrideState::NotSetup;
        }
        let fired = self
            .watcher
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|watcher| watcher.fired())
            .unwrap_or(false);
        if fired {
            OverrideState::Installed
        } else {
            OverrideState::WaitingForModule
        }
    }

    /// Number of interceptions installed so far.
    pub fn intercept_count(&self) -> usize {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Wraps the identity-check operation: code on the serial context is
    /// told it is on the main thread; everyone else gets the original
    /// answer.
    fn install_identity(&self) {
        let context = self.context.clone();
        let record = self.table.install(
            &self.config.thread_type,
            &self.config.identity_op,
            move |original| {
                Arc::new(move |call: &OpCall| {
                    if context.is_current() {
                        OpReturn::Bool(true)
                    } else {
                        original.as_ref()(call)
                    }
                })
            },
        );
        match record {
            Some(record) => {
                info!(
                    type_name = %self.config.thread_type,
                    op = %self.config.identity_op,
                    "Thread identity check rerouted"
                );
                self.records
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .push(record);
            }
            None => warn!(
                type_name = %self.config.thread_type,
                op = %self.config.identity_op,
                "Identity operation not found, skipping"
            ),
        }
    }

    /// Registers the watcher that installs the observer interceptions once
    /// the runner core module is loaded and its center type exists.
    fn watch_runner_core(&self) {
        let prefix = self.config.watch_prefix.clone();
        let suffix = self.config.watch_suffix.clone();
        let ready_table = self.table.clone();
        let ready_center = self.config.center_type.clone();

        let complete = {
            let table = self.table.clone();
            let context = self.context.clone();
            let records = self.records.clone();
            let config = self.config.clone();
            move || {
                let mut records = records.lock().unwrap_or_else(|e| e.into_inner());
                for op_name in [&config.add_op, &config.remove_op] {
                    match install_reroute(&table, &context, &config.center_type, op_name) {
                        Some(record) => {
                            info!(
                                type_name = %config.center_type,
                                op = %op_name,
                                "Observer operation rerouted"
                            );
                            records.push(record);
                        }
                        None => warn!(
                            type_name = %config.center_type,
                            op = %op_name,
                            "Operation not found, skipping"
                        ),
                    }
                }
            }
        };

        let watcher = LoadWatcher::new(
            &self.events,
            move |path| path_starts_with(path, &prefix) && path_ends_with(path, &suffix),
            move || ready_table.contains_type(&ready_center),
            complete,
        );
        *self.watcher.lock().unwrap_or_else(|e| e.into_inner()) = Some(watcher);
    }
}

impl std::fmt::Debug for MainThreadOverride {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainThreadOverride")
            .field("state", &self.state())
            .field("intercept_count", &self.intercept_count())
            .finish()
    }
}

/// Installs a replacement that forwards the unchanged call to the original
/// implementation inside the serial context, blocking the caller until the
/// forwarded call completes.
fn install_reroute(
    table: &DispatchTable,
    context: &Arc<SerialContext>,
    type_name: &str,
    op_name: &str,
) -> Option<InterceptRecord> {
    let context = context.clone();
    table.install(type_name, op_name, move |original| {
        Arc::new(move |call: &OpCall| {
            let original = original.clone();
            let call = call.clone();
            context.run_sync(move || original.as_ref()(&call))
        })
    })
}

/// Byte-wise prefix test on an absolute module path.
fn path_starts_with(path: &Path, prefix: &str) -> bool {
    path.as_os_str()
        .as_encoded_bytes()
        .starts_with(prefix.as_bytes())
}

/// Byte-wise suffix test on an absolute module path.
fn path_ends_with(path: &Path, suffix: &str) -> bool {
    path.as_os_str()
        .as_encoded_bytes()
        .ends_with(suffix.as_bytes())
}
