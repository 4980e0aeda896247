//! One-shot load-completion watcher.
//!
//! A [`LoadWatcher`] reacts to module-load events: it scans the host's
//! module list for an entry matching a target predicate, then re-checks a
//! readiness predicate until both hold, then runs its completion callback
//! exactly once and unregisters itself. A use case is installing a
//! dispatch-table interception for a type defined by a lazily loaded
//! module.

use std::path::Path;
use std::sync::{Arc, Mutex, Weak};

use tracing::debug;
use uuid::Uuid;

use crate::events::{LoaderEvents, WatchToken};
use crate::host::ModuleHost;

/// Scan cursor and firing state.
///
/// `position` only ever increases, so an already-inspected module list
/// entry is never re-tested. `fired` is terminal.
#[derive(Debug, Default)]
struct Scan {
    saw_target: bool,
    fired: bool,
    position: usize,
}

/// Shared state between the watcher handle and its registered handler.
struct WatchState {
    target: Box<dyn Fn(&Path) -> bool + Send + Sync>,
    ready: Box<dyn Fn() -> bool + Send + Sync>,
    complete: Mutex<Option<Box<dyn FnOnce() + Send>>>,
    scan: Mutex<Scan>,
}

/// Watches for a target module to finish loading and a readiness condition
/// to hold, then fires a completion callback exactly once.
///
/// The watcher waits indefinitely; dropping it before it fires removes its
/// registration so the callback can never run on a dead owner.
pub struct LoadWatcher {
    token: WatchToken,
    events: Arc<LoaderEvents>,
    state: Arc<WatchState>,
}

impl LoadWatcher {
    /// Registers a new watcher with the given registry.
    ///
    /// `target` decides whether an absolute module path is the one being
    /// waited for. `ready` is evaluated lazily, only after the target has
    /// been seen, and may become true at any later notification.
    /// `complete` runs at most once, on whatever thread delivered the
    /// deciding notification.
    pub fn new(
        events: &Arc<LoaderEvents>,
        target: impl Fn(&Path) -> bool + Send + Sync + 'static,
        ready: impl Fn() -> bool + Send + Sync + 'static,
        complete: impl FnOnce() + Send + 'static,
    ) -> Self {
        let token = Uuid::new_v4();
        let state = Arc::new(WatchState {
            target: Box::new(target),
            ready: Box::new(ready),
            complete: Mutex::new(Some(Box::new(complete))),
            scan: Mutex::new(Scan::default()),
        });

        let handler_state = state.clone();
        let handler_events: Weak<LoaderEvents> = Arc::downgrade(events);
        let host = events.host().clone();
        events.register(
            token,
            Arc::new(move |_event| {
                Self::on_load(&handler_state, &handler_events, token, &host);
            }),
        );

        Self {
            token,
            events: events.clone(),
            state,
        }
    }

    /// Handles one load notification. The event payload is ignored; the
    /// host's module list is the source of truth.
    fn on_load(
        state: &Arc<WatchState>,
        events: &Weak<LoaderEvents>,
        token: WatchToken,
        host: &Arc<dyn ModuleHost>,
    ) {
        let mut scan = state.scan.lock().unwrap_or_else(|e| e.into_inner());
        if scan.fired {
            return;
        }

        let count = host.module_count();
        while !scan.saw_target && scan.position < count {
            let index = scan.position;
            scan.position += 1;
            // Entries without a resolvable path are skipped, not errors.
            let Some(path) = host.module_path(index) else {
                continue;
            };
            if (state.target)(&path) {
                scan.saw_target = true;
                debug!(token = %token, path = %path.display(), "Target module seen");
            }
        }

        if scan.saw_target && !scan.fired && (state.ready)() {
            // Marking fired under the lock makes the transition terminal
            // even under concurrent notification delivery.
            scan.fired = true;
            drop(scan);

            if let Some(events) = events.upgrade() {
                events.unregister(&token);
            }
            let complete = state
                .complete
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .take();
            if let Some(complete) = complete {
                debug!(token = %token, "Watcher fired");
                complete();
            }
        }
    }

    /// Whether the target module has been seen at least once.
    pub fn saw_target(&self) -> bool {
        self.state
            .scan
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .saw_target
    }

    /// Whether the completion callback has run. Terminal.
    pub fn fired(&self) -> bool {
        self.state
            .scan
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .fired
    }

    /// This watcher's registration token.
    pub fn token(&self) -> WatchToken {
        self.token
    }
}

impl Drop for LoadWatcher {
    fn drop(&mut self) {
        // Idempotent; the registration is already gone if the watcher fired.
        self.events.unregister(&self.token);
    }
}

impl std::fmt::Debug for LoadWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadWatcher")
            .field("token", &self.token)
            .field("saw_target", &self.saw_target())
            .field("fired", &self.fired())
            .finish()
    }
}
