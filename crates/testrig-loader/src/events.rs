//! Process-wide load-event fan-out.
//!
//! [`LoaderEvents`] attaches exactly one observer to the underlying
//! [`ModuleHost`], lazily on first registration, and fans every load event
//! out to the currently registered handlers. Handlers are keyed by a
//! [`WatchToken`]; owners unregister their token before dropping so no
//! handler is ever invoked for a dead owner.

use std::sync::{Arc, Once, OnceLock, Weak};

use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use crate::host::{ModuleEvent, ModuleHost};
use crate::process::ProcessHost;

/// Identity token for a registered handler, unique per watcher instance.
pub type WatchToken = Uuid;

/// Handler invoked on each module-load event.
///
/// Handlers must tolerate repeated invocation and may unregister their own
/// token while a fan-out is in flight.
pub type LoadHandler = Arc<dyn Fn(&ModuleEvent) + Send + Sync>;

/// Registry fanning module-load events out to registered handlers.
///
/// Exactly one observer is ever attached to the host, regardless of how
/// many handlers come and go; the attachment permanently extends the host's
/// observer set.
pub struct LoaderEvents {
    host: Arc<dyn ModuleHost>,
    handlers: DashMap<WatchToken, LoadHandler>,
    subscribe: Once,
    /// Handed to the host observer so the observer never keeps the
    /// registry alive on its own.
    self_weak: Weak<LoaderEvents>,
}

static GLOBAL: OnceLock<Arc<LoaderEvents>> = OnceLock::new();

impl LoaderEvents {
    /// Creates a registry over the given host.
    pub fn new(host: Arc<dyn ModuleHost>) -> Arc<Self> {
        Arc::new_cyclic(|self_weak| Self {
            host,
            handlers: DashMap::new(),
            subscribe: Once::new(),
            self_weak: self_weak.clone(),
        })
    }

    /// The process-wide registry over [`ProcessHost::global`], created
    /// lazily on first access.
    pub fn global() -> &'static Arc<LoaderEvents> {
        GLOBAL.get_or_init(|| LoaderEvents::new(ProcessHost::global().clone()))
    }

    /// The host this registry observes.
    pub fn host(&self) -> &Arc<dyn ModuleHost> {
        &self.host
    }

    /// Registers a handler under `token`.
    ///
    /// The first registration attaches the single host observer; repeated
    /// calls are free.
    pub fn register(&self, token: WatchToken, handler: LoadHandler) {
        self.handlers.insert(token, handler);

        self.subscribe.call_once(|| {
            let weak = self.self_weak.clone();
            self.host.observe_loads(Arc::new(move |event| {
                if let Some(events) = weak.upgrade() {
                    events.fan_out(event);
                }
            }));
        });
        debug!(token = %token, "Load handler registered");
    }

    /// Removes the handler registered under `token`. Idempotent.
    pub fn unregister(&self, token: &WatchToken) {
        self.handlers.remove(token);
    }

    /// Whether a handler is currently registered under `token`.
    pub fn contains(&self, token: &WatchToken) -> bool {
        self.handlers.contains_key(token)
    }

    /// Number of currently registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Invokes every registered handler with `event`.
    ///
    /// Iterates a snapshot of the handler map so a handler unregistering
    /// itself mid-fan-out cannot destabilize the others. Handlers removed
    /// after the snapshot was taken are skipped.
    fn fan_out(&self, event: &ModuleEvent) {
        let snapshot: Vec<(WatchToken, LoadHandler)> = self
            .handlers
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        for (token, handler) in snapshot {
            if !self.handlers.contains_key(&token) {
                continue;
            }
            handler(event);
        }
    }
}

impl std::fmt::Debug for LoaderEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderEvents")
            .field("handler_count", &self.handlers.len())
            .finish()
    }
}
