//! Shared fixtures for integration tests.

use std::sync::Arc;

use testrig_dispatch::{DispatchTable, SerialContext};
use testrig_loader::LoaderEvents;
use testrig_loader::testing::ScriptedHost;

/// A fresh harness wiring over a scripted host.
pub struct Rig {
    pub host: Arc<ScriptedHost>,
    pub events: Arc<LoaderEvents>,
    pub table: Arc<DispatchTable>,
    pub context: Arc<SerialContext>,
}

pub fn rig() -> Rig {
    let host = Arc::new(ScriptedHost::new());
    let events = LoaderEvents::new(host.clone());
    Rig {
        host,
        events,
        table: Arc::new(DispatchTable::new()),
        context: Arc::new(SerialContext::new("itest-serial")),
    }
}
