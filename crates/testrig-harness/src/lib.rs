//! Harness orchestration for Testrig.
//!
//! [`harness_main`] is the single entry point an embedding host calls:
//! it optionally enables the main-thread override, bootstraps the test
//! runtime (inline or on a background thread), and optionally parks the
//! calling thread in a run loop.

pub mod bootstrap;
pub mod options;

use std::sync::OnceLock;

use tracing::{error, info};

use testrig_core::HarnessConfig;
use testrig_core::config::main_thread::MainThreadConfig;
use testrig_dispatch::{DispatchTable, MainThreadOverride, SerialContext};
use testrig_loader::LoaderEvents;

pub use options::HarnessOptions;

/// Sets up the test runtime inside the host process.
///
/// Hard startup failures (missing configuration, missing modules, missing
/// entry symbol) terminate the process with a diagnostic; a misconfigured
/// host environment is not recoverable.
pub fn harness_main(config: HarnessConfig, options: HarnessOptions) {
    if options.contains(HarnessOptions::MAIN_THREAD_OVERRIDE) {
        override_layer(config.main_thread.clone()).setup();
    }

    if options.contains(HarnessOptions::ASYNC_START) {
        let config = config.clone();
        std::thread::Builder::new()
            .name("testrig-bootstrap".to_string())
            .spawn(move || run_bootstrap(&config))
            .expect("Failed to spawn bootstrap thread");
    } else {
        run_bootstrap(&config);
    }

    if options.contains(HarnessOptions::FOREGROUND) {
        run_loop();
    }
}

fn run_bootstrap(config: &HarnessConfig) {
    if let Err(e) = bootstrap::start_session(config) {
        error!(error = %e, "Failed to start test session");
        std::process::exit(1);
    }
}

/// The process-wide override, wired to the global table, registry, and
/// context on first use.
fn override_layer(config: MainThreadConfig) -> &'static MainThreadOverride {
    static OVERRIDE: OnceLock<MainThreadOverride> = OnceLock::new();
    OVERRIDE.get_or_init(|| {
        MainThreadOverride::new(
            DispatchTable::global().clone(),
            LoaderEvents::global().clone(),
            SerialContext::global().clone(),
            config,
        )
    })
}

/// Holds the calling thread while the runner works elsewhere.
fn run_loop() {
    info!("Holding the foreground thread for the session run loop");
    loop {
        std::thread::park();
    }
}
