//! Startup glue: resolve configured paths, open the runner modules, and
//! invoke the runner entry point.
//!
//! Every failure here means a misconfigured host environment, not a
//! transient fault, so callers terminate the process instead of retrying.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use testrig_core::{AppError, AppResult, HarnessConfig};
use testrig_loader::ProcessHost;

/// Session identifier injected by the driving tool. Its absence usually
/// means the host was launched by hand.
const SESSION_VAR: &str = "TESTRIG_SESSION_ID";

/// Opens the runner modules and the suite module, then invokes the runner
/// entry point on the calling thread.
///
/// Modules are opened through [`ProcessHost::global`] so their loads flow
/// through the load-event registry.
pub fn start_session(config: &HarnessConfig) -> AppResult<()> {
    if std::env::var_os(SESSION_VAR).is_none() {
        warn!(
            "Missing {SESSION_VAR}; this process does not look like a driven test session"
        );
    }

    let runner_root = config.runner_root.as_deref().ok_or_else(|| {
        AppError::configuration(
            "Missing runner_root; the driving tool injects TESTRIG_RUNNER_ROOT automatically",
        )
    })?;
    let runner_root = PathBuf::from(runner_root);

    let core_path = runner_root.join(&config.runner.core_module);
    let front_path = runner_root.join(&config.runner.front_module);
    let suite_path = resolve_suite_path(config)?;

    let host = ProcessHost::global();
    open_module(host, &core_path)?;
    open_module(host, &front_path)?;
    open_module(host, &suite_path)?;

    let entry = unsafe { host.entry_point(&core_path, &config.runner.entry_symbol) }?;
    info!(symbol = %config.runner.entry_symbol, "Invoking runner entry point");
    unsafe { entry() };
    Ok(())
}

/// Resolves the suite module path; relative values are anchored at the
/// host executable's directory.
fn resolve_suite_path(config: &HarnessConfig) -> AppResult<PathBuf> {
    let suite = config.suite_path.as_deref().ok_or_else(|| {
        AppError::configuration(
            "Missing suite_path; the driving tool injects TESTRIG_SUITE_PATH automatically",
        )
    })?;
    let suite = Path::new(suite);
    if suite.is_absolute() {
        return Ok(suite.to_path_buf());
    }

    let exe = std::env::current_exe()
        .map_err(|e| AppError::configuration(format!("Cannot resolve host executable: {e}")))?;
    let dir = exe.parent().ok_or_else(|| {
        AppError::configuration("Host executable has no parent directory")
    })?;
    Ok(dir.join(suite))
}

fn open_module(host: &ProcessHost, path: &Path) -> AppResult<()> {
    if !path.exists() {
        return Err(AppError::loader(format!(
            "Missing module, expected it at '{}'",
            path.display()
        )));
    }
    unsafe { host.open(path) }
}
