//! Harness configuration schemas.
//!
//! Configuration is deserialized via the `config` crate from an optional
//! TOML file merged with `TESTRIG_*` environment variables. The driving
//! tool normally injects the environment variables; the TOML file exists
//! for local debugging.

pub mod logging;
pub mod main_thread;
pub mod runner;

use serde::{Deserialize, Serialize};

use self::logging::LoggingConfig;
use self::main_thread::MainThreadConfig;
use self::runner::RunnerConfig;

use crate::error::AppError;

/// Root harness configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Base directory containing the runner's shared libraries.
    ///
    /// Injected as `TESTRIG_RUNNER_ROOT` by the driving tool. Required for
    /// bootstrap; absent means the harness was invoked outside a test
    /// session.
    #[serde(default)]
    pub runner_root: Option<String>,
    /// Path to the suite module, resolved relative to the host executable's
    /// directory. Injected as `TESTRIG_SUITE_PATH`.
    #[serde(default)]
    pub suite_path: Option<String>,
    /// Runner module names and entry point.
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Main-thread override settings.
    #[serde(default)]
    pub main_thread: MainThreadConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl HarnessConfig {
    /// Load configuration from the optional TOML file and the environment.
    ///
    /// Merge order: `config/testrig.toml` (if present), then environment
    /// variables prefixed with `TESTRIG_` (nested keys separated by `__`).
    pub fn load() -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/testrig").required(false))
            .add_source(
                config::Environment::with_prefix("TESTRIG")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            runner_root: None,
            suite_path: None,
            runner: RunnerConfig::default(),
            main_thread: MainThreadConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
