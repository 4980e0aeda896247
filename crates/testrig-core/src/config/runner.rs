//! Runner module locations and entry point.

use serde::{Deserialize, Serialize};

/// Names of the runner's shared libraries and its entry-point symbol.
///
/// All module names are resolved relative to the configured runner root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// File name of the runner core library. This is the lazily loaded
    /// module the override layer watches for.
    #[serde(default = "default_core_module")]
    pub core_module: String,
    /// File name of the runner front library.
    #[serde(default = "default_front_module")]
    pub front_module: String,
    /// Name of the `extern "C"` entry-point symbol inside the core library.
    #[serde(default = "default_entry_symbol")]
    pub entry_symbol: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            core_module: default_core_module(),
            front_module: default_front_module(),
            entry_symbol: default_entry_symbol(),
        }
    }
}

fn default_core_module() -> String {
    "libtestrunner_core.so".to_string()
}

fn default_front_module() -> String {
    "libtestrunner.so".to_string()
}

fn default_entry_symbol() -> String {
    "runner_main".to_string()
}
