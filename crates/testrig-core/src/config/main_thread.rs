//! Main-thread override settings.

use serde::{Deserialize, Serialize};

/// Settings for the main-thread override layer.
///
/// The watch prefix/suffix pair identifies the runner core module among the
/// loaded modules; the type and operation names identify the dispatch-table
/// slots the override replaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MainThreadConfig {
    /// Absolute path prefix the watched module must start with.
    #[serde(default = "default_watch_prefix")]
    pub watch_prefix: String,
    /// Path suffix the watched module must end with.
    #[serde(default = "default_watch_suffix")]
    pub watch_suffix: String,
    /// Type carrying the thread-identity operation.
    #[serde(default = "default_thread_type")]
    pub thread_type: String,
    /// Operation reporting whether the caller is on the main thread.
    #[serde(default = "default_identity_op")]
    pub identity_op: String,
    /// Type that appears once the runner core has registered itself.
    #[serde(default = "default_center_type")]
    pub center_type: String,
    /// Observer-registration operation on the center type.
    #[serde(default = "default_add_op")]
    pub add_op: String,
    /// Observer-removal operation on the center type.
    #[serde(default = "default_remove_op")]
    pub remove_op: String,
}

impl Default for MainThreadConfig {
    fn default() -> Self {
        Self {
            watch_prefix: default_watch_prefix(),
            watch_suffix: default_watch_suffix(),
            thread_type: default_thread_type(),
            identity_op: default_identity_op(),
            center_type: default_center_type(),
            add_op: default_add_op(),
            remove_op: default_remove_op(),
        }
    }
}

fn default_watch_prefix() -> String {
    "/".to_string()
}

fn default_watch_suffix() -> String {
    "/libtestrunner_core.so".to_string()
}

fn default_thread_type() -> String {
    "Thread".to_string()
}

fn default_identity_op() -> String {
    "is_main_thread".to_string()
}

fn default_center_type() -> String {
    "TestObservationCenter".to_string()
}

fn default_add_op() -> String {
    "add_observer".to_string()
}

fn default_remove_op() -> String {
    "remove_observer".to_string()
}
