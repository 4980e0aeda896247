//! Module loading and load-completion detection for Testrig.
//!
//! This crate provides:
//! - The [`host::ModuleHost`] trait over the process's loaded-module list
//! - [`process::ProcessHost`], the production host backed by `libloading`
//! - [`events::LoaderEvents`], the process-wide load-event fan-out registry
//! - [`watcher::LoadWatcher`], a one-shot detector that fires a callback
//!   once a target module is loaded and a readiness condition holds

pub mod events;
pub mod host;
pub mod process;
#[cfg(any(test, feature = "mock"))]
pub mod testing;
pub mod watcher;

pub use events::{LoaderEvents, WatchToken};
pub use host::{ModuleEvent, ModuleHost};
pub use process::ProcessHost;
pub use watcher::LoadWatcher;
