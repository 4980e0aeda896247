//! Dispatch-table interception and serialized call rerouting for Testrig.
//!
//! This crate provides:
//! - [`table::DispatchTable`], the operation indirection table with
//!   install/forward interception
//! - [`serial::SerialContext`], a dedicated one-at-a-time execution thread
//!   with synchronous hand-off
//! - [`main_thread::MainThreadOverride`], which combines the two with a
//!   load watcher to reroute main-thread-affine calls

pub mod main_thread;
pub mod serial;
pub mod table;

pub use main_thread::{MainThreadOverride, OverrideState};
pub use serial::SerialContext;
pub use table::{DispatchTable, Imp, InterceptRecord, OpCall, OpReturn};
