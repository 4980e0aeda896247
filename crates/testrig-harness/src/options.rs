//! Harness option flags.

use bitflags::bitflags;

bitflags! {
    /// Optional behaviors selected by the embedding host.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct HarnessOptions: u32 {
        /// Bootstrap the runner on a background thread.
        const ASYNC_START = 1 << 0;
        /// Reroute main-thread-affine runner calls onto the serial
        /// context so the host keeps the real main thread.
        const MAIN_THREAD_OVERRIDE = 1 << 1;
        /// Park the calling thread in a run loop while the tests run.
        const FOREGROUND = 1 << 2;
    }
}
