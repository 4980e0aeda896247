//! Dedicated serialized execution context.
//!
//! One named OS thread drains a job channel, running submitted work
//! strictly one at a time in submission order. Submission is a synchronous
//! hand-off: the caller blocks until its job has completed on the context
//! thread.

use std::sync::mpsc;
use std::sync::{Arc, OnceLock};
use std::thread::{self, ThreadId};

use tracing::debug;

type Job = Box<dyn FnOnce() + Send>;

/// A one-at-a-time execution context usable from any thread.
///
/// Dropping a context closes its channel and lets the thread exit; the
/// process-wide context from [`SerialContext::global`] is never dropped.
pub struct SerialContext {
    sender: mpsc::Sender<Job>,
    thread_id: ThreadId,
}

static GLOBAL: OnceLock<Arc<SerialContext>> = OnceLock::new();

impl SerialContext {
    /// Spawns a new context thread with the given name.
    pub fn new(name: &str) -> Self {
        let (sender, receiver) = mpsc::channel::<Job>();
        let (id_tx, id_rx) = mpsc::channel();
        thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let _ = id_tx.send(thread::current().id());
                while let Ok(job) = receiver.recv() {
                    job();
                }
                debug!("Serial context thread exiting");
            })
            .expect("Failed to spawn serial context thread");
        let thread_id = id_rx
            .recv()
            .expect("Serial context thread did not report its id");

        Self { sender, thread_id }
    }

    /// The process-wide context, spawned lazily on first access.
    pub fn global() -> &'static Arc<SerialContext> {
        GLOBAL.get_or_init(|| Arc::new(SerialContext::new("testrig-serial")))
    }

    /// Whether the calling thread is the context thread.
    ///
    /// Read-only; safe under arbitrary concurrency.
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Runs `work` on the context thread, blocking until it completes, and
    /// returns its result.
    ///
    /// Work submitted from the context thread itself runs inline, which
    /// keeps the one-at-a-time guarantee without self-deadlock.
    pub fn run_sync<R, F>(&self, work: F) -> R
    where
        R: Send + 'static,
        F: FnOnce() -> R + Send + 'static,
    {
        if self.is_current() {
            return work();
        }

        let (done_tx, done_rx) = mpsc::channel();
        let job: Job = Box::new(move || {
            let _ = done_tx.send(work());
        });
        self.sender
            .send(job)
            .expect("Serial context thread terminated");
        done_rx.recv().expect("Serial context dropped a job")
    }
}

impl std::fmt::Debug for SerialContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialContext")
            .field("thread_id", &self.thread_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_returns_result() {
        let context = SerialContext::new("test-serial");
        assert_eq!(context.run_sync(|| 21 * 2), 42);
    }

    #[test]
    fn test_is_current_only_inside() {
        let context = Arc::new(SerialContext::new("test-serial"));
        assert!(!context.is_current());
        let inner = context.clone();
        assert!(context.run_sync(move || inner.is_current()));
    }

    #[test]
    fn test_nested_run_sync_does_not_deadlock() {
        let context = Arc::new(SerialContext::new("test-serial"));
        let inner = context.clone();
        let result = context.run_sync(move || inner.run_sync(|| 7));
        assert_eq!(result, 7);
    }

    #[test]
    fn test_jobs_are_serialized() {
        let context = Arc::new(SerialContext::new("test-serial"));
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let log = Arc::new(Mutex::new(Vec::new()));

        let threads: Vec<_> = (0..8)
            .map(|i| {
                let context = context.clone();
                let active = active.clone();
                let peak = peak.clone();
                let log = log.clone();
                thread::spawn(move || {
                    context.run_sync(move || {
                        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        log.lock().unwrap_or_else(|e| e.into_inner()).push(i);
                        active.fetch_sub(1, Ordering::SeqCst);
                    });
                })
            })
            .collect();
        for thread in threads {
            thread.join().expect("submitter thread panicked");
        }

        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(
            log.lock().unwrap_or_else(|e| e.into_inner()).len(),
            8
        );
    }
}
