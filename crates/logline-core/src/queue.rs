//! Per-destination delivery queue.
//!
//! Each queue owns one named worker thread that runs submitted jobs one at
//! a time in submission order. Submitting never blocks. Queues are never
//! shared between destinations, so all mutable delivery state of a
//! destination is only touched from its own worker.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc as std_mpsc;
use std::thread::{self, JoinHandle, ThreadId};

use tokio::sync::mpsc;

use crate::error::{LogError, LogResult};

type Task = Box<dyn FnOnce() + Send + 'static>;

enum Job {
    Run(Task),
    Barrier(std_mpsc::Sender<()>),
}

/// A single-consumer FIFO job queue backed by a dedicated thread.
pub struct DeliveryQueue {
    label: String,
    tx: Option<mpsc::UnboundedSender<Job>>,
    worker: Option<JoinHandle<()>>,
    worker_id: ThreadId,
}

impl DeliveryQueue {
    /// Start a queue whose worker thread is named `label`.
    pub fn new(label: impl Into<String>) -> LogResult<Self> {
        let label = label.into();
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();

        let worker_label = label.clone();
        let worker = thread::Builder::new()
            .name(label.clone())
            .spawn(move || {
                while let Some(job) = rx.blocking_recv() {
                    match job {
                        Job::Run(task) => {
                            if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
                                tracing::error!(queue = %worker_label, "Delivery job panicked");
                            }
                        }
                        Job::Barrier(done) => {
                            let _ = done.send(());
                        }
                    }
                }
                tracing::trace!(queue = %worker_label, "Delivery queue drained");
            })
            .map_err(|source| LogError::QueueSpawn {
                label: label.clone(),
                source,
            })?;

        let worker_id = worker.thread().id();

        Ok(Self {
            label,
            tx: Some(tx),
            worker: Some(worker),
            worker_id,
        })
    }

    /// The worker thread's name.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Enqueue a job. Returns immediately.
    pub fn dispatch(&self, task: impl FnOnce() + Send + 'static) {
        let sent = self
            .tx
            .as_ref()
            .map(|tx| tx.send(Job::Run(Box::new(task))).is_ok())
            .unwrap_or(false);

        if !sent {
            tracing::warn!(queue = %self.label, "Delivery queue closed, dropping job");
        }
    }

    /// Block until every job dispatched before this call has run.
    ///
    /// Returns immediately when called from the queue's own worker.
    pub fn flush(&self) {
        if thread::current().id() == self.worker_id {
            return;
        }

        let (done_tx, done_rx) = std_mpsc::channel();
        let Some(tx) = self.tx.as_ref() else {
            return;
        };
        if tx.send(Job::Barrier(done_tx)).is_ok() {
            let _ = done_rx.recv();
        }
    }
}

impl std::fmt::Debug for DeliveryQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryQueue")
            .field("label", &self.label)
            .finish()
    }
}

impl Drop for DeliveryQueue {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain what is left and exit.
        self.tx.take();

        if thread::current().id() == self.worker_id {
            return;
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_jobs_run_in_order() {
        let queue = DeliveryQueue::new("test-order").unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for i in 0..100 {
            let seen = seen.clone();
            queue.dispatch(move || seen.lock().push(i));
        }
        queue.flush();

        assert_eq!(*seen.lock(), (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_jobs_run_on_named_worker() {
        let queue = DeliveryQueue::new("named-worker").unwrap();
        let name = Arc::new(Mutex::new(None));

        let captured = name.clone();
        queue.dispatch(move || {
            *captured.lock() = thread::current().name().map(str::to_string);
        });
        queue.flush();

        assert_eq!(name.lock().as_deref(), Some("named-worker"));
    }

    #[test]
    fn test_dispatch_does_not_block() {
        let queue = DeliveryQueue::new("slow").unwrap();
        let (release_tx, release_rx) = std_mpsc::channel::<()>();

        queue.dispatch(move || {
            let _ = release_rx.recv_timeout(Duration::from_secs(5));
        });
        // The worker is parked on the first job; submitting more must not wait.
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..10 {
            let counter = counter.clone();
            queue.dispatch(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        release_tx.send(()).unwrap();
        queue.flush();
        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_panicking_job_does_not_kill_worker() {
        let queue = DeliveryQueue::new("panics").unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        queue.dispatch(|| panic!("formatter exploded"));
        let after = counter.clone();
        queue.dispatch(move || {
            after.fetch_add(1, Ordering::SeqCst);
        });
        queue.flush();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_drains_pending_jobs() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let queue = DeliveryQueue::new("drain").unwrap();
            for _ in 0..25 {
                let counter = counter.clone();
                queue.dispatch(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                });
            }
        }
        assert_eq!(counter.load(Ordering::SeqCst), 25);
    }

    #[test]
    fn test_flush_from_worker_returns() {
        let queue = Arc::new(DeliveryQueue::new("reentrant").unwrap());
        let done = Arc::new(AtomicUsize::new(0));

        let inner = queue.clone();
        let flag = done.clone();
        queue.dispatch(move || {
            inner.flush();
            flag.store(1, Ordering::SeqCst);
        });
        queue.flush();

        assert_eq!(done.load(Ordering::SeqCst), 1);
    }
}
