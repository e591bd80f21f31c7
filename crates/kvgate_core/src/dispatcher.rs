//! Job dispatch onto the bounded worker pool.
//!
//! Every handle-lifecycle and single-shot data operation becomes a [`Job`]:
//! a named closure holding a value-captured parameter snapshot and the
//! sending half of a oneshot channel. Workers drain a shared queue and
//! execute each job exactly once; the completion travels back through the
//! channel and is observed wherever the caller awaits its [`JobTicket`] -
//! the single designated caller-side context.
//!
//! Completion order is finish order, not submission order. There is no
//! cancellation or timeout: once queued, a job runs to completion.

use crate::error::{Error, GatewayResult};
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::mpsc;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::thread::JoinHandle;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Default number of worker threads in the pool.
pub const DEFAULT_WORKERS: usize = 4;

/// One pending operation: a name for diagnostics and the work itself.
///
/// The closure owns everything the operation needs - parameter snapshot,
/// engine reference, completion sender - so nothing borrows caller-owned
/// memory across the offload.
struct Job {
    name: &'static str,
    run: Box<dyn FnOnce() + Send>,
}

/// A bounded worker pool executing blocking engine calls off the caller's
/// context.
///
/// Dropping the dispatcher closes the queue and joins every worker; jobs
/// already queued still run to completion first.
pub(crate) struct Dispatcher {
    queue: Option<mpsc::Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl Dispatcher {
    /// Starts a pool with `workers` threads (at least one).
    pub(crate) fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..workers)
            .map(|index| {
                let receiver = Arc::clone(&receiver);
                std::thread::Builder::new()
                    .name(format!("kvgate-worker-{index}"))
                    .spawn(move || worker_loop(index, &receiver))
                    .expect("failed to spawn worker thread")
            })
            .collect();

        Self {
            queue: Some(sender),
            workers,
        }
    }

    /// Enqueues `work` and returns the ticket for its single completion.
    ///
    /// Dropping the ticket makes the call fire-and-forget: the job still
    /// runs, its outcome is discarded.
    pub(crate) fn submit<T, F>(&self, name: &'static str, work: F) -> JobTicket<T>
    where
        T: Send + 'static,
        F: FnOnce() -> GatewayResult<T> + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        let job = Job {
            name,
            run: Box::new(move || {
                let outcome = work();
                // A dropped ticket is fire-and-forget; the send failing is
                // the expected way to discard the outcome.
                let _ = sender.send(outcome);
            }),
        };

        if let Some(queue) = &self.queue {
            if queue.send(job).is_err() {
                warn!(job = name, "job queue closed, completion will report shutdown");
            }
        }
        JobTicket { receiver }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        // Closing the queue lets each worker drain and exit.
        self.queue.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

fn worker_loop(index: usize, receiver: &Mutex<mpsc::Receiver<Job>>) {
    debug!(worker = index, "worker started");
    loop {
        let job = {
            let queue = receiver.lock();
            queue.recv()
        };
        match job {
            Ok(job) => {
                debug!(worker = index, job = job.name, "executing job");
                (job.run)();
            }
            Err(_) => break,
        }
    }
    debug!(worker = index, "worker stopped");
}

/// The owned, exactly-once completion of one submitted job.
///
/// Await the ticket on the caller's context, or [`JobTicket::wait`] from
/// synchronous code. Dropping it discards the outcome without affecting the
/// job.
#[derive(Debug)]
pub struct JobTicket<T> {
    receiver: oneshot::Receiver<GatewayResult<T>>,
}

impl<T> JobTicket<T> {
    /// Blocks the current thread until the job completes.
    ///
    /// Must not be called from asynchronous code; await the ticket instead.
    ///
    /// # Errors
    ///
    /// Returns the job's own error, or [`Error::Handle`] if the dispatcher
    /// shut down before the job could complete.
    pub fn wait(self) -> GatewayResult<T> {
        self.receiver
            .blocking_recv()
            .unwrap_or_else(|_| Err(shutdown_error()))
    }
}

impl<T> Future for JobTicket<T> {
    type Output = GatewayResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(_)) => Poll::Ready(Err(shutdown_error())),
            Poll::Pending => Poll::Pending,
        }
    }
}

fn shutdown_error() -> Error {
    Error::handle("dispatcher shut down before the job completed")
}
