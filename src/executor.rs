//! A single worker thread running queued closures in order.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread::JoinHandle;

use tokio::sync::mpsc;

use crate::errors::Error;
use crate::pending::Pending;

type Task = Box<dyn FnOnce() + Send>;

pub struct Executor {
    queue: Option<mpsc::UnboundedSender<Task>>,
    worker: Option<JoinHandle<()>>,
}

impl Executor {
    /// Spawns the worker thread under the given name.
    pub fn new(name: &str) -> std::io::Result<Self> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Task>();
        let worker = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                while let Some(task) = rx.blocking_recv() {
                    if catch_unwind(AssertUnwindSafe(task)).is_err() {
                        tracing::error!("executor task panicked");
                    }
                }
                tracing::trace!("executor queue closed");
            })?;

        Ok(Executor {
            queue: Some(tx),
            worker: Some(worker),
        })
    }

    /// Queues `f` and returns a handle to its result.
    pub fn exec_async<T, F>(&self, f: F) -> Pending<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, Error> + Send + 'static,
    {
        let (resolver, pending) = Pending::channel();
        let task: Task = Box::new(move || {
            let _ = resolver.send(f());
        });

        // A closed queue drops the resolver, which the handle reports as disconnected.
        if let Some(queue) = &self.queue {
            let _ = queue.send(task);
        }
        pending
    }
}

impl Drop for Executor {
    fn drop(&mut self) {
        self.queue.take();
        if let Some(worker) = self.worker.take() {
            if worker.thread().id() != std::thread::current().id() {
                let _ = worker.join();
            }
        }
    }
}
