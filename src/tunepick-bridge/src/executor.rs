//! The UI-owning execution context.
//!
//! Native picker surfaces may only be created, presented and dismissed from
//! the thread that owns the UI. Work that starts elsewhere (e.g. the
//! authorization continuation on a runtime worker) hops over with
//! [`UiExecutor::dispatch`].

use std::io;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tokio::sync::mpsc;

/// A unit of work to run on the UI thread.
pub type UiJob = Box<dyn FnOnce() + Send + 'static>;

pub trait UiExecutor: Send + Sync {
    /// Queue `job` to run on the UI thread. Jobs run in submission order.
    fn dispatch(&self, job: UiJob);

    /// Whether the caller is currently on the UI thread.
    fn is_ui_thread(&self) -> bool;
}

/// A dedicated OS thread acting as the UI main queue.
///
/// The thread exits once every handle is dropped and the queue drains.
#[derive(Debug, Clone)]
pub struct UiThread {
    tx: mpsc::UnboundedSender<UiJob>,
    thread_id: ThreadId,
}

impl UiThread {
    pub fn spawn(name: &str) -> io::Result<Arc<Self>> {
        let (tx, mut rx) = mpsc::unbounded_channel::<UiJob>();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                while let Some(job) = rx.blocking_recv() {
                    job();
                }
                tracing::debug!("ui thread queue closed");
            })?;
        Ok(Arc::new(Self {
            tx,
            thread_id: handle.thread().id(),
        }))
    }

    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }
}

impl UiExecutor for UiThread {
    fn dispatch(&self, job: UiJob) {
        if self.tx.send(job).is_err() {
            tracing::warn!("ui thread has shut down, dropping job");
        }
    }

    fn is_ui_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }
}
