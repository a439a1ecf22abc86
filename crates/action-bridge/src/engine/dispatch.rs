//! Single UI-affinity thread that runs every host interaction.
//!
//! Host command handlers and enablement updates are not thread safe, so all
//! of them are funnelled through one named OS thread. Request workers either
//! post work and move on, or block until the job has run.

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread::{self, ThreadId};

use tracing::{debug, error};

use crate::host::HostError;

/// Name of the dispatch thread.
pub const DISPATCH_THREAD_NAME: &str = "ui-dispatch";

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Handle to the UI dispatch thread.
///
/// The thread exits once every handle has been dropped and the queue has
/// drained.
#[derive(Debug)]
pub struct UiDispatcher {
    sender: mpsc::Sender<Job>,
    thread_id: ThreadId,
}

impl UiDispatcher {
    /// Start the dispatch thread.
    pub fn spawn() -> io::Result<Self> {
        let (sender, receiver) = mpsc::channel::<Job>();

        let handle = thread::Builder::new()
            .name(DISPATCH_THREAD_NAME.to_string())
            .spawn(move || {
                for job in receiver {
                    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
                        error!(
                            panic = %panic_message(payload.as_ref()),
                            "Job panicked on UI dispatch thread"
                        );
                    }
                }
                debug!("UI dispatch thread stopped");
            })?;

        Ok(Self {
            sender,
            thread_id: handle.thread().id(),
        })
    }

    /// Whether the caller is running on the dispatch thread.
    pub fn is_dispatch_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Queue `job` and return immediately.
    pub fn post<F>(&self, job: F) -> Result<(), HostError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.sender
            .send(Box::new(job))
            .map_err(|_| HostError::DispatcherGone)
    }

    /// Run `job` on the dispatch thread and block until it returns.
    ///
    /// A panic inside `job` is reported as [`HostError::Panicked`]. Calls made
    /// from the dispatch thread itself run inline.
    pub fn invoke_and_wait<F, T>(&self, job: F) -> Result<T, HostError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        if self.is_dispatch_thread() {
            return run_guarded(job);
        }

        let (reply_tx, reply_rx) = mpsc::sync_channel(1);
        self.post(move || {
            // The waiting side may have given up; nothing to do then.
            let _ = reply_tx.send(run_guarded(job));
        })?;

        reply_rx.recv().map_err(|_| HostError::DispatcherGone)?
    }
}

fn run_guarded<F, T>(job: F) -> Result<T, HostError>
where
    F: FnOnce() -> T,
{
    panic::catch_unwind(AssertUnwindSafe(job))
        .map_err(|payload| HostError::Panicked(panic_message(payload.as_ref())))
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
