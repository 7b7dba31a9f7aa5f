//! Ordered command stream
//!
//! Commands run one at a time, in submission order, on a dedicated worker
//! thread. Submission returns immediately.

use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex};

use crate::error::{BackendError, Result};

pub(crate) type Command = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct InFlight {
    count: Mutex<usize>,
    idle: Condvar,
}

pub(crate) struct Stream {
    sender: Mutex<Option<Sender<Command>>>,
    in_flight: Arc<InFlight>,
    worker: Option<JoinHandle<()>>,
}

impl Stream {
    pub(crate) fn spawn(name: String) -> Result<Self> {
        let (sender, receiver) = mpsc::channel::<Command>();
        let in_flight = Arc::new(InFlight::default());
        let worker_state = Arc::clone(&in_flight);

        let worker = thread::Builder::new()
            .name(name)
            .spawn(move || {
                for command in receiver {
                    command();
                    let mut count = worker_state.count.lock();
                    *count -= 1;
                    if *count == 0 {
                        worker_state.idle.notify_all();
                    }
                }
            })
            .map_err(|e| BackendError::DeviceInit(format!("failed to spawn stream worker: {e}")))?;

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            in_flight,
            worker: Some(worker),
        })
    }

    /// Queue a command behind everything already submitted.
    pub(crate) fn submit(&self, command: Command) {
        let sender = self.sender.lock();
        let Some(sender) = sender.as_ref() else {
            tracing::warn!("stream already shut down, dropping command");
            return;
        };

        *self.in_flight.count.lock() += 1;
        if sender.send(command).is_err() {
            // Worker is gone; undo the count so synchronize cannot hang.
            let mut count = self.in_flight.count.lock();
            *count -= 1;
            if *count == 0 {
                self.in_flight.idle.notify_all();
            }
            tracing::warn!("stream worker exited, dropping command");
        }
    }

    /// Block until every submitted command has finished.
    pub(crate) fn synchronize(&self) {
        let mut count = self.in_flight.count.lock();
        while *count > 0 {
            self.in_flight.idle.wait(&mut count);
        }
    }

    pub(crate) fn in_flight(&self) -> usize {
        *self.in_flight.count.lock()
    }
}

impl Drop for Stream {
    fn drop(&mut self) {
        self.sender.lock().take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("stream worker panicked during shutdown");
            }
        }
    }
}
