//! Fire-and-forget persistence
//!
//! Wraps a durable store in a background writer thread. Reads and decisions
//! (like whether a spend is affordable) come from an in-memory copy that is
//! updated immediately; the inner store catches up asynchronously and logs
//! its own failures.

use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;

use super::{PlayerProfile, ProfileBackend, ProfileOp, StoreError};

enum Request {
    Write(ProfileOp),
    Flush(Sender<()>),
}

/// Store front that never blocks on I/O
pub struct WriteBehind {
    cache: PlayerProfile,
    tx: Option<Sender<Request>>,
    worker: Option<JoinHandle<()>>,
}

impl WriteBehind {
    pub fn spawn<S>(mut store: S) -> Self
    where
        S: ProfileBackend + Send + 'static,
    {
        let cache = store.current().clone();
        let (tx, rx) = mpsc::channel::<Request>();

        let worker = std::thread::Builder::new()
            .name("profile-writer".into())
            .spawn(move || {
                for request in rx {
                    match request {
                        Request::Write(op) => {
                            if let Err(e) = store.commit(op) {
                                log::warn!("Profile write {:?} failed: {}", op, e);
                            }
                        }
                        Request::Flush(done) => {
                            let _ = done.send(());
                        }
                    }
                }
                log::debug!("Profile writer stopped");
            });

        let (tx, worker) = match worker {
            Ok(handle) => (Some(tx), Some(handle)),
            Err(e) => {
                log::warn!("Could not start profile writer, writes are memory-only: {}", e);
                (None, None)
            }
        };

        Self { cache, tx, worker }
    }

    /// Block until every queued write has reached the inner store
    pub fn flush(&self) {
        let Some(tx) = &self.tx else { return };
        let (done_tx, done_rx) = mpsc::channel();
        if tx.send(Request::Flush(done_tx)).is_ok() {
            let _ = done_rx.recv();
        }
    }
}

impl ProfileBackend for WriteBehind {
    fn current(&self) -> &PlayerProfile {
        &self.cache
    }

    fn commit(&mut self, op: ProfileOp) -> Result<bool, StoreError> {
        if !op.apply(&mut self.cache) {
            return Ok(false);
        }
        let Some(tx) = &self.tx else {
            return Ok(true);
        };
        tx.send(Request::Write(op))
            .map_err(|_| StoreError::Unavailable("profile writer stopped".into()))?;
        Ok(true)
    }
}

impl Drop for WriteBehind {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain and exit
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
