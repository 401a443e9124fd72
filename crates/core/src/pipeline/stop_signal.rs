use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::shared::sleeper::Sleeper;

/// Caller half: clears the running flag and wakes any pending sleep.
pub struct StopHandle {
    running: Arc<AtomicBool>,
    wake: Option<Sender<()>>,
}

/// Worker half: observes the flag and sleeps interruptibly.
#[derive(Clone)]
pub struct StopSignal {
    running: Arc<AtomicBool>,
    wake: Receiver<()>,
}

/// Arms `running` and returns both halves.
pub fn stop_pair(running: Arc<AtomicBool>) -> (StopHandle, StopSignal) {
    let (tx, rx) = crossbeam_channel::bounded(0);
    running.store(true, Ordering::Release);
    (
        StopHandle {
            running: running.clone(),
            wake: Some(tx),
        },
        StopSignal { running, wake: rx },
    )
}

impl StopHandle {
    pub fn request_stop(&mut self) {
        self.running.store(false, Ordering::Release);
        // Disconnecting the channel ends every recv_timeout immediately.
        self.wake.take();
    }
}

impl StopSignal {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Worker-side self-termination.
    pub fn clear(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// Sleeps for `duration` unless a stop arrives first. Returns whether
    /// the worker should keep going.
    pub fn sleep(&self, duration: Duration) -> bool {
        if !self.is_running() {
            return false;
        }
        match self.wake.recv_timeout(duration) {
            Err(RecvTimeoutError::Timeout) => self.is_running(),
            Ok(()) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }
}

impl Sleeper for StopSignal {
    fn sleep(&self, duration: Duration) -> bool {
        StopSignal::sleep(self, duration)
    }
}
