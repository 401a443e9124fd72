use std::time::Duration;

/// A wait that may end early. Returns `false` when the wait was cut short
/// and the caller should give up.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration) -> bool;
}

/// Plain uninterruptible thread sleep.
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) -> bool {
        std::thread::sleep(duration);
        true
    }
}
