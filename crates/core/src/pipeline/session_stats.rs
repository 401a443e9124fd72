use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Counters written by the scheduler thread and read by anyone.
#[derive(Debug, Default)]
pub struct SessionCounters {
    frames_delivered: AtomicU64,
    frames_dropped: AtomicU64,
    read_errors: AtomicU64,
    consecutive_read_errors: AtomicU32,
    transport_resets: AtomicU64,
    last_pts: AtomicU64,
}

/// Point-in-time copy of [`SessionCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub frames_delivered: u64,
    /// Frames that failed to decode.
    pub frames_dropped: u64,
    pub read_errors: u64,
    pub consecutive_read_errors: u32,
    pub transport_resets: u64,
    pub last_pts: u64,
}

impl SessionCounters {
    pub fn frame_delivered(&self, pts: u64) {
        self.frames_delivered.fetch_add(1, Ordering::Relaxed);
        self.last_pts.store(pts, Ordering::Relaxed);
    }

    pub fn frame_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn read_failed(&self, consecutive: u32) {
        self.read_errors.fetch_add(1, Ordering::Relaxed);
        self.consecutive_read_errors.store(consecutive, Ordering::Relaxed);
    }

    pub fn read_succeeded(&self) {
        self.consecutive_read_errors.store(0, Ordering::Relaxed);
    }

    pub fn transport_reset(&self) {
        self.transport_resets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn last_pts(&self) -> u64 {
        self.last_pts.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> SessionStats {
        SessionStats {
            frames_delivered: self.frames_delivered.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            read_errors: self.read_errors.load(Ordering::Relaxed),
            consecutive_read_errors: self.consecutive_read_errors.load(Ordering::Relaxed),
            transport_resets: self.transport_resets.load(Ordering::Relaxed),
            last_pts: self.last_pts.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Display for SessionStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} frames delivered, {} dropped, {} read errors, {} transport resets",
            self.frames_delivered, self.frames_dropped, self.read_errors, self.transport_resets
        )
    }
}
