use std::sync::{Arc, Mutex, MutexGuard};

use crate::pipeline::frame_sink::FrameSink;
use crate::shared::frame::{Frame, OwnedFrame};

#[derive(Default)]
struct Slot {
    frame: Option<OwnedFrame>,
    fresh: bool,
}

/// Keeps a copy of the newest frame for a renderer that polls on its own
/// thread. Clones share the same slot.
#[derive(Clone, Default)]
pub struct LatestFrameSink {
    slot: Arc<Mutex<Slot>>,
}

impl LatestFrameSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        // A panicking renderer must not take the scheduler down with it.
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// A frame arrived since the last `take_frame()` or `frame_consumed()`.
    pub fn has_new_frame(&self) -> bool {
        self.lock().fresh
    }

    /// Copy of the newest frame if it has not been consumed yet.
    pub fn take_frame(&self) -> Option<OwnedFrame> {
        let mut slot = self.lock();
        if !slot.fresh {
            return None;
        }
        slot.fresh = false;
        slot.frame.clone()
    }

    /// Copy of the newest frame, consumed or not.
    pub fn current_frame(&self) -> Option<OwnedFrame> {
        self.lock().frame.clone()
    }

    pub fn frame_consumed(&self) {
        self.lock().fresh = false;
    }
}

impl FrameSink for LatestFrameSink {
    fn on_frame(&mut self, frame: &Frame<'_>) {
        let mut slot = self.lock();
        match slot.frame.as_mut() {
            Some(existing) => {
                existing.pixels.clear();
                existing.pixels.extend_from_slice(frame.pixels());
                existing.width = frame.width();
                existing.height = frame.height();
                existing.pts = frame.pts();
            }
            None => slot.frame = Some(frame.to_owned_frame()),
        }
        slot.fresh = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sink_has_nothing() {
        let sink = LatestFrameSink::new();
        assert!(!sink.has_new_frame());
        assert!(sink.take_frame().is_none());
        assert!(sink.current_frame().is_none());
    }

    #[test]
    fn test_newest_frame_wins() {
        let mut sink = LatestFrameSink::new();
        let reader = sink.clone();
        sink.on_frame(&Frame::new(&[1, 2], 2, 1, 1));
        sink.on_frame(&Frame::new(&[3, 4, 5, 6], 2, 2, 2));

        assert!(reader.has_new_frame());
        let frame = reader.take_frame().unwrap();
        assert_eq!(frame.pts, 2);
        assert_eq!(frame.pixels, vec![3, 4, 5, 6]);
        assert_eq!((frame.width, frame.height), (2, 2));

        assert!(!reader.has_new_frame());
        assert!(reader.take_frame().is_none());
        assert_eq!(reader.current_frame().unwrap().pts, 2);
    }

    #[test]
    fn test_frame_consumed_clears_flag() {
        let mut sink = LatestFrameSink::new();
        sink.on_frame(&Frame::new(&[1], 1, 1, 1));
        sink.frame_consumed();
        assert!(!sink.has_new_frame());
        sink.on_frame(&Frame::new(&[2], 1, 1, 2));
        assert!(sink.has_new_frame());
    }
}
