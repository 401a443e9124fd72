use crate::shared::frame::Frame;

/// Receives decoded frames on the scheduler thread.
///
/// The frame borrows the scheduler's pixel buffer, which is overwritten on
/// the next iteration; copy what must outlive the call. A slow sink delays
/// every following frame.
pub trait FrameSink: Send {
    fn on_frame(&mut self, frame: &Frame<'_>);
}

impl<F> FrameSink for F
where
    F: FnMut(&Frame<'_>) + Send,
{
    fn on_frame(&mut self, frame: &Frame<'_>) {
        self(frame)
    }
}
