/// A decoded frame as handed to the sink: RGB565 pixels in row-major order.
///
/// The pixel slice borrows the scheduler's reusable output buffer and is only
/// valid for the duration of the sink callback. Sinks that need the pixels
/// later must copy them (see [`OwnedFrame`]).
#[derive(Clone, Copy, Debug)]
pub struct Frame<'a> {
    pixels: &'a [u16],
    width: u32,
    height: u32,
    pts: u64,
}

impl<'a> Frame<'a> {
    pub fn new(pixels: &'a [u16], width: u32, height: u32, pts: u64) -> Self {
        debug_assert_eq!(
            pixels.len(),
            (width as usize) * (height as usize),
            "pixel count must equal width * height"
        );
        Self {
            pixels,
            width,
            height,
            pts,
        }
    }

    pub fn pixels(&self) -> &'a [u16] {
        self.pixels
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Sequence number, strictly increasing over successfully decoded frames.
    pub fn pts(&self) -> u64 {
        self.pts
    }

    pub fn to_owned_frame(&self) -> OwnedFrame {
        OwnedFrame {
            pixels: self.pixels.to_vec(),
            width: self.width,
            height: self.height,
            pts: self.pts,
        }
    }
}

/// Detached copy of a [`Frame`] that may outlive the callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnedFrame {
    pub pixels: Vec<u16>,
    pub width: u32,
    pub height: u32,
    pub pts: u64,
}

impl OwnedFrame {
    pub fn as_frame(&self) -> Frame<'_> {
        Frame::new(&self.pixels, self.width, self.height, self.pts)
    }
}
