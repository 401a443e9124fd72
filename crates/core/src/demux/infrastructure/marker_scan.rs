use crate::shared::constants::{EOI_MARKER, SOI_MARKER};

fn find_marker(window: &[u8], marker: [u8; 2], from: usize) -> Option<usize> {
    window
        .get(from..)?
        .windows(2)
        .position(|pair| pair == marker.as_slice())
        .map(|pos| pos + from)
}

/// Offset of the first Start-Of-Image marker.
pub fn find_soi(window: &[u8]) -> Option<usize> {
    find_marker(window, SOI_MARKER, 0)
}

/// Offset of the first End-Of-Image marker at or after `from`.
pub fn find_eoi(window: &[u8], from: usize) -> Option<usize> {
    find_marker(window, EOI_MARKER, from)
}

/// Where a JPEG image sits inside a byte window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameBounds {
    pub start: usize,
    /// One past the EOI marker, if the window contains one.
    pub end: Option<usize>,
}

impl FrameBounds {
    /// End of the frame, or the whole remaining window when no EOI was seen.
    pub fn end_or(&self, window_len: usize) -> usize {
        self.end.unwrap_or(window_len)
    }
}

pub fn locate_frame(window: &[u8]) -> Option<FrameBounds> {
    let start = find_soi(window)?;
    let end = find_eoi(window, start + SOI_MARKER.len()).map(|eoi| eoi + EOI_MARKER.len());
    Some(FrameBounds { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::at_start(&[0xFF, 0xD8, 0x00], Some(0))]
    #[case::after_garbage(&[0x00, 0x12, 0xFF, 0xD8], Some(2))]
    #[case::lone_ff(&[0xFF, 0x00, 0xFF], None)]
    #[case::repeated_ff(&[0xFF, 0xFF, 0xD8], Some(1))]
    #[case::empty(&[], None)]
    fn test_find_soi(#[case] window: &[u8], #[case] expected: Option<usize>) {
        assert_eq!(find_soi(window), expected);
    }

    #[test]
    fn test_find_eoi_respects_start_offset() {
        let window = [0xFF, 0xD9, 0x00, 0xFF, 0xD9];
        assert_eq!(find_eoi(&window, 0), Some(0));
        assert_eq!(find_eoi(&window, 1), Some(3));
        assert_eq!(find_eoi(&window, 10), None);
    }

    #[test]
    fn test_locate_complete_frame() {
        let window = [0x01, 0xFF, 0xD8, 0x10, 0xFF, 0xD9, 0x02];
        let bounds = locate_frame(&window).unwrap();
        assert_eq!(bounds, FrameBounds { start: 1, end: Some(6) });
        assert_eq!(bounds.end_or(window.len()), 6);
    }

    #[test]
    fn test_locate_frame_without_eoi_runs_to_window_end() {
        let window = [0xFF, 0xD8, 0x10, 0x11];
        let bounds = locate_frame(&window).unwrap();
        assert_eq!(bounds.end, None);
        assert_eq!(bounds.end_or(window.len()), 4);
    }

    #[test]
    fn test_eoi_inside_soi_is_not_matched() {
        // FF D8 D9: the D8 belongs to SOI, so no EOI follows it.
        let window = [0xFF, 0xD8, 0xD9];
        assert_eq!(locate_frame(&window).unwrap().end, None);
    }
}
