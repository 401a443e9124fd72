/// Fixed-capacity byte buffer holding one compressed frame.
///
/// Allocated once when a session opens and never resized afterwards; a
/// frame that does not fit is rejected by the reader instead.
pub struct ScratchBuffer {
    data: Box<[u8]>,
}

impl ScratchBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity].into_boxed_slice(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_is_fixed() {
        let mut buf = ScratchBuffer::new(16);
        assert_eq!(buf.capacity(), 16);
        buf.as_mut_slice()[15] = 0xAB;
        assert_eq!(buf.as_slice()[15], 0xAB);
        assert_eq!(buf.capacity(), 16);
    }
}
