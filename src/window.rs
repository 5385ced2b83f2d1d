//! Rolling tail of raw command output used for prompt detection.
//!
//! Only the most recent `capacity` bytes are kept. Older bytes are dropped
//! from the front, never archived.

#[derive(Debug)]
pub struct OutputWindow {
    buffer: Vec<u8>,
    capacity: usize,
}

impl OutputWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a chunk, discarding the oldest bytes beyond capacity.
    pub fn extend(&mut self, data: &[u8]) {
        if data.len() >= self.capacity {
            self.buffer.clear();
            self.buffer
                .extend_from_slice(&data[data.len() - self.capacity..]);
            return;
        }
        let overflow = (self.buffer.len() + data.len()).saturating_sub(self.capacity);
        if overflow > 0 {
            self.buffer.drain(..overflow);
        }
        self.buffer.extend_from_slice(data);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_everything_under_capacity() {
        let mut window = OutputWindow::new(16);
        window.extend(b"hello ");
        window.extend(b"world");
        assert_eq!(window.as_slice(), b"hello world");
    }

    #[test]
    fn drops_oldest_bytes_first() {
        let mut window = OutputWindow::new(8);
        window.extend(b"abcdef");
        window.extend(b"ghij");
        assert_eq!(window.as_slice(), b"cdefghij");
        assert_eq!(window.len(), 8);
    }

    #[test]
    fn oversized_chunk_keeps_its_tail() {
        let mut window = OutputWindow::new(4);
        window.extend(b"xy");
        window.extend(b"0123456789");
        assert_eq!(window.as_slice(), b"6789");
    }

    #[test]
    fn never_exceeds_capacity() {
        let mut window = OutputWindow::new(4096);
        for i in 0..100u8 {
            window.extend(&[i; 97]);
            assert!(window.len() <= window.capacity());
        }
        assert_eq!(window.as_slice().last(), Some(&99));
    }

    #[test]
    fn clear_empties_window() {
        let mut window = OutputWindow::new(32);
        window.extend(b"Do you want to proceed?");
        window.clear();
        assert!(window.is_empty());
    }
}
