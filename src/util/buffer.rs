/// A byte FIFO with separate read and write cursors over a single growable
/// region.
///
/// Producers call [`reserve`](Buffer::reserve) +
/// [`mark_written`](Buffer::mark_written) (or one of the `write_*`
/// conveniences); consumers call [`read`](Buffer::read) +
/// [`mark_read`](Buffer::mark_read). Invariant: `read ≤ write ≤
/// storage.len()`.
///
/// Consumed bytes are reclaimed by shifting the live region left once the
/// read cursor passes the midpoint of the storage; callers never observe
/// this.
#[derive(Debug, Default)]
pub struct Buffer {
    storage: Vec<u8>,
    read: usize,
    write: usize,
}

impl Buffer {
    pub fn new() -> Buffer {
        Buffer::default()
    }

    pub fn with_capacity(capacity: usize) -> Buffer {
        Buffer {
            storage: Vec::with_capacity(capacity),
            read: 0,
            write: 0,
        }
    }

    /// Make `n` bytes of scratch space available past the write cursor,
    /// returning it for the caller to fill. Call
    /// [`mark_written`](Buffer::mark_written) with the number of bytes
    /// actually produced.
    pub fn reserve(&mut self, n: usize) -> &mut [u8] {
        self.compact();
        if self.storage.len() < self.write + n {
            self.storage.resize(self.write + n, 0);
        }
        &mut self.storage[self.write..self.write + n]
    }

    /// Advance the write cursor over `n` bytes previously obtained from
    /// [`reserve`](Buffer::reserve).
    pub fn mark_written(&mut self, n: usize) {
        debug_assert!(self.write + n <= self.storage.len());
        self.write += n;
    }

    /// The contiguous readable region.
    pub fn read(&self) -> &[u8] {
        &self.storage[self.read..self.write]
    }

    /// The contiguous readable region, mutably (used for in-place hex
    /// decoding of packet bodies).
    pub fn read_mut(&mut self) -> &mut [u8] {
        &mut self.storage[self.read..self.write]
    }

    pub fn read_available(&self) -> usize {
        self.write - self.read
    }

    /// Consume `n` bytes from the front of the readable region.
    pub fn mark_read(&mut self, n: usize) {
        debug_assert!(self.read + n <= self.write);
        self.read += n;
    }

    pub fn write_u8(&mut self, byte: u8) {
        self.reserve(1)[0] = byte;
        self.write += 1;
    }

    pub fn write_all(&mut self, bytes: &[u8]) {
        let n = bytes.len();
        self.reserve(n).copy_from_slice(bytes);
        self.write += n;
    }

    /// Reset both cursors. Storage is retained.
    pub fn clear(&mut self) {
        self.read = 0;
        self.write = 0;
    }

    fn compact(&mut self) {
        if self.read == 0 || self.read < self.storage.len() / 2 {
            return;
        }
        self.storage.copy_within(self.read..self.write, 0);
        self.write -= self.read;
        self.read = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserve_then_mark_written() {
        let mut buf = Buffer::new();
        let scratch = buf.reserve(4);
        scratch.copy_from_slice(b"abcd");
        buf.mark_written(4);

        assert_eq!(buf.read(), b"abcd");
        assert_eq!(buf.read_available(), 4);
    }

    #[test]
    fn partial_reads() {
        let mut buf = Buffer::new();
        buf.write_all(b"hello world");

        buf.mark_read(6);
        assert_eq!(buf.read(), b"world");

        buf.mark_read(5);
        assert_eq!(buf.read_available(), 0);
    }

    #[test]
    fn interleaved_read_write() {
        let mut buf = Buffer::new();
        for chunk in 0..100u8 {
            buf.write_all(&[chunk; 7]);
            assert_eq!(buf.read()[0], chunk);
            buf.mark_read(7);
        }
        assert_eq!(buf.read_available(), 0);
    }

    #[test]
    fn compaction_preserves_content() {
        let mut buf = Buffer::new();
        buf.write_all(&[0; 64]);
        buf.mark_read(64);
        buf.write_all(b"tail");
        // compaction is triggered by the next reserve
        buf.write_u8(b'!');
        assert_eq!(buf.read(), b"tail!");
    }

    #[test]
    fn clear_resets_cursors() {
        let mut buf = Buffer::new();
        buf.write_all(b"junk");
        buf.clear();
        assert_eq!(buf.read_available(), 0);
        buf.write_all(b"ok");
        assert_eq!(buf.read(), b"ok");
    }
}
