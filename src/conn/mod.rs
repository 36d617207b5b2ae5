//! Traits to perform in-order, serial, byte-wise I/O with the GDB client.

mod impls;

/// A trait to perform in-order, serial, byte-wise I/O.
///
/// This trait is implemented for [`TcpStream`](std::net::TcpStream) and
/// [`UnixStream`](std::os::unix::net::UnixStream) (on unix systems).
pub trait Connection {
    /// Transport-specific error type.
    type Error;

    /// Write a single byte.
    fn write(&mut self, byte: u8) -> Result<(), Self::Error>;

    /// Write the entire buffer, blocking until complete.
    ///
    /// This method's default implementation calls `self.write()` on each byte
    /// in the buffer. This can be quite inefficient, so if a more efficient
    /// implementation exists (such as calling `write_all()` on an underlying
    /// `std::io::Write` object), this method should be overwritten.
    fn write_all(&mut self, buf: &[u8]) -> Result<(), Self::Error> {
        for b in buf {
            self.write(*b)?;
        }
        Ok(())
    }

    /// Flush this Connection, ensuring that all intermediately buffered
    /// contents reach their destination.
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Called at the start of a debugging session _before_ any GDB packets
    /// have been sent/received.
    ///
    /// This method's default implementation is a no-op.
    ///
    /// The implementation for `TcpStream` uses it to enable
    /// [`TCP_NODELAY`](std::net::TcpStream::set_nodelay) — the protocol is
    /// many tiny packets, and Nagle's algorithm makes that miserable.
    fn on_session_start(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Extends [`Connection`] with `read` and `peek` methods, as required by the
/// bundled [`run_blocking`](crate::stub::run_blocking) event loops.
pub trait ConnectionExt: Connection {
    /// Read a single byte, blocking until one is available.
    fn read(&mut self) -> Result<u8, Self::Error>;

    /// Peek a single byte. This MUST be a **non-blocking** operation,
    /// returning `None` if no byte is available.
    fn peek(&mut self) -> Result<Option<u8>, Self::Error>;
}
