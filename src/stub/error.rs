use core::fmt::{self, Debug, Display};

use crate::protocol::RecvPacketError;

/// Which direction of the connection an error occurred on.
#[derive(Debug)]
pub enum ConnectionErrorKind {
    /// Error initializing the session.
    Init,
    /// Error reading data.
    Read,
    /// Error writing data.
    Write,
}

#[derive(Debug)]
pub(crate) enum InternalError<T, C> {
    /// Connection error.
    Connection(C, ConnectionErrorKind),
    /// The RPC client encountered a fatal error.
    TargetError(T),

    /// A packet opened with something other than `$`, `+`, or 0x03.
    BadPacketOpen(u8),
    /// Checksum mismatch while no-ack mode was active.
    ChecksumMismatch { expected: u8, calculated: u8 },
    /// Packet did not fit in the negotiated packet buffer.
    PacketBufferOverflow,
    /// Client sent a packet that makes no sense in the current state.
    PacketUnexpected,

    // A non-fatal error occurred (with errno-style error code).
    //
    // This "dummy" error is required as part of the internal
    // `TargetResultExt::handle_error()` machinery: it funnels recoverable
    // handler failures back to the dispatch loop, which renders them as
    // `Exx` replies. It never escapes to the end user.
    #[doc(hidden)]
    NonFatalError(u8),
}

impl<T, C> InternalError<T, C> {
    pub fn conn_read(e: C) -> Self {
        InternalError::Connection(e, ConnectionErrorKind::Read)
    }

    pub fn conn_write(e: C) -> Self {
        InternalError::Connection(e, ConnectionErrorKind::Write)
    }

    pub fn conn_init(e: C) -> Self {
        InternalError::Connection(e, ConnectionErrorKind::Init)
    }
}

impl<T, C> From<RecvPacketError<C>> for InternalError<T, C> {
    fn from(e: RecvPacketError<C>) -> Self {
        match e {
            RecvPacketError::BadPacketOpen(b) => InternalError::BadPacketOpen(b),
            RecvPacketError::ChecksumMismatch {
                expected,
                calculated,
            } => InternalError::ChecksumMismatch {
                expected,
                calculated,
            },
            RecvPacketError::PacketBufferOverflow => InternalError::PacketBufferOverflow,
            RecvPacketError::Connection(e) => InternalError::conn_write(e),
        }
    }
}

/// An error which may occur during a GDB debugging session.
#[derive(Debug)]
pub struct GdbStubError<T, C> {
    kind: InternalError<T, C>,
}

impl<T, C> Display for GdbStubError<T, C>
where
    T: Display,
    C: Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use self::InternalError::*;
        match &self.kind {
            Connection(e, ConnectionErrorKind::Init) => {
                write!(f, "Connection Error while initializing the session: {}", e)
            }
            Connection(e, ConnectionErrorKind::Read) => {
                write!(f, "Connection Error while reading request: {}", e)
            }
            Connection(e, ConnectionErrorKind::Write) => {
                write!(f, "Connection Error while writing response: {}", e)
            }
            TargetError(e) => write!(f, "Debug RPC client threw a fatal error: {}", e),
            BadPacketOpen(b) => write!(f, "Packet opened with unexpected byte {:#04x}", b),
            ChecksumMismatch {
                expected,
                calculated,
            } => write!(
                f,
                "Checksum mismatch with acknowledgements disabled (packet claims {:02x}, calculated {:02x})",
                expected, calculated
            ),
            PacketBufferOverflow => {
                write!(f, "Received an oversized packet (did not fit in the packet buffer)")
            }
            PacketUnexpected => write!(f, "Client sent an unexpected packet"),
            NonFatalError(_) => {
                write!(f, "Internal non-fatal error. You should never see this!")
            }
        }
    }
}

impl<T, C> std::error::Error for GdbStubError<T, C>
where
    T: Debug + Display,
    C: Debug + Display,
{
}

impl<T, C> GdbStubError<T, C> {
    /// Check if the error was due to a fatal RPC-client error.
    pub fn is_target_error(&self) -> bool {
        matches!(self.kind, InternalError::TargetError(..))
    }

    /// If the error was due to a fatal RPC-client error, return the concrete
    /// error type.
    pub fn into_target_error(self) -> Option<T> {
        match self.kind {
            InternalError::TargetError(e) => Some(e),
            _ => None,
        }
    }

    /// Check if the error was due to a connection error.
    pub fn is_connection_error(&self) -> bool {
        matches!(self.kind, InternalError::Connection(..))
    }

    /// If the error was due to a connection error, return the concrete error
    /// type.
    pub fn into_connection_error(self) -> Option<(C, ConnectionErrorKind)> {
        match self.kind {
            InternalError::Connection(e, kind) => Some((e, kind)),
            _ => None,
        }
    }
}

impl<T, C> From<InternalError<T, C>> for GdbStubError<T, C> {
    fn from(kind: InternalError<T, C>) -> Self {
        GdbStubError { kind }
    }
}
