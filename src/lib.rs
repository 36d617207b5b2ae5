//! An implementation of the server side of the [GDB Remote Serial
//! Protocol][rsp] that bridges a game-console debug monitor to a local GDB
//! client.
//!
//! The caller hands [`GdbStub`](stub::GdbStub) an already-opened duplex byte
//! channel to GDB (anything implementing [`conn::Connection`]) and an
//! already-bound [`target::DeviceInterface`] speaking the monitor's RPC. The
//! stub then runs the whole session: packet framing and acknowledgement,
//! multiprocess attach/detach, register and memory access, and translation
//! of asynchronous debug events into stop replies.
//!
//! What this crate deliberately does _not_ do:
//!
//! - open sockets / spawn the RPC client (bring your own transport),
//! - tracepoints, hardware breakpoints, reverse execution,
//! - the `vFile` remote filesystem (not advertised).
//!
//! [rsp]: https://sourceware.org/gdb/current/onlinedocs/gdb/Remote-Protocol.html

pub mod common;
pub mod conn;
pub mod stub;
pub mod target;

mod protocol;
mod util;

pub use stub::{DisconnectReason, GdbStub, GdbStubBuilder, GdbStubError};
