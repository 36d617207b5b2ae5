//! The core [`GdbStub`] type, used to drive a GDB debugging session against
//! a [`DeviceInterface`](crate::target::DeviceInterface) over a given
//! [`Connection`](crate::conn::Connection).

use log::{info, trace};

use crate::conn::{Connection, ConnectionExt};
use crate::protocol::{PumpEvent, RecvPacketStateMachine};
use crate::target::DeviceInterface;
use crate::util::buffer::Buffer;

mod builder;
mod core_impl;
mod error;
mod stop_reason;

pub(crate) mod registry;

pub use builder::{GdbStubBuilder, GdbStubBuilderError};
pub use core_impl::DisconnectReason;
pub use error::{ConnectionErrorKind, GdbStubError};
pub use registry::ThreadRef;
pub use stop_reason::StopReason;

use core_impl::State;
use error::InternalError;

/// Types and traits related to the [`GdbStub::run_blocking`] interface.
pub mod run_blocking {
    use super::*;
    use crate::target::EventFlag;

    /// Why the event loop woke up.
    pub enum Event {
        /// GDB sent a byte.
        IncomingData(u8),
        /// At least one attached process has signalled queued debug events.
        DebugEventsPending,
    }

    /// A user-provided multiplexer over the GDB channel and the per-process
    /// async event flags.
    ///
    /// The stub calls [`wait_for_event`](BlockingEventLoop::wait_for_event)
    /// whenever it has nothing to do; the implementation blocks until either
    /// source is ready. How it waits is its own business — `poll(2)` over the
    /// socket plus a self-pipe kicked by the RPC layer is the natural shape,
    /// and [`PollingEventLoop`] is a portable fallback.
    pub trait BlockingEventLoop {
        type Connection: ConnectionExt;

        fn wait_for_event(
            conn: &mut Self::Connection,
            event_flags: &[EventFlag],
        ) -> Result<Event, <Self::Connection as Connection>::Error>;
    }

    /// A portable [`BlockingEventLoop`] built on
    /// [`ConnectionExt::peek`](crate::conn::ConnectionExt::peek) and a short
    /// sleep. Fine for interactive debugging; swap in an OS-level poller if
    /// the wakeup latency ever matters.
    pub struct PollingEventLoop<C> {
        _conn: core::marker::PhantomData<C>,
    }

    impl<C: ConnectionExt> BlockingEventLoop for PollingEventLoop<C> {
        type Connection = C;

        fn wait_for_event(
            conn: &mut C,
            event_flags: &[EventFlag],
        ) -> Result<Event, C::Error> {
            use std::sync::atomic::Ordering;

            loop {
                if conn.peek()?.is_some() {
                    return Ok(Event::IncomingData(conn.read()?));
                }
                if event_flags.iter().any(|f| f.load(Ordering::Acquire)) {
                    return Ok(Event::DebugEventsPending);
                }
                std::thread::sleep(std::time::Duration::from_micros(500));
            }
        }
    }
}

/// Drive a GDB debugging session: bytes from GDB in, debug RPCs out, stop
/// replies back.
pub struct GdbStub<D: DeviceInterface, C: Connection> {
    conn: C,
    packet_buffer: Buffer,
    recv_packet: RecvPacketStateMachine,
    inner: core_impl::GdbStubImpl<D, C>,
}

impl<D: DeviceInterface, C: Connection> GdbStub<D, C> {
    /// Create a [`GdbStubBuilder`] using the provided device interface and
    /// connection.
    pub fn builder(device: D, conn: C) -> GdbStubBuilder<D, C> {
        GdbStubBuilder::new(device, conn)
    }

    /// Create a new `GdbStub` with default options.
    pub fn new(device: D, conn: C) -> GdbStub<D, C> {
        // the default configuration is always buildable
        GdbStubBuilder::new(device, conn).build().unwrap()
    }
}

impl<D: DeviceInterface, C: ConnectionExt> GdbStub<D, C> {
    /// Run the session to completion using the bundled polling event loop.
    pub fn run(self) -> Result<DisconnectReason, GdbStubError<D::Error, C::Error>> {
        self.run_blocking::<run_blocking::PollingEventLoop<C>>()
    }

    /// Run the session to completion using a custom event loop.
    ///
    /// Returns once GDB detaches, or with an error if the connection or the
    /// RPC client fails fatally.
    pub fn run_blocking<E>(mut self) -> Result<DisconnectReason, GdbStubError<D::Error, C::Error>>
    where
        E: run_blocking::BlockingEventLoop<Connection = C>,
    {
        self.conn
            .on_session_start()
            .map_err(InternalError::conn_init)?;
        info!("GDB session started");

        let result = self.run_inner::<E>();

        match result {
            Ok(reason) => Ok(reason),
            Err(err) => {
                // a dying RPC client may leave GDB blocked on a vCont reply;
                // mark everything detached and wave goodbye before bailing
                if matches!(err, InternalError::TargetError(_)) && self.inner.waiting_for_stop {
                    self.inner.registry.processes.clear();
                    let mut res = crate::protocol::ResponseWriter::new(&mut self.conn);
                    let _ = res.write_str("W00").and_then(|()| res.flush());
                }
                Err(err.into())
            }
        }
    }

    fn run_inner<E>(&mut self) -> Result<DisconnectReason, InternalError<D::Error, C::Error>>
    where
        E: run_blocking::BlockingEventLoop<Connection = C>,
    {
        loop {
            // deliver any stop reply the target owes before blocking again
            if self.inner.waiting_for_stop && self.inner.registry.has_pending_events() {
                self.inner.ingest_pending_events()?;
            }
            self.inner.maybe_report_stop(&mut self.conn)?;

            let event_flags = self.inner.registry.event_flags();
            let event = E::wait_for_event(&mut self.conn, &event_flags)
                .map_err(InternalError::conn_read)?;

            match event {
                run_blocking::Event::IncomingData(byte) => {
                    let ack_enabled = !self.inner.features.no_ack_mode();
                    let pumped = self.recv_packet.pump(
                        &mut self.conn,
                        &mut self.packet_buffer,
                        byte,
                        ack_enabled,
                    )?;

                    match pumped {
                        PumpEvent::Pending => {}
                        PumpEvent::Interrupt => self.inner.handle_interrupt()?,
                        PumpEvent::Packet => {
                            let state = {
                                let body = self.packet_buffer.read_mut();
                                self.inner.handle_packet(&mut self.conn, body)?
                            };
                            self.packet_buffer.clear();

                            match state {
                                State::Pump => {}
                                State::DeferredStopReason => {
                                    trace!("reply deferred until the target stops")
                                }
                                State::Disconnect(reason) => {
                                    info!("GDB session over: {:?}", reason);
                                    return Ok(reason);
                                }
                            }
                        }
                    }
                }
                run_blocking::Event::DebugEventsPending => {
                    self.inner.ingest_pending_events()?;
                    self.inner.maybe_report_stop(&mut self.conn)?;
                }
            }
        }
    }
}
