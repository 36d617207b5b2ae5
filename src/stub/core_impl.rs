use core::marker::PhantomData;
use std::collections::VecDeque;

use log::{info, warn};

use crate::common::Pid;
use crate::conn::Connection;
use crate::protocol::commands::Command;
use crate::protocol::{PacketBuf, ResponseWriter, WireThreadId};
use crate::stub::error::InternalError;
use crate::stub::registry::{Registry, ThreadInfoCursor, ThreadRef};
use crate::stub::stop_reason::StopReason;
use crate::target::{Debugger, DeviceInterface};

/// Common imports used by >50% of all handler modules.
///
/// Do not clutter this prelude with types only used by a few handlers.
mod prelude {
    pub(super) use crate::conn::Connection;
    pub(super) use crate::protocol::ResponseWriter;
    pub(super) use crate::stub::core_impl::target_result_ext::TargetResultExt;
    pub(super) use crate::stub::core_impl::{GdbStubImpl, HandlerStatus};
    pub(super) use crate::stub::error::InternalError as Error;
    pub(super) use crate::target::{Debugger, DeviceInterface};
}

mod base;
mod monitor_cmd;
mod no_ack_mode;
mod queries;
mod resume;
mod thread_events;
mod xfer;

pub(crate) use xfer::{libraries_xml, XferObject};

pub(crate) mod target_result_ext {
    use crate::stub::error::InternalError;
    use crate::target::{TargetError, TargetResult};

    /// Encapsulates the boilerplate of handling recoverable RPC failures:
    /// fatal errors bail out, everything else becomes an `Exx` reply via
    /// the `NonFatalError` funnel.
    pub(crate) trait TargetResultExt<V, T, C> {
        fn handle_error(self) -> Result<V, InternalError<T, C>>;
    }

    impl<V, T, C> TargetResultExt<V, T, C> for TargetResult<V, T> {
        fn handle_error(self) -> Result<V, InternalError<T, C>> {
            let code = match self {
                Ok(v) => return Ok(v),
                Err(TargetError::Fatal(e)) => return Err(InternalError::TargetError(e)),
                // Recoverable errors:
                Err(TargetError::NonFatal) => 1,
                Err(TargetError::Errno(code)) => code,
            };

            Err(InternalError::NonFatalError(code))
        }
    }
}

/// The monitor reserves this PID for aliasing: RSP reads a literal pid 0 as
/// "any process", so the target's (real, valid) PID 0 crosses the wire as
/// 512 instead.
pub(crate) const RESERVED_PID: Pid = 512;

pub(crate) fn shift_pid(pid: Pid) -> Pid {
    if pid == 0 {
        RESERVED_PID
    } else {
        pid
    }
}

pub(crate) fn unshift_pid(pid: Pid) -> Pid {
    if pid == RESERVED_PID {
        0
    } else {
        pid
    }
}

/// Describes why the GDB session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisconnectReason {
    /// GDB detached from the last attached process.
    Detach,
}

/// What the dispatch loop should do after a packet.
pub(crate) enum State {
    Pump,
    DeferredStopReason,
    Disconnect(DisconnectReason),
}

pub(crate) enum HandlerStatus {
    Handled,
    NeedsOk,
    DeferredStopReason,
    Disconnect(DisconnectReason),
}

pub(crate) struct GdbStubImpl<D: DeviceInterface, C: Connection> {
    _connection: PhantomData<fn() -> C>,

    pub(crate) device: D,
    pub(crate) features: ProtocolFeatures,
    pub(crate) registry: Registry<D>,
    pub(crate) xfer_objects: Vec<(&'static str, XferObject<D>)>,
    pub(crate) extra_features: Vec<String>,

    pub(crate) stop_reason: StopReason,
    /// A stop reply is owed (set by `ingest` when the target quiesces,
    /// cleared when the reply goes out).
    pub(crate) stop_pending: bool,
    /// A `vCont`/`vAttach` reply is outstanding.
    pub(crate) waiting_for_stop: bool,
    /// Queued `QThreadEvents` notifications, delivered one per resume.
    pub(crate) pending_notifications: VecDeque<StopReason>,

    pub(crate) thread_info: ThreadInfoCursor,
    /// Selected by `Hc`; `None` means "all threads".
    pub(crate) resume_thread: Option<ThreadRef>,
    pub(crate) packet_size: usize,
}

impl<D: DeviceInterface, C: Connection> GdbStubImpl<D, C> {
    pub fn new(device: D, packet_size: usize, extra_features: Vec<String>) -> GdbStubImpl<D, C> {
        GdbStubImpl {
            _connection: PhantomData,

            device,
            features: ProtocolFeatures::empty(),
            registry: Registry::new(),
            xfer_objects: vec![(
                "libraries",
                XferObject::ReadOnlyString {
                    generator: libraries_xml::<D>,
                    cache: None,
                },
            )],
            extra_features,

            stop_reason: StopReason::default(),
            stop_pending: false,
            waiting_for_stop: false,
            pending_notifications: VecDeque::new(),

            thread_info: ThreadInfoCursor::default(),
            resume_thread: None,
            packet_size,
        }
    }

    /// Dispatch one complete packet body and emit its reply.
    pub fn handle_packet(
        &mut self,
        conn: &mut C,
        body: &mut [u8],
    ) -> Result<State, InternalError<D::Error, C::Error>> {
        let cmd = match Command::from_packet(PacketBuf::new(body)) {
            Some(cmd) => cmd,
            None => {
                // a known prefix with an unparseable body is answered like
                // any other unsupported packet
                warn!("malformed packet, replying empty");
                ResponseWriter::new(conn)
                    .flush()
                    .map_err(InternalError::conn_write)?;
                return Ok(State::Pump);
            }
        };

        let mut res = ResponseWriter::new(conn);
        let state = match self.handle_command(&mut res, cmd) {
            Ok(HandlerStatus::Handled) => {
                res.flush().map_err(InternalError::conn_write)?;
                State::Pump
            }
            Ok(HandlerStatus::NeedsOk) => {
                res.write_str("OK").map_err(InternalError::conn_write)?;
                res.flush().map_err(InternalError::conn_write)?;
                State::Pump
            }
            // no reply now; the stop-reply path answers later
            Ok(HandlerStatus::DeferredStopReason) => State::DeferredStopReason,
            Ok(HandlerStatus::Disconnect(reason)) => {
                res.flush().map_err(InternalError::conn_write)?;
                State::Disconnect(reason)
            }
            Err(InternalError::NonFatalError(code)) => {
                res.write_str("E").map_err(InternalError::conn_write)?;
                res.write_hex(code).map_err(InternalError::conn_write)?;
                res.flush().map_err(InternalError::conn_write)?;
                State::Pump
            }
            Err(e) => return Err(e),
        };

        Ok(state)
    }

    fn handle_command(
        &mut self,
        res: &mut ResponseWriter<'_, C>,
        cmd: Command<'_>,
    ) -> Result<HandlerStatus, InternalError<D::Error, C::Error>> {
        match cmd {
            // `handle_X` methods live in the sibling handler modules
            Command::Base(cmd) => self.handle_base(res, cmd),
            Command::Queries(cmd) => self.handle_queries(res, cmd),
            Command::MonitorCmd(cmd) => self.handle_monitor_cmd(res, cmd),
            Command::NoAckMode(cmd) => self.handle_no_ack_mode(res, cmd),
            Command::ThreadEvents(cmd) => self.handle_thread_events(res, cmd),
            Command::Resume(cmd) => self.handle_resume(res, cmd),
            Command::Xfer(cmd) => self.handle_xfer(res, cmd),
            Command::Unknown(cmd) => {
                // unsupported packets get an empty reply, per the protocol
                info!("unknown command: {:?}", core::str::from_utf8(cmd));
                Ok(HandlerStatus::Handled)
            }
        }
    }

    /// The current `Hg` thread, re-resolved against the registry.
    pub(crate) fn current_thread(
        &mut self,
    ) -> Result<ThreadRef, InternalError<D::Error, C::Error>> {
        self.registry.fixup_current_thread();
        self.registry
            .current_thread
            .ok_or(InternalError::NonFatalError(1))
    }

    pub(crate) fn write_thread_ref(
        &self,
        res: &mut ResponseWriter<'_, C>,
        thread: ThreadRef,
    ) -> Result<(), InternalError<D::Error, C::Error>> {
        res.write_thread_id(WireThreadId {
            pid: self
                .features
                .multiprocess()
                .then(|| shift_pid(thread.pid)),
            tid: thread.tid,
        })
        .map_err(InternalError::conn_write)
    }

    pub(crate) fn write_stop_reason(
        &self,
        res: &mut ResponseWriter<'_, C>,
        reason: StopReason,
    ) -> Result<(), InternalError<D::Error, C::Error>> {
        match reason {
            StopReason::Exited { pid, status } => {
                res.write_str("W").map_err(InternalError::conn_write)?;
                res.write_hex(status).map_err(InternalError::conn_write)?;
                if self.features.multiprocess() {
                    if let Some(pid) = pid {
                        res.write_str(";process:")
                            .map_err(InternalError::conn_write)?;
                        res.write_num(shift_pid(pid))
                            .map_err(InternalError::conn_write)?;
                    }
                }
            }
            StopReason::Signal { signal, thread } => {
                res.write_str("T").map_err(InternalError::conn_write)?;
                res.write_hex(signal.0).map_err(InternalError::conn_write)?;
                res.write_str("thread:").map_err(InternalError::conn_write)?;
                self.write_thread_ref(res, thread)?;
                res.write_str(";").map_err(InternalError::conn_write)?;
            }
            StopReason::ThreadCreated { thread } => {
                res.write_str("T05create;thread:")
                    .map_err(InternalError::conn_write)?;
                self.write_thread_ref(res, thread)?;
                res.write_str(";").map_err(InternalError::conn_write)?;
            }
            StopReason::ThreadExited { thread } => {
                res.write_str("T05thread:")
                    .map_err(InternalError::conn_write)?;
                self.write_thread_ref(res, thread)?;
                res.write_str(";").map_err(InternalError::conn_write)?;
            }
        }
        Ok(())
    }

    /// Drain events from every process that has signalled them.
    pub(crate) fn ingest_pending_events(
        &mut self,
    ) -> Result<(), InternalError<D::Error, C::Error>> {
        let pids: Vec<Pid> = self.registry.processes.keys().copied().collect();
        for pid in pids {
            let has_events = self
                .registry
                .processes
                .get(&pid)
                .map(|p| p.has_events.load(std::sync::atomic::Ordering::Acquire))
                .unwrap_or(false);
            if !has_events {
                continue;
            }
            self.ingest_events_for(pid)?;
        }
        Ok(())
    }

    /// Drain one process's queue, folding the outcome into session state.
    pub(crate) fn ingest_events_for(
        &mut self,
        pid: Pid,
    ) -> Result<(), InternalError<D::Error, C::Error>> {
        use crate::target::TargetError;

        let outcome = match self
            .registry
            .ingest_events(pid, self.features.thread_events())
        {
            Ok(outcome) => outcome,
            Err(TargetError::Fatal(e)) => return Err(InternalError::TargetError(e)),
            Err(_) => {
                warn!("non-fatal RPC error while draining events of pid {:#x}", pid);
                return Ok(());
            }
        };

        self.pending_notifications.extend(outcome.notifications);
        if let Some(reason) = outcome.stop_reason {
            self.stop_reason = reason;
        }
        if outcome.stopped {
            self.stop_pending = true;
        }
        Ok(())
    }

    /// Emit the stop reply GDB is owed, if it is owed one and one is ready.
    ///
    /// Queued thread-event notifications go out first, one per resume; the
    /// session-level stop reason goes last.
    pub(crate) fn maybe_report_stop(
        &mut self,
        conn: &mut C,
    ) -> Result<(), InternalError<D::Error, C::Error>> {
        if !self.waiting_for_stop {
            return Ok(());
        }

        let reason = if let Some(notification) = self.pending_notifications.pop_front() {
            notification
        } else if self.stop_pending {
            self.stop_pending = false;
            self.stop_reason
        } else {
            return Ok(());
        };

        let mut res = ResponseWriter::new(conn);
        self.write_stop_reason(&mut res, reason)?;
        res.flush().map_err(InternalError::conn_write)?;
        self.waiting_for_stop = false;
        Ok(())
    }

    /// GDB sent the break byte: ask every running process to stop. The
    /// actual `T05` goes out once the kernel delivers the stop event.
    pub(crate) fn handle_interrupt(&mut self) -> Result<(), InternalError<D::Error, C::Error>> {
        use crate::target::TargetError;

        info!("<-- interrupt");
        for proc in self.registry.processes.values_mut() {
            if !proc.running {
                continue;
            }
            match proc.debugger.break_process() {
                Ok(()) => {}
                Err(TargetError::Fatal(e)) => return Err(InternalError::TargetError(e)),
                Err(_) => warn!("failed to break pid {:#x}", proc.pid),
            }
        }
        self.waiting_for_stop = true;
        Ok(())
    }
}

#[derive(Copy, Clone)]
#[repr(transparent)]
pub(crate) struct ProtocolFeatures(u8);

// Not part of the protocol - an internal bookkeeping detail.
bitflags::bitflags! {
    impl ProtocolFeatures: u8 {
        const NO_ACK_MODE = 1 << 0;
        const MULTIPROCESS = 1 << 1;
        const THREAD_EVENTS = 1 << 2;
    }
}

impl ProtocolFeatures {
    #[inline(always)]
    pub(crate) fn no_ack_mode(&self) -> bool {
        self.contains(ProtocolFeatures::NO_ACK_MODE)
    }

    #[inline(always)]
    pub(crate) fn set_no_ack_mode(&mut self, val: bool) {
        self.set(ProtocolFeatures::NO_ACK_MODE, val)
    }

    #[inline(always)]
    pub(crate) fn multiprocess(&self) -> bool {
        self.contains(ProtocolFeatures::MULTIPROCESS)
    }

    #[inline(always)]
    pub(crate) fn set_multiprocess(&mut self, val: bool) {
        self.set(ProtocolFeatures::MULTIPROCESS, val)
    }

    #[inline(always)]
    pub(crate) fn thread_events(&self) -> bool {
        self.contains(ProtocolFeatures::THREAD_EVENTS)
    }

    #[inline(always)]
    pub(crate) fn set_thread_events(&mut self, val: bool) {
        self.set(ProtocolFeatures::THREAD_EVENTS, val)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pid_shift_roundtrips() {
        // 512 itself is reserved by the monitor and never a real PID
        for pid in [0u64, 1, 2, 511, 513, 0x1000, u64::MAX >> 1] {
            assert_eq!(unshift_pid(shift_pid(pid)), pid);
            assert_ne!(shift_pid(pid), 0);
        }
    }
}
