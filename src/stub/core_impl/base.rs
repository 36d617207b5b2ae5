use super::prelude::*;
use super::{unshift_pid, DisconnectReason};
use crate::protocol::commands::ext::Base;
use crate::protocol::common::thread_id::{IdKind, ThreadId};
use crate::stub::registry::ThreadRef;
use crate::target::{RegisterSet, ThreadContext, NUM_REGISTERS};

use log::info;

impl<D: DeviceInterface, C: Connection> GdbStubImpl<D, C> {
    /// Resolve wire thread-id syntax against the registry.
    ///
    /// PID 0 means "the current thread's process" (or the first attached
    /// process), TID 0 means "any thread of that process". `-1` is rejected
    /// here; handlers that accept "all" deal with it before calling.
    pub(crate) fn resolve_thread_id(
        &mut self,
        thread: ThreadId,
    ) -> Result<ThreadRef, Error<D::Error, C::Error>> {
        let pid = match thread.pid {
            None | Some(IdKind::Any) => match self.registry.current_thread {
                Some(cur) => cur.pid,
                None => self
                    .registry
                    .processes
                    .keys()
                    .next()
                    .copied()
                    .ok_or(Error::NonFatalError(0x16))?,
            },
            Some(IdKind::WithId(pid)) => unshift_pid(pid),
            Some(IdKind::All) => return Err(Error::PacketUnexpected),
        };

        if !self.registry.processes.contains_key(&pid) {
            return Err(Error::NonFatalError(0x16));
        }

        let tid = match thread.tid {
            IdKind::Any => {
                self.registry
                    .first_thread_of(pid)
                    .ok_or(Error::NonFatalError(1))?
                    .tid
            }
            IdKind::WithId(tid) => tid,
            IdKind::All => return Err(Error::PacketUnexpected),
        };

        Ok(ThreadRef { pid, tid })
    }

    pub(crate) fn handle_base(
        &mut self,
        res: &mut ResponseWriter<'_, C>,
        command: Base<'_>,
    ) -> Result<HandlerStatus, Error<D::Error, C::Error>> {
        let handler_status = match command {
            // ---------------------- Stop-reason query --------------------- //
            Base::QuestionMark(_) => {
                let reason = self.stop_reason;
                self.write_stop_reason(res, reason)?;
                HandlerStatus::Handled
            }

            // --------------------------- Detach --------------------------- //
            Base::D(cmd) => {
                match cmd.pid {
                    Some(pid) => self.detach_process(unshift_pid(pid))?,
                    None => {
                        let pids: Vec<_> = self.registry.processes.keys().copied().collect();
                        for pid in pids {
                            self.detach_process(pid)?;
                        }
                    }
                }

                if self.registry.processes.is_empty() {
                    // manually write OK, since we need to return a
                    // DisconnectReason
                    res.write_str("OK").map_err(Error::conn_write)?;
                    HandlerStatus::Disconnect(DisconnectReason::Detach)
                } else {
                    HandlerStatus::NeedsOk
                }
            }

            // ----------------------- Register access ---------------------- //
            Base::g(_) => {
                let thread = self.current_thread()?;
                let proc = self
                    .registry
                    .process_mut(thread.pid)
                    .ok_or(Error::NonFatalError(0x16))?;
                let ctx = proc.debugger.get_thread_context(thread.tid).handle_error()?;

                for reg in ctx.regs {
                    res.write_hex_buf(&reg.to_le_bytes())
                        .map_err(Error::conn_write)?;
                }
                HandlerStatus::Handled
            }
            Base::G(cmd) => {
                let thread = self.current_thread()?;

                let mut ctx = ThreadContext::default();
                if cmd.vals.len() > NUM_REGISTERS * 8 {
                    return Err(Error::NonFatalError(1));
                }
                for (slot, chunk) in ctx.regs.iter_mut().zip(cmd.vals.chunks_exact(8)) {
                    let mut bytes = [0; 8];
                    bytes.copy_from_slice(chunk);
                    *slot = u64::from_le_bytes(bytes);
                }

                let proc = self
                    .registry
                    .process_mut(thread.pid)
                    .ok_or(Error::NonFatalError(0x16))?;
                proc.debugger
                    .set_thread_context(
                        thread.tid,
                        &ctx,
                        RegisterSet::GENERAL | RegisterSet::CONTROL,
                    )
                    .handle_error()?;
                HandlerStatus::NeedsOk
            }

            // ------------------------ Memory access ----------------------- //
            Base::m(cmd) => {
                let thread = self.current_thread()?;
                let proc = self
                    .registry
                    .process_mut(thread.pid)
                    .ok_or(Error::NonFatalError(0x16))?;
                let data = proc.debugger.read_memory(cmd.addr, cmd.len).handle_error()?;
                res.write_hex_buf(&data).map_err(Error::conn_write)?;
                HandlerStatus::Handled
            }
            Base::M(cmd) => {
                let thread = self.current_thread()?;
                let proc = self
                    .registry
                    .process_mut(thread.pid)
                    .ok_or(Error::NonFatalError(0x16))?;
                proc.debugger.write_memory(cmd.addr, cmd.val).handle_error()?;
                HandlerStatus::NeedsOk
            }

            // ------------------- Thread selection / liveness -------------- //
            Base::H(cmd) => {
                use crate::protocol::commands::_h_upcase::Op;
                match cmd.kind {
                    Op::Other => {
                        let thread = self.resolve_thread_id(cmd.thread)?;
                        self.registry.current_thread = Some(thread);
                    }
                    Op::StepContinue => {
                        self.resume_thread = match cmd.thread.tid {
                            IdKind::All => None,
                            _ => Some(self.resolve_thread_id(cmd.thread)?),
                        };
                    }
                }
                HandlerStatus::NeedsOk
            }
            Base::T(cmd) => {
                let thread = match self.resolve_thread_id(cmd.thread) {
                    Ok(thread) => thread,
                    Err(_) => return Err(Error::NonFatalError(0x16)),
                };
                if self.registry.thread_exists(thread) {
                    HandlerStatus::NeedsOk
                } else {
                    return Err(Error::NonFatalError(0x16));
                }
            }
        };
        Ok(handler_status)
    }

    fn detach_process(&mut self, pid: u64) -> Result<(), Error<D::Error, C::Error>> {
        let mut proc = match self.registry.processes.remove(&pid) {
            Some(proc) => proc,
            None => return Err(Error::NonFatalError(0x16)),
        };
        info!("detaching from pid {:#x}", pid);
        proc.debugger.detach().handle_error()?;
        self.registry.fixup_current_thread();
        Ok(())
    }
}
