use super::prelude::*;
use super::unshift_pid;
use crate::common::{Pid, Signal};
use crate::protocol::commands::ext::Resume;
use crate::protocol::commands::_vCont::{vCont, Actions, VContKind};
use crate::protocol::common::thread_id::IdKind;
use crate::stub::stop_reason::StopReason;
use crate::target::ContinueFlags;

use log::info;
use std::collections::BTreeSet;

impl<D: DeviceInterface, C: Connection> GdbStubImpl<D, C> {
    pub(crate) fn handle_resume(
        &mut self,
        res: &mut ResponseWriter<'_, C>,
        command: Resume<'_>,
    ) -> Result<HandlerStatus, Error<D::Error, C::Error>> {
        let handler_status = match command {
            Resume::vCont(cmd) => match cmd {
                vCont::Query => {
                    res.write_str("vCont;c;C;s;S;t")
                        .map_err(Error::conn_write)?;
                    HandlerStatus::Handled
                }
                vCont::Actions(actions) => self.do_vcont(res, actions)?,
            },
            Resume::vAttach(cmd) => self.do_attach(res, unshift_pid(cmd.pid), false)?,
            Resume::vAttachWait(cmd) => self.do_attach(res, unshift_pid(cmd.pid), true)?,
        };
        Ok(handler_status)
    }

    fn do_vcont(
        &mut self,
        res: &mut ResponseWriter<'_, C>,
        actions: Actions<'_>,
    ) -> Result<HandlerStatus, Error<D::Error, C::Error>> {
        // a queued thread-event notification takes the place of this
        // resume's stop reply; GDB will resume again to collect the rest
        if let Some(notification) = self.pending_notifications.pop_front() {
            self.write_stop_reason(res, notification)?;
            return Ok(HandlerStatus::Handled);
        }

        // first action wins for any given process
        let mut claimed: BTreeSet<Pid> = BTreeSet::new();

        for action in actions.iter() {
            let action = action.ok_or(Error::NonFatalError(1))?;
            match action.kind {
                VContKind::Continue | VContKind::ContinueWithSig(_) => {
                    let pids = self.action_scope(action.thread)?;
                    for pid in pids {
                        if !claimed.insert(pid) {
                            continue;
                        }
                        self.continue_process(pid, None)?;
                    }
                }
                VContKind::Step | VContKind::StepWithSig(_) => {
                    // the monitor has no hardware single-step; step degrades
                    // to resuming only the named thread
                    let thread = match action.thread {
                        Some(id) if id.tid != IdKind::All => self.resolve_thread_id(id)?,
                        _ => match self.resume_thread.or(self.registry.current_thread) {
                            Some(thread) => thread,
                            None => return Err(Error::NonFatalError(1)),
                        },
                    };
                    if claimed.insert(thread.pid) {
                        self.continue_process(thread.pid, Some(thread.tid))?;
                    }
                }
                VContKind::Stop => {
                    let pids = self.action_scope(action.thread)?;
                    for pid in pids {
                        if !claimed.insert(pid) {
                            continue;
                        }
                        if let Some(proc) = self.registry.process_mut(pid) {
                            proc.debugger.break_process().handle_error()?;
                        }
                    }
                }
            }
        }

        self.waiting_for_stop = true;
        Ok(HandlerStatus::DeferredStopReason)
    }

    /// The set of attached PIDs an action's thread-id selects.
    fn action_scope(
        &mut self,
        thread: Option<crate::protocol::common::thread_id::ThreadId>,
    ) -> Result<Vec<Pid>, Error<D::Error, C::Error>> {
        let all = || -> Vec<Pid> { self.registry.processes.keys().copied().collect() };
        match thread {
            None => Ok(all()),
            Some(id) => match id.pid {
                Some(IdKind::All) | None => Ok(all()),
                Some(IdKind::Any) => Ok(self
                    .registry
                    .current_thread
                    .map(|t| vec![t.pid])
                    .unwrap_or_else(all)),
                Some(IdKind::WithId(pid)) => Ok(vec![unshift_pid(pid)]),
            },
        }
    }

    fn continue_process(
        &mut self,
        pid: Pid,
        only_tid: Option<u64>,
    ) -> Result<(), Error<D::Error, C::Error>> {
        let proc = match self.registry.process_mut(pid) {
            Some(proc) => proc,
            None => return Err(Error::NonFatalError(0x16)),
        };

        match only_tid {
            Some(tid) => {
                proc.debugger
                    .continue_debug_event(ContinueFlags::EXCEPTION_HANDLED, &[tid])
                    .handle_error()?;
                proc.running_thread_ids = vec![tid];
            }
            None => {
                proc.debugger
                    .continue_debug_event(
                        ContinueFlags::EXCEPTION_HANDLED | ContinueFlags::CONTINUE_ALL,
                        &[],
                    )
                    .handle_error()?;
                proc.running_thread_ids = proc.threads.keys().copied().collect();
            }
        }
        proc.running = true;
        Ok(())
    }

    fn do_attach(
        &mut self,
        res: &mut ResponseWriter<'_, C>,
        pid: Pid,
        wait: bool,
    ) -> Result<HandlerStatus, Error<D::Error, C::Error>> {
        info!(
            "attaching to pid {:#x}{}",
            pid,
            if wait { " (wait)" } else { "" }
        );

        let debugger = if wait {
            self.device.attach_wait(pid).handle_error()?
        } else {
            self.device.attach(pid).handle_error()?
        };
        self.registry.insert_process(pid, debugger).handle_error()?;

        // the kernel front-loads attach/thread events plus a
        // debugger-attached exception; drain them now
        self.ingest_events_for(pid)?;

        if let Some(thread) = self.registry.first_thread_of(pid) {
            self.registry.current_thread = Some(thread);
        }

        let reason = if self.stop_pending {
            self.stop_pending = false;
            self.stop_reason
        } else {
            // no exception surfaced yet; synthesize the attach trap on the
            // process's first thread
            let thread = self
                .registry
                .first_thread_of(pid)
                .ok_or(Error::NonFatalError(1))?;
            StopReason::Signal {
                signal: Signal::SIGTRAP,
                thread,
            }
        };
        self.stop_reason = reason;
        self.write_stop_reason(res, reason)?;
        Ok(HandlerStatus::Handled)
    }
}
