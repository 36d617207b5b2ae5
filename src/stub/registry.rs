//! Bookkeeping for attached processes and their threads.

use std::collections::BTreeMap;
use std::sync::atomic::Ordering;

use log::{debug, warn};

use crate::common::{Pid, Tid};
use crate::stub::stop_reason::{exception_signal, StopReason};
use crate::target::{DebugEventKind, Debugger, DeviceInterface, EventFlag, TargetResult};

/// A thread known to be alive within an attached process.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Thread {
    pub thread_id: Tid,
    pub tls_addr: u64,
}

/// An attached process and its debugger handle.
pub(crate) struct Process<D: DeviceInterface> {
    pub pid: Pid,
    pub debugger: D::Debugger,
    /// Exactly the TIDs currently known attached, in TID order.
    pub threads: BTreeMap<Tid, Thread>,
    /// The subset of threads last resumed.
    pub running_thread_ids: Vec<Tid>,
    /// Set by the RPC layer when debug events are queued.
    pub has_events: EventFlag,
    pub running: bool,
}

/// A non-owning reference to a thread: resolved against the registry on
/// every use, so a vanished thread is caught instead of dangling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadRef {
    pub pid: Pid,
    pub tid: Tid,
}

/// What one event-drain pass amounted to.
#[derive(Debug, Default)]
pub(crate) struct IngestOutcome {
    /// The process quiesced (exception or process exit).
    pub stopped: bool,
    /// New session-level stop reason, if any.
    pub stop_reason: Option<StopReason>,
    /// Thread-event notifications to relay (only populated when
    /// `QThreadEvents` is on).
    pub notifications: Vec<StopReason>,
}

pub(crate) struct Registry<D: DeviceInterface> {
    pub processes: BTreeMap<Pid, Process<D>>,
    /// Selected by `H g`; re-resolved whenever threads vanish.
    pub current_thread: Option<ThreadRef>,
}

impl<D: DeviceInterface> Registry<D> {
    pub fn new() -> Registry<D> {
        Registry {
            processes: BTreeMap::new(),
            current_thread: None,
        }
    }

    /// Insert a freshly-attached process, wiring up its async event flag.
    pub fn insert_process(
        &mut self,
        pid: Pid,
        mut debugger: D::Debugger,
    ) -> TargetResult<(), D::Error> {
        let has_events = EventFlag::default();
        debugger.arm_async_wait(has_events.clone())?;
        self.processes.insert(
            pid,
            Process {
                pid,
                debugger,
                threads: BTreeMap::new(),
                running_thread_ids: Vec::new(),
                has_events,
                running: false,
            },
        );
        Ok(())
    }

    pub fn process_mut(&mut self, pid: Pid) -> Option<&mut Process<D>> {
        self.processes.get_mut(&pid)
    }

    pub fn thread_exists(&self, thread: ThreadRef) -> bool {
        self.processes
            .get(&thread.pid)
            .map(|p| p.threads.contains_key(&thread.tid))
            .unwrap_or(false)
    }

    pub fn first_thread_of(&self, pid: Pid) -> Option<ThreadRef> {
        let proc = self.processes.get(&pid)?;
        let tid = proc.threads.keys().next()?;
        Some(ThreadRef { pid, tid: *tid })
    }

    pub fn first_thread(&self) -> Option<ThreadRef> {
        self.processes
            .keys()
            .find_map(|pid| self.first_thread_of(*pid))
    }

    pub fn thread(&self, thread: ThreadRef) -> Option<&Thread> {
        self.processes.get(&thread.pid)?.threads.get(&thread.tid)
    }

    /// Re-point `current_thread` somewhere sane after threads or processes
    /// disappear.
    pub fn fixup_current_thread(&mut self) {
        match self.current_thread {
            Some(cur) if self.thread_exists(cur) => {}
            _ => self.current_thread = self.first_thread(),
        }
    }

    /// True if any attached process has signalled queued debug events.
    pub fn has_pending_events(&self) -> bool {
        self.processes
            .values()
            .any(|p| p.has_events.load(Ordering::Acquire))
    }

    /// Snapshot of every process's event flag, for the event loop to wait
    /// on.
    pub fn event_flags(&self) -> Vec<EventFlag> {
        self.processes
            .values()
            .map(|p| p.has_events.clone())
            .collect()
    }

    /// Drain the debug-event queue of one process.
    ///
    /// Clears the process's event flag _before_ draining (a set-after-drain
    /// re-wakes the loop rather than getting lost), and re-arms the async
    /// wait afterwards. Returns what the drain amounted to.
    pub fn ingest_events(
        &mut self,
        pid: Pid,
        thread_events_enabled: bool,
    ) -> TargetResult<IngestOutcome, D::Error> {
        let mut outcome = IngestOutcome::default();
        let mut process_exited = false;

        {
            let proc = match self.processes.get_mut(&pid) {
                Some(proc) => proc,
                None => return Ok(outcome),
            };

            proc.has_events.store(false, Ordering::Release);

            while let Some(event) = proc.debugger.get_debug_event()? {
                debug!("pid {:#x} debug event: {:?}", pid, event);
                match event.kind {
                    DebugEventKind::AttachProcess { .. } => {
                        // registry state already reflects the attach
                    }
                    DebugEventKind::AttachThread {
                        thread_id,
                        tls_pointer,
                        ..
                    } => {
                        proc.threads.insert(
                            thread_id,
                            Thread {
                                thread_id,
                                tls_addr: tls_pointer,
                            },
                        );
                        if thread_events_enabled {
                            outcome.notifications.push(StopReason::ThreadCreated {
                                thread: ThreadRef {
                                    pid,
                                    tid: thread_id,
                                },
                            });
                        }
                    }
                    DebugEventKind::ExitThread { .. } => {
                        if proc.threads.remove(&event.thread_id).is_none() {
                            warn!(
                                "exit event for unknown thread {:#x} of pid {:#x}",
                                event.thread_id, pid
                            );
                        }
                        if thread_events_enabled {
                            outcome.notifications.push(StopReason::ThreadExited {
                                thread: ThreadRef {
                                    pid,
                                    tid: event.thread_id,
                                },
                            });
                        }
                    }
                    DebugEventKind::ExitProcess { .. } => {
                        process_exited = true;
                        outcome.stopped = true;
                        outcome.stop_reason = Some(StopReason::Exited {
                            pid: Some(pid),
                            status: 0,
                        });
                    }
                    DebugEventKind::Exception(exception) => {
                        let tid = if event.thread_id != 0 {
                            event.thread_id
                        } else {
                            proc.threads.keys().next().copied().unwrap_or(0)
                        };
                        proc.running = false;
                        outcome.stopped = true;
                        outcome.stop_reason = Some(StopReason::Signal {
                            signal: exception_signal(exception.exception_type),
                            thread: ThreadRef { pid, tid },
                        });
                    }
                }
            }

            if !process_exited {
                let flag = proc.has_events.clone();
                proc.debugger.arm_async_wait(flag)?;
            }
        }

        if process_exited {
            self.processes.remove(&pid);
        }
        self.fixup_current_thread();

        Ok(outcome)
    }
}

/// Iteration state for the paginated `qfThreadInfo`/`qsThreadInfo`
/// exchange. Holds `(pid, tid)` keys rather than iterators, so threads
/// appearing or vanishing mid-exchange cannot invalidate it.
#[derive(Debug, Default)]
pub(crate) struct ThreadInfoCursor {
    valid: bool,
    pos: Option<(Pid, Tid)>,
}

impl ThreadInfoCursor {
    pub fn start(&mut self) {
        self.valid = true;
        self.pos = None;
    }

    /// Up to `cap` thread refs past the cursor, in `(pid, tid)` order.
    /// An empty result means the listing is done (and invalidates the
    /// cursor).
    pub fn next_chunk<D: DeviceInterface>(
        &mut self,
        registry: &Registry<D>,
        cap: usize,
    ) -> Vec<ThreadRef> {
        let mut out = Vec::new();
        if !self.valid {
            return out;
        }

        'scan: for (pid, proc) in registry.processes.iter() {
            if let Some((cur_pid, _)) = self.pos {
                if *pid < cur_pid {
                    continue;
                }
            }
            for tid in proc.threads.keys() {
                if let Some(pos) = self.pos {
                    if (*pid, *tid) <= pos {
                        continue;
                    }
                }
                out.push(ThreadRef {
                    pid: *pid,
                    tid: *tid,
                });
                self.pos = Some((*pid, *tid));
                if out.len() == cap {
                    break 'scan;
                }
            }
        }

        if out.is_empty() {
            self.valid = false;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::{
        ContinueFlags, DebugEvent, LoadedModuleInfo, MemoryInfo, RegisterSet, TargetError,
        ThreadContext,
    };

    struct NullDebugger;

    impl Debugger for NullDebugger {
        type Error = ();

        fn detach(&mut self) -> TargetResult<(), ()> {
            Ok(())
        }
        fn break_process(&mut self) -> TargetResult<(), ()> {
            Ok(())
        }
        fn continue_debug_event(
            &mut self,
            _flags: ContinueFlags,
            _thread_ids: &[Tid],
        ) -> TargetResult<(), ()> {
            Ok(())
        }
        fn get_thread_context(&mut self, _tid: Tid) -> TargetResult<ThreadContext, ()> {
            Err(TargetError::NonFatal)
        }
        fn set_thread_context(
            &mut self,
            _tid: Tid,
            _ctx: &ThreadContext,
            _mask: RegisterSet,
        ) -> TargetResult<(), ()> {
            Err(TargetError::NonFatal)
        }
        fn read_memory(&mut self, _addr: u64, _len: usize) -> TargetResult<Vec<u8>, ()> {
            Err(TargetError::NonFatal)
        }
        fn write_memory(&mut self, _addr: u64, _data: &[u8]) -> TargetResult<(), ()> {
            Err(TargetError::NonFatal)
        }
        fn query_memory(&mut self, _addr: u64) -> TargetResult<MemoryInfo, ()> {
            Err(TargetError::NonFatal)
        }
        fn get_nso_infos(&mut self) -> TargetResult<Vec<LoadedModuleInfo>, ()> {
            Ok(Vec::new())
        }
        fn get_debug_event(&mut self) -> TargetResult<Option<DebugEvent>, ()> {
            Ok(None)
        }
        fn arm_async_wait(&mut self, _flag: EventFlag) -> TargetResult<(), ()> {
            Ok(())
        }
    }

    struct NullDevice;

    impl DeviceInterface for NullDevice {
        type Error = ();
        type Debugger = NullDebugger;

        fn attach(&mut self, _pid: Pid) -> TargetResult<NullDebugger, ()> {
            Ok(NullDebugger)
        }
        fn attach_wait(&mut self, _pid: Pid) -> TargetResult<NullDebugger, ()> {
            Ok(NullDebugger)
        }
    }

    fn registry_with(threads: &[(Pid, Tid)]) -> Registry<NullDevice> {
        let mut registry = Registry::new();
        for (pid, tid) in threads {
            if registry.processes.get(pid).is_none() {
                registry.insert_process(*pid, NullDebugger).unwrap();
            }
            registry.process_mut(*pid).unwrap().threads.insert(
                *tid,
                Thread {
                    thread_id: *tid,
                    tls_addr: 0,
                },
            );
        }
        registry
    }

    #[test]
    fn pagination_lists_each_thread_once_in_order() {
        let registry = registry_with(&[(1, 3), (1, 1), (2, 7), (2, 2), (5, 1)]);

        let mut cursor = ThreadInfoCursor::default();
        cursor.start();

        let mut listed = Vec::new();
        loop {
            let chunk = cursor.next_chunk(&registry, 2);
            if chunk.is_empty() {
                break;
            }
            listed.extend(chunk);
        }

        let expected: Vec<(Pid, Tid)> = vec![(1, 1), (1, 3), (2, 2), (2, 7), (5, 1)];
        let listed: Vec<(Pid, Tid)> = listed.iter().map(|t| (t.pid, t.tid)).collect();
        assert_eq!(listed, expected);

        // cursor is spent until restarted
        assert!(cursor.next_chunk(&registry, 2).is_empty());
    }

    #[test]
    fn cursor_without_start_yields_nothing() {
        let registry = registry_with(&[(1, 1)]);
        let mut cursor = ThreadInfoCursor::default();
        assert!(cursor.next_chunk(&registry, 16).is_empty());
    }

    #[test]
    fn current_thread_fixup_on_thread_exit() {
        let mut registry = registry_with(&[(1, 1), (1, 2)]);
        registry.current_thread = Some(ThreadRef { pid: 1, tid: 2 });

        registry.process_mut(1).unwrap().threads.remove(&2);
        registry.fixup_current_thread();
        assert_eq!(registry.current_thread, Some(ThreadRef { pid: 1, tid: 1 }));

        registry.process_mut(1).unwrap().threads.remove(&1);
        registry.fixup_current_thread();
        assert_eq!(registry.current_thread, None);
    }
}
