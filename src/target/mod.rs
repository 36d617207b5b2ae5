//! The seam between the stub and the debug monitor's RPC client.
//!
//! The stub consumes two traits: [`DeviceInterface`] (one per device, hands
//! out debuggers) and [`Debugger`] (one per attached process). A concrete
//! RPC client implements both; the stub never sees sockets or wire formats,
//! only these operations.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::common::{Pid, Tid};

mod context;
mod event;
mod memory;
mod module;

pub use context::{RegisterSet, ThreadContext, NUM_REGISTERS};
pub use event::{DebugEvent, DebugEventKind, Exception, ExceptionInfo, ExceptionType, ExitType};
pub use memory::{ContinueFlags, MemoryAttribute, MemoryInfo, MemoryPermission, MemoryType};
pub use module::LoadedModuleInfo;

/// Per-process asynchronous event signal.
///
/// The RPC layer sets the flag (from whatever thread its transport runs on)
/// when the process has debug events queued; the stub clears it before
/// draining and re-arms the wait. Edge-triggered: one set may cover many
/// queued events.
pub type EventFlag = Arc<AtomicBool>;

/// An error that may occur while servicing a debug RPC.
#[derive(Debug)]
pub enum TargetError<E> {
    /// The operation failed for a reason the session can survive. GDB gets
    /// a generic `E01`.
    NonFatal,
    /// As `NonFatal`, with a specific errno-style code for the `Exx` reply.
    Errno(u8),
    /// The RPC channel itself is gone. Tears down the session.
    Fatal(E),
}

/// A shorthand for the [`TargetError`]-flavored result type used by the RPC
/// seam.
pub type TargetResult<T, E> = Result<T, TargetError<E>>;

/// A handle to the debug monitor on one device.
pub trait DeviceInterface {
    /// Error type shared by the device and its debuggers.
    type Error;
    /// The per-process debugger handle this device hands out.
    type Debugger: Debugger<Error = Self::Error>;

    /// Open a debugger for a running process.
    fn attach(&mut self, pid: Pid) -> TargetResult<Self::Debugger, Self::Error>;

    /// Open a debugger for `pid`, blocking monitor-side until such a process
    /// exists (used to catch a process right at launch).
    fn attach_wait(&mut self, pid: Pid) -> TargetResult<Self::Debugger, Self::Error>;
}

/// A debugger bound to one attached process.
///
/// Register state is never cached by the stub; every `g`/`G` goes through
/// [`get_thread_context`](Debugger::get_thread_context) /
/// [`set_thread_context`](Debugger::set_thread_context).
pub trait Debugger {
    type Error;

    /// Detach from the process, resuming it.
    fn detach(&mut self) -> TargetResult<(), Self::Error>;

    /// Ask the kernel to suspend the process, queueing a debug event.
    fn break_process(&mut self) -> TargetResult<(), Self::Error>;

    /// Resume from the last debug event. An empty `thread_ids` resumes
    /// whatever `flags` says (typically everything, via
    /// [`ContinueFlags::CONTINUE_ALL`]).
    fn continue_debug_event(
        &mut self,
        flags: ContinueFlags,
        thread_ids: &[Tid],
    ) -> TargetResult<(), Self::Error>;

    fn get_thread_context(&mut self, tid: Tid) -> TargetResult<ThreadContext, Self::Error>;

    fn set_thread_context(
        &mut self,
        tid: Tid,
        ctx: &ThreadContext,
        mask: RegisterSet,
    ) -> TargetResult<(), Self::Error>;

    fn read_memory(&mut self, addr: u64, len: usize) -> TargetResult<Vec<u8>, Self::Error>;

    fn write_memory(&mut self, addr: u64, data: &[u8]) -> TargetResult<(), Self::Error>;

    /// Query the memory region containing `addr`.
    fn query_memory(&mut self, addr: u64) -> TargetResult<MemoryInfo, Self::Error>;

    /// Enumerate the process's loaded executable modules.
    fn get_nso_infos(&mut self) -> TargetResult<Vec<LoadedModuleInfo>, Self::Error>;

    /// Pop the next queued debug event; `None` when the queue is drained.
    fn get_debug_event(&mut self) -> TargetResult<Option<DebugEvent>, Self::Error>;

    /// Arm a one-shot asynchronous wait: `flag` is set once the process has
    /// debug events queued. Re-armed by the stub after every drain.
    fn arm_async_wait(&mut self, flag: EventFlag) -> TargetResult<(), Self::Error>;
}
