use crate::common::{Pid, Tid};

/// A debug event popped from a process's event queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugEvent {
    /// Kernel event flags (bit 0: the event stops the process).
    pub flags: u32,
    /// The thread the event pertains to; 0 for process-scoped events.
    pub thread_id: Tid,
    pub kind: DebugEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebugEventKind {
    AttachProcess {
        title_id: u64,
        process_id: Pid,
        process_name: [u8; 12],
        mmu_flags: u32,
        /// \[5.0.0+\]
        user_exception_context_addr: u64,
    },
    AttachThread {
        thread_id: Tid,
        tls_pointer: u64,
        entrypoint: u64,
    },
    ExitProcess {
        exit_type: ExitType,
    },
    ExitThread {
        exit_type: ExitType,
    },
    Exception(Exception),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u64)]
pub enum ExitType {
    PausedThread = 0,
    RunningThread = 1,
    ExitedProcess = 2,
    TerminatedProcess = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exception {
    pub exception_type: ExceptionType,
    pub fault_register: u64,
    pub info: ExceptionInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ExceptionType {
    Trap = 0,
    InstructionAbort = 1,
    DataAbortMisc = 2,
    PcSpAlignmentFault = 3,
    DebuggerAttached = 4,
    BreakPoint = 5,
    UserBreak = 6,
    DebuggerBreak = 7,
    BadSvcId = 8,
    SError = 9,
}

/// Per-exception-class payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionInfo {
    None,
    UndefinedInstruction { opcode: u32 },
    BreakPoint { is_watchpoint: bool },
    UserBreak { info0: u32, info1: u64, info2: u64 },
    BadSvcId { svc_id: u32 },
}
