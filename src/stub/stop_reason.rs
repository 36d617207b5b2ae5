//! Stop reasons reported back to the GDB client.

use crate::common::{Pid, Signal};
use crate::stub::registry::ThreadRef;
use crate::target::ExceptionType;

/// Why the target last quiesced. Rendered into a `W…`/`T…` stop-reply
/// packet at the protocol edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The process exited. `pid` is `None` before anything was ever
    /// attached (the initial `?` reply is a bare `W00`).
    Exited { pid: Option<Pid>, status: u8 },
    /// A thread took a fault or breakpoint.
    Signal { signal: Signal, thread: ThreadRef },
    /// A thread came into existence (reported only with `QThreadEvents:1`).
    ThreadCreated { thread: ThreadRef },
    /// A thread exited (reported only with `QThreadEvents:1`).
    ThreadExited { thread: ThreadRef },
}

impl Default for StopReason {
    fn default() -> Self {
        StopReason::Exited {
            pid: None,
            status: 0,
        }
    }
}

/// The signal number GDB should see for a given exception class.
pub(crate) fn exception_signal(ty: ExceptionType) -> Signal {
    use ExceptionType::*;
    match ty {
        Trap => Signal::SIGTRAP,
        InstructionAbort | DataAbortMisc => Signal::SIGSEGV,
        PcSpAlignmentFault | SError => Signal::SIGBUS,
        DebuggerAttached | BreakPoint | UserBreak | DebuggerBreak => Signal::SIGTRAP,
        BadSvcId => Signal::SIGILL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_classes_map_to_conventional_signals() {
        assert_eq!(exception_signal(ExceptionType::Trap), Signal::SIGTRAP);
        assert_eq!(
            exception_signal(ExceptionType::InstructionAbort),
            Signal::SIGSEGV
        );
        assert_eq!(
            exception_signal(ExceptionType::DataAbortMisc),
            Signal::SIGSEGV
        );
        assert_eq!(
            exception_signal(ExceptionType::PcSpAlignmentFault),
            Signal::SIGBUS
        );
        assert_eq!(exception_signal(ExceptionType::BadSvcId), Signal::SIGILL);
        assert_eq!(exception_signal(ExceptionType::SError), Signal::SIGBUS);
        assert_eq!(
            exception_signal(ExceptionType::DebuggerAttached),
            Signal::SIGTRAP
        );
    }
}
