//! Common types and definitions used across `gdbridge`.

mod signal;

pub use self::signal::Signal;

/// Process ID, as reported by the debug monitor.
///
/// The monitor's PID 0 is a valid process; it never appears on the wire
/// verbatim (see the PID shifting rules in [`crate::stub`]).
pub type Pid = u64;

/// Thread ID, as reported by the debug monitor.
pub type Tid = u64;
