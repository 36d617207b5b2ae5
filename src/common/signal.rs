/// The subset of signal numbers the stub reports in stop replies.
///
/// The console's kernel has no POSIX signals; these are the conventional
/// numbers GDB expects to see for the corresponding fault classes.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Signal(pub u8);

#[allow(clippy::upper_case_acronyms)]
#[rustfmt::skip]
impl Signal {
    #[doc = "Illegal instruction"]    pub const SIGILL:  Self = Self(4);
    #[doc = "Trace/breakpoint trap"]  pub const SIGTRAP: Self = Self(5);
    #[doc = "Bus error"]              pub const SIGBUS:  Self = Self(7);
    #[doc = "Segmentation fault"]     pub const SIGSEGV: Self = Self(11);
}
