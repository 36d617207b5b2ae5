use bitflags::bitflags;

/// One region of a process's address space, as the kernel reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryInfo {
    pub base_addr: u64,
    pub size: u64,
    pub memory_type: MemoryType,
    pub memory_attribute: MemoryAttribute,
    pub permission: MemoryPermission,
    pub device_ref_count: u32,
    pub ipc_ref_count: u32,
    pub padding: u32,
}

/// Kernel memory state. The low 8 bits are the memory type enumeration;
/// the rest are state bits the stub carries but does not interpret.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MemoryType(pub u32);

#[rustfmt::skip]
impl MemoryType {
    pub const UNMAPPED:              Self = Self(0x00);
    pub const IO:                    Self = Self(0x01);
    pub const NORMAL:                Self = Self(0x02);
    pub const CODE_STATIC:           Self = Self(0x03);
    pub const CODE_MUTABLE:          Self = Self(0x04);
    pub const HEAP:                  Self = Self(0x05);
    pub const SHARED_MEM:            Self = Self(0x06);
    pub const WEIRD_SHARED_MEM:      Self = Self(0x07);
    pub const MODULE_CODE_STATIC:    Self = Self(0x08);
    pub const MODULE_CODE_MUTABLE:   Self = Self(0x09);
    pub const IPC_BUFFER_0:          Self = Self(0x0a);
    pub const MAPPED_MEMORY:         Self = Self(0x0b);
    pub const THREAD_LOCAL:          Self = Self(0x0c);
    pub const TRANSFER_MEM_ISOLATED: Self = Self(0x0d);
    pub const TRANSFER_MEM:          Self = Self(0x0e);
    pub const PROCESS_MEM:           Self = Self(0x0f);
    pub const RESERVED:              Self = Self(0x10);
    pub const IPC_BUFFER_1:          Self = Self(0x11);
    pub const IPC_BUFFER_3:          Self = Self(0x12);
    pub const KERNEL_STACK:          Self = Self(0x13);
    pub const JIT_READ_ONLY:         Self = Self(0x14);
    pub const JIT_WRITABLE:          Self = Self(0x15);
}

impl MemoryType {
    /// The memory-type enumeration in the low 8 bits.
    pub fn base_type(self) -> MemoryType {
        MemoryType(self.0 & 0xff)
    }

    /// Human-readable name, for monitor-command output.
    pub fn name(self) -> &'static str {
        match self.base_type() {
            Self::UNMAPPED => "unmapped",
            Self::IO => "io",
            Self::NORMAL => "normal",
            Self::CODE_STATIC => "code-static",
            Self::CODE_MUTABLE => "code-mutable",
            Self::HEAP => "heap",
            Self::SHARED_MEM => "shared-mem",
            Self::WEIRD_SHARED_MEM => "weird-shared-mem",
            Self::MODULE_CODE_STATIC => "module-code-static",
            Self::MODULE_CODE_MUTABLE => "module-code-mutable",
            Self::IPC_BUFFER_0 => "ipc-buffer-0",
            Self::MAPPED_MEMORY => "mapped-memory",
            Self::THREAD_LOCAL => "thread-local",
            Self::TRANSFER_MEM_ISOLATED => "transfer-mem-isolated",
            Self::TRANSFER_MEM => "transfer-mem",
            Self::PROCESS_MEM => "process-mem",
            Self::RESERVED => "reserved",
            Self::IPC_BUFFER_1 => "ipc-buffer-1",
            Self::IPC_BUFFER_3 => "ipc-buffer-3",
            Self::KERNEL_STACK => "kernel-stack",
            Self::JIT_READ_ONLY => "jit-read-only",
            Self::JIT_WRITABLE => "jit-writable",
            _ => "unknown",
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MemoryAttribute: u32 {
        const BORROWED      = 1 << 0;
        const IPC_MAPPED    = 1 << 1;
        const DEVICE_MAPPED = 1 << 2;
        const UNCACHED      = 1 << 3;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MemoryPermission: u32 {
        const R = 1 << 0;
        const W = 1 << 1;
        const X = 1 << 2;
        const DONT_CARE = 1 << 28;
    }
}

impl MemoryPermission {
    /// `rwx`-style rendering for monitor-command output.
    pub fn display(self) -> [u8; 3] {
        let mut out = *b"---";
        if self.contains(MemoryPermission::R) {
            out[0] = b'r';
        }
        if self.contains(MemoryPermission::W) {
            out[1] = b'w';
        }
        if self.contains(MemoryPermission::X) {
            out[2] = b'x';
        }
        out
    }
}

bitflags! {
    /// Flags for
    /// [`Debugger::continue_debug_event`](crate::target::Debugger::continue_debug_event).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ContinueFlags: u32 {
        /// Mark the exception as handled (don't re-deliver it).
        const EXCEPTION_HANDLED = 1 << 0;
        /// Keep exception events enabled.
        const ENABLE_EXCEPTION_EVENT = 1 << 1;
        /// Resume every thread, not just the listed ones.
        const CONTINUE_ALL = 1 << 2;
    }
}
