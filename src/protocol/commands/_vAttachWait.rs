use super::prelude::*;

#[derive(PartialEq, Eq, Debug)]
pub struct vAttachWait {
    /// Still PID-shifted, as it came off the wire.
    pub pid: u64,
}

impl<'a> ParseCommand<'a> for vAttachWait {
    fn from_packet(buf: PacketBuf<'a>) -> Option<Self> {
        match buf.as_body() {
            [b';', pid @ ..] => Some(vAttachWait {
                pid: decode_hex(pid).ok()?,
            }),
            _ => None,
        }
    }
}
