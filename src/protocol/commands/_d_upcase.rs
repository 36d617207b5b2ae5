use super::prelude::*;

#[derive(PartialEq, Eq, Debug)]
pub struct D {
    /// Still PID-shifted, as it came off the wire.
    pub pid: Option<u64>,
}

impl<'a> ParseCommand<'a> for D {
    fn from_packet(buf: PacketBuf<'a>) -> Option<Self> {
        match buf.as_body() {
            [] => Some(D { pid: None }),
            [b';', pid @ ..] => Some(D {
                pid: Some(decode_hex(pid).ok()?),
            }),
            _ => None,
        }
    }
}
