use super::prelude::*;

#[derive(PartialEq, Eq, Debug)]
pub struct T {
    pub thread: ThreadId,
}

impl<'a> ParseCommand<'a> for T {
    fn from_packet(buf: PacketBuf<'a>) -> Option<Self> {
        Some(T {
            thread: ThreadId::try_from(buf.as_body()).ok()?,
        })
    }
}
