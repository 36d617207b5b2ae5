use super::prelude::*;

#[derive(Debug)]
pub struct qThreadExtraInfo {
    pub thread: ThreadId,
}

impl<'a> ParseCommand<'a> for qThreadExtraInfo {
    fn from_packet(buf: PacketBuf<'a>) -> Option<Self> {
        match buf.as_body() {
            [b',', thread @ ..] => Some(qThreadExtraInfo {
                thread: ThreadId::try_from(thread).ok()?,
            }),
            _ => None,
        }
    }
}
