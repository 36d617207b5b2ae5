use super::prelude::*;

#[derive(PartialEq, Eq, Debug)]
pub struct QThreadEvents {
    pub enable: bool,
}

impl<'a> ParseCommand<'a> for QThreadEvents {
    fn from_packet(buf: PacketBuf<'a>) -> Option<Self> {
        let enable = match buf.as_body() {
            b":0" => false,
            b":1" => true,
            _ => return None,
        };
        Some(QThreadEvents { enable })
    }
}
