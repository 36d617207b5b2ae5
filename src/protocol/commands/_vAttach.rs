use super::prelude::*;

#[derive(PartialEq, Eq, Debug)]
pub struct vAttach {
    /// Still PID-shifted, as it came off the wire.
    pub pid: u64,
}

impl<'a> ParseCommand<'a> for vAttach {
    fn from_packet(buf: PacketBuf<'a>) -> Option<Self> {
        match buf.as_body() {
            [b';', pid @ ..] => Some(vAttach {
                pid: decode_hex(pid).ok()?,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pid() {
        let mut body = *b";10";
        let cmd = vAttach::from_packet(PacketBuf::new(&mut body)).unwrap();
        assert_eq!(cmd.pid, 0x10);
    }

    #[test]
    fn rejects_missing_pid() {
        let mut body = *b"";
        assert!(vAttach::from_packet(PacketBuf::new(&mut body)).is_none());
    }
}
