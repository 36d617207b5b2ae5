use super::prelude::*;

#[derive(Debug)]
pub struct qRcmd<'a> {
    /// The command line, already hex-decoded.
    pub cmd: &'a [u8],
}

impl<'a> ParseCommand<'a> for qRcmd<'a> {
    fn from_packet(buf: PacketBuf<'a>) -> Option<Self> {
        match buf.into_body() {
            [] => Some(qRcmd { cmd: &[] }),
            [b',', hex_cmd @ ..] => Some(qRcmd {
                cmd: decode_hex_buf(hex_cmd).ok()?,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_command_line() {
        let mut body = *b",68656c70"; // "help"
        let cmd = qRcmd::from_packet(PacketBuf::new(&mut body)).unwrap();
        assert_eq!(cmd.cmd, b"help");
    }
}
