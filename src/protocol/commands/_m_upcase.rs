use super::prelude::*;

#[derive(Debug)]
pub struct M<'a> {
    pub addr: u64,
    /// Payload, already hex-decoded.
    pub val: &'a [u8],
}

impl<'a> ParseCommand<'a> for M<'a> {
    fn from_packet(buf: PacketBuf<'a>) -> Option<Self> {
        let body = buf.into_body();

        let mut split = body.splitn_mut(2, |b| *b == b':');
        let header = split.next()?;
        let val = split.next()?;

        let mut header = header.split(|b| *b == b',');
        let addr = decode_hex(header.next()?).ok()?;
        let len: usize = decode_hex(header.next()?).ok()?;

        let val = decode_hex_buf(val).ok()?;
        if val.len() != len {
            return None;
        }

        Some(M { addr, val })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_write() {
        let mut body = *b"2000,2:beef";
        let cmd = M::from_packet(PacketBuf::new(&mut body)).unwrap();
        assert_eq!(cmd.addr, 0x2000);
        assert_eq!(cmd.val, &[0xbe, 0xef]);
    }

    #[test]
    fn length_mismatch() {
        let mut body = *b"2000,3:beef";
        assert!(M::from_packet(PacketBuf::new(&mut body)).is_none());
    }
}
