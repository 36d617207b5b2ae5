use crate::conn::Connection;
use crate::protocol::common::hex::encode_hex_nybble;

/// A thread-id as it should appear on the wire: PID already shifted, `pid`
/// present iff multiprocess syntax was negotiated.
#[derive(Debug, Clone, Copy)]
pub struct WireThreadId {
    pub pid: Option<u64>,
    pub tid: u64,
}

/// A wrapper around [`Connection`] that builds a single reply packet:
/// escaping, the running checksum, and the trailing `#xx` are handled here.
///
/// Dropping a `ResponseWriter` without calling [`flush`](ResponseWriter::flush)
/// abandons the reply (nothing has hit the wire until the first byte is
/// written, and a partially-written reply means the session is already dead).
pub struct ResponseWriter<'a, C: Connection + 'a> {
    inner: &'a mut C,
    started: bool,
    checksum: u8,
    #[cfg(feature = "trace-pkt")]
    msg: Vec<u8>,
}

impl<'a, C: Connection + 'a> ResponseWriter<'a, C> {
    pub fn new(inner: &'a mut C) -> Self {
        Self {
            inner,
            started: false,
            checksum: 0,
            #[cfg(feature = "trace-pkt")]
            msg: Vec::new(),
        }
    }

    /// Consumes self, writing out the final '#' and checksum.
    ///
    /// An empty reply (nothing written) still produces a valid `$#00`
    /// packet, which is how unsupported packets are answered.
    pub fn flush(mut self) -> Result<(), C::Error> {
        if !self.started {
            self.started = true;
            self.inner.write(b'$')?;
        }

        #[cfg(feature = "trace-pkt")]
        log::trace!(
            "--> ${}#{:02x}",
            String::from_utf8_lossy(&self.msg),
            self.checksum
        );

        let checksum = self.checksum;
        self.inner.write(b'#')?;
        self.inner.write(encode_hex_nybble(checksum >> 4))?;
        self.inner.write(encode_hex_nybble(checksum))?;
        self.inner.flush()
    }

    /// Write a single byte, escaping it if it collides with the packet
    /// grammar.
    pub fn write(&mut self, byte: u8) -> Result<(), C::Error> {
        if !self.started {
            self.started = true;
            self.inner.write(b'$')?;
        }

        #[cfg(feature = "trace-pkt")]
        self.msg.push(byte);

        let mut byte = byte;
        if matches!(byte, b'#' | b'$' | b'}' | b'*') {
            self.checksum = self.checksum.wrapping_add(b'}');
            self.inner.write(b'}')?;
            byte ^= 0x20;
        }

        self.checksum = self.checksum.wrapping_add(byte);
        self.inner.write(byte)
    }

    pub fn write_all(&mut self, data: &[u8]) -> Result<(), C::Error> {
        data.iter().try_for_each(|b| self.write(*b))
    }

    pub fn write_str(&mut self, s: &str) -> Result<(), C::Error> {
        self.write_all(s.as_bytes())
    }

    /// Write a single byte as two lowercase hex chars.
    pub fn write_hex(&mut self, byte: u8) -> Result<(), C::Error> {
        self.write(encode_hex_nybble(byte >> 4))?;
        self.write(encode_hex_nybble(byte))
    }

    /// Write an entire buffer as lowercase hex (two chars per byte).
    pub fn write_hex_buf(&mut self, data: &[u8]) -> Result<(), C::Error> {
        data.iter().try_for_each(|b| self.write_hex(*b))
    }

    /// Write a big-endian hex number, skipping leading zero bytes.
    ///
    /// A value of zero produces no output; the stub never puts a bare zero
    /// on the wire (PID 0 is shifted, and `0` literals are written as text).
    pub fn write_num(&mut self, n: u64) -> Result<(), C::Error> {
        let mut started = false;
        for offset in (0..8).rev() {
            let b = (n >> (offset * 8)) as u8;
            if !started && b == 0 {
                continue;
            }
            started = true;
            self.write_hex(b)?;
        }
        Ok(())
    }

    /// Write a thread-id in the current syntax (`pPID.TID` or `TID`).
    pub fn write_thread_id(&mut self, id: WireThreadId) -> Result<(), C::Error> {
        if let Some(pid) = id.pid {
            self.write(b'p')?;
            self.write_num(pid)?;
            self.write(b'.')?;
        }
        self.write_num(id.tid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct VecConn(Vec<u8>);

    impl Connection for VecConn {
        type Error = ();

        fn write(&mut self, byte: u8) -> Result<(), ()> {
            self.0.push(byte);
            Ok(())
        }

        fn flush(&mut self) -> Result<(), ()> {
            Ok(())
        }
    }

    fn collect(f: impl FnOnce(&mut ResponseWriter<'_, VecConn>)) -> Vec<u8> {
        let mut conn = VecConn(Vec::new());
        let mut res = ResponseWriter::new(&mut conn);
        f(&mut res);
        res.flush().unwrap();
        conn.0
    }

    #[test]
    fn empty_reply() {
        assert_eq!(collect(|_| ()), b"$#00");
    }

    #[test]
    fn ok_reply_checksum() {
        assert_eq!(collect(|res| res.write_str("OK").unwrap()), b"$OK#9a");
    }

    #[test]
    fn escapes_grammar_bytes() {
        let out = collect(|res| res.write_all(b"a#b$c}d*e").unwrap());
        let body_end = out.len() - 3;
        assert_eq!(&out[1..body_end], b"a}\x03b}\x04c}]d}\x0ae");
        // checksum covers the escaped form
        let checksum = out[1..body_end]
            .iter()
            .fold(0u8, |a, x| a.wrapping_add(*x));
        let expected = format!("{:02x}", checksum);
        assert_eq!(&out[body_end + 1..], expected.as_bytes());
    }

    #[test]
    fn hex_is_lowercase() {
        let out = collect(|res| res.write_hex_buf(&[0xde, 0xad, 0xbe, 0xef]).unwrap());
        assert_eq!(&out[1..9], b"deadbeef");
    }

    #[test]
    fn num_skips_leading_zero_bytes() {
        let out = collect(|res| res.write_num(0x1234).unwrap());
        assert_eq!(&out[1..5], b"1234");

        let out = collect(|res| res.write_num(0xdead_0000_beef).unwrap());
        assert_eq!(&out[1..13], b"dead0000beef");

        let out = collect(|res| res.write_num(0).unwrap());
        assert_eq!(out, b"$#00");
    }

    #[test]
    fn thread_id_syntax() {
        let out = collect(|res| {
            res.write_thread_id(WireThreadId {
                pid: Some(0x10),
                tid: 3,
            })
            .unwrap()
        });
        assert_eq!(&out[1..6], b"p10.3");
    }
}
