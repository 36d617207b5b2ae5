use super::prelude::*;

/// `qXfer:object:read:annex:offset,length` /
/// `qXfer:object:write:annex:offset:data`
///
/// The object name is left as-is; the stub resolves it against its
/// transfer-object table.
#[derive(Debug)]
pub struct qXfer<'a> {
    pub object: &'a [u8],
    pub annex: &'a [u8],
    pub op: QXferOp<'a>,
}

#[derive(Debug)]
pub enum QXferOp<'a> {
    Read { offset: usize, length: usize },
    Write { offset: usize, data: &'a [u8] },
}

impl<'a> ParseCommand<'a> for qXfer<'a> {
    fn from_packet(buf: PacketBuf<'a>) -> Option<Self> {
        let body = buf.into_body();

        let mut parts = body.splitn_mut(4, |b| *b == b':');
        let leading = parts.next()?;
        if !leading.is_empty() {
            return None;
        }
        let object = parts.next()?;
        let direction = parts.next()?;
        let rest = parts.next()?;

        match &*direction {
            b"read" => {
                // annex:offset,length
                let mut rest = rest.rsplitn(2, |b| *b == b':');
                let window = rest.next()?;
                let annex = rest.next()?;

                let mut window = window.split(|b| *b == b',');
                let offset = decode_hex(window.next()?).ok()?;
                let length = decode_hex(window.next()?).ok()?;

                Some(qXfer {
                    object,
                    annex,
                    op: QXferOp::Read { offset, length },
                })
            }
            b"write" => {
                // annex:offset:data
                let mut rest = rest.splitn_mut(3, |b| *b == b':');
                let annex = rest.next()?;
                let offset = decode_hex(rest.next()?).ok()?;
                let data = decode_hex_buf(rest.next()?).ok()?;

                Some(qXfer {
                    object,
                    annex,
                    op: QXferOp::Write { offset, data },
                })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_window() {
        let mut body = *b":libraries:read::0,fff";
        let cmd = qXfer::from_packet(PacketBuf::new(&mut body)).unwrap();
        assert_eq!(cmd.object, b"libraries");
        assert_eq!(cmd.annex, b"");
        match cmd.op {
            QXferOp::Read { offset, length } => {
                assert_eq!(offset, 0);
                assert_eq!(length, 0xfff);
            }
            _ => panic!("expected read"),
        }
    }

    #[test]
    fn read_second_window() {
        let mut body = *b":libraries:read::e00,200";
        let cmd = qXfer::from_packet(PacketBuf::new(&mut body)).unwrap();
        match cmd.op {
            QXferOp::Read { offset, .. } => assert_eq!(offset, 0xe00),
            _ => panic!("expected read"),
        }
    }

    #[test]
    fn write_payload() {
        let mut body = *b":settings:write:opts:10:beef";
        let cmd = qXfer::from_packet(PacketBuf::new(&mut body)).unwrap();
        assert_eq!(cmd.object, b"settings");
        assert_eq!(cmd.annex, b"opts");
        match cmd.op {
            QXferOp::Write { offset, data } => {
                assert_eq!(offset, 0x10);
                assert_eq!(data, &[0xbe, 0xef]);
            }
            _ => panic!("expected write"),
        }
    }

    #[test]
    fn bad_direction() {
        let mut body = *b":libraries:munch::0,fff";
        assert!(qXfer::from_packet(PacketBuf::new(&mut body)).is_none());
    }
}
