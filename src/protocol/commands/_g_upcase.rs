use super::prelude::*;

#[derive(Debug)]
pub struct G<'a> {
    /// The register file, already hex-decoded.
    pub vals: &'a [u8],
}

impl<'a> ParseCommand<'a> for G<'a> {
    fn from_packet(buf: PacketBuf<'a>) -> Option<Self> {
        let body = buf.into_body();
        if body.is_empty() {
            return None;
        }
        Some(G {
            vals: decode_hex_buf(body).ok()?,
        })
    }
}
