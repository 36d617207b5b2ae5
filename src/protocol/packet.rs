/// A view over a framed, checksum-verified, unescaped packet body.
///
/// Command parsers whittle the view down (via
/// [`strip_prefix`](PacketBuf::strip_prefix)) before taking the remaining
/// body apart. The body is mutable so hex fields can be decoded in place.
pub struct PacketBuf<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> PacketBuf<'a> {
    pub fn new(buf: &'a mut [u8]) -> PacketBuf<'a> {
        PacketBuf { buf, pos: 0 }
    }

    /// If the current body starts with `prefix`, consume it and return true.
    pub fn strip_prefix(&mut self, prefix: &[u8]) -> bool {
        if self.buf[self.pos..].starts_with(prefix) {
            self.pos += prefix.len();
            true
        } else {
            false
        }
    }

    pub fn as_body(&self) -> &[u8] {
        &self.buf[self.pos..]
    }

    pub fn into_body(self) -> &'a mut [u8] {
        &mut self.buf[self.pos..]
    }

    pub fn into_body_str(self) -> Option<&'a str> {
        core::str::from_utf8(&self.buf[self.pos..]).ok()
    }

    /// The full packet body, including any consumed prefix (used by the
    /// unknown-packet arm).
    pub fn into_raw_body(self) -> &'a [u8] {
        self.buf
    }
}
