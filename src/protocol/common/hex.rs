use btoi::{btou_radix, ParseIntegerError};
use num_traits::{CheckedAdd, CheckedMul, FromPrimitive, Zero};

/// Decode a big-endian ascii-hex integer from the entire buffer.
#[inline]
pub fn decode_hex<I>(buf: &[u8]) -> Result<I, ParseIntegerError>
where
    I: FromPrimitive + Zero + CheckedAdd + CheckedMul,
{
    btou_radix(buf, 16)
}

#[derive(Debug)]
pub enum DecodeHexBufError {
    NotAscii,
    NotEvenLen,
}

fn ascii2byte(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        b'x' | b'X' => Some(0),
        _ => None,
    }
}

/// Decode a GDB hex string into a byte slice _in place_.
///
/// GDB hex strings may include "xx", which represent "missing" data. This
/// method simply treats "xx" as 0x00.
pub fn decode_hex_buf(buf: &mut [u8]) -> Result<&mut [u8], DecodeHexBufError> {
    use DecodeHexBufError::*;

    if buf.len() % 2 != 0 {
        return Err(NotEvenLen);
    }

    let decoded_len = buf.len() / 2;
    for i in 0..decoded_len {
        let b = ascii2byte(buf[i * 2]).ok_or(NotAscii)? << 4
            | ascii2byte(buf[i * 2 + 1]).ok_or(NotAscii)?;
        buf[i] = b;
    }

    Ok(&mut buf[..decoded_len])
}

/// Encode a nybble as lowercase ascii-hex.
///
/// Lowercase is load-bearing: a reply whose first nybble is 0xE would be
/// read back by (older) GDB as an `Exx` error reply if encoded as `'E'`.
#[inline]
pub fn encode_hex_nybble(n: u8) -> u8 {
    match n & 0xf {
        n @ 0..=9 => b'0' + n,
        n => b'a' + n - 0xa,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_u64() {
        assert_eq!(decode_hex::<u64>(b"deadbeef"), Ok(0xdeadbeef));
        assert_eq!(decode_hex::<u64>(b"0"), Ok(0));
        assert!(decode_hex::<u64>(b"12zz").is_err());
        assert!(decode_hex::<u64>(b"").is_err());
    }

    #[test]
    fn decode_buf_in_place() {
        let mut buf = *b"48690a";
        assert_eq!(decode_hex_buf(&mut buf).unwrap(), b"Hi\n");
    }

    #[test]
    fn decode_buf_missing_data() {
        let mut buf = *b"xx41";
        assert_eq!(decode_hex_buf(&mut buf).unwrap(), &[0x00, 0x41]);
    }

    #[test]
    fn decode_buf_odd_len() {
        let mut buf = *b"abc";
        assert!(decode_hex_buf(&mut buf).is_err());
    }

    #[test]
    fn nybbles_are_lowercase() {
        assert_eq!(encode_hex_nybble(0xe), b'e');
        assert_eq!(encode_hex_nybble(0x5), b'5');
    }
}
