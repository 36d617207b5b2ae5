use log::{error, trace};

use crate::conn::Connection;
use crate::protocol::common::hex::{decode_hex_buf, encode_hex_nybble};
use crate::util::buffer::Buffer;

enum State {
    WaitPacketOpen,
    PacketData,
    Escape,
    ChecksumHi,
    ChecksumLo,
}

/// What a single pumped byte amounted to.
pub enum PumpEvent {
    /// Mid-packet; keep feeding bytes.
    Pending,
    /// GDB sent the break byte (0x03).
    Interrupt,
    /// The packet buffer now holds a complete, checksum-verified, unescaped
    /// packet body. Consume it fully before pumping the next byte.
    Packet,
}

#[derive(Debug)]
pub enum RecvPacketError<C> {
    /// A packet opened with something other than `$`, `+`, or 0x03.
    BadPacketOpen(u8),
    /// Checksum mismatch while no-ack mode is active (with acks on, a
    /// mismatch just solicits a retransmission).
    ChecksumMismatch { expected: u8, calculated: u8 },
    /// The packet outgrew the negotiated packet buffer.
    PacketBufferOverflow,
    /// Failed to write an ack/nack byte.
    Connection(C),
}

/// Receives packets incrementally using an asynchronous state machine,
/// unescaping and checksum-verifying on the fly.
///
/// Acknowledgement bytes (`+` on a good packet, `-` to solicit
/// retransmission) are emitted here as well, since whether a packet even
/// _exists_ is only known at this layer.
pub struct RecvPacketStateMachine {
    state: State,
    checksum: u8,
    checksum_hex: [u8; 2],
    max_packet_size: usize,
}

impl RecvPacketStateMachine {
    pub fn new(max_packet_size: usize) -> Self {
        RecvPacketStateMachine {
            state: State::WaitPacketOpen,
            checksum: 0,
            checksum_hex: [0; 2],
            max_packet_size,
        }
    }

    /// Feed one byte from the GDB channel.
    ///
    /// `ack_enabled` reflects the live `QStartNoAckMode` negotiation; it is
    /// sampled when the checksum completes.
    pub fn pump<C: Connection>(
        &mut self,
        conn: &mut C,
        packet_buffer: &mut Buffer,
        byte: u8,
        ack_enabled: bool,
    ) -> Result<PumpEvent, RecvPacketError<C::Error>> {
        // the break byte is recognized in every state; an in-flight packet
        // is abandoned and the next `$` starts clean
        if byte == 0x03 {
            self.state = State::WaitPacketOpen;
            return Ok(PumpEvent::Interrupt);
        }

        match self.state {
            State::WaitPacketOpen => match byte {
                b'+' => {} // we don't retransmit, so acks carry no information
                b'$' => {
                    packet_buffer.clear();
                    self.checksum = 0;
                    self.state = State::PacketData;
                }
                _ => {
                    error!("packet opened with bad byte {:#04x?}", byte);
                    return Err(RecvPacketError::BadPacketOpen(byte));
                }
            },
            State::PacketData => match byte {
                b'#' => self.state = State::ChecksumHi,
                b'}' => {
                    self.checksum = self.checksum.wrapping_add(byte);
                    self.state = State::Escape;
                }
                _ => {
                    self.checksum = self.checksum.wrapping_add(byte);
                    self.push(packet_buffer, byte)?;
                }
            },
            State::Escape => {
                self.checksum = self.checksum.wrapping_add(byte);
                self.push(packet_buffer, byte ^ 0x20)?;
                self.state = State::PacketData;
            }
            State::ChecksumHi => {
                self.checksum_hex[0] = byte;
                self.state = State::ChecksumLo;
            }
            State::ChecksumLo => {
                self.checksum_hex[1] = byte;
                self.state = State::WaitPacketOpen;

                let mut hex = self.checksum_hex;
                let expected = match decode_hex_buf(&mut hex) {
                    Ok([b]) => *b,
                    _ => !self.checksum, // malformed hex never matches
                };

                if expected != self.checksum {
                    if ack_enabled {
                        conn.write(b'-').map_err(RecvPacketError::Connection)?;
                        conn.flush().map_err(RecvPacketError::Connection)?;
                        return Ok(PumpEvent::Pending);
                    }
                    error!(
                        "checksum mismatch with acks disabled (expected {:02x}, got {:02x})",
                        expected, self.checksum
                    );
                    return Err(RecvPacketError::ChecksumMismatch {
                        expected,
                        calculated: self.checksum,
                    });
                }

                if ack_enabled {
                    conn.write(b'+').map_err(RecvPacketError::Connection)?;
                    conn.flush().map_err(RecvPacketError::Connection)?;
                }

                trace!(
                    "<-- ${}#{}{}",
                    String::from_utf8_lossy(packet_buffer.read()),
                    encode_hex_nybble(self.checksum >> 4) as char,
                    encode_hex_nybble(self.checksum) as char,
                );

                return Ok(PumpEvent::Packet);
            }
        }

        Ok(PumpEvent::Pending)
    }

    fn push<C>(
        &mut self,
        packet_buffer: &mut Buffer,
        byte: u8,
    ) -> Result<(), RecvPacketError<C>> {
        if packet_buffer.read_available() >= self.max_packet_size {
            return Err(RecvPacketError::PacketBufferOverflow);
        }
        packet_buffer.write_u8(byte);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullConn {
        acks: Vec<u8>,
    }

    impl NullConn {
        fn new() -> NullConn {
            NullConn { acks: Vec::new() }
        }
    }

    impl Connection for NullConn {
        type Error = ();

        fn write(&mut self, byte: u8) -> Result<(), ()> {
            self.acks.push(byte);
            Ok(())
        }

        fn flush(&mut self) -> Result<(), ()> {
            Ok(())
        }
    }

    fn pump_all(
        recv: &mut RecvPacketStateMachine,
        conn: &mut NullConn,
        buf: &mut Buffer,
        bytes: &[u8],
        ack: bool,
    ) -> Vec<PumpEvent> {
        bytes
            .iter()
            .map(|b| recv.pump(conn, buf, *b, ack).unwrap())
            .collect()
    }

    #[test]
    fn plain_packet() {
        let mut recv = RecvPacketStateMachine::new(0x4000);
        let mut conn = NullConn::new();
        let mut buf = Buffer::new();

        let events = pump_all(&mut recv, &mut conn, &mut buf, b"$m100,4#5e", true);
        assert!(matches!(events.last(), Some(PumpEvent::Packet)));
        assert_eq!(buf.read(), b"m100,4");
        assert_eq!(conn.acks, b"+");
    }

    #[test]
    fn escaped_bytes_are_unescaped() {
        let mut recv = RecvPacketStateMachine::new(0x4000);
        let mut conn = NullConn::new();
        let mut buf = Buffer::new();

        // "}\x03" unescapes to '#' (0x23); checksum covers the escaped form
        let body = b"X}\x03";
        let checksum = body.iter().fold(0u8, |a, x| a.wrapping_add(*x));
        let mut pkt = Vec::new();
        pkt.push(b'$');
        pkt.extend_from_slice(body);
        pkt.push(b'#');
        pkt.push(encode_hex_nybble(checksum >> 4));
        pkt.push(encode_hex_nybble(checksum));

        let events = pump_all(&mut recv, &mut conn, &mut buf, &pkt, true);
        assert!(matches!(events.last(), Some(PumpEvent::Packet)));
        assert_eq!(buf.read(), b"X#");
    }

    #[test]
    fn bad_checksum_solicits_retransmission() {
        let mut recv = RecvPacketStateMachine::new(0x4000);
        let mut conn = NullConn::new();
        let mut buf = Buffer::new();

        let events = pump_all(&mut recv, &mut conn, &mut buf, b"$OK#00", true);
        assert!(matches!(events.last(), Some(PumpEvent::Pending)));
        assert_eq!(conn.acks, b"-");

        // ...and the retransmitted packet parses fine
        let events = pump_all(&mut recv, &mut conn, &mut buf, b"$OK#9a", true);
        assert!(matches!(events.last(), Some(PumpEvent::Packet)));
        assert_eq!(conn.acks, b"-+");
    }

    #[test]
    fn bad_checksum_is_fatal_without_acks() {
        let mut recv = RecvPacketStateMachine::new(0x4000);
        let mut conn = NullConn::new();
        let mut buf = Buffer::new();

        for b in b"$OK#0" {
            recv.pump(&mut conn, &mut buf, *b, false).unwrap();
        }
        assert!(matches!(
            recv.pump(&mut conn, &mut buf, b'0', false),
            Err(RecvPacketError::ChecksumMismatch { .. })
        ));
        assert!(conn.acks.is_empty());
    }

    #[test]
    fn no_acks_in_no_ack_mode() {
        let mut recv = RecvPacketStateMachine::new(0x4000);
        let mut conn = NullConn::new();
        let mut buf = Buffer::new();

        let events = pump_all(&mut recv, &mut conn, &mut buf, b"$OK#9a", false);
        assert!(matches!(events.last(), Some(PumpEvent::Packet)));
        assert!(conn.acks.is_empty());
    }

    #[test]
    fn interrupt_mid_packet_resumes_cleanly() {
        let mut recv = RecvPacketStateMachine::new(0x4000);
        let mut conn = NullConn::new();
        let mut buf = Buffer::new();

        pump_all(&mut recv, &mut conn, &mut buf, b"$m10", true);
        assert!(matches!(
            recv.pump(&mut conn, &mut buf, 0x03, true).unwrap(),
            PumpEvent::Interrupt
        ));

        let events = pump_all(&mut recv, &mut conn, &mut buf, b"$OK#9a", true);
        assert!(matches!(events.last(), Some(PumpEvent::Packet)));
        assert_eq!(buf.read(), b"OK");
    }

    #[test]
    fn framing_round_trips_through_the_response_writer() {
        use crate::protocol::ResponseWriter;

        // every byte value that can ride in a reply body, including the
        // ones that need escaping (0x03 is reserved for the break byte)
        let payload: Vec<u8> = (0u8..=255).filter(|b| *b != 0x03).collect();

        let mut wire = NullConn::new();
        let mut res = ResponseWriter::new(&mut wire);
        res.write_all(&payload).unwrap();
        res.flush().unwrap();

        let mut recv = RecvPacketStateMachine::new(0x4000);
        let mut conn = NullConn::new();
        let mut buf = Buffer::new();

        let mut done = false;
        for byte in &wire.acks {
            if let PumpEvent::Packet = recv.pump(&mut conn, &mut buf, *byte, true).unwrap() {
                done = true;
                break;
            }
        }
        assert!(done);
        assert_eq!(buf.read(), &payload[..]);
        assert_eq!(conn.acks, b"+");
    }

    #[test]
    fn stray_acks_are_ignored() {
        let mut recv = RecvPacketStateMachine::new(0x4000);
        let mut conn = NullConn::new();
        let mut buf = Buffer::new();

        let events = pump_all(&mut recv, &mut conn, &mut buf, b"+$OK#9a", true);
        assert!(matches!(events.last(), Some(PumpEvent::Packet)));
    }

    #[test]
    fn bad_open_byte_is_fatal() {
        let mut recv = RecvPacketStateMachine::new(0x4000);
        let mut conn = NullConn::new();
        let mut buf = Buffer::new();

        assert!(matches!(
            recv.pump(&mut conn, &mut buf, b'%', true),
            Err(RecvPacketError::BadPacketOpen(b'%'))
        ));
    }

    #[test]
    fn oversized_packet_overflows() {
        let mut recv = RecvPacketStateMachine::new(4);
        let mut conn = NullConn::new();
        let mut buf = Buffer::new();

        let mut err = None;
        for b in b"$aaaaaaaa#00" {
            if let Err(e) = recv.pump(&mut conn, &mut buf, *b, true) {
                err = Some(e);
                break;
            }
        }
        assert!(matches!(err, Some(RecvPacketError::PacketBufferOverflow)));
    }
}
