use core::fmt::{self, Display};

use crate::conn::Connection;
use crate::protocol::RecvPacketStateMachine;
use crate::target::DeviceInterface;
use crate::util::buffer::Buffer;

use super::core_impl::GdbStubImpl;
use super::GdbStub;

/// The smallest packet buffer worth negotiating; anything below this can't
/// even hold a register-file write.
const MIN_PACKET_SIZE: usize = 0x400;

/// An error which may occur when building a [`GdbStub`].
#[derive(Debug)]
pub enum GdbStubBuilderError {
    /// Custom packet buffer size is below the workable minimum.
    PacketBufTooSmall,
}

impl Display for GdbStubBuilderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use self::GdbStubBuilderError::*;
        match self {
            PacketBufTooSmall => write!(
                f,
                "`packet_buffer_size` is smaller than the minimum packet size ({:#x}).",
                MIN_PACKET_SIZE
            ),
        }
    }
}

impl std::error::Error for GdbStubBuilderError {}

/// Helper to construct and customize [`GdbStub`].
pub struct GdbStubBuilder<D: DeviceInterface, C: Connection> {
    device: D,
    conn: C,
    packet_buffer_size: Option<usize>,
    extra_features: Vec<String>,
}

impl<D: DeviceInterface, C: Connection> GdbStubBuilder<D, C> {
    /// Create a new `GdbStubBuilder` using the provided device interface and
    /// connection.
    pub fn new(device: D, conn: C) -> GdbStubBuilder<D, C> {
        GdbStubBuilder {
            device,
            conn,
            packet_buffer_size: None,
            extra_features: vec![
                "vContSupported+".to_string(),
                "QStartNoAckMode+".to_string(),
                "QThreadEvents+".to_string(),
            ],
        }
    }

    /// Specify a custom size for the packet buffer. Defaults to 0x4000 bytes
    /// (advertised to GDB as `PacketSize=3FFF`).
    pub fn packet_buffer_size(mut self, size: usize) -> Self {
        self.packet_buffer_size = Some(size);
        self
    }

    /// Advertise an additional raw entry in the `qSupported` reply.
    pub fn extra_feature(mut self, feature: impl Into<String>) -> Self {
        self.extra_features.push(feature.into());
        self
    }

    /// Build the GdbStub, returning an error if something went wrong.
    pub fn build(self) -> Result<GdbStub<D, C>, GdbStubBuilderError> {
        let packet_size = self.packet_buffer_size.unwrap_or(0x4000);
        if packet_size < MIN_PACKET_SIZE {
            return Err(GdbStubBuilderError::PacketBufTooSmall);
        }

        Ok(GdbStub {
            conn: self.conn,
            packet_buffer: Buffer::with_capacity(packet_size),
            recv_packet: RecvPacketStateMachine::new(packet_size),
            inner: GdbStubImpl::new(self.device, packet_size, self.extra_features),
        })
    }
}
