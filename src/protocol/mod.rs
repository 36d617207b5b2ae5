mod packet;
mod recv_packet;
mod response_writer;

pub(crate) mod commands;
pub(crate) mod common;

pub(crate) use packet::PacketBuf;
pub(crate) use recv_packet::{PumpEvent, RecvPacketError, RecvPacketStateMachine};
pub(crate) use response_writer::{ResponseWriter, WireThreadId};
