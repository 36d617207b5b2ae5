use paste::paste;

use crate::protocol::packet::PacketBuf;

/// Common imports used by >50% of all packet parsers.
///
/// Do not clutter this prelude with types only used by a few packets.
pub(self) mod prelude {
    pub use crate::protocol::commands::ParseCommand;
    pub use crate::protocol::common::hex::{decode_hex, decode_hex_buf};
    pub use crate::protocol::common::thread_id::ThreadId;
    pub use crate::protocol::packet::PacketBuf;
}

pub trait ParseCommand<'a>: Sized {
    /// Try to parse a packet from the packet buffer.
    fn from_packet(buf: PacketBuf<'a>) -> Option<Self>;
}

macro_rules! commands {
    (
        $(
            $ext:ident $(use $lt:lifetime)? {
                $($name:literal => $mod:ident::$command:ident$(<$lifetime:lifetime>)?,)*
            }
        )*
    ) => {paste! {
        $($(
            #[allow(non_snake_case, non_camel_case_types)]
            pub mod $mod;
        )*)*

        pub mod ext {
            $(
                #[allow(non_camel_case_types, clippy::enum_variant_names)]
                pub enum [<$ext:camel>] $(<$lt>)? {
                    $($command(super::$mod::$command<$($lifetime)?>),)*
                }
            )*
        }

        /// GDB commands, grouped by the handler module that services them.
        pub enum Command<'a> {
            $(
                [<$ext:camel>](ext::[<$ext:camel>]$(<$lt>)?),
            )*
            Unknown(&'a [u8]),
        }

        impl<'a> Command<'a> {
            pub fn from_packet(mut buf: PacketBuf<'a>) -> Option<Command<'a>> {
                // listed order doubles as match priority, so longer prefixes
                // that share a stem must be listed first (`vAttachWait`
                // before `vAttach`)
                $($(
                #[allow(clippy::string_lit_as_bytes)]
                if buf.strip_prefix($name.as_bytes()) {
                    let cmd = $mod::$command::from_packet(buf)?;

                    return Some(
                        Command::[<$ext:camel>](
                            ext::[<$ext:camel>]::$command(cmd)
                        )
                    )
                }
                )*)*

                Some(Command::Unknown(buf.into_raw_body()))
            }
        }
    }};
}

commands! {
    base use 'a {
        "?" => question_mark::QuestionMark,
        "D" => _d_upcase::D,
        "g" => _g::g,
        "G" => _g_upcase::G<'a>,
        "H" => _h_upcase::H,
        "m" => _m::m,
        "M" => _m_upcase::M<'a>,
        "T" => _t_upcase::T,
    }

    queries use 'a {
        "qC" => _qC::qC,
        "qfThreadInfo" => _qfThreadInfo::qfThreadInfo,
        "qsThreadInfo" => _qsThreadInfo::qsThreadInfo,
        "qOffsets" => _qOffsets::qOffsets,
        "qSupported" => _qSupported::qSupported<'a>,
        "qThreadExtraInfo" => _qThreadExtraInfo::qThreadExtraInfo,
    }

    monitor_cmd use 'a {
        "qRcmd" => _qRcmd::qRcmd<'a>,
    }

    no_ack_mode {
        "QStartNoAckMode" => _QStartNoAckMode::QStartNoAckMode,
    }

    thread_events {
        "QThreadEvents" => _QThreadEvents::QThreadEvents,
    }

    resume use 'a {
        "vAttachWait" => _vAttachWait::vAttachWait,
        "vAttach" => _vAttach::vAttach,
        "vCont" => _vCont::vCont<'a>,
    }

    xfer use 'a {
        "qXfer" => _qXfer::qXfer<'a>,
    }
}
