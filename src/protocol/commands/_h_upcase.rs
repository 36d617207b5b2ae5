use super::prelude::*;

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Op {
    /// `Hg` — selects the thread for register/memory operations.
    Other,
    /// `Hc` — selects the thread for step/continue (deprecated in favor of
    /// `vCont`, but still sent by every GDB).
    StepContinue,
}

#[derive(PartialEq, Eq, Debug)]
pub struct H {
    pub kind: Op,
    pub thread: ThreadId,
}

impl<'a> ParseCommand<'a> for H {
    fn from_packet(buf: PacketBuf<'a>) -> Option<Self> {
        let body = buf.as_body();
        let (op, thread) = body.split_first()?;
        let kind = match *op {
            b'g' => Op::Other,
            b'c' => Op::StepContinue,
            _ => return None,
        };

        Some(H {
            kind,
            thread: ThreadId::try_from(thread).ok()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::common::thread_id::IdKind;

    #[test]
    fn select_for_access() {
        let mut body = *b"gp10.3";
        let cmd = H::from_packet(PacketBuf::new(&mut body)).unwrap();
        assert_eq!(cmd.kind, Op::Other);
        assert_eq!(cmd.thread.pid, Some(IdKind::WithId(0x10)));
        assert_eq!(cmd.thread.tid, IdKind::WithId(3));
    }

    #[test]
    fn select_for_resume_all() {
        let mut body = *b"c-1";
        let cmd = H::from_packet(PacketBuf::new(&mut body)).unwrap();
        assert_eq!(cmd.kind, Op::StepContinue);
        assert_eq!(cmd.thread.tid, IdKind::All);
    }

    #[test]
    fn bad_op() {
        let mut body = *b"x1";
        assert!(H::from_packet(PacketBuf::new(&mut body)).is_none());
    }
}
