use super::prelude::*;

#[derive(Debug)]
pub enum vCont<'a> {
    Query,
    Actions(Actions<'a>),
}

impl<'a> ParseCommand<'a> for vCont<'a> {
    fn from_packet(buf: PacketBuf<'a>) -> Option<Self> {
        match buf.as_body() {
            [b'?'] => Some(vCont::Query),
            [b';', ..] => Some(vCont::Actions(Actions(buf.into_body()))),
            _ => None,
        }
    }
}

/// A lazily evaluated iterator over the actions specified in a vCont packet.
#[derive(Debug)]
pub struct Actions<'a>(&'a [u8]);

impl<'a> Actions<'a> {
    pub fn iter(&self) -> impl Iterator<Item = Option<VContAction>> + 'a {
        let body: &'a [u8] = self.0;
        body.split(|b| *b == b';').skip(1).map(|act| {
            let mut s = act.split(|b| *b == b':');
            let kind = s.next()?;
            let thread = match s.next() {
                Some(s) => Some(ThreadId::try_from(s).ok()?),
                None => None,
            };

            Some(VContAction {
                kind: VContKind::from_bytes(kind)?,
                thread,
            })
        })
    }
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct VContAction {
    pub kind: VContKind,
    pub thread: Option<ThreadId>,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum VContKind {
    Continue,
    ContinueWithSig(u8),
    Step,
    StepWithSig(u8),
    Stop,
}

impl VContKind {
    fn from_bytes(s: &[u8]) -> Option<VContKind> {
        use self::VContKind::*;

        let res = match s {
            [b'c'] => Continue,
            [b's'] => Step,
            [b't'] => Stop,
            [b'C', sig @ ..] => ContinueWithSig(decode_hex(sig).ok()?),
            [b'S', sig @ ..] => StepWithSig(decode_hex(sig).ok()?),
            _ => return None,
        };

        Some(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::common::thread_id::IdKind;

    #[test]
    fn query() {
        let mut body = *b"?";
        assert!(matches!(
            vCont::from_packet(PacketBuf::new(&mut body)),
            Some(vCont::Query)
        ));
    }

    #[test]
    fn continue_all() {
        let mut body = *b";c";
        let cmd = vCont::from_packet(PacketBuf::new(&mut body)).unwrap();
        let actions = match cmd {
            vCont::Actions(a) => a.iter().collect::<Vec<_>>(),
            _ => panic!("expected actions"),
        };
        assert_eq!(
            actions,
            vec![Some(VContAction {
                kind: VContKind::Continue,
                thread: None,
            })]
        );
    }

    #[test]
    fn step_specific_thread() {
        let mut body = *b";s:p10.3;c";
        let cmd = vCont::from_packet(PacketBuf::new(&mut body)).unwrap();
        let actions = match cmd {
            vCont::Actions(a) => a.iter().collect::<Vec<_>>(),
            _ => panic!("expected actions"),
        };
        assert_eq!(actions.len(), 2);
        let step = actions[0].unwrap();
        assert_eq!(step.kind, VContKind::Step);
        assert_eq!(step.thread.unwrap().tid, IdKind::WithId(3));
        assert_eq!(actions[1].unwrap().kind, VContKind::Continue);
    }

    #[test]
    fn continue_with_signal() {
        let mut body = *b";C05";
        let cmd = vCont::from_packet(PacketBuf::new(&mut body)).unwrap();
        let actions = match cmd {
            vCont::Actions(a) => a.iter().collect::<Vec<_>>(),
            _ => panic!("expected actions"),
        };
        assert_eq!(actions[0].unwrap().kind, VContKind::ContinueWithSig(5));
    }

    #[test]
    fn malformed_action() {
        let mut body = *b";q";
        let cmd = vCont::from_packet(PacketBuf::new(&mut body)).unwrap();
        let actions = match cmd {
            vCont::Actions(a) => a.iter().collect::<Vec<_>>(),
            _ => panic!("expected actions"),
        };
        assert_eq!(actions, vec![None]);
    }
}
