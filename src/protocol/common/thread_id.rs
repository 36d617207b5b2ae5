use core::convert::TryFrom;

use super::hex::decode_hex;

/// Pid/Tid selector, as it appears in thread-id syntax.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum IdKind {
    /// All threads (`-1`)
    All,
    /// Any thread (`0`)
    Any,
    /// A specific ID (still PID-shifted; see [`crate::stub`])
    WithId(u64),
}

/// A (possibly multiprocess) thread-id: `pPID.TID` or bare `TID`.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct ThreadId {
    /// Process selector (present iff the `p` syntax was used).
    pub pid: Option<IdKind>,
    /// Thread selector.
    pub tid: IdKind,
}

impl TryFrom<&[u8]> for ThreadId {
    type Error = ();

    fn try_from(s: &[u8]) -> Result<Self, ()> {
        match s {
            [b'p', s @ ..] => {
                // p<pid>.<tid>
                let mut s = s.split(|b| *b == b'.');
                let pid: IdKind = s.next().ok_or(())?.try_into()?;
                let tid: IdKind = match s.next() {
                    Some(s) => s.try_into()?,
                    None => IdKind::All, // sending only p<pid> is valid
                };

                Ok(ThreadId {
                    pid: Some(pid),
                    tid,
                })
            }
            _ => {
                // <tid>
                let tid: IdKind = s.try_into()?;

                Ok(ThreadId { pid: None, tid })
            }
        }
    }
}

impl TryFrom<&[u8]> for IdKind {
    type Error = ();

    fn try_from(s: &[u8]) -> Result<Self, ()> {
        Ok(match s {
            b"-1" => IdKind::All,
            b"0" => IdKind::Any,
            id => IdKind::WithId(decode_hex(id).map_err(drop)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiprocess_syntax() {
        let id = ThreadId::try_from(b"p10.5".as_ref()).unwrap();
        assert_eq!(id.pid, Some(IdKind::WithId(0x10)));
        assert_eq!(id.tid, IdKind::WithId(5));
    }

    #[test]
    fn pid_only() {
        let id = ThreadId::try_from(b"p200".as_ref()).unwrap();
        assert_eq!(id.pid, Some(IdKind::WithId(0x200)));
        assert_eq!(id.tid, IdKind::All);
    }

    #[test]
    fn bare_tid() {
        let id = ThreadId::try_from(b"1f".as_ref()).unwrap();
        assert_eq!(id.pid, None);
        assert_eq!(id.tid, IdKind::WithId(0x1f));
    }

    #[test]
    fn wildcards() {
        let id = ThreadId::try_from(b"p-1.-1".as_ref()).unwrap();
        assert_eq!(id.pid, Some(IdKind::All));
        assert_eq!(id.tid, IdKind::All);

        let id = ThreadId::try_from(b"0".as_ref()).unwrap();
        assert_eq!(id.tid, IdKind::Any);
    }

    #[test]
    fn garbage() {
        assert!(ThreadId::try_from(b"pzz.1".as_ref()).is_err());
        assert!(ThreadId::try_from(b"".as_ref()).is_err());
    }
}
