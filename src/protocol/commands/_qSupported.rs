use super::prelude::*;

/// `qSupported:feature+;feature-;feature=value;…`
#[derive(Debug)]
pub struct qSupported<'a> {
    features: &'a [u8],
}

impl<'a> qSupported<'a> {
    /// Iterate over `(name, supported)` pairs. `feature=value` entries are
    /// reported as supported; malformed entries are skipped.
    pub fn features(&self) -> impl Iterator<Item = (&'a [u8], bool)> + 'a {
        let features: &'a [u8] = self.features;
        features.split(|b| *b == b';').filter_map(|f| match f {
            [] => None,
            [name @ .., b'+'] => Some((name, true)),
            [name @ .., b'-'] => Some((name, false)),
            other => {
                let mut s = other.split(|b| *b == b'=');
                let name = s.next()?;
                s.next()?;
                Some((name, true))
            }
        })
    }
}

impl<'a> ParseCommand<'a> for qSupported<'a> {
    fn from_packet(buf: PacketBuf<'a>) -> Option<Self> {
        match buf.into_body() {
            [] => Some(qSupported { features: &[] }),
            [b':', features @ ..] => Some(qSupported { features }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_negotiation() {
        let mut body = *b":multiprocess+;swbreak-;xmlRegisters=i386";
        let cmd = qSupported::from_packet(PacketBuf::new(&mut body)).unwrap();
        let features: Vec<_> = cmd.features().collect();
        assert_eq!(
            features,
            vec![
                (b"multiprocess".as_ref(), true),
                (b"swbreak".as_ref(), false),
                (b"xmlRegisters".as_ref(), true),
            ]
        );
    }

    #[test]
    fn no_features() {
        let mut body = *b"";
        let cmd = qSupported::from_packet(PacketBuf::new(&mut body)).unwrap();
        assert_eq!(cmd.features().count(), 0);
    }
}
