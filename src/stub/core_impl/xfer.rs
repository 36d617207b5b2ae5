use super::prelude::*;
use crate::protocol::commands::ext::Xfer;
use crate::protocol::commands::_qXfer::QXferOp;
use crate::stub::registry::Registry;
use crate::target::TargetResult;

use log::debug;

/// Generator backing a [`XferObject::ReadOnlyString`].
pub(crate) type XferGenerator<D> =
    fn(&mut Registry<D>) -> TargetResult<String, <D as DeviceInterface>::Error>;

/// A `qXfer` transfer object.
///
/// Dispatch is over tagged variants rather than trait objects; each variant
/// carries its generator and implies its read/write capabilities.
pub(crate) enum XferObject<D: DeviceInterface> {
    /// Read-only object whose contents are produced whole, then served out
    /// in windows. The cache is rebuilt on each offset-0 read and dropped
    /// once the final window has been served.
    ReadOnlyString {
        generator: XferGenerator<D>,
        cache: Option<Vec<u8>>,
    },
}

impl<D: DeviceInterface> XferObject<D> {
    pub fn advertises_read(&self) -> bool {
        match self {
            XferObject::ReadOnlyString { .. } => true,
        }
    }

    pub fn advertises_write(&self) -> bool {
        match self {
            XferObject::ReadOnlyString { .. } => false,
        }
    }
}

impl<D: DeviceInterface, C: Connection> GdbStubImpl<D, C> {
    pub(crate) fn handle_xfer(
        &mut self,
        res: &mut ResponseWriter<'_, C>,
        command: Xfer<'_>,
    ) -> Result<HandlerStatus, Error<D::Error, C::Error>> {
        let Xfer::qXfer(cmd) = command;

        let object = match self
            .xfer_objects
            .iter_mut()
            .find(|(name, _)| name.as_bytes() == cmd.object)
        {
            Some((_, object)) => object,
            None => {
                // unknown object: empty reply, like any unsupported packet
                debug!("qXfer for unknown object {:?}", cmd.object);
                return Ok(HandlerStatus::Handled);
            }
        };

        match (object, cmd.op) {
            (
                XferObject::ReadOnlyString { generator, cache },
                QXferOp::Read { offset, length },
            ) => {
                if offset == 0 || cache.is_none() {
                    let s = generator(&mut self.registry).handle_error()?;
                    *cache = Some(s.into_bytes());
                }
                let data = match cache.as_deref() {
                    Some(data) => data,
                    None => return Err(Error::NonFatalError(1)),
                };

                let start = offset.min(data.len());
                let end = offset.saturating_add(length).min(data.len());
                let last = end == data.len();

                res.write(if last { b'l' } else { b'm' })
                    .map_err(Error::conn_write)?;
                res.write_all(&data[start..end]).map_err(Error::conn_write)?;

                if last {
                    *cache = None;
                }
                Ok(HandlerStatus::Handled)
            }
            (XferObject::ReadOnlyString { .. }, QXferOp::Write { .. }) => {
                Err(Error::NonFatalError(1))
            }
        }
    }
}

/// The `qXfer:libraries:read` generator: every attached process's loaded
/// modules, named by build-id.
pub(crate) fn libraries_xml<D: DeviceInterface>(
    registry: &mut Registry<D>,
) -> TargetResult<String, D::Error> {
    use core::fmt::Write;

    let mut xml = String::from("<library-list>\n");
    for proc in registry.processes.values_mut() {
        for module in proc.debugger.get_nso_infos()? {
            let _ = write!(
                xml,
                "  <library name=\"{}\"><segment address=\"{:#x}\"/></library>\n",
                module.build_id_hex(),
                module.base_addr,
            );
        }
    }
    xml.push_str("</library-list>\n");
    Ok(xml)
}
