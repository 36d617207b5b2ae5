use super::prelude::*;
use crate::protocol::commands::ext::Queries;

impl<D: DeviceInterface, C: Connection> GdbStubImpl<D, C> {
    pub(crate) fn handle_queries(
        &mut self,
        res: &mut ResponseWriter<'_, C>,
        command: Queries<'_>,
    ) -> Result<HandlerStatus, Error<D::Error, C::Error>> {
        let handler_status = match command {
            Queries::qSupported(cmd) => {
                // incoming feature negotiation
                for (feature, supported) in cmd.features() {
                    if feature == b"multiprocess" {
                        self.features.set_multiprocess(supported);
                    }
                }

                res.write_str("PacketSize=").map_err(Error::conn_write)?;
                res.write_str(&format!("{:X}", self.packet_size - 1))
                    .map_err(Error::conn_write)?;
                res.write_str(";multiprocess+").map_err(Error::conn_write)?;

                for (name, object) in &self.xfer_objects {
                    if object.advertises_read() {
                        res.write_str(";qXfer:").map_err(Error::conn_write)?;
                        res.write_str(name).map_err(Error::conn_write)?;
                        res.write_str(":read+").map_err(Error::conn_write)?;
                    }
                    if object.advertises_write() {
                        res.write_str(";qXfer:").map_err(Error::conn_write)?;
                        res.write_str(name).map_err(Error::conn_write)?;
                        res.write_str(":write+").map_err(Error::conn_write)?;
                    }
                }

                for feature in &self.extra_features {
                    res.write(b';').map_err(Error::conn_write)?;
                    res.write_str(feature).map_err(Error::conn_write)?;
                }

                HandlerStatus::Handled
            }

            Queries::qC(_) => {
                let thread = self.current_thread()?;
                res.write_str("QC").map_err(Error::conn_write)?;
                self.write_thread_ref(res, thread)?;
                HandlerStatus::Handled
            }

            Queries::qfThreadInfo(_) => {
                self.thread_info.start();
                self.emit_thread_info_chunk(res)?
            }
            Queries::qsThreadInfo(_) => self.emit_thread_info_chunk(res)?,

            Queries::qOffsets(_) => {
                // the target never relocates after load, as far as the stub
                // can see
                res.write_str("Text=0;Data=0;Bss=0")
                    .map_err(Error::conn_write)?;
                HandlerStatus::Handled
            }

            Queries::qThreadExtraInfo(cmd) => {
                let thread = self.resolve_thread_id(cmd.thread)?;
                let tls_addr = self
                    .registry
                    .thread(thread)
                    .ok_or(Error::NonFatalError(0x16))?
                    .tls_addr;

                let text = format!("TID {:#x}; TLS {:#x}", thread.tid, tls_addr);
                res.write_hex_buf(text.as_bytes())
                    .map_err(Error::conn_write)?;
                HandlerStatus::Handled
            }
        };
        Ok(handler_status)
    }

    fn emit_thread_info_chunk(
        &mut self,
        res: &mut ResponseWriter<'_, C>,
    ) -> Result<HandlerStatus, Error<D::Error, C::Error>> {
        const THREADS_PER_CHUNK: usize = 16;

        let chunk = self
            .thread_info
            .next_chunk(&self.registry, THREADS_PER_CHUNK);

        if chunk.is_empty() {
            res.write_str("l").map_err(Error::conn_write)?;
        } else {
            res.write_str("m").map_err(Error::conn_write)?;
            for (i, thread) in chunk.iter().enumerate() {
                if i > 0 {
                    res.write(b',').map_err(Error::conn_write)?;
                }
                self.write_thread_ref(res, *thread)?;
            }
        }
        Ok(HandlerStatus::Handled)
    }
}
