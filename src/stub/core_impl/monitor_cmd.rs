use super::prelude::*;
use crate::protocol::commands::ext::MonitorCmd;
use crate::target::MemoryType;

use core::fmt::Write;

const HELP_TEXT: &str = "\
monitor commands:
  help      this text
  wait      drain pending debug events and report the stop state
  mappings  dump the current process's address-space layout
";

impl<D: DeviceInterface, C: Connection> GdbStubImpl<D, C> {
    pub(crate) fn handle_monitor_cmd(
        &mut self,
        res: &mut ResponseWriter<'_, C>,
        command: MonitorCmd<'_>,
    ) -> Result<HandlerStatus, Error<D::Error, C::Error>> {
        let MonitorCmd::qRcmd(cmd) = command;

        let line = core::str::from_utf8(cmd.cmd).map_err(|_| Error::NonFatalError(1))?;
        let mut words = line.split_whitespace();

        let output = match words.next() {
            None | Some("help") => HELP_TEXT.to_string(),
            Some("wait") => self.monitor_wait()?,
            Some("mappings") => self.monitor_mappings()?,
            Some(other) => {
                log::debug!("unknown monitor command {:?}", other);
                return Err(Error::NonFatalError(1));
            }
        };

        // qRcmd output is hex-encoded text
        res.write_hex_buf(output.as_bytes())
            .map_err(Error::conn_write)?;
        Ok(HandlerStatus::Handled)
    }

    /// Synchronously drain every process's event queue, then describe the
    /// resulting stop state.
    fn monitor_wait(&mut self) -> Result<String, Error<D::Error, C::Error>> {
        let pids: Vec<_> = self.registry.processes.keys().copied().collect();
        for pid in pids {
            self.ingest_events_for(pid)?;
        }

        let mut out = String::new();
        if self.stop_pending {
            out.push_str("target has stopped\n");
        } else if self.registry.processes.values().any(|p| p.running) {
            out.push_str("target is running; no stop event yet\n");
        } else {
            out.push_str("target is stopped\n");
        }
        let _ = writeln!(out, "last stop reason: {:?}", self.stop_reason);
        Ok(out)
    }

    /// Walk `QueryMemory` over the current process's address space.
    fn monitor_mappings(&mut self) -> Result<String, Error<D::Error, C::Error>> {
        let thread = self.current_thread()?;
        let proc = self
            .registry
            .process_mut(thread.pid)
            .ok_or(Error::NonFatalError(0x16))?;

        let mut out = String::new();
        let mut addr = 0u64;
        loop {
            let info = proc.debugger.query_memory(addr).handle_error()?;
            if info.memory_type.base_type() != MemoryType::UNMAPPED {
                let perm = info.permission.display();
                let _ = writeln!(
                    out,
                    "{:#014x}-{:#014x} {} {}",
                    info.base_addr,
                    info.base_addr.saturating_add(info.size),
                    core::str::from_utf8(&perm).unwrap_or("???"),
                    info.memory_type.name(),
                );
            }

            addr = match info.base_addr.checked_add(info.size) {
                Some(next) if next > addr => next,
                _ => break,
            };
        }
        Ok(out)
    }
}
