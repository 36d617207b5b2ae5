use super::prelude::*;
use crate::protocol::commands::ext::ThreadEvents;

impl<D: DeviceInterface, C: Connection> GdbStubImpl<D, C> {
    pub(crate) fn handle_thread_events(
        &mut self,
        _res: &mut ResponseWriter<'_, C>,
        command: ThreadEvents,
    ) -> Result<HandlerStatus, Error<D::Error, C::Error>> {
        let ThreadEvents::QThreadEvents(cmd) = command;

        self.features.set_thread_events(cmd.enable);
        Ok(HandlerStatus::NeedsOk)
    }
}
