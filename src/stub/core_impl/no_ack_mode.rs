use super::prelude::*;
use crate::protocol::commands::ext::NoAckMode;

impl<D: DeviceInterface, C: Connection> GdbStubImpl<D, C> {
    pub(crate) fn handle_no_ack_mode(
        &mut self,
        _res: &mut ResponseWriter<'_, C>,
        command: NoAckMode,
    ) -> Result<HandlerStatus, Error<D::Error, C::Error>> {
        let NoAckMode::QStartNoAckMode(_) = command;

        // the `+` for this very packet has already gone out; everything
        // after the OK reply is ack-free
        self.features.set_no_ack_mode(true);
        Ok(HandlerStatus::NeedsOk)
    }
}
