use crate::error::Result;
use crate::status::LinkStatus;

/// A packetized receive link.
///
/// This is everything the monitor needs from the physical transport:
/// lifecycle, a poll for complete packets, the status of the last poll, and
/// the bytes of the last verified packet.
pub trait Transport: Send {
    /// Acquire the link. Fails with `LinkError::PortUnavailable` if the
    /// port cannot be opened.
    fn open(&mut self) -> Result<()>;

    /// Release the link. Closing a closed link does nothing.
    fn close(&mut self);

    /// True while the link is usable. A link that fails underneath (e.g.
    /// the device was unplugged) reports false until it is reopened.
    fn is_open(&self) -> bool;

    /// Poll for a complete packet.
    ///
    /// Returns true when a new packet is ready in
    /// [`Transport::receive_buffer`]. A rejected packet returns false and
    /// leaves a negative [`Transport::status`].
    fn available(&mut self) -> bool;

    /// Outcome of the most recent [`Transport::available`] call.
    fn status(&self) -> LinkStatus;

    /// Bytes of the most recently completed packet, tag byte first.
    fn receive_buffer(&self) -> &[u8];

    /// Name used in logs (port path or a test label).
    fn name(&self) -> &str;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn open(&mut self) -> Result<()> {
        (**self).open()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn available(&mut self) -> bool {
        (**self).available()
    }

    fn status(&self) -> LinkStatus {
        (**self).status()
    }

    fn receive_buffer(&self) -> &[u8] {
        (**self).receive_buffer()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
