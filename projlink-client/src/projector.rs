//! High-level projector API.
//!
//! Command table follows the ViewSonic RS-232 control reference: read
//! requests name a module and field, and replies carry the value two bytes
//! into the payload.

use crate::channel::Connector;
use crate::config::SerialConfig;
use crate::error::ClientError;
use crate::serial::SerialConnector;
use crate::session::Session;
use bytes::Bytes;
use projlink_protocol::Frame;

/// Module id for system control fields.
pub const MODULE_SYSTEM: u8 = 0x34;

/// Power field (read and write).
pub const FIELD_POWER: u8 = 0x11;

/// Lamp hours field (read).
pub const FIELD_LAMP_HOURS: u8 = 0x15;

/// Offset of the value within a read reply payload.
const VALUE_OFFSET: usize = 2;

/// Write value that switches the projector on.
const POWER_ON: u8 = 0x00;

/// Write value that switches the projector off.
const POWER_OFF: u8 = 0x01;

/// High-level client for a projector.
pub struct Projector<C: Connector> {
    session: Session<C>,
}

impl Projector<SerialConnector> {
    /// Opens a projector on a local serial port.
    pub fn open_serial(port: &str, config: &SerialConfig) -> Result<Self, ClientError> {
        let mut session = Session::serial();
        session.open(port, config)?;
        Ok(Self::new(session))
    }
}

impl<C: Connector> Projector<C> {
    pub fn new(session: Session<C>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session<C> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<C> {
        &mut self.session
    }

    pub fn into_session(self) -> Session<C> {
        self.session
    }

    /// Closes the underlying session.
    pub fn close(&mut self) {
        self.session.close();
    }

    // =========================================================================
    // Generic field access
    // =========================================================================

    /// Reads a field, returning the raw reply payload.
    pub fn read_field(&mut self, module: u8, field: u8, reply_len: u8) -> Result<Bytes, ClientError> {
        let response = self
            .session
            .transact(&Frame::read_request(module, field, reply_len))?;
        Ok(response.payload)
    }

    /// Writes a single-byte field value.
    pub fn write_field(&mut self, module: u8, field: u8, value: u8) -> Result<(), ClientError> {
        self.session
            .transact(&Frame::write_request(module, field, value))?;
        Ok(())
    }

    // =========================================================================
    // Power
    // =========================================================================

    /// Returns whether the projector is powered on.
    pub fn power_state(&mut self) -> Result<bool, ClientError> {
        let payload = self.read_field(MODULE_SYSTEM, FIELD_POWER, 0x00)?;
        flag_at(&payload, VALUE_OFFSET)
    }

    pub fn power_on(&mut self) -> Result<(), ClientError> {
        tracing::debug!("Powering on");
        self.write_field(MODULE_SYSTEM, FIELD_POWER, POWER_ON)
    }

    pub fn power_off(&mut self) -> Result<(), ClientError> {
        tracing::debug!("Powering off");
        self.write_field(MODULE_SYSTEM, FIELD_POWER, POWER_OFF)
    }

    // =========================================================================
    // Lamp
    // =========================================================================

    /// Returns accumulated lamp hours.
    pub fn lamp_hours(&mut self) -> Result<u32, ClientError> {
        let payload = self.read_field(MODULE_SYSTEM, FIELD_LAMP_HOURS, 0x01)?;
        u32_le_at(&payload, VALUE_OFFSET)
    }
}

fn flag_at(payload: &[u8], offset: usize) -> Result<bool, ClientError> {
    payload
        .get(offset)
        .map(|&b| b != 0)
        .ok_or(ClientError::ShortResponse {
            needed: offset + 1,
            got: payload.len(),
        })
}

fn u32_le_at(payload: &[u8], offset: usize) -> Result<u32, ClientError> {
    let bytes: [u8; 4] = payload
        .get(offset..offset + 4)
        .and_then(|s| s.try_into().ok())
        .ok_or(ClientError::ShortResponse {
            needed: offset + 4,
            got: payload.len(),
        })?;
    Ok(u32::from_le_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedChannel, ScriptedConnector};
    use projlink_protocol::CommandKind;

    fn open_projector() -> (Projector<ScriptedConnector>, ScriptedChannel) {
        let channel = ScriptedChannel::new();
        let mut session = Session::new(ScriptedConnector::new(channel.clone()));
        session.open("scripted", &SerialConfig::default()).unwrap();
        (Projector::new(session), channel)
    }

    fn reply(payload: &[u8]) -> Vec<u8> {
        Frame::new(CommandKind::Response, Bytes::copy_from_slice(payload))
            .encode()
            .to_vec()
    }

    #[test]
    fn test_power_state_on() {
        let (mut projector, channel) = open_projector();
        channel.push_data(reply(&[0x00, 0x00, 0x01]));

        assert!(projector.power_state().unwrap());
        assert_eq!(
            channel.written(),
            vec![0x07, 0x14, 0x00, 0x05, 0x00, 0x34, 0x00, 0x00, 0x11, 0x00, 0x5e]
        );
    }

    #[test]
    fn test_power_state_off() {
        let (mut projector, channel) = open_projector();
        channel.push_data(reply(&[0x00, 0x00, 0x00]));
        assert!(!projector.power_state().unwrap());
    }

    #[test]
    fn test_power_state_short_reply() {
        let (mut projector, channel) = open_projector();
        channel.push_data(reply(&[0x00]));
        assert!(matches!(
            projector.power_state(),
            Err(ClientError::ShortResponse { needed: 3, got: 1 })
        ));
    }

    #[test]
    fn test_power_on_and_off() {
        let (mut projector, channel) = open_projector();
        channel.push_data(vec![0x03, 0x14, 0x00, 0x00, 0x00, 0x14]);
        projector.power_on().unwrap();
        assert_eq!(
            channel.written(),
            vec![0x06, 0x14, 0x00, 0x04, 0x00, 0x34, 0x11, 0x00, 0x00, 0x5d]
        );

        let (mut projector, channel) = open_projector();
        channel.push_data(vec![0x03, 0x14, 0x00, 0x00, 0x00, 0x14]);
        projector.power_off().unwrap();
        assert_eq!(
            channel.written(),
            vec![0x06, 0x14, 0x00, 0x04, 0x00, 0x34, 0x11, 0x01, 0x00, 0x5e]
        );
    }

    #[test]
    fn test_lamp_hours() {
        let (mut projector, channel) = open_projector();
        channel.push_data(reply(&[0x00, 0x00, 0x34, 0x12, 0x00, 0x00]));
        assert_eq!(projector.lamp_hours().unwrap(), 0x1234);

        let written = channel.written();
        assert_eq!(&written[5..10], &[0x34, 0x00, 0x00, 0x15, 0x01]);
    }

    #[test]
    fn test_lamp_hours_short_reply() {
        let (mut projector, channel) = open_projector();
        channel.push_data(reply(&[0x00, 0x00, 0x01, 0x02]));
        assert!(matches!(
            projector.lamp_hours(),
            Err(ClientError::ShortResponse { needed: 6, got: 4 })
        ));
    }

    #[test]
    fn test_device_exception() {
        let (mut projector, channel) = open_projector();
        channel.push_data(vec![0x00, 0x14, 0x00, 0x00, 0x00, 0x14]);
        assert!(matches!(
            projector.power_on(),
            Err(ClientError::DeviceException { .. })
        ));
    }

    #[test]
    fn test_closed_projector() {
        let (mut projector, channel) = open_projector();
        projector.close();
        assert!(matches!(projector.lamp_hours(), Err(ClientError::NotOpen)));
        assert!(channel.written().is_empty());
    }

    #[test]
    fn test_value_helpers() {
        assert!(flag_at(&[0, 0, 7], 2).unwrap());
        assert_eq!(u32_le_at(&[0, 0, 1, 0, 0, 1], 2).unwrap(), 0x0100_0001);
        assert!(u32_le_at(&[], 2).is_err());
    }
}
