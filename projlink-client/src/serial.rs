//! Serial port transport.

use crate::channel::{Channel, Connector};
use crate::config::{Parity, SerialConfig};
use serialport::{ClearBuffer, DataBits, FlowControl, SerialPort, SerialPortType, StopBits};
use std::io::{self, Read, Write};

/// Opens channels on local serial ports.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialConnector;

impl Connector for SerialConnector {
    type Channel = SerialChannel;

    fn open(&self, port: &str, config: &SerialConfig) -> io::Result<SerialChannel> {
        let data_bits = data_bits(config.data_bits)?;
        let stop_bits = stop_bits(config.stop_bits)?;

        tracing::debug!(
            "Opening {} at {} baud ({}{}{}, timeout {:?})",
            port,
            config.baud_rate,
            config.data_bits,
            parity_char(config.parity),
            config.stop_bits,
            config.read_timeout()
        );

        let handle = serialport::new(port, config.baud_rate)
            .data_bits(data_bits)
            .stop_bits(stop_bits)
            .parity(parity(config.parity))
            .flow_control(FlowControl::None)
            .timeout(config.read_timeout())
            .open()?;

        Ok(SerialChannel { port: handle })
    }
}

/// An open serial port.
pub struct SerialChannel {
    port: Box<dyn SerialPort>,
}

impl SerialChannel {
    /// Returns the OS name of the port, if known.
    pub fn name(&self) -> Option<String> {
        self.port.name()
    }
}

impl Channel for SerialChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.port.write_all(buf)?;
        self.port.flush()
    }

    fn discard_input(&mut self) -> io::Result<()> {
        self.port.clear(ClearBuffer::Input)?;
        Ok(())
    }
}

/// A serial port present on this machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub name: String,
    pub description: String,
}

/// Lists serial ports present on this machine.
pub fn available_ports() -> io::Result<Vec<PortInfo>> {
    let ports = serialport::available_ports()?;
    Ok(ports
        .into_iter()
        .map(|p| PortInfo {
            description: describe(&p.port_type),
            name: p.port_name,
        })
        .collect())
}

fn describe(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(usb) => {
            let mut desc = format!("USB {:04x}:{:04x}", usb.vid, usb.pid);
            if let Some(ref product) = usb.product {
                desc.push(' ');
                desc.push_str(product);
            }
            desc
        }
        SerialPortType::PciPort => "PCI".to_string(),
        SerialPortType::BluetoothPort => "Bluetooth".to_string(),
        SerialPortType::Unknown => "unknown".to_string(),
    }
}

fn data_bits(bits: u8) -> io::Result<DataBits> {
    match bits {
        5 => Ok(DataBits::Five),
        6 => Ok(DataBits::Six),
        7 => Ok(DataBits::Seven),
        8 => Ok(DataBits::Eight),
        other => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("unsupported data bits: {}", other),
        )),
    }
}

fn stop_bits(bits: u8) -> io::Result<StopBits> {
    match bits {
        1 => Ok(StopBits::One),
        2 => Ok(StopBits::Two),
        other => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("unsupported stop bits: {}", other),
        )),
    }
}

fn parity(parity: Parity) -> serialport::Parity {
    match parity {
        Parity::None => serialport::Parity::None,
        Parity::Odd => serialport::Parity::Odd,
        Parity::Even => serialport::Parity::Even,
    }
}

fn parity_char(parity: Parity) -> char {
    match parity {
        Parity::None => 'N',
        Parity::Odd => 'O',
        Parity::Even => 'E',
    }
}
