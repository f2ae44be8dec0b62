//! Discovering and opening serial ports an EV3 may be attached to.
//!
//! The brick shows up as a Bluetooth serial port (RFCOMM) once paired.
//! This module does not have async support.

use std::time::Duration;

use serialport::{SerialPort, SerialPortInfo, SerialPortType};

use crate::channel::StreamChannel;
use crate::errors::DeviceError;

/// The default baud rate. Bluetooth serial ignores it, USB adapters do not.
pub const DEFAULT_BAUD_RATE: u32 = 115200;

/// The default timeout for a serial read in seconds
pub const SERIAL_TIMEOUT_SECONDS: u64 = 5;

/// The default timeout for a serial read in nanoseconds
pub const SERIAL_TIMEOUT_NS: u32 = 0;

/// Settings used to open a serial port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    pub port_name: String,
    pub baud_rate: u32,
    /// How long a read may block before the command fails
    pub timeout: Duration,
}

impl SerialConfig {
    pub fn new(port_name: impl Into<String>) -> Self {
        SerialConfig {
            port_name: port_name.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: Duration::new(SERIAL_TIMEOUT_SECONDS, SERIAL_TIMEOUT_NS),
        }
    }

    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A serial port that may lead to an EV3
#[derive(Debug, Clone)]
pub struct Ev3SerialPort {
    pub port_info: SerialPortInfo,
    /// True when the operating system reports the port as Bluetooth
    /// or its name looks like an RFCOMM device.
    pub bluetooth: bool,
}

/// Lists the serial ports on the computer, Bluetooth ones first.
pub fn discover_ports() -> Result<Vec<Ev3SerialPort>, DeviceError> {
    let mut ports: Vec<Ev3SerialPort> = serialport::available_ports()?
        .into_iter()
        .map(|port_info| {
            let bluetooth = matches!(port_info.port_type, SerialPortType::BluetoothPort)
                || port_info.port_name.contains("rfcomm")
                || port_info.port_name.contains("EV3");
            Ev3SerialPort {
                port_info,
                bluetooth,
            }
        })
        .collect();

    // Stable, so ports keep the order the OS reported within each group
    ports.sort_by_key(|p| !p.bluetooth);
    tracing::debug!(count = ports.len(), "discovered serial ports");
    Ok(ports)
}

/// Opens the serial port described by `config` and wraps it in a [StreamChannel].
pub fn open_device(
    config: &SerialConfig,
) -> Result<StreamChannel<Box<dyn SerialPort>>, DeviceError> {
    let port = serialport::new(&config.port_name, config.baud_rate)
        .parity(serialport::Parity::None)
        .data_bits(serialport::DataBits::Eight)
        .stop_bits(serialport::StopBits::One)
        .timeout(config.timeout)
        .open()
        .map_err(|e| match e.kind() {
            serialport::ErrorKind::NoDevice => DeviceError::NotFound(config.port_name.clone()),
            _ => DeviceError::SerialportError(e),
        })?;

    tracing::info!(port = %config.port_name, baud = config.baud_rate, "opened serial port");
    Ok(StreamChannel::new(port))
}
