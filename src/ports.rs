//! Port identifiers of the EV3 brick.
use bitflags::bitflags;

use crate::errors::PortError;

/// One of the four sensor ports
///
/// # Variants
///
/// * [InputPort::One] - Port 1, protocol code 0
/// * [InputPort::Two] - Port 2, protocol code 1
/// * [InputPort::Three] - Port 3, protocol code 2
/// * [InputPort::Four] - Port 4, protocol code 3
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum InputPort {
    One = 0x00,
    Two = 0x01,
    Three = 0x02,
    Four = 0x03,
}

impl InputPort {
    pub const ALL: [InputPort; 4] = [
        InputPort::One,
        InputPort::Two,
        InputPort::Three,
        InputPort::Four,
    ];

    /// The code of the port in the serial protocol.
    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for InputPort {
    type Error = PortError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0x00 => Ok(InputPort::One),
            0x01 => Ok(InputPort::Two),
            0x02 => Ok(InputPort::Three),
            0x03 => Ok(InputPort::Four),
            a => Err(PortError::InvalidInput(a)),
        }
    }
}

/// One of the four motor ports
///
/// # Variants
///
/// * [OutputPort::A] - protocol code 0
/// * [OutputPort::B] - protocol code 1
/// * [OutputPort::C] - protocol code 2
/// * [OutputPort::D] - protocol code 3
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OutputPort {
    A = 0x00,
    B = 0x01,
    C = 0x02,
    D = 0x03,
}

impl OutputPort {
    pub const ALL: [OutputPort; 4] = [OutputPort::A, OutputPort::B, OutputPort::C, OutputPort::D];

    /// The code of the port in the serial protocol.
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// The single bit selecting this port in output commands.
    pub fn mask(self) -> OutputMask {
        OutputMask::from_bits_truncate(1 << self.to_byte())
    }
}

impl TryFrom<u8> for OutputPort {
    type Error = PortError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0x00 => Ok(OutputPort::A),
            0x01 => Ok(OutputPort::B),
            0x02 => Ok(OutputPort::C),
            0x03 => Ok(OutputPort::D),
            a => Err(PortError::InvalidOutput(a)),
        }
    }
}

impl std::str::FromStr for OutputPort {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" | "a" => Ok(OutputPort::A),
            "B" | "b" => Ok(OutputPort::B),
            "C" | "c" => Ok(OutputPort::C),
            "D" | "d" => Ok(OutputPort::D),
            _ => Err(PortError::InvalidOutput(s.bytes().next().unwrap_or(0))),
        }
    }
}

bitflags! {
    /// The port selection byte of output opcodes
    ///
    /// # Members
    /// * [OutputMask::A] through [OutputMask::D] - one bit per motor port
    /// * [OutputMask::ALL] - every motor port
    pub struct OutputMask: u8 {
        const A = 0b0001;
        const B = 0b0010;
        const C = 0b0100;
        const D = 0b1000;
        const ALL = Self::A.bits | Self::B.bits | Self::C.bits | Self::D.bits;
    }
}

impl From<OutputPort> for OutputMask {
    fn from(port: OutputPort) -> Self {
        port.mask()
    }
}
