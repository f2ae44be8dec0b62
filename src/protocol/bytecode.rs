//! Builder for the byte stream of a single direct command.

use super::{GV1, LC1, LC2, LC4};

/// A typed parameter of an EV3 opcode.
///
/// The brick only knows a fixed set of widths. Each one is written as a
/// tag byte followed by the value in little endian order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameter {
    /// Written as [LC1] and one byte
    Byte(u8),
    /// Written as [LC2] and two bytes
    Short(i16),
    /// Written as [LC4] and four bytes
    Int(i32),
}

impl From<u8> for Parameter {
    fn from(v: u8) -> Self {
        Parameter::Byte(v)
    }
}

impl From<i8> for Parameter {
    fn from(v: i8) -> Self {
        Parameter::Byte(v as u8)
    }
}

impl From<i16> for Parameter {
    fn from(v: i16) -> Self {
        Parameter::Short(v)
    }
}

impl From<i32> for Parameter {
    fn from(v: i32) -> Self {
        Parameter::Int(v)
    }
}

/// The body of a direct command, without the packet header.
///
/// # Example
/// ```rust
/// use ev3_serial::protocol::{Bytecode, OpCode, SoundCommand};
///
/// let mut bc = Bytecode::new();
/// bc.add_op_code(OpCode::Sound)
///     .add_op_code(SoundCommand::Tone)
///     .add_parameter(10u8)
///     .add_parameter(440i16)
///     .add_parameter(200i16);
/// assert_eq!(bc.as_bytes(), &[0x94, 0x01, 0x81, 10, 0x82, 0xB8, 0x01, 0x82, 0xC8, 0x00]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bytecode {
    buffer: Vec<u8>,
}

impl Bytecode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a raw opcode or sub-command byte.
    pub fn add_op_code(&mut self, code: impl Into<u8>) -> &mut Self {
        self.buffer.push(code.into());
        self
    }

    /// Appends a tagged constant parameter.
    pub fn add_parameter(&mut self, value: impl Into<Parameter>) -> &mut Self {
        match value.into() {
            Parameter::Byte(v) => {
                self.buffer.push(LC1);
                self.buffer.push(v);
            }
            Parameter::Short(v) => {
                self.buffer.push(LC2);
                self.buffer.extend_from_slice(&v.to_le_bytes());
            }
            Parameter::Int(v) => {
                self.buffer.push(LC4);
                self.buffer.extend_from_slice(&v.to_le_bytes());
            }
        }
        self
    }

    /// Appends a reference to a slot of the reply's global buffer.
    /// The brick stores the result of the opcode starting at that slot.
    pub fn add_global_index(&mut self, index: u8) -> &mut Self {
        self.buffer.push(GV1);
        self.buffer.push(index);
        self
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{InputDeviceCommand, OpCode, LAYER_MASTER};

    #[test]
    fn new_bytecode_is_empty() {
        let bc = Bytecode::new();
        assert!(bc.is_empty());
        assert_eq!(bc.len(), 0);
    }

    #[test]
    fn parameters_are_tagged_little_endian() {
        let mut bc = Bytecode::new();
        bc.add_parameter(0x7fu8)
            .add_parameter(-2i8)
            .add_parameter(0x1234i16)
            .add_parameter(-1i16)
            .add_parameter(0x0A0B0C0Di32);

        assert_eq!(
            bc.as_bytes(),
            &[
                0x81, 0x7f, //
                0x81, 0xfe, //
                0x82, 0x34, 0x12, //
                0x82, 0xff, 0xff, //
                0x83, 0x0D, 0x0C, 0x0B, 0x0A,
            ]
        );
    }

    #[test]
    fn global_index_uses_gv1() {
        let mut bc = Bytecode::new();
        bc.add_global_index(0x00).add_global_index(0x10);
        assert_eq!(bc.into_bytes(), vec![0xE1, 0x00, 0xE1, 0x10]);
    }

    #[test]
    fn opcodes_are_single_bytes() {
        let mut bc = Bytecode::new();
        bc.add_op_code(OpCode::InputDevice)
            .add_op_code(InputDeviceCommand::ReadySi)
            .add_op_code(0x42u8)
            .add_parameter(LAYER_MASTER);
        assert_eq!(bc.as_bytes(), &[0x99, 0x1D, 0x42, 0x81, 0x00]);
    }
}
