pub mod bytecode;
pub mod reply;
pub use bytecode::{Bytecode, Parameter};
pub use reply::Reply;

/// Parameter tag for a one byte constant (LC1).
pub const LC1: u8 = 0x81;
/// Parameter tag for a two byte constant (LC2).
pub const LC2: u8 = 0x82;
/// Parameter tag for a four byte constant (LC4).
pub const LC4: u8 = 0x83;
/// Reference to a global variable addressed by a one byte index (GV1).
pub const GV1: u8 = 0xE1;

/// The layer of the brick that receives the command. Daisy chaining is not supported.
pub const LAYER_MASTER: u8 = 0x00;

/// Number of bytes before the global buffer in a direct reply:
/// the message counter (two bytes) and the reply type.
pub const REPLY_HEADER_LEN: usize = 3;

/// The largest global buffer a direct command can reserve.
pub const MAX_GLOBAL_BUFFER: u16 = 1023;

/// The largest command body the brick accepts, header included.
pub const MAX_COMMAND_LEN: usize = 1024;

/// Opcodes understood by the EV3 virtual machine.
///
/// Only the opcodes the driver issues are listed here. Anything else
/// can still be sent as a raw [u8] through [Bytecode::add_op_code].
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    Sound = 0x94,
    InputDevice = 0x99,
    OutputPower = 0xA4,
    OutputStart = 0xA6,
}

/// Sub-commands of [OpCode::Sound]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCommand {
    Tone = 0x01,
}

/// Sub-commands of [OpCode::InputDevice]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputDeviceCommand {
    ReadyPct = 0x1B,
    ReadySi = 0x1D,
}

impl From<OpCode> for u8 {
    fn from(code: OpCode) -> u8 {
        code as u8
    }
}

impl From<SoundCommand> for u8 {
    fn from(code: SoundCommand) -> u8 {
        code as u8
    }
}

impl From<InputDeviceCommand> for u8 {
    fn from(code: InputDeviceCommand) -> u8 {
        code as u8
    }
}

/// The type byte of an outgoing direct command.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    /// The brick answers with a direct reply carrying the global buffer.
    DirectReply = 0x00,
    /// The brick executes the command silently.
    DirectNoReply = 0x80,
}

/// The type byte of an incoming direct reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyType {
    Ok,
    Error,
}

impl TryFrom<u8> for ReplyType {
    type Error = crate::errors::ChannelError;

    fn try_from(value: u8) -> Result<ReplyType, crate::errors::ChannelError> {
        match value {
            0x02 => Ok(ReplyType::Ok),
            0x04 => Ok(ReplyType::Error),
            v => Err(crate::errors::ChannelError::UnknownReplyType(v)),
        }
    }
}
