use thiserror::Error;

/// Errors raised while moving a command across a [crate::channel::Channel].
#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialport Error: {0}")]
    SerialportError(#[from] serialport::Error),
    /// The reply does not have the length announced when the command was sent.
    #[error("reply length mismatch: expected {expected} bytes, got {actual}")]
    ReplyLength { expected: usize, actual: usize },
    #[error("reply counter mismatch: sent {sent:#06x}, got {received:#06x}")]
    CounterMismatch { sent: u16, received: u16 },
    #[error("controller rejected the command")]
    CommandFailed,
    #[error("unknown reply type {0:#04x}")]
    UnknownReplyType(u8),
    #[error("command too long ({0} bytes)")]
    CommandTooLong(usize),
    #[error("reply buffer too large ({0} bytes, max 1023)")]
    ReplyTooLarge(u16),
    /// The worker that owned the request went away before resolving it.
    #[error("channel worker has shut down")]
    Disconnected,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("reply too short: needed {needed} bytes at offset {offset}, reply has {len}")]
    ReplyTooShort {
        offset: usize,
        needed: usize,
        len: usize,
    },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortError {
    #[error("invalid input port code {0}")]
    InvalidInput(u8),
    #[error("invalid output port code {0}")]
    InvalidOutput(u8),
}

#[derive(Error, Debug)]
pub enum JobError {
    #[error("a job is already running on this EV3")]
    AlreadyRunning,
    #[error("failed to spawn job worker: {0}")]
    Spawn(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Serialport Error: {0}")]
    SerialportError(#[from] serialport::Error),
    #[error("no serial port named {0}")]
    NotFound(String),
}

/// Any error a pending result can resolve to.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Channel(#[from] ChannelError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Port(#[from] PortError),
    #[error(transparent)]
    Job(#[from] JobError),
}
