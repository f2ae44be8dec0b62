//! Transports for direct commands.
//!
//! [Channel] is the blocking contract every transport implements.
//! [AsyncChannel] puts a single worker thread in front of one so that many
//! callers can share it without interleaving command/reply pairs.

use crate::errors::ChannelError;
use crate::protocol::Bytecode;

pub mod spooler;
pub mod stream;

pub use spooler::AsyncChannel;
pub use stream::StreamChannel;

/// A blocking, ordered transport to the brick.
pub trait Channel: Send {
    /// Sends a command that produces no reply.
    fn send_no_reply(&mut self, bytecode: &Bytecode) -> Result<(), ChannelError>;

    /// Sends a command and waits for its reply.
    ///
    /// `expected_reply_length` is the size of the global buffer the command
    /// writes to. The returned bytes are the reply header followed by
    /// exactly that many bytes.
    fn send(
        &mut self,
        expected_reply_length: u16,
        bytecode: &Bytecode,
    ) -> Result<Vec<u8>, ChannelError>;
}

impl<C: Channel + ?Sized> Channel for Box<C> {
    fn send_no_reply(&mut self, bytecode: &Bytecode) -> Result<(), ChannelError> {
        (**self).send_no_reply(bytecode)
    }

    fn send(
        &mut self,
        expected_reply_length: u16,
        bytecode: &Bytecode,
    ) -> Result<Vec<u8>, ChannelError> {
        (**self).send(expected_reply_length, bytecode)
    }
}
