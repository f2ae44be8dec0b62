//! Direct command framing over any byte stream.
//!
//! Every packet starts with a two byte little endian length that counts
//! the bytes after it, followed by the message counter, the command type
//! and the global/local buffer allocation:
//!
//! ```text
//! [len lo][len hi][counter lo][counter hi][type]
//! [globals lo][locals << 2 | globals hi][bytecode...]
//! ```
//!
//! A reply echoes the counter and carries the global buffer:
//!
//! ```text
//! [len lo][len hi][counter lo][counter hi][reply type][global buffer...]
//! ```

use std::io::{Read, Write};

use super::Channel;
use crate::errors::ChannelError;
use crate::protocol::{
    Bytecode, CommandType, ReplyType, MAX_COMMAND_LEN, MAX_GLOBAL_BUFFER, REPLY_HEADER_LEN,
};

/// Bytes between the length field and the bytecode of an outgoing packet.
const COMMAND_HEADER_LEN: usize = 5;

/// A [Channel] speaking the direct command framing over a stream,
/// such as a serial port or an RFCOMM socket.
pub struct StreamChannel<T: Read + Write + Send> {
    stream: T,
    counter: u16,
}

impl<T: Read + Write + Send> StreamChannel<T> {
    pub fn new(stream: T) -> Self {
        StreamChannel { stream, counter: 0 }
    }

    /// Gives back the wrapped stream.
    pub fn into_inner(self) -> T {
        self.stream
    }

    /// Builds a packet for `bytecode` and returns it with the counter it was stamped with.
    fn frame(
        &mut self,
        kind: CommandType,
        globals: u16,
        bytecode: &Bytecode,
    ) -> Result<(Vec<u8>, u16), ChannelError> {
        if globals > MAX_GLOBAL_BUFFER {
            return Err(ChannelError::ReplyTooLarge(globals));
        }

        let body_len = COMMAND_HEADER_LEN + bytecode.len();
        if body_len > MAX_COMMAND_LEN {
            return Err(ChannelError::CommandTooLong(body_len));
        }

        let counter = self.counter;
        self.counter = self.counter.wrapping_add(1);

        let mut packet = Vec::with_capacity(2 + body_len);
        packet.extend_from_slice(&(body_len as u16).to_le_bytes());
        packet.extend_from_slice(&counter.to_le_bytes());
        packet.push(kind as u8);

        // No local variables are ever reserved, so the upper six bits stay clear
        packet.push((globals & 0xff) as u8);
        packet.push(((globals >> 8) & 0x03) as u8);

        packet.extend_from_slice(bytecode.as_bytes());

        Ok((packet, counter))
    }

    fn write_packet(&mut self, packet: &[u8]) -> Result<(), ChannelError> {
        self.stream.write_all(packet)?;
        self.stream.flush()?;
        Ok(())
    }

    /// Reads one length-prefixed reply body.
    fn read_body(&mut self) -> Result<Vec<u8>, ChannelError> {
        let mut len = [0u8; 2];
        // DO NOT CHANGE THIS TO READ. A short read would desync every later reply.
        self.stream.read_exact(&mut len)?;
        let len = u16::from_le_bytes(len) as usize;

        let mut body = vec![0u8; len];
        self.stream.read_exact(&mut body)?;
        Ok(body)
    }

    /// Reads the reply to the command stamped with `counter` and checks it.
    ///
    /// Replies to earlier commands whose read timed out may still be in the
    /// stream. Those are skipped until the matching one arrives.
    fn read_reply(&mut self, counter: u16, expected: u16) -> Result<Vec<u8>, ChannelError> {
        let wanted = REPLY_HEADER_LEN + expected as usize;

        let body = loop {
            let body = self.read_body()?;
            if body.len() < REPLY_HEADER_LEN {
                return Err(ChannelError::ReplyLength {
                    expected: wanted,
                    actual: body.len(),
                });
            }

            let received = u16::from_le_bytes([body[0], body[1]]);
            if received == counter {
                break body;
            }

            // A stale reply is behind us in wrapping order, anything else is a real mismatch
            let behind = counter.wrapping_sub(received);
            if behind >= 0x8000 {
                return Err(ChannelError::CounterMismatch {
                    sent: counter,
                    received,
                });
            }
            tracing::debug!(counter, received, "discarding late reply");
        };

        if body.len() != wanted {
            return Err(ChannelError::ReplyLength {
                expected: wanted,
                actual: body.len(),
            });
        }

        match ReplyType::try_from(body[2])? {
            ReplyType::Ok => Ok(body),
            ReplyType::Error => Err(ChannelError::CommandFailed),
        }
    }
}

impl<T: Read + Write + Send> Channel for StreamChannel<T> {
    fn send_no_reply(&mut self, bytecode: &Bytecode) -> Result<(), ChannelError> {
        let (packet, counter) = self.frame(CommandType::DirectNoReply, 0, bytecode)?;
        tracing::trace!(counter, len = packet.len(), "writing direct command");
        self.write_packet(&packet)
    }

    fn send(
        &mut self,
        expected_reply_length: u16,
        bytecode: &Bytecode,
    ) -> Result<Vec<u8>, ChannelError> {
        let (packet, counter) =
            self.frame(CommandType::DirectReply, expected_reply_length, bytecode)?;
        tracing::trace!(
            counter,
            len = packet.len(),
            expected_reply_length,
            "writing direct command"
        );
        self.write_packet(&packet)?;
        self.read_reply(counter, expected_reply_length)
    }
}
