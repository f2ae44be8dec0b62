use crate::errors::DecodeError;

/// The raw bytes of a direct reply.
///
/// The first [super::REPLY_HEADER_LEN] bytes are the echoed message counter
/// and the reply type, the global buffer follows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    data: Vec<u8>,
}

impl Reply {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `len` bytes starting at `offset`.
    pub fn bytes(&self, offset: usize, len: usize) -> Result<&[u8], DecodeError> {
        offset
            .checked_add(len)
            .and_then(|end| self.data.get(offset..end))
            .ok_or(DecodeError::ReplyTooShort {
                offset,
                needed: len,
                len: self.data.len(),
            })
    }

    /// Reads a little endian [f32] at `offset`.
    pub fn f32_le(&self, offset: usize) -> Result<f32, DecodeError> {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(self.bytes(offset, 4)?);
        Ok(f32::from_le_bytes(raw))
    }

    /// Reads the byte at `offset` as a two's complement [i8].
    pub fn i8(&self, offset: usize) -> Result<i8, DecodeError> {
        Ok(self.bytes(offset, 1)?[0] as i8)
    }
}

impl From<Vec<u8>> for Reply {
    fn from(data: Vec<u8>) -> Self {
        Reply::new(data)
    }
}
