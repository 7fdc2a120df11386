use crate::{Encodable, ErrorKind, Length, Result};
use core::convert::TryInto;

/// TLV encoder writing into a caller-supplied buffer.
#[derive(Debug)]
pub struct Encoder<'a> {
    /// Buffer into which the encoded message is written
    bytes: Option<&'a mut [u8]>,

    /// Total number of bytes written to buffer so far
    position: Length,
}

impl<'a> Encoder<'a> {
    /// Create a new encoder with the given byte slice as a backing buffer.
    pub fn new(bytes: &'a mut [u8]) -> Self {
        Self {
            bytes: Some(bytes),
            position: Length::zero(),
        }
    }

    /// Encode a value which impls the [`Encodable`] trait.
    pub fn encode<T: Encodable + ?Sized>(&mut self, encodable: &T) -> Result<()> {
        if self.is_failed() {
            return self.error(ErrorKind::Failed);
        }

        encodable.encode(self).map_err(|e| {
            self.bytes.take();
            e.nested(self.position)
        })
    }

    /// Return an error with the given [`ErrorKind`], annotating it with
    /// context about where the error occurred.
    pub fn error<T>(&mut self, kind: ErrorKind) -> Result<T> {
        self.bytes.take();
        Err(kind.at(self.position))
    }

    /// Did the encoding operation fail due to an error?
    pub fn is_failed(&self) -> bool {
        self.bytes.is_none()
    }

    /// Finish encoding to the buffer, returning a slice containing the data
    /// written to the buffer.
    pub fn finish(self) -> Result<&'a [u8]> {
        let position = self.position;

        match self.bytes {
            Some(bytes) => bytes
                .get(..self.position.into())
                .ok_or_else(|| ErrorKind::BufferUnderrun.at(position)),
            None => Err(ErrorKind::Failed.at(position)),
        }
    }

    /// Encode a single byte into the backing buffer.
    pub fn byte(&mut self, byte: u8) -> Result<()> {
        match self.reserve(1u8)?.first_mut() {
            Some(b) => {
                *b = byte;
                Ok(())
            }
            None => self.error(ErrorKind::Overlength),
        }
    }

    /// Encode the provided byte slice into the backing buffer.
    pub fn bytes(&mut self, slice: &[u8]) -> Result<()> {
        self.reserve(slice.len())?.copy_from_slice(slice);
        Ok(())
    }

    /// Reserve a portion of the internal buffer, updating the internal cursor
    /// position and returning a mutable slice.
    fn reserve(&mut self, len: impl TryInto<Length>) -> Result<&mut [u8]> {
        let len = len
            .try_into()
            .or_else(|_| self.error(ErrorKind::Overflow))?;

        if len > self.remaining_len()? {
            return self.error(ErrorKind::Overlength);
        }

        let end = (self.position + len).or_else(|e| self.error(e.kind()))?;
        let range = self.position.into()..end.into();
        let position = &mut self.position;

        match self.bytes.as_mut() {
            Some(bytes) => {
                *position = end;
                Ok(&mut bytes[range])
            }
            None => Err(ErrorKind::Failed.at(*position)),
        }
    }

    /// Get the size of the buffer in bytes.
    fn buffer_len(&self) -> Result<Length> {
        self.bytes
            .as_ref()
            .map(|bytes| bytes.len().min(Length::max()))
            .ok_or_else(|| ErrorKind::Failed.at(self.position))
            .and_then(TryInto::try_into)
    }

    /// Get the number of bytes still remaining in the buffer.
    fn remaining_len(&self) -> Result<Length> {
        self.buffer_len()?
            .to_usize()
            .checked_sub(self.position.into())
            .ok_or_else(|| ErrorKind::Overlength.at(self.position))
            .and_then(TryInto::try_into)
    }
}

#[cfg(test)]
mod tests {
    use super::Encoder;
    use crate::{ErrorKind, Length};

    #[test]
    fn overlength_message() {
        let mut buffer = [0u8; 2];
        let mut encoder = Encoder::new(&mut buffer);
        encoder.bytes(&[1, 2]).unwrap();
        let err = encoder.byte(3).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Overlength);
        assert_eq!(err.position(), Some(Length::from(2u8)));
        assert!(encoder.is_failed());
    }

    #[test]
    fn finish() {
        let mut buffer = [0u8; 8];
        let mut encoder = Encoder::new(&mut buffer);
        encoder.byte(0x04).unwrap();
        encoder.bytes(&[0xAA, 0xBB]).unwrap();
        assert_eq!(encoder.finish().unwrap(), &[0x04, 0xAA, 0xBB]);
    }
}
