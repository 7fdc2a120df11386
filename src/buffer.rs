use crate::{Decodable, ErrorKind, Length, Result};

/// Constructed values nested deeper than this fail to decode with
/// [`ErrorKind::NestingTooDeep`].
pub const MAX_NESTING_DEPTH: usize = 64;

/// Bounds-checked cursor over a borrowed byte region.
///
/// Reads never cross `limit`. A constructed value narrows the limit to its
/// own extent with [`ParseBuffer::set_length`] while its children are read,
/// then puts the outer limit back with [`ParseBuffer::set_limit`]; limits
/// are not stacked automatically.
///
/// Invariant: `mark <= cursor <= limit <= bytes.len()`.
#[derive(Clone, Debug)]
pub struct ParseBuffer<'a> {
    /// Byte slice being decoded.
    bytes: &'a [u8],

    /// Position of the next byte to read.
    cursor: usize,

    /// Position saved by [`ParseBuffer::mark`].
    mark: usize,

    /// End of the currently visible region.
    limit: usize,

    /// Number of constructed values currently being read.
    depth: usize,
}

impl<'a> ParseBuffer<'a> {
    /// Create a new buffer spanning the whole slice.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            cursor: 0,
            mark: 0,
            limit: bytes.len(),
            depth: 0,
        }
    }

    /// Decode a value which impls the [`Decodable`] trait.
    pub fn decode<T: Decodable>(&mut self) -> Result<T> {
        T::decode(self)
    }

    /// Return an error with the given [`ErrorKind`], annotating it with
    /// context about where the error occurred.
    pub fn error<T>(&self, kind: ErrorKind) -> Result<T> {
        Err(kind.at(self.position_length()))
    }

    /// Finish decoding, returning the given value if the visible region
    /// is exhausted, or an error otherwise
    pub fn finish<T>(self, value: T) -> Result<T> {
        if self.is_exhausted() {
            Ok(value)
        } else {
            self.error(ErrorKind::TrailingData {
                decoded: self.position_length(),
                remaining: Length::try_from(self.remaining())?,
            })
        }
    }

    /// Offset of the cursor from the start of the backing slice.
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// End of the visible region.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Bytes left before the limit.
    pub fn remaining(&self) -> usize {
        self.limit - self.cursor
    }

    /// Has the cursor reached the limit?
    pub fn is_exhausted(&self) -> bool {
        self.cursor == self.limit
    }

    /// Remember the current cursor position.
    pub fn mark(&mut self) {
        self.mark = self.cursor;
    }

    /// Move the cursor back to the last mark. The limit is left untouched.
    pub fn reset(&mut self) {
        self.cursor = self.mark;
    }

    /// Narrow the visible region to the next `length` bytes.
    ///
    /// Returns the previous limit, which the caller hands back to
    /// [`ParseBuffer::set_limit`] once the narrowed region has been read.
    /// Fails with [`ErrorKind::LengthExceedsRegion`] if the region would
    /// reach past the current limit.
    pub fn set_length(&mut self, length: usize) -> Result<usize> {
        if length > self.remaining() {
            return self.error(ErrorKind::LengthExceedsRegion {
                declared: Length::try_from(length)?,
                remaining: Length::try_from(self.remaining())?,
            });
        }
        let outer = self.limit;
        self.limit = self.cursor + length;
        Ok(outer)
    }

    /// Set the end of the visible region.
    pub fn set_limit(&mut self, limit: usize) -> Result<()> {
        if limit < self.cursor || limit > self.bytes.len() {
            return self.error(ErrorKind::BufferUnderrun);
        }
        self.limit = limit;
        Ok(())
    }

    /// Step into the value of a constructed object.
    pub(crate) fn enter(&mut self) -> Result<()> {
        if self.depth >= MAX_NESTING_DEPTH {
            return self.error(ErrorKind::NestingTooDeep {
                max: MAX_NESTING_DEPTH,
            });
        }
        self.depth += 1;
        Ok(())
    }

    /// Step back out of a constructed value.
    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Read a single byte, updating the cursor.
    pub fn get(&mut self) -> Result<u8> {
        match self.get_bytes(1)? {
            [byte] => Ok(*byte),
            _ => self.error(ErrorKind::BufferUnderrun),
        }
    }

    /// Read `len` bytes, or fail with [`ErrorKind::BufferUnderrun`] if the
    /// region does not hold that many.
    pub fn get_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return self.error(ErrorKind::BufferUnderrun);
        }
        let start = self.cursor;
        self.cursor += len;
        Ok(&self.bytes[start..self.cursor])
    }

    /// Read a DER/BER length field.
    ///
    /// Returns `None` for the indefinite form (`0x80`).
    pub fn der_length(&mut self) -> Result<Option<Length>> {
        let first = self.get()?;
        if first & 0x80 == 0 {
            return Ok(Some(Length::from(first)));
        }

        let octets = first & 0x7F;
        match octets {
            0 => Ok(None),
            1..=4 => {
                let length = self
                    .get_bytes(octets as usize)?
                    .iter()
                    .fold(0u32, |acc, byte| (acc << 8) | *byte as u32);
                Ok(Some(Length::from(length)))
            }
            _ => self.error(ErrorKind::LengthFieldTooLarge { octets }),
        }
    }

    /// Read a DGI length field: one byte up to `0xFE`, or `0xFF` followed by
    /// a two byte big-endian length.
    pub fn dgi_length(&mut self) -> Result<Length> {
        match self.get()? {
            0xFF => {
                let be_len = self.get_bytes(2)?;
                Ok(Length::from(u16::from_be_bytes([be_len[0], be_len[1]])))
            }
            len => Ok(len.into()),
        }
    }

    /// Read a tag field and return its raw bytes as a big-endian integer,
    /// e.g. `0x9F02` for the two byte tag `9F 02`.
    ///
    /// The field is delimited exactly as [`Tag`](crate::Tag) decoding does,
    /// but only tags of up to four bytes fit the result: a five byte tag,
    /// which [`Tag`](crate::Tag) accepts, fails here with
    /// [`ErrorKind::InvalidTagEncoding`].
    pub fn get_tag(&mut self) -> Result<u32> {
        let first = self.get()?;
        let mut tag = first as u32;
        if first & 0x1F != 0x1F {
            return Ok(tag);
        }

        for _ in 0..3 {
            let byte = self.get()?;
            tag = (tag << 8) | byte as u32;
            if byte & 0x80 == 0 {
                return Ok(tag);
            }
        }
        self.error(ErrorKind::InvalidTagEncoding)
    }

    fn position_length(&self) -> Length {
        Length::from(self.cursor.min(Length::max()) as u32)
    }
}

impl<'a> From<&'a [u8]> for ParseBuffer<'a> {
    fn from(bytes: &'a [u8]) -> ParseBuffer<'a> {
        ParseBuffer::new(bytes)
    }
}
