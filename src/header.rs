//! TLV headers.

use crate::{Encodable, Encoder, Length, LengthDialect, Result, Tag};
use core::convert::TryInto;

/// Tag + length component of TLV-encoded values, with the length written
/// in the dialect of the node it belongs to.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct Header {
    /// Tag representing the type of the encoded value
    pub tag: Tag,

    /// Length of the encoded value
    pub length: Length,

    /// How the length field is written
    pub dialect: LengthDialect,
}

impl Header {
    /// Create a new [`Header`] from a [`Tag`] and a specified length.
    ///
    /// Returns [`Error`](crate::Error) if the length exceeds the limits of [`Length`]
    pub fn new(tag: Tag, length: impl TryInto<Length>, dialect: LengthDialect) -> Result<Self> {
        let length = length
            .try_into()
            .map_err(|_| crate::ErrorKind::Overflow)?;
        Ok(Self { tag, length, dialect })
    }
}

impl Encodable for Header {
    fn encoded_len(&self) -> Result<Length> {
        self.tag.encoded_len()? + self.dialect.encoded_len(self.length)?
    }

    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
        self.tag.encode(encoder)?;
        self.dialect.encode(self.length, encoder)
    }
}

#[cfg(test)]
mod tests {
    use super::Header;
    use crate::{Encodable, LengthDialect, Tag};

    #[test]
    fn dialects() {
        let mut buf = [0u8; 8];

        let header = Header::new(Tag::context(2).non_canonical(), 300usize, LengthDialect::Der).unwrap();
        assert_eq!(header.encode_to_slice(&mut buf).unwrap(), &[0x9F, 0x02, 0x82, 0x01, 0x2C]);
        assert_eq!(header.encoded_len().unwrap().to_usize(), 5);

        let header = Header::new(Tag::private(1), 300usize, LengthDialect::Dgi).unwrap();
        assert_eq!(header.encode_to_slice(&mut buf).unwrap(), &[0xC1, 0xFF, 0x01, 0x2C]);
    }
}
