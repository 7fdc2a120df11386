use crate::{
    constructed::decode_children, Class, ConstructedTlv, Decodable, Encodable, Encoder, ErrorKind,
    Length, LengthDialect, ParseBuffer, Result, Tag, Tlv,
};
use core::ops::{Deref, DerefMut};

/// ASN.1 `SEQUENCE`: a constructed object with the universal tag 16.
///
/// Dereferences to [`ConstructedTlv`] for the child list API.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Sequence(ConstructedTlv);

impl Sequence {
    pub fn new() -> Self {
        Self(ConstructedTlv::new(Tag::SEQUENCE))
    }

    /// Append children, taking ownership of them.
    pub fn with_children(self, children: impl IntoIterator<Item = Tlv>) -> Self {
        Self(self.0.with_children(children))
    }

    /// Write the length field in `dialect` instead.
    pub fn with_dialect(self, dialect: LengthDialect) -> Self {
        Self(self.0.with_dialect(dialect))
    }

    /// Attach a diagnostic name, shown by the tree dump.
    pub fn with_name(self, name: impl Into<alloc::string::String>) -> Self {
        Self(self.0.with_name(name))
    }

    /// Decode a sequence whose length fields use `dialect`.
    pub fn decode_with(buffer: &mut ParseBuffer<'_>, dialect: LengthDialect) -> Result<Self> {
        let tag: Tag = buffer.decode()?;
        if tag.class != Class::Universal || tag.number != Tag::SEQUENCE.number {
            return buffer.error(ErrorKind::UnexpectedTag {
                expected: Some(Tag::SEQUENCE),
                actual: tag,
            });
        }
        let children = decode_children(buffer, dialect)?;
        Ok(Self(ConstructedTlv::from_parts(tag, dialect, children)))
    }

    pub fn into_inner(self) -> ConstructedTlv {
        self.0
    }
}

impl Default for Sequence {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for Sequence {
    type Target = ConstructedTlv;

    fn deref(&self) -> &ConstructedTlv {
        &self.0
    }
}

impl DerefMut for Sequence {
    fn deref_mut(&mut self) -> &mut ConstructedTlv {
        &mut self.0
    }
}

impl Decodable for Sequence {
    fn decode(buffer: &mut ParseBuffer<'_>) -> Result<Self> {
        Self::decode_with(buffer, LengthDialect::Der)
    }
}

impl Encodable for Sequence {
    fn encoded_len(&self) -> Result<Length> {
        self.0.encoded_len()
    }

    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
        self.0.encode(encoder)
    }
}

#[cfg(test)]
mod tests {
    use super::Sequence;
    use crate::{Decodable, Encodable, ErrorKind, PrimitiveTlv, Tag};
    use hex_literal::hex;

    #[test]
    fn reconstruct() {
        let mut sequence = Sequence::new();
        sequence.add(PrimitiveTlv::new(Tag::INTEGER, [0x01u8]));
        sequence.add(PrimitiveTlv::new(Tag::NULL, [0u8; 0]));

        let encoded = sequence.to_vec().unwrap();
        assert_eq!(encoded, hex!("30 05 02 01 01 05 00"));
        assert_eq!(Sequence::from_bytes(&encoded).unwrap(), sequence);
    }

    #[test]
    fn wrong_tag() {
        let err = Sequence::from_bytes(&hex!("31 00")).unwrap_err();
        assert_eq!(
            err.kind(),
            ErrorKind::UnexpectedTag {
                expected: Some(Tag::SEQUENCE),
                actual: Tag::SET,
            }
        );
    }
}
