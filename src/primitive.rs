use crate::{
    header::Header, Decodable, Encodable, Encoder, ErrorKind, Length, LengthDialect, ParseBuffer,
    Result, Tag,
};
use alloc::{string::String, vec::Vec};
use core::convert::TryFrom;

/// Leaf data object: a tag and the value bytes it owns.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PrimitiveTlv {
    tag: Tag,
    name: Option<String>,
    dialect: LengthDialect,
    value: Vec<u8>,
}

impl PrimitiveTlv {
    /// Create a primitive object with DER lengths.
    pub fn new(tag: Tag, value: impl Into<Vec<u8>>) -> Self {
        Self {
            tag,
            name: None,
            dialect: LengthDialect::Der,
            value: value.into(),
        }
    }

    /// Write the length field in `dialect` instead.
    pub fn with_dialect(mut self, dialect: LengthDialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Attach a diagnostic name, shown by the tree dump.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn dialect(&self) -> LengthDialect {
        self.dialect
    }

    /// Borrow the value bytes.
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Replace the value bytes.
    pub fn set_value(&mut self, value: impl Into<Vec<u8>>) {
        self.value = value.into();
    }

    /// Take the value bytes.
    pub fn into_value(self) -> Vec<u8> {
        self.value
    }

    /// Length of the value field.
    pub fn length(&self) -> Result<Length> {
        Length::try_from(self.value.len())
    }

    /// Decode one primitive object whose length field uses `dialect`.
    ///
    /// Fails with [`ErrorKind::LengthExceedsRegion`] if the declared length
    /// reaches past the buffer's current limit.
    pub fn decode_with(buffer: &mut ParseBuffer<'_>, dialect: LengthDialect) -> Result<Self> {
        let tag: Tag = buffer.decode()?;
        let length = match dialect.decode(buffer)? {
            Some(length) => length,
            None => return buffer.error(ErrorKind::IndefiniteLength),
        };

        if length.to_usize() > buffer.remaining() {
            return buffer.error(ErrorKind::LengthExceedsRegion {
                declared: length,
                remaining: Length::try_from(buffer.remaining())?,
            });
        }
        let value = buffer.get_bytes(length.to_usize())?;
        trace!("primitive {} with {} value bytes", tag, length);

        Ok(Self {
            tag,
            name: None,
            dialect,
            value: value.to_vec(),
        })
    }

    pub(crate) fn header(&self) -> Result<Header> {
        Header::new(self.tag, self.value.len(), self.dialect)
    }
}

impl Decodable for PrimitiveTlv {
    fn decode(buffer: &mut ParseBuffer<'_>) -> Result<Self> {
        Self::decode_with(buffer, LengthDialect::Der)
    }
}

impl Encodable for PrimitiveTlv {
    fn encoded_len(&self) -> Result<Length> {
        self.header()?.encoded_len()? + self.length()?
    }

    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
        self.header()?.encode(encoder)?;
        encoder.bytes(&self.value)
    }
}
