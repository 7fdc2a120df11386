//! Flat tag-length-value lists as used by EMV and Global Platform.
//!
//! Entries carry a numeric tag and a value, never children. The tag is the
//! big-endian integer formed by its bytes, so `9F 02` is tag `0x9F02`.

use crate::{
    length::minimal_octets, Decodable, Encodable, Encoder, ErrorKind, Length, LengthDialect,
    ParseBuffer, Result,
};
use alloc::vec::Vec;
use core::{convert::TryFrom, marker::PhantomData};

/// Tag and length rules of a flat TLV format.
pub trait FlatFormat {
    /// Read a tag field.
    fn read_tag(buffer: &mut ParseBuffer<'_>) -> Result<u32>;

    /// Size of the tag field for `tag`.
    fn tag_len(tag: u32) -> Result<Length>;

    fn write_tag(tag: u32, encoder: &mut Encoder<'_>) -> Result<()>;

    /// Read a length field.
    fn read_length(buffer: &mut ParseBuffer<'_>) -> Result<Length>;

    /// Size of the length field for `length`.
    fn length_len(length: Length) -> Result<Length>;

    fn write_length(length: Length, encoder: &mut Encoder<'_>) -> Result<()>;
}

/// EMV: tags of one to four bytes, written with as few bytes as the value
/// needs; DER style lengths of at most three bytes after the `0x8n` marker.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Emv;

/// Largest value an EMV length field can carry.
const EMV_MAX_LENGTH: u32 = 0xFF_FFFF;

impl FlatFormat for Emv {
    fn read_tag(buffer: &mut ParseBuffer<'_>) -> Result<u32> {
        buffer.get_tag()
    }

    fn tag_len(tag: u32) -> Result<Length> {
        Length::try_from(minimal_octets(tag))
    }

    fn write_tag(tag: u32, encoder: &mut Encoder<'_>) -> Result<()> {
        encoder.bytes(&tag.to_be_bytes()[4 - minimal_octets(tag)..])
    }

    fn read_length(buffer: &mut ParseBuffer<'_>) -> Result<Length> {
        match buffer.der_length()? {
            Some(length) => Ok(length),
            None => buffer.error(ErrorKind::IndefiniteLength),
        }
    }

    fn length_len(length: Length) -> Result<Length> {
        if u32::from(length) > EMV_MAX_LENGTH {
            return Err(ErrorKind::ValueTooLarge { length: length.to_usize() }.into());
        }
        LengthDialect::Der.encoded_len(length)
    }

    fn write_length(length: Length, encoder: &mut Encoder<'_>) -> Result<()> {
        if u32::from(length) > EMV_MAX_LENGTH {
            return encoder.error(ErrorKind::ValueTooLarge { length: length.to_usize() });
        }
        LengthDialect::Der.encode(length, encoder)
    }
}

/// Data grouping identifiers of personalisation scripts: a fixed two byte
/// tag and a DGI length.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Dgi;

impl FlatFormat for Dgi {
    fn read_tag(buffer: &mut ParseBuffer<'_>) -> Result<u32> {
        let bytes = buffer.get_bytes(2)?;
        Ok(u32::from(u16::from_be_bytes([bytes[0], bytes[1]])))
    }

    fn tag_len(tag: u32) -> Result<Length> {
        match u16::try_from(tag) {
            Ok(_) => Ok(Length::from(2u8)),
            Err(_) => Err(ErrorKind::InvalidTagEncoding.into()),
        }
    }

    fn write_tag(tag: u32, encoder: &mut Encoder<'_>) -> Result<()> {
        match u16::try_from(tag) {
            Ok(tag) => encoder.bytes(&tag.to_be_bytes()),
            Err(_) => encoder.error(ErrorKind::InvalidTagEncoding),
        }
    }

    fn read_length(buffer: &mut ParseBuffer<'_>) -> Result<Length> {
        buffer.dgi_length()
    }

    fn length_len(length: Length) -> Result<Length> {
        LengthDialect::Dgi.encoded_len(length)
    }

    fn write_length(length: Length, encoder: &mut Encoder<'_>) -> Result<()> {
        LengthDialect::Dgi.encode(length, encoder)
    }
}

/// One flat data object.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GpTlv<F = Emv> {
    tag: u32,
    value: Vec<u8>,
    format: PhantomData<F>,
}

/// Entry of an EMV record.
pub type EmvTlv = GpTlv<Emv>;

/// Entry of a personalisation script.
pub type DgiTlv = GpTlv<Dgi>;

impl<F: FlatFormat> GpTlv<F> {
    pub fn new(tag: u32, value: impl Into<Vec<u8>>) -> Self {
        Self {
            tag,
            value: value.into(),
            format: PhantomData,
        }
    }

    pub fn tag(&self) -> u32 {
        self.tag
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn into_value(self) -> Vec<u8> {
        self.value
    }

    /// Length of the value field.
    pub fn length(&self) -> Result<Length> {
        Length::try_from(self.value.len())
    }
}

impl<F: FlatFormat> Decodable for GpTlv<F> {
    fn decode(buffer: &mut ParseBuffer<'_>) -> Result<Self> {
        let tag = F::read_tag(buffer)?;
        let length = F::read_length(buffer)?;
        if length.to_usize() > buffer.remaining() {
            return buffer.error(ErrorKind::LengthExceedsRegion {
                declared: length,
                remaining: Length::try_from(buffer.remaining())?,
            });
        }
        let value = buffer.get_bytes(length.to_usize())?;
        trace!("flat tag {:X} with {} value bytes", tag, length);
        Ok(Self::new(tag, value))
    }
}

impl<F: FlatFormat> Encodable for GpTlv<F> {
    fn encoded_len(&self) -> Result<Length> {
        let length = self.length()?;
        (F::tag_len(self.tag)? + F::length_len(length)?)? + length
    }

    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
        F::write_tag(self.tag, encoder)?;
        F::write_length(self.length()?, encoder)?;
        encoder.bytes(&self.value)
    }
}

/// Ordered list of flat data objects, kept in the order they were read.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TlvList<F = Emv> {
    entries: Vec<GpTlv<F>>,
}

impl<F> Default for TlvList<F> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<F: FlatFormat> TlvList<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: GpTlv<F>) {
        self.entries.push(entry);
    }

    /// First entry carrying `tag`.
    pub fn find(&self, tag: u32) -> Option<&GpTlv<F>> {
        self.entries.iter().find(|entry| entry.tag == tag)
    }

    pub fn get(&self, index: usize) -> Option<&GpTlv<F>> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> core::slice::Iter<'_, GpTlv<F>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<GpTlv<F>> {
        self.entries
    }
}

impl<F: FlatFormat> FromIterator<GpTlv<F>> for TlvList<F> {
    fn from_iter<I: IntoIterator<Item = GpTlv<F>>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a, F> IntoIterator for &'a TlvList<F> {
    type Item = &'a GpTlv<F>;
    type IntoIter = core::slice::Iter<'a, GpTlv<F>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<F: FlatFormat> Decodable for TlvList<F> {
    /// Read entries until the buffer is exhausted.
    fn decode(buffer: &mut ParseBuffer<'_>) -> Result<Self> {
        let mut list = Self::new();
        while !buffer.is_exhausted() {
            list.push(buffer.decode()?);
        }
        Ok(list)
    }
}

impl<F: FlatFormat> Encodable for TlvList<F> {
    fn encoded_len(&self) -> Result<Length> {
        self.entries
            .iter()
            .fold(Ok(Length::zero()), |sum, entry| sum + entry.encoded_len()?)
    }

    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
        for entry in &self.entries {
            entry.encode(encoder)?;
        }
        Ok(())
    }
}
