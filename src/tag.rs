use crate::{Decodable, Encodable, Encoder, ErrorKind, Length, ParseBuffer, Result};
use core::fmt;

const CLASS_OFFSET: usize = 6;
const CONSTRUCTED_OFFSET: usize = 5;

/// Indicator bit for constructed form encoding (i.e. vs primitive form)
const CONSTRUCTED_FLAG: u8 = 1u8 << CONSTRUCTED_OFFSET;

/// Low bits of the first octet announcing a multi-byte tag number
const MULTI_BYTE_MARKER: u8 = 0x1F;

/// Indicator bit for continuation octets of a multi-byte tag number
const NOT_LAST_TAG_OCTET_FLAG: u8 = 1u8 << 7;

/// At most four continuation octets follow the first tag octet.
const MAX_CONTINUATION_OCTETS: usize = 4;

/// Class of BER tag.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum Class {
    Universal = 0b00,
    Application = 0b01,
    Context = 0b10,
    Private = 0b11,
}

impl Class {
    fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Class::Universal,
            0b01 => Class::Application,
            0b10 => Class::Context,
            _ => Class::Private,
        }
    }
}

/// Tag of a BER-TLV data object: class, primitive/constructed flag and
/// tag number.
///
/// Numbers below 31 normally fit the first octet. `non_canonical` records
/// that such a number was instead written in the two byte form, which some
/// EMV and ICAO data does; the tag then re-encodes the same way.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Tag {
    pub class: Class,
    pub constructed: bool,
    pub number: u32,
    pub non_canonical: bool,
}

impl Tag {
    pub const END_OF_CONTENTS: Self = Self::universal(0x0);
    pub const BOOLEAN: Self = Self::universal(0x1);
    pub const INTEGER: Self = Self::universal(0x2);
    pub const BIT_STRING: Self = Self::universal(0x3);
    pub const OCTET_STRING: Self = Self::universal(0x4);
    pub const NULL: Self = Self::universal(0x5);
    pub const OBJECT_IDENTIFIER: Self = Self::universal(0x6);
    pub const UTF8_STRING: Self = Self::universal(0xC);
    pub const SEQUENCE: Self = Self::universal(0x10).constructed();
    pub const SET: Self = Self::universal(0x11).constructed();
    pub const NUMERIC_STRING: Self = Self::universal(0x12);
    pub const PRINTABLE_STRING: Self = Self::universal(0x13);
    pub const TELETEX_STRING: Self = Self::universal(0x14);
    pub const IA5_STRING: Self = Self::universal(0x16);
    pub const UTC_TIME: Self = Self::universal(0x17);
    pub const GENERALIZED_TIME: Self = Self::universal(0x18);

    /// Largest tag number five octets can carry.
    pub const MAX_NUMBER: u32 = (1 << 28) - 1;

    pub const fn new(class: Class, constructed: bool, number: u32) -> Self {
        Self { class, constructed, number, non_canonical: false }
    }

    pub const fn universal(number: u32) -> Self {
        Self::new(Class::Universal, false, number)
    }

    pub const fn application(number: u32) -> Self {
        Self::new(Class::Application, false, number)
    }

    pub const fn context(number: u32) -> Self {
        Self::new(Class::Context, false, number)
    }

    pub const fn private(number: u32) -> Self {
        Self::new(Class::Private, false, number)
    }

    pub const fn constructed(self) -> Self {
        let Self { class, constructed: _, number, non_canonical } = self;
        Self { class, constructed: true, number, non_canonical }
    }

    /// Force the two byte form for a tag number below 31.
    pub const fn non_canonical(self) -> Self {
        let Self { class, constructed, number, non_canonical: _ } = self;
        Self { class, constructed, number, non_canonical: true }
    }

    /// Is this the same tag as `other`, ignoring how the number is written?
    pub fn matches(&self, other: &Tag) -> bool {
        self.class == other.class && self.constructed == other.constructed && self.number == other.number
    }

    /// Assert that this [`Tag`] matches the provided expected tag.
    ///
    /// On mismatch, returns an [`Error`](crate::Error) with [`ErrorKind::UnexpectedTag`].
    pub fn assert_eq(self, expected: Tag) -> Result<Self> {
        if self.matches(&expected) {
            Ok(self)
        } else {
            Err(ErrorKind::UnexpectedTag {
                expected: Some(expected),
                actual: self,
            }
            .into())
        }
    }

    fn is_short_form(&self) -> bool {
        self.number < MULTI_BYTE_MARKER as u32 && !self.non_canonical
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag(class = {:?}, constructed = {}, number = {}", self.class, self.constructed, self.number)?;
        if self.non_canonical {
            write!(f, ", non-canonical")?;
        }
        write!(f, ")")
    }
}

impl Encodable for Tag {
    fn encoded_len(&self) -> Result<Length> {
        if self.is_short_form() {
            return Ok(Length::from(1u8));
        }
        match self.number {
            0..=0x7F => Ok(Length::from(2u8)),
            0x80..=0x3FFF => Ok(Length::from(3u8)),
            0x4000..=0x1F_FFFF => Ok(Length::from(4u8)),
            0x20_0000..=Self::MAX_NUMBER => Ok(Length::from(5u8)),
            _ => Err(ErrorKind::InvalidTagEncoding.into()),
        }
    }

    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
        let first_byte = ((self.class as u8) << CLASS_OFFSET) | ((self.constructed as u8) << CONSTRUCTED_OFFSET);

        if self.is_short_form() {
            return encoder.byte(first_byte | self.number as u8);
        }

        let octets = self.encoded_len()?.to_usize() - 1;
        encoder.byte(first_byte | MULTI_BYTE_MARKER)?;
        for i in (0..octets).rev() {
            let group = ((self.number >> (7 * i)) & 0x7F) as u8;
            let flag = if i == 0 { 0 } else { NOT_LAST_TAG_OCTET_FLAG };
            encoder.byte(flag | group)?;
        }
        Ok(())
    }
}

/// Numbers below 31 in the multi-byte form are flagged
/// non-canonical so they encode back the same way.
/// Leading `80` padding octets in the number are not remembered: `1F 80 40`
/// decodes to number 64 and encodes as `1F 40`.
impl Decodable for Tag {
    fn decode(buffer: &mut ParseBuffer<'_>) -> Result<Self> {
        let first_byte = buffer.get()?;
        let class = Class::from_bits(first_byte >> CLASS_OFFSET);
        let constructed = first_byte & CONSTRUCTED_FLAG != 0;

        // remove class and primitive/constructed bits
        let first_byte_masked = first_byte & MULTI_BYTE_MARKER;
        if first_byte_masked != MULTI_BYTE_MARKER {
            return Ok(Self::new(class, constructed, first_byte_masked as u32));
        }

        let mut number = 0u32;
        for _ in 0..MAX_CONTINUATION_OCTETS {
            let byte = buffer.get()?;
            number = (number << 7) | (byte & !NOT_LAST_TAG_OCTET_FLAG) as u32;
            if byte & NOT_LAST_TAG_OCTET_FLAG == 0 {
                let tag = Self::new(class, constructed, number);
                if number < MULTI_BYTE_MARKER as u32 {
                    debug!("tolerating two byte form of tag number {}", number);
                    return Ok(tag.non_canonical());
                }
                return Ok(tag);
            }
        }
        buffer.error(ErrorKind::InvalidTagEncoding)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Decodable, Encodable, ErrorKind, Tag};

    fn reconstruct(tag: Tag, expected: &[u8]) {
        let mut buf = [0u8; 8];
        let encoded = tag.encode_to_slice(&mut buf).unwrap();
        assert_eq!(encoded, expected);
        assert_eq!(tag.encoded_len().unwrap().to_usize(), expected.len());
        let tag2 = Tag::from_bytes(encoded).unwrap();
        assert_eq!(tag, tag2);
    }

    #[test]
    fn boundaries() {
        reconstruct(Tag::universal(30), &[0x1E]);
        reconstruct(Tag::universal(31), &[0x1F, 0x1F]);
        reconstruct(Tag::universal(127), &[0x1F, 0x7F]);
        reconstruct(Tag::universal(128), &[0x1F, 0x81, 0x00]);
        reconstruct(Tag::universal(0xAA), &[0x1F, 0x81, 0x2A]);
        reconstruct(Tag::universal(16383), &[0x1F, 0xFF, 0x7F]);
        reconstruct(Tag::universal(16384), &[0x1F, 0x81, 0x80, 0x00]);
        reconstruct(Tag::universal(0x20_0000), &[0x1F, 0x81, 0x80, 0x80, 0x00]);
        reconstruct(Tag::universal(Tag::MAX_NUMBER), &[0x1F, 0xFF, 0xFF, 0xFF, 0x7F]);
    }

    #[test]
    fn classes() {
        reconstruct(Tag::SEQUENCE, &[0x30]);
        reconstruct(Tag::application(0x66).constructed(), &[0x7F, 0x66]);
        reconstruct(Tag::context(0x66), &[0x9F, 0x66]);
        reconstruct(Tag::private(1).constructed(), &[0xE1]);
    }

    #[test]
    fn non_canonical() {
        // EMV style 9F 02: context class number 2 in the two byte form
        reconstruct(Tag::context(2).non_canonical(), &[0x9F, 0x02]);
        reconstruct(Tag::universal(30).non_canonical(), &[0x1F, 0x1E]);

        let tag = Tag::from_bytes(&[0x9F, 0x02]).unwrap();
        assert!(tag.non_canonical);
        assert_ne!(tag, Tag::context(2));
        assert!(tag.matches(&Tag::context(2)));
    }

    #[test]
    fn padded_number_encodes_minimally() {
        let tag = Tag::from_bytes(&[0x1F, 0x80, 0x40]).unwrap();
        assert_eq!(tag, Tag::universal(64));
        assert!(!tag.non_canonical);
        reconstruct(tag, &[0x1F, 0x40]);
    }

    #[test]
    fn malformed() {
        assert_eq!(
            Tag::from_bytes(&[0x1F, 0x81, 0x81, 0x81, 0x81, 0x01]).unwrap_err().kind(),
            ErrorKind::InvalidTagEncoding
        );
        assert_eq!(Tag::from_bytes(&[0x1F, 0x81]).unwrap_err().kind(), ErrorKind::BufferUnderrun);
        assert_eq!(
            Tag::universal(Tag::MAX_NUMBER + 1).encoded_len().unwrap_err().kind(),
            ErrorKind::InvalidTagEncoding
        );
    }
}
