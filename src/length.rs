//! Lengths and the length-field dialects.

use crate::{Encoder, Error, ErrorKind, ParseBuffer, Result};
use core::{convert::TryFrom, fmt, ops::Add};

/// Length of a value or of an encoding, in bytes.
///
/// By definition, in the range `0..=u32::MAX`, the most a four byte DER
/// length field can express.
#[derive(Copy, Clone, Debug, Default, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct Length(u32);

impl Length {
    /// Return a length of `0`.
    pub const fn zero() -> Self {
        Length(0)
    }

    /// Get the maximum length supported by this crate
    pub const fn max() -> usize {
        u32::MAX as usize
    }

    /// Convert length to `usize`
    pub fn to_usize(self) -> usize {
        self.0 as usize
    }
}

impl Add for Length {
    type Output = Result<Self>;

    fn add(self, other: Self) -> Result<Self> {
        self.0
            .checked_add(other.0)
            .map(Length)
            .ok_or_else(|| ErrorKind::Overflow.into())
    }
}

impl Add<u8> for Length {
    type Output = Result<Self>;

    fn add(self, other: u8) -> Result<Self> {
        self + Length::from(other)
    }
}

impl Add<usize> for Length {
    type Output = Result<Self>;

    fn add(self, other: usize) -> Result<Self> {
        self + Length::try_from(other)?
    }
}

impl Add<Length> for Result<Length> {
    type Output = Self;

    fn add(self, other: Length) -> Self {
        self? + other
    }
}

impl From<u8> for Length {
    fn from(len: u8) -> Length {
        Length(len as u32)
    }
}

impl From<u16> for Length {
    fn from(len: u16) -> Length {
        Length(len as u32)
    }
}

impl From<u32> for Length {
    fn from(len: u32) -> Length {
        Length(len)
    }
}

impl From<Length> for u32 {
    fn from(len: Length) -> u32 {
        len.0
    }
}

impl From<Length> for usize {
    fn from(len: Length) -> usize {
        len.0 as usize
    }
}

impl TryFrom<usize> for Length {
    type Error = Error;

    fn try_from(len: usize) -> Result<Length> {
        u32::try_from(len)
            .map(Length)
            .map_err(|_| ErrorKind::Overflow.into())
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Number of big-endian bytes needed to hold `value`, at least one.
pub(crate) fn minimal_octets(value: u32) -> usize {
    match value {
        0..=0xFF => 1,
        0x100..=0xFFFF => 2,
        0x1_0000..=0xFF_FFFF => 3,
        _ => 4,
    }
}

/// Length-field convention of a node.
///
/// | Dialect | Short form     | Long form                          |
/// |---------|----------------|------------------------------------|
/// | `Der`   | 1 byte, 0–127  | `0x80 | n` + n big-endian bytes, n ≤ 4 |
/// | `Dgi`   | 1 byte, 0–254  | `0xFF` + 2 big-endian bytes        |
///
/// A node keeps the dialect it was created with; its children are decoded
/// with the same dialect.
#[derive(Copy, Clone, Debug, Default, Eq, Hash, PartialEq)]
pub enum LengthDialect {
    /// ASN.1 DER/BER lengths, including the BER indefinite form on decode.
    #[default]
    Der,
    /// Data grouping identifier lengths with the `0xFF` escape.
    Dgi,
}

impl LengthDialect {
    /// Read a length field from the buffer.
    ///
    /// Returns `None` for a BER indefinite length, which only the `Der`
    /// dialect can produce.
    pub fn decode(self, buffer: &mut ParseBuffer<'_>) -> Result<Option<Length>> {
        match self {
            LengthDialect::Der => buffer.der_length(),
            LengthDialect::Dgi => buffer.dgi_length().map(Some),
        }
    }

    /// Size of the length field that encodes `length`.
    pub fn encoded_len(self, length: Length) -> Result<Length> {
        match (self, u32::from(length)) {
            (LengthDialect::Der, 0..=0x7F) => Ok(Length(1)),
            (LengthDialect::Der, n) => Ok(Length(1 + minimal_octets(n) as u32)),
            (LengthDialect::Dgi, 0..=0xFE) => Ok(Length(1)),
            (LengthDialect::Dgi, 0xFF..=0xFFFF) => Ok(Length(3)),
            (LengthDialect::Dgi, n) => Err(ErrorKind::ValueTooLarge { length: n as usize }.into()),
        }
    }

    /// Write the length field for `length`.
    pub fn encode(self, length: Length, encoder: &mut Encoder<'_>) -> Result<()> {
        let n = u32::from(length);
        match (self, n) {
            (LengthDialect::Der, 0..=0x7F) => encoder.byte(n as u8),
            (LengthDialect::Der, _) => {
                let octets = minimal_octets(n);
                encoder.byte(0x80 | octets as u8)?;
                encoder.bytes(&n.to_be_bytes()[4 - octets..])
            }
            (LengthDialect::Dgi, 0..=0xFE) => encoder.byte(n as u8),
            (LengthDialect::Dgi, 0xFF..=0xFFFF) => {
                encoder.byte(0xFF)?;
                encoder.bytes(&(n as u16).to_be_bytes())
            }
            (LengthDialect::Dgi, _) => encoder.error(ErrorKind::ValueTooLarge { length: n as usize }),
        }
    }
}
