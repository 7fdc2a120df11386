//! Base-128 compact integers.
//!
//! Seven bits per byte, most significant group first, with the high bit set
//! on every byte but the last. This is the same scheme as multi-byte tag
//! numbers and OID arcs, used on its own as a length prefix.

use crate::{Decodable, Encodable, Encoder, ErrorKind, Length, ParseBuffer, Result};
use alloc::vec::Vec;

const CONTINUATION_FLAG: u8 = 0x80;

/// A `u64` written in the base-128 compact form.
#[derive(Copy, Clone, Debug, Default, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct CompactInteger(pub u64);

/// Number of bytes [`encode`] writes for `value`.
pub fn encoded_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    core::cmp::max(1, (bits + 6) / 7)
}

/// Append the compact form of `value` to `out`.
pub fn encode(value: u64, out: &mut Vec<u8>) {
    let octets = encoded_len(value);
    for i in (0..octets).rev() {
        let group = ((value >> (7 * i)) & 0x7F) as u8;
        out.push(if i == 0 { group } else { group | CONTINUATION_FLAG });
    }
}

/// Read one compact integer, failing with [`ErrorKind::Overflow`] if it
/// does not fit 64 bits.
pub fn decode(buffer: &mut ParseBuffer<'_>) -> Result<u64> {
    let mut value = 0u64;
    loop {
        let byte = buffer.get()?;
        if value >> 57 != 0 {
            return buffer.error(ErrorKind::Overflow);
        }
        value = (value << 7) | (byte & !CONTINUATION_FLAG) as u64;
        if byte & CONTINUATION_FLAG == 0 {
            return Ok(value);
        }
    }
}

impl From<u64> for CompactInteger {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<CompactInteger> for u64 {
    fn from(value: CompactInteger) -> u64 {
        value.0
    }
}

impl Encodable for CompactInteger {
    fn encoded_len(&self) -> Result<Length> {
        Length::try_from(encoded_len(self.0))
    }

    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
        let mut bytes = Vec::with_capacity(encoded_len(self.0));
        encode(self.0, &mut bytes);
        encoder.bytes(&bytes)
    }
}

impl Decodable for CompactInteger {
    fn decode(buffer: &mut ParseBuffer<'_>) -> Result<Self> {
        decode(buffer).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::CompactInteger;
    use crate::{Decodable, Encodable, ErrorKind, ParseBuffer};

    #[test]
    fn known_encodings() {
        assert_eq!(CompactInteger(0).to_vec().unwrap(), &[0x00]);
        assert_eq!(CompactInteger(0x7F).to_vec().unwrap(), &[0x7F]);
        assert_eq!(CompactInteger(0x80).to_vec().unwrap(), &[0x81, 0x00]);
        assert_eq!(CompactInteger(113549).to_vec().unwrap(), &[0x86, 0xF7, 0x0D]);
        assert_eq!(CompactInteger(u64::MAX).to_vec().unwrap().len(), 10);
    }

    #[test]
    fn reconstruct() {
        for value in [0u64, 1, 127, 128, 16383, 16384, 1 << 35, u64::MAX] {
            let encoded = CompactInteger(value).to_vec().unwrap();
            assert_eq!(encoded.len(), super::encoded_len(value));
            assert_eq!(CompactInteger::from_bytes(&encoded).unwrap(), CompactInteger(value));
        }
    }

    #[test]
    fn sequence_of_prefixes() {
        let mut bytes = Vec::new();
        super::encode(300, &mut bytes);
        super::encode(5, &mut bytes);
        let mut buffer = ParseBuffer::new(&bytes);
        assert_eq!(super::decode(&mut buffer).unwrap(), 300);
        assert_eq!(super::decode(&mut buffer).unwrap(), 5);
        assert!(buffer.is_exhausted());
    }

    #[test]
    fn overflow_and_truncation() {
        let too_long = [0xFFu8; 10];
        let mut bytes = too_long.to_vec();
        bytes.push(0x7F);
        assert_eq!(CompactInteger::from_bytes(&bytes).unwrap_err().kind(), ErrorKind::Overflow);
        assert_eq!(CompactInteger::from_bytes(&[0x81]).unwrap_err().kind(), ErrorKind::BufferUnderrun);
    }
}
