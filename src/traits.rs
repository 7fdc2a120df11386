//! Trait definitions

use crate::{Encoder, ErrorKind, Length, ParseBuffer, Result};
use alloc::vec::Vec;
use core::{convert::TryInto, iter};

/// Decoding trait.
pub trait Decodable: Sized {
    /// Attempt to decode this message using the provided buffer.
    fn decode(buffer: &mut ParseBuffer<'_>) -> Result<Self>;

    /// Parse `Self` from the provided byte slice, which must hold exactly
    /// one encoding.
    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut buffer = ParseBuffer::new(bytes);
        let result = Self::decode(&mut buffer)?;
        buffer.finish(result)
    }
}

/// Encoding trait.
pub trait Encodable {
    /// Compute the length of this value in bytes when encoded
    fn encoded_len(&self) -> Result<Length>;

    /// Encode this value using the provided [`Encoder`].
    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()>;

    /// Encode this value to the provided byte slice, returning a sub-slice
    /// containing the encoded message.
    fn encode_to_slice<'a>(&self, buf: &'a mut [u8]) -> Result<&'a [u8]> {
        let mut encoder = Encoder::new(buf);
        self.encode(&mut encoder)?;
        encoder.finish()
    }

    /// Encode this message, appending it to the provided byte vector.
    fn encode_to_vec(&self, buf: &mut Vec<u8>) -> Result<Length> {
        let expected_len = self.encoded_len()?.to_usize();
        let current_len = buf.len();
        buf.reserve(expected_len);
        buf.extend(iter::repeat(0).take(expected_len));

        let mut encoder = Encoder::new(&mut buf[current_len..]);
        self.encode(&mut encoder)?;
        let actual_len = encoder.finish()?.len();

        if expected_len != actual_len {
            return Err(ErrorKind::Underlength {
                expected: expected_len.try_into()?,
                actual: actual_len.try_into()?,
            }
            .into());
        }

        actual_len.try_into()
    }

    /// Serialize this message as a byte vector.
    fn to_vec(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.encode_to_vec(&mut buf)?;
        Ok(buf)
    }

    /// Encode this message, appending it to the provided heapless byte vector.
    #[cfg(feature = "heapless")]
    #[cfg_attr(docsrs, doc(cfg(feature = "heapless")))]
    fn encode_to_heapless_vec<const N: usize>(&self, buf: &mut heapless::Vec<u8, N>) -> Result<Length> {
        let expected_len = self.encoded_len()?.to_usize();
        let current_len = buf.len();
        buf.resize_default(current_len + expected_len)
            .map_err(|_| crate::Error::from(ErrorKind::Overlength))?;

        let mut encoder = Encoder::new(&mut buf[current_len..]);
        self.encode(&mut encoder)?;
        let actual_len = encoder.finish()?.len();

        if expected_len != actual_len {
            return Err(ErrorKind::Underlength {
                expected: expected_len.try_into()?,
                actual: actual_len.try_into()?,
            }
            .into());
        }

        actual_len.try_into()
    }

    /// Serialize this message as a heapless byte vector.
    #[cfg(feature = "heapless")]
    #[cfg_attr(docsrs, doc(cfg(feature = "heapless")))]
    fn to_heapless_vec<const N: usize>(&self) -> Result<heapless::Vec<u8, N>> {
        let mut buf = heapless::Vec::new();
        self.encode_to_heapless_vec(&mut buf)?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Decodable, ErrorKind, Length, PrimitiveTlv, Tag};

    #[test]
    fn from_bytes_rejects_trailing_data() {
        let err = PrimitiveTlv::from_bytes(&[0x04, 0x01, 0xAA, 0x00]).unwrap_err();
        assert_eq!(
            err.kind(),
            ErrorKind::TrailingData {
                decoded: Length::from(3u8),
                remaining: Length::from(1u8),
            }
        );
        assert_eq!(err.position(), Some(Length::from(3u8)));

        let tlv = PrimitiveTlv::from_bytes(&[0x04, 0x01, 0xAA]).unwrap();
        assert_eq!(tlv.tag(), Tag::OCTET_STRING);
    }

    #[cfg(feature = "heapless")]
    #[test]
    fn heapless_vec() {
        use crate::Encodable;

        let tlv = PrimitiveTlv::new(Tag::OCTET_STRING, vec![1u8, 2, 3]);
        let encoded: heapless::Vec<u8, 8> = tlv.to_heapless_vec().unwrap();
        assert_eq!(&encoded[..], &[0x04, 0x03, 1, 2, 3]);

        let err = tlv.to_heapless_vec::<4>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Overlength);
    }
}
