//! ASN.1 OBJECT IDENTIFIER values.

use crate::{
    compact, Class, Decodable, Encodable, Encoder, Error, ErrorKind, Length, LengthDialect,
    ParseBuffer, PrimitiveTlv, Result, Tag,
};
use alloc::{string::String, vec::Vec};
use core::{fmt, str::FromStr};

/// Encode arcs as the content octets of an OBJECT IDENTIFIER.
///
/// The first two arcs share one subidentifier `40 * c0 + c1`; every arc is
/// written in base-128 with the high bit set on all but its last byte.
pub fn encode_arcs(arcs: &[u64]) -> Result<Vec<u8>> {
    let (first, second, rest) = match arcs {
        [first, second, rest @ ..] => (*first, *second, rest),
        _ => return Err(ErrorKind::InvalidOid.into()),
    };
    if first > 2 || (first < 2 && second > 39) {
        return Err(ErrorKind::InvalidOid.into());
    }
    let head = (40 * first)
        .checked_add(second)
        .ok_or(ErrorKind::InvalidOid)?;

    let mut value = Vec::new();
    compact::encode(head, &mut value);
    for arc in rest {
        compact::encode(*arc, &mut value);
    }
    Ok(value)
}

/// Split OBJECT IDENTIFIER content octets back into arcs.
pub fn decode_arcs(value: &[u8]) -> Result<Vec<u64>> {
    if value.is_empty() {
        return Err(ErrorKind::InvalidOid.into());
    }

    let mut buffer = ParseBuffer::new(value);
    let head = compact::decode(&mut buffer).map_err(|_| ErrorKind::InvalidOid)?;
    let mut arcs = match head {
        0..=79 => alloc::vec![head / 40, head % 40],
        _ => alloc::vec![2, head - 80],
    };
    while !buffer.is_exhausted() {
        arcs.push(compact::decode(&mut buffer).map_err(|_| ErrorKind::InvalidOid)?);
    }
    Ok(arcs)
}

/// Parse `1.2.840` or `1 2 840` into arcs.
pub(crate) fn parse_numeric(text: &str) -> Result<Vec<u64>> {
    text.split(|c| c == '.' || c == ' ')
        .filter(|token| !token.is_empty())
        .map(|token| token.parse::<u64>().map_err(|_| Error::from(ErrorKind::InvalidOidExpression)))
        .collect()
}

/// Primitive data object with the universal tag 6 whose value holds the
/// encoded arcs of an object identifier.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ObjectIdentifier {
    inner: PrimitiveTlv,
    arcs: Vec<u64>,
}

impl ObjectIdentifier {
    /// Build from arcs, e.g. `&[1, 2, 840, 113549]`.
    pub fn from_arcs(arcs: &[u64]) -> Result<Self> {
        let value = encode_arcs(arcs)?;
        Ok(Self {
            inner: PrimitiveTlv::new(Tag::OBJECT_IDENTIFIER, value),
            arcs: arcs.to_vec(),
        })
    }

    /// Build from content octets, e.g. `2A 86 48 86 F7 0D`.
    pub fn from_value(value: &[u8]) -> Result<Self> {
        let arcs = decode_arcs(value)?;
        Ok(Self {
            inner: PrimitiveTlv::new(Tag::OBJECT_IDENTIFIER, value),
            arcs,
        })
    }

    /// Write the length field in `dialect` instead.
    pub fn with_dialect(self, dialect: LengthDialect) -> Self {
        Self {
            inner: self.inner.with_dialect(dialect),
            arcs: self.arcs,
        }
    }

    /// Attach a diagnostic name, shown by the tree dump.
    pub fn with_name(self, name: impl Into<String>) -> Self {
        Self {
            inner: self.inner.with_name(name),
            arcs: self.arcs,
        }
    }

    pub fn arcs(&self) -> &[u64] {
        &self.arcs
    }

    /// Content octets.
    pub fn value(&self) -> &[u8] {
        self.inner.value()
    }

    pub fn tag(&self) -> Tag {
        self.inner.tag()
    }

    pub fn name(&self) -> Option<&str> {
        self.inner.name()
    }

    pub fn dialect(&self) -> LengthDialect {
        self.inner.dialect()
    }

    pub fn as_primitive(&self) -> &PrimitiveTlv {
        &self.inner
    }

    /// Decode an object identifier whose length field uses `dialect`.
    pub fn decode_with(buffer: &mut ParseBuffer<'_>, dialect: LengthDialect) -> Result<Self> {
        let start = buffer.position();
        let inner = PrimitiveTlv::decode_with(buffer, dialect)?;
        let tag = inner.tag();
        if tag.class != Class::Universal || tag.number != Tag::OBJECT_IDENTIFIER.number {
            return buffer.error(ErrorKind::UnexpectedTag {
                expected: Some(Tag::OBJECT_IDENTIFIER),
                actual: tag,
            });
        }
        let arcs = decode_arcs(inner.value())
            .map_err(|e| e.nested(Length::from(start.min(Length::max()) as u32)))?;
        Ok(Self { inner, arcs })
    }
}

impl fmt::Display for ObjectIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arc) in self.arcs.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", arc)?;
        }
        Ok(())
    }
}

impl FromStr for ObjectIdentifier {
    type Err = Error;

    /// Parse numeric dotted (or space separated) notation. Symbolic names
    /// need an [`ObjectIdentifierRegistry`](crate::ObjectIdentifierRegistry).
    fn from_str(text: &str) -> Result<Self> {
        Self::from_arcs(&parse_numeric(text)?)
    }
}

impl Decodable for ObjectIdentifier {
    fn decode(buffer: &mut ParseBuffer<'_>) -> Result<Self> {
        Self::decode_with(buffer, LengthDialect::Der)
    }
}

impl Encodable for ObjectIdentifier {
    fn encoded_len(&self) -> Result<Length> {
        self.inner.encoded_len()
    }

    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
        self.inner.encode(encoder)
    }
}

#[cfg(test)]
mod tests {
    use super::ObjectIdentifier;
    use crate::{Decodable, Encodable, ErrorKind};
    use hex_literal::hex;

    #[test]
    fn rsadsi() {
        let oid = ObjectIdentifier::from_arcs(&[1, 2, 840, 113549]).unwrap();
        assert_eq!(oid.value(), &hex!("2A 86 48 86 F7 0D"));
        assert_eq!(oid.to_vec().unwrap(), hex!("06 06 2A 86 48 86 F7 0D"));

        let decoded = ObjectIdentifier::from_bytes(&hex!("06 06 2A 86 48 86 F7 0D")).unwrap();
        assert_eq!(decoded.arcs(), &[1, 2, 840, 113549]);
        assert_eq!(decoded, oid);
        assert_eq!(decoded.to_string(), "1.2.840.113549");
    }

    #[test]
    fn parse() {
        let oid: ObjectIdentifier = "2.5.4.3".parse().unwrap();
        assert_eq!(oid.value(), &[0x55, 0x04, 0x03]);
        let oid: ObjectIdentifier = "1 3 6 1 5 5 7 9 1".parse().unwrap();
        assert_eq!(oid.value(), &hex!("2B 06 01 05 05 07 09 01"));
        assert_eq!("1.x.3".parse::<ObjectIdentifier>().unwrap_err().kind(), ErrorKind::InvalidOidExpression);
    }

    #[test]
    fn first_arcs() {
        assert_eq!(ObjectIdentifier::from_arcs(&[0, 39]).unwrap().value(), &[39]);
        assert_eq!(ObjectIdentifier::from_arcs(&[2, 999]).unwrap().value(), &hex!("88 37"));
        assert_eq!(ObjectIdentifier::from_value(&hex!("88 37")).unwrap().arcs(), &[2, 999]);

        for arcs in [&[3u64, 1][..], &[1, 40][..], &[1][..]] {
            assert_eq!(ObjectIdentifier::from_arcs(arcs).unwrap_err().kind(), ErrorKind::InvalidOid);
        }
    }

    #[test]
    fn malformed_value() {
        assert_eq!(ObjectIdentifier::from_value(&[]).unwrap_err().kind(), ErrorKind::InvalidOid);
        assert_eq!(ObjectIdentifier::from_value(&hex!("2A 86")).unwrap_err().kind(), ErrorKind::InvalidOid);
        assert_eq!(
            ObjectIdentifier::from_bytes(&hex!("04 01 2A")).unwrap_err().kind(),
            ErrorKind::UnexpectedTag {
                expected: Some(crate::Tag::OBJECT_IDENTIFIER),
                actual: crate::Tag::OCTET_STRING,
            }
        );
    }
}
