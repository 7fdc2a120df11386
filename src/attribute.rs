//! X.500 directory attributes: `SEQUENCE { type OBJECT IDENTIFIER, values SET OF ANY }`.
//!
//! Values are character strings or a generalized time. Personal data
//! attributes on identity cards wrap each value in a context-specific
//! constructed tag, which is kept alongside the value.

use crate::{
    Class, ConstructedTlv, Decodable, Encodable, Encoder, Error, ErrorKind, Length, ObjectIdentifier,
    ObjectIdentifierRegistry, ParseBuffer, PrimitiveTlv, Result, Sequence, Tag, Tlv,
};
use alloc::{
    string::{String, ToString},
    vec::Vec,
};
use core::{fmt, str::FromStr};

/// `GeneralizedTime` with day precision or better: `YYYYMMDD[HHMM[SS]][Z]`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct GeneralizedTime {
    year: u16,
    month: u8,
    day: u8,
    time: Option<TimeOfDay>,
    utc: bool,
}

/// Time part of a [`GeneralizedTime`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
    pub second: Option<u8>,
}

impl GeneralizedTime {
    /// A calendar date without time of day.
    pub fn from_date(year: u16, month: u8, day: u8) -> Result<Self> {
        if year > 9999 || !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return Err(ErrorKind::InvalidTime.into());
        }
        Ok(Self {
            year,
            month,
            day,
            time: None,
            utc: false,
        })
    }

    /// Add a time of day.
    pub fn with_time(mut self, time: TimeOfDay) -> Result<Self> {
        if time.hour > 23 || time.minute > 59 || time.second.map_or(false, |s| s > 59) {
            return Err(ErrorKind::InvalidTime.into());
        }
        self.time = Some(time);
        Ok(self)
    }

    /// Mark the time as UTC, written with a trailing `Z`.
    pub fn utc(mut self) -> Self {
        self.utc = true;
        self
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    pub fn time(&self) -> Option<TimeOfDay> {
        self.time
    }

    pub fn is_utc(&self) -> bool {
        self.utc
    }
}

impl FromStr for GeneralizedTime {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        let (digits, utc) = match text.strip_suffix('Z') {
            Some(digits) => (digits, true),
            None => (text, false),
        };
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ErrorKind::InvalidTime.into());
        }

        // all ASCII digits, so any byte offset is a char boundary
        let field = |range: core::ops::Range<usize>| -> Result<u16> {
            digits
                .get(range)
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| Error::from(ErrorKind::InvalidTime))
        };

        let date = Self::from_date(field(0..4)?, field(4..6)? as u8, field(6..8)? as u8)?;
        let date = match digits.len() {
            8 => date,
            12 => date.with_time(TimeOfDay {
                hour: field(8..10)? as u8,
                minute: field(10..12)? as u8,
                second: None,
            })?,
            14 => date.with_time(TimeOfDay {
                hour: field(8..10)? as u8,
                minute: field(10..12)? as u8,
                second: Some(field(12..14)? as u8),
            })?,
            _ => return Err(ErrorKind::InvalidTime.into()),
        };
        Ok(if utc { date.utc() } else { date })
    }
}

impl fmt::Display for GeneralizedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}{:02}", self.year, self.month, self.day)?;
        if let Some(time) = self.time {
            write!(f, "{:02}{:02}", time.hour, time.minute)?;
            if let Some(second) = time.second {
                write!(f, "{:02}", second)?;
            }
        }
        if self.utc {
            f.write_str("Z")?;
        }
        Ok(())
    }
}

/// Typed value of a directory attribute.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AttributeValue {
    /// `NumericString`: digits and space.
    Numeric(String),
    /// `UTF8String`.
    Utf8(String),
    /// `PrintableString`.
    Printable(String),
    /// `TeletexString`, read as ISO 8859-1.
    Latin1(String),
    /// `GeneralizedTime`.
    GeneralizedTime(GeneralizedTime),
}

impl AttributeValue {
    /// Universal tag the value is written with.
    pub fn tag(&self) -> Tag {
        match self {
            AttributeValue::Numeric(_) => Tag::NUMERIC_STRING,
            AttributeValue::Utf8(_) => Tag::UTF8_STRING,
            AttributeValue::Printable(_) => Tag::PRINTABLE_STRING,
            AttributeValue::Latin1(_) => Tag::TELETEX_STRING,
            AttributeValue::GeneralizedTime(_) => Tag::GENERALIZED_TIME,
        }
    }

    /// Text of a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Numeric(s)
            | AttributeValue::Utf8(s)
            | AttributeValue::Printable(s)
            | AttributeValue::Latin1(s) => Some(s),
            AttributeValue::GeneralizedTime(_) => None,
        }
    }

    pub fn as_time(&self) -> Option<&GeneralizedTime> {
        match self {
            AttributeValue::GeneralizedTime(time) => Some(time),
            _ => None,
        }
    }

    /// Convert to a primitive data object, checking the character set.
    pub fn to_primitive(&self) -> Result<PrimitiveTlv> {
        let tag = self.tag();
        let value: Vec<u8> = match self {
            AttributeValue::Numeric(s) if s.bytes().all(is_numeric) => s.as_bytes().to_vec(),
            AttributeValue::Printable(s) if s.bytes().all(is_printable) => s.as_bytes().to_vec(),
            AttributeValue::Utf8(s) => s.as_bytes().to_vec(),
            AttributeValue::Latin1(s) => s
                .chars()
                .map(|c| u8::try_from(u32::from(c)))
                .collect::<core::result::Result<_, _>>()
                .map_err(|_| Error::from(ErrorKind::InvalidString { tag }))?,
            AttributeValue::GeneralizedTime(time) => time.to_string().into_bytes(),
            _ => return Err(ErrorKind::InvalidString { tag }.into()),
        };
        Ok(PrimitiveTlv::new(tag, value))
    }

    /// Read a value from a primitive data object carrying one of the
    /// supported universal tags.
    pub fn from_primitive(tlv: &PrimitiveTlv) -> Result<Self> {
        let tag = tlv.tag();
        let bytes = tlv.value();
        let invalid = || Error::from(ErrorKind::InvalidString { tag });
        let text = || core::str::from_utf8(bytes).map(String::from).map_err(|_| invalid());

        if tag.class != Class::Universal || tag.constructed {
            return Err(ErrorKind::UnexpectedTag { expected: None, actual: tag }.into());
        }
        match tag.number {
            0x12 if bytes.iter().copied().all(is_numeric) => text().map(AttributeValue::Numeric),
            0x13 if bytes.iter().copied().all(is_printable) => text().map(AttributeValue::Printable),
            0x0C => text().map(AttributeValue::Utf8),
            0x14 => Ok(AttributeValue::Latin1(bytes.iter().map(|&b| char::from(b)).collect())),
            0x18 => {
                let text = core::str::from_utf8(bytes).map_err(|_| Error::from(ErrorKind::InvalidTime))?;
                text.parse().map(AttributeValue::GeneralizedTime)
            }
            0x12 | 0x13 => Err(invalid()),
            _ => Err(ErrorKind::UnexpectedTag { expected: None, actual: tag }.into()),
        }
    }
}

fn is_numeric(byte: u8) -> bool {
    byte.is_ascii_digit() || byte == b' '
}

fn is_printable(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || b" '()+,-./:=?".contains(&byte)
}

/// One element of the value set.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AttributeEntry {
    /// Number of the context-specific tag wrapping the value, if any.
    pub context: Option<u32>,
    pub value: AttributeValue,
}

/// Directory attribute: a type identifier and a set of values.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DirectoryAttribute {
    oid: ObjectIdentifier,
    entries: Vec<AttributeEntry>,
}

impl DirectoryAttribute {
    /// Attribute of type `oid` without values.
    pub fn new(oid: ObjectIdentifier) -> Self {
        Self {
            oid,
            entries: Vec::new(),
        }
    }

    /// Attribute whose type is looked up by name, e.g. `"dateOfBirth"`.
    pub fn named(registry: &ObjectIdentifierRegistry, name: &str) -> Result<Self> {
        registry.oid_for(name).map(Self::new)
    }

    pub fn with_value(mut self, value: AttributeValue) -> Self {
        self.add_value(value);
        self
    }

    pub fn add_value(&mut self, value: AttributeValue) {
        self.entries.push(AttributeEntry { context: None, value });
    }

    /// Add a value wrapped in the context-specific tag `context`.
    pub fn add_tagged_value(&mut self, context: u32, value: AttributeValue) {
        self.entries.push(AttributeEntry {
            context: Some(context),
            value,
        });
    }

    pub fn oid(&self) -> &ObjectIdentifier {
        &self.oid
    }

    /// Registered name of the attribute type.
    pub fn type_name<'r>(&self, registry: &'r ObjectIdentifierRegistry) -> Option<&'r str> {
        registry.name_of(&self.oid)
    }

    pub fn value_count(&self) -> usize {
        self.entries.len()
    }

    pub fn value(&self, index: usize) -> Option<&AttributeValue> {
        self.entries.get(index).map(|entry| &entry.value)
    }

    /// Context-specific tag number of the value at `index`.
    pub fn context(&self, index: usize) -> Option<u32> {
        self.entries.get(index).and_then(|entry| entry.context)
    }

    pub fn entries(&self) -> &[AttributeEntry] {
        &self.entries
    }

    /// The value at `index`, if it is a string.
    pub fn string(&self, index: usize) -> Option<&str> {
        self.value(index).and_then(AttributeValue::as_str)
    }

    /// The value at `index`, if it is a date.
    pub fn date(&self, index: usize) -> Option<&GeneralizedTime> {
        self.value(index).and_then(AttributeValue::as_time)
    }

    /// Build the data object tree.
    pub fn to_tlv(&self) -> Result<Tlv> {
        let mut set = ConstructedTlv::new(Tag::SET);
        for entry in &self.entries {
            let value = entry.value.to_primitive()?;
            match entry.context {
                Some(number) => {
                    let mut wrapper = ConstructedTlv::new(Tag::context(number));
                    wrapper.add(value);
                    set.add(wrapper);
                }
                None => set.add(value),
            }
        }

        Ok(Sequence::new()
            .with_children([Tlv::from(self.oid.clone()), Tlv::from(set)])
            .into())
    }

    /// Read an attribute from a decoded tree.
    pub fn from_tlv(tlv: &Tlv) -> Result<Self> {
        let sequence = match tlv {
            Tlv::Sequence(sequence) => sequence,
            other => {
                return Err(ErrorKind::UnexpectedTag {
                    expected: Some(Tag::SEQUENCE),
                    actual: other.tag(),
                }
                .into())
            }
        };

        let (oid, set) = match sequence.children() {
            [Tlv::ObjectIdentifier(oid), set] => (oid, set),
            [Tlv::ObjectIdentifier(_), .., extra] => {
                return Err(ErrorKind::UnexpectedTag {
                    expected: None,
                    actual: extra.tag(),
                }
                .into())
            }
            [Tlv::ObjectIdentifier(_)] | [] => {
                debug!("attribute without type or value set");
                return Err(ErrorKind::Failed.into());
            }
            [other, ..] => {
                return Err(ErrorKind::UnexpectedTag {
                    expected: Some(Tag::OBJECT_IDENTIFIER),
                    actual: other.tag(),
                }
                .into())
            }
        };
        set.tag().assert_eq(Tag::SET)?;

        let entries = set
            .children()
            .iter()
            .map(read_entry)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            oid: oid.clone(),
            entries,
        })
    }
}

fn read_entry(tlv: &Tlv) -> Result<AttributeEntry> {
    let tag = tlv.tag();
    let (context, inner) = match tlv {
        Tlv::Constructed(wrapper) if tag.class == Class::Context => match wrapper.children() {
            [inner] => (Some(tag.number), inner),
            _ => {
                warn!("{} does not wrap exactly one value", tag);
                return Err(ErrorKind::UnexpectedTag { expected: None, actual: tag }.into());
            }
        },
        _ => (None, tlv),
    };

    match inner {
        Tlv::Primitive(value) => Ok(AttributeEntry {
            context,
            value: AttributeValue::from_primitive(value)?,
        }),
        other => Err(ErrorKind::UnexpectedTag {
            expected: None,
            actual: other.tag(),
        }
        .into()),
    }
}

impl Decodable for DirectoryAttribute {
    fn decode(buffer: &mut ParseBuffer<'_>) -> Result<Self> {
        let start = buffer.position();
        let tlv: Tlv = buffer.decode()?;
        Self::from_tlv(&tlv).map_err(|e| match e.position() {
            Some(_) => e,
            None => e.nested(Length::from(start.min(Length::max()) as u32)),
        })
    }
}

impl Encodable for DirectoryAttribute {
    fn encoded_len(&self) -> Result<Length> {
        self.to_tlv()?.encoded_len()
    }

    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
        self.to_tlv()?.encode(encoder)
    }
}

#[cfg(test)]
mod tests {
    use super::{AttributeValue, DirectoryAttribute, GeneralizedTime, TimeOfDay};
    use crate::{Decodable, Encodable, ErrorKind, ObjectIdentifierRegistry, PrimitiveTlv, Tag};
    use hex_literal::hex;

    #[test]
    fn date_of_birth() {
        let registry = ObjectIdentifierRegistry::with_defaults();
        let mut attribute = DirectoryAttribute::named(&registry, "dateOfBirth").unwrap();
        attribute.add_value(AttributeValue::GeneralizedTime(
            GeneralizedTime::from_date(1964, 8, 12).unwrap(),
        ));

        let encoded = attribute.to_vec().unwrap();
        assert_eq!(
            encoded,
            hex!("30 16 06 08 2B06010505070901 31 0A 18 08 3139363430383132")
        );

        let decoded = DirectoryAttribute::from_bytes(&encoded).unwrap();
        assert_eq!(decoded, attribute);
        assert_eq!(decoded.type_name(&registry), Some("dateOfBirth"));
        assert_eq!(decoded.date(0).unwrap().year(), 1964);
        assert_eq!(decoded.string(0), None);
    }

    #[test]
    fn tagged_strings() {
        let registry = ObjectIdentifierRegistry::with_defaults();
        let mut attribute = DirectoryAttribute::named(&registry, "placeOfBirth").unwrap();
        attribute.add_tagged_value(1, AttributeValue::Utf8("Zürich".into()));
        attribute.add_tagged_value(2, AttributeValue::Printable("CH".into()));
        attribute.add_value(AttributeValue::Latin1("Genève".into()));

        let encoded = attribute.to_vec().unwrap();
        let decoded = DirectoryAttribute::from_bytes(&encoded).unwrap();
        assert_eq!(decoded.value_count(), 3);
        assert_eq!(decoded.string(0), Some("Zürich"));
        assert_eq!(decoded.context(0), Some(1));
        assert_eq!(decoded.context(1), Some(2));
        assert_eq!(decoded.context(2), None);
        assert_eq!(decoded.string(2), Some("Genève"));
        assert_eq!(decoded.value(2).unwrap().tag(), Tag::TELETEX_STRING);
        assert_eq!(decoded, attribute);
    }

    #[test]
    fn character_sets() {
        assert_eq!(
            AttributeValue::Numeric("12a".into()).to_primitive().unwrap_err().kind(),
            ErrorKind::InvalidString { tag: Tag::NUMERIC_STRING }
        );
        assert_eq!(
            AttributeValue::Printable("a@b".into()).to_primitive().unwrap_err().kind(),
            ErrorKind::InvalidString { tag: Tag::PRINTABLE_STRING }
        );
        assert!(AttributeValue::Latin1("€".into()).to_primitive().is_err());
        assert_eq!(
            AttributeValue::Latin1("é".into()).to_primitive().unwrap().value(),
            &[0xE9]
        );

        let bad_utf8 = PrimitiveTlv::new(Tag::UTF8_STRING, [0xC3u8]);
        assert!(AttributeValue::from_primitive(&bad_utf8).is_err());
        let octets = PrimitiveTlv::new(Tag::OCTET_STRING, [0x41u8]);
        assert!(matches!(
            AttributeValue::from_primitive(&octets).unwrap_err().kind(),
            ErrorKind::UnexpectedTag { .. }
        ));
    }

    #[test]
    fn generalized_time_text() {
        let time: GeneralizedTime = "20240229153000Z".parse().unwrap();
        assert_eq!(
            time.time(),
            Some(TimeOfDay { hour: 15, minute: 30, second: Some(0) })
        );
        assert!(time.is_utc());
        assert_eq!(time.to_string(), "20240229153000Z");
        assert_eq!("202402291530".parse::<GeneralizedTime>().unwrap().to_string(), "202402291530");

        for bad in ["2024", "20241301", "2024022915", "2024-02-29", "20240229256000"] {
            assert_eq!(bad.parse::<GeneralizedTime>().unwrap_err().kind(), ErrorKind::InvalidTime);
        }
    }

    #[test]
    fn not_an_attribute() {
        assert!(matches!(
            DirectoryAttribute::from_bytes(&hex!("31 00")).unwrap_err().kind(),
            ErrorKind::UnexpectedTag { .. }
        ));
        assert!(matches!(
            DirectoryAttribute::from_bytes(&hex!("30 05 04 01 00 31 00")).unwrap_err().kind(),
            ErrorKind::UnexpectedTag { .. }
        ));
        assert!(DirectoryAttribute::from_bytes(&hex!("30 07 06 03 550403 30 00")).is_err());
    }
}
