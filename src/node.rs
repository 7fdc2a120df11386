use crate::{
    Class, ConstructedTlv, Decodable, Encodable, Encoder, Length, LengthDialect, ObjectIdentifier,
    ParseBuffer, PrimitiveTlv, Result, Sequence, Tag,
};
use alloc::string::String;
use core::fmt::{self, Write};

/// Indentation added per nesting level by the tree dump.
const DUMP_INDENT: usize = 2;

/// A decoded or programmatically built data object.
///
/// Each child is owned by exactly one parent; moving a node into another
/// parent moves it, nothing is shared.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Tlv {
    /// Leaf with a value.
    Primitive(PrimitiveTlv),
    /// Composite with any tag other than the universal SEQUENCE.
    Constructed(ConstructedTlv),
    /// Universal SEQUENCE.
    Sequence(Sequence),
    /// Universal OBJECT IDENTIFIER.
    ObjectIdentifier(ObjectIdentifier),
}

impl Tlv {
    /// Decode the next data object, choosing its kind from the tag.
    ///
    /// The tag is peeked first: universal tag 16 yields a [`Sequence`],
    /// universal tag 6 an [`ObjectIdentifier`], any other constructed tag a
    /// [`ConstructedTlv`] and the rest a [`PrimitiveTlv`]. Children are
    /// decoded with the same `dialect`.
    pub fn decode_with(buffer: &mut ParseBuffer<'_>, dialect: LengthDialect) -> Result<Self> {
        buffer.mark();
        let tag: Tag = buffer.decode()?;
        buffer.reset();

        match tag {
            Tag { class: Class::Universal, number: 16, .. } => {
                Sequence::decode_with(buffer, dialect).map(Tlv::Sequence)
            }
            Tag { class: Class::Universal, number: 6, .. } => {
                ObjectIdentifier::decode_with(buffer, dialect).map(Tlv::ObjectIdentifier)
            }
            Tag { constructed: true, .. } => {
                ConstructedTlv::decode_with(buffer, dialect).map(Tlv::Constructed)
            }
            _ => PrimitiveTlv::decode_with(buffer, dialect).map(Tlv::Primitive),
        }
    }

    pub fn tag(&self) -> Tag {
        match self {
            Tlv::Primitive(tlv) => tlv.tag(),
            Tlv::Constructed(tlv) => tlv.tag(),
            Tlv::Sequence(tlv) => tlv.tag(),
            Tlv::ObjectIdentifier(tlv) => tlv.tag(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Tlv::Primitive(tlv) => tlv.name(),
            Tlv::Constructed(tlv) => tlv.name(),
            Tlv::Sequence(tlv) => tlv.name(),
            Tlv::ObjectIdentifier(tlv) => tlv.name(),
        }
    }

    pub fn dialect(&self) -> LengthDialect {
        match self {
            Tlv::Primitive(tlv) => tlv.dialect(),
            Tlv::Constructed(tlv) => tlv.dialect(),
            Tlv::Sequence(tlv) => tlv.dialect(),
            Tlv::ObjectIdentifier(tlv) => tlv.dialect(),
        }
    }

    /// Length of the value field.
    pub fn length(&self) -> Result<Length> {
        match self {
            Tlv::Primitive(tlv) => tlv.length(),
            Tlv::Constructed(tlv) => tlv.length(),
            Tlv::Sequence(tlv) => tlv.length(),
            Tlv::ObjectIdentifier(tlv) => tlv.as_primitive().length(),
        }
    }

    /// Does this node hold children rather than a value?
    pub fn is_constructed(&self) -> bool {
        self.as_constructed().is_some()
    }

    /// Value bytes of a leaf, `None` for composites.
    pub fn value(&self) -> Option<&[u8]> {
        self.as_primitive().map(PrimitiveTlv::value)
    }

    /// Children of a composite; empty for leaves.
    pub fn children(&self) -> &[Tlv] {
        self.as_constructed().map_or(&[], ConstructedTlv::children)
    }

    pub fn as_primitive(&self) -> Option<&PrimitiveTlv> {
        match self {
            Tlv::Primitive(tlv) => Some(tlv),
            Tlv::ObjectIdentifier(oid) => Some(oid.as_primitive()),
            _ => None,
        }
    }

    pub fn as_constructed(&self) -> Option<&ConstructedTlv> {
        match self {
            Tlv::Constructed(tlv) => Some(tlv),
            Tlv::Sequence(sequence) => Some(sequence),
            _ => None,
        }
    }

    pub fn as_constructed_mut(&mut self) -> Option<&mut ConstructedTlv> {
        match self {
            Tlv::Constructed(tlv) => Some(tlv),
            Tlv::Sequence(sequence) => Some(sequence),
            _ => None,
        }
    }

    pub fn as_object_identifier(&self) -> Option<&ObjectIdentifier> {
        match self {
            Tlv::ObjectIdentifier(oid) => Some(oid),
            _ => None,
        }
    }

    /// Is this the BER end-of-contents marker `00 00`?
    ///
    /// Only the universal class counts. An empty context or application
    /// tag 0, such as an implicitly tagged NULL `80 00`, is an ordinary
    /// child of an indefinite length value.
    pub fn is_end_of_contents(&self) -> bool {
        match self {
            Tlv::Primitive(tlv) => tlv.tag().matches(&Tag::END_OF_CONTENTS) && tlv.value().is_empty(),
            _ => false,
        }
    }

    /// Render the tree as indented text, one node per line. This is a
    /// diagnostic aid and cannot be parsed back.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        // writing to a String cannot fail
        let _ = self.write_tree(&mut out, 0);
        out
    }

    fn write_tree(&self, out: &mut impl Write, depth: usize) -> fmt::Result {
        write!(out, "{:indent$}{}", "", self.tag(), indent = depth * DUMP_INDENT)?;
        if let Some(name) = self.name() {
            write!(out, " {}", name)?;
        }
        match self.length() {
            Ok(length) => write!(out, " ({} bytes)", length)?,
            Err(_) => write!(out, " (length overflow)")?,
        }

        match self {
            Tlv::ObjectIdentifier(oid) => writeln!(out, ": {}", oid),
            Tlv::Primitive(tlv) => {
                write!(out, ":")?;
                for byte in tlv.value() {
                    write!(out, " {:02X}", byte)?;
                }
                writeln!(out)
            }
            Tlv::Constructed(_) | Tlv::Sequence(_) => {
                writeln!(out)?;
                for child in self.children() {
                    child.write_tree(out, depth + 1)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Tlv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tree(f, 0)
    }
}

impl From<PrimitiveTlv> for Tlv {
    fn from(tlv: PrimitiveTlv) -> Self {
        Tlv::Primitive(tlv)
    }
}

impl From<ConstructedTlv> for Tlv {
    fn from(tlv: ConstructedTlv) -> Self {
        Tlv::Constructed(tlv)
    }
}

impl From<Sequence> for Tlv {
    fn from(sequence: Sequence) -> Self {
        Tlv::Sequence(sequence)
    }
}

impl From<ObjectIdentifier> for Tlv {
    fn from(oid: ObjectIdentifier) -> Self {
        Tlv::ObjectIdentifier(oid)
    }
}

impl Decodable for Tlv {
    fn decode(buffer: &mut ParseBuffer<'_>) -> Result<Self> {
        Self::decode_with(buffer, LengthDialect::Der)
    }
}

impl Encodable for Tlv {
    fn encoded_len(&self) -> Result<Length> {
        match self {
            Tlv::Primitive(tlv) => tlv.encoded_len(),
            Tlv::Constructed(tlv) => tlv.encoded_len(),
            Tlv::Sequence(tlv) => tlv.encoded_len(),
            Tlv::ObjectIdentifier(tlv) => tlv.encoded_len(),
        }
    }

    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
        match self {
            Tlv::Primitive(tlv) => tlv.encode(encoder),
            Tlv::Constructed(tlv) => tlv.encode(encoder),
            Tlv::Sequence(tlv) => tlv.encode(encoder),
            Tlv::ObjectIdentifier(tlv) => tlv.encode(encoder),
        }
    }
}
