use crate::{
    header::Header, Decodable, Encodable, Encoder, Length, LengthDialect, ParseBuffer, Result, Tag,
    Tlv,
};
use alloc::{string::String, vec::Vec};

/// Composite data object owning an ordered list of children.
///
/// The length is the sum of the children's encoded sizes and is computed
/// on every call, so it always reflects the current children.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConstructedTlv {
    tag: Tag,
    name: Option<String>,
    dialect: LengthDialect,
    children: Vec<Tlv>,
}

impl ConstructedTlv {
    /// Create an empty constructed object with DER lengths. The constructed
    /// bit of `tag` is set.
    pub fn new(tag: Tag) -> Self {
        Self {
            tag: tag.constructed(),
            name: None,
            dialect: LengthDialect::Der,
            children: Vec::new(),
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

    /// Append children, taking ownership of them.
    pub fn with_children(mut self, children: impl IntoIterator<Item = Tlv>) -> Self {
        self.children.extend(children);
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

    /// Append a child.
    pub fn add(&mut self, child: impl Into<Tlv>) {
        self.children.push(child.into());
    }

    /// Insert a child at `index`, shifting later children back.
    ///
    /// Hands the child back if `index` is past the end of the list.
    pub fn insert(&mut self, index: usize, child: impl Into<Tlv>) -> core::result::Result<(), Tlv> {
        let child = child.into();
        if index > self.children.len() {
            return Err(child);
        }
        self.children.insert(index, child);
        Ok(())
    }

    /// Remove and return the child at `index`.
    pub fn remove(&mut self, index: usize) -> Option<Tlv> {
        if index < self.children.len() {
            Some(self.children.remove(index))
        } else {
            None
        }
    }

    pub fn get(&self, index: usize) -> Option<&Tlv> {
        self.children.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Tlv> {
        self.children.get_mut(index)
    }

    /// Find the first child carrying `tag`, scanning from the child after
    /// `after`, or from the first child if `after` is `None`.
    ///
    /// Returns the index alongside the child so a scan can be continued.
    /// The scan does not wrap around.
    pub fn find_tag(&self, tag: Tag, after: Option<usize>) -> Option<(usize, &Tlv)> {
        let start = after.map_or(0, |index| index + 1);
        self.children
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, child)| child.tag().matches(&tag))
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Tlv> {
        self.children.iter()
    }

    pub fn children(&self) -> &[Tlv] {
        &self.children
    }

    /// Give up the children, moving ownership to the caller.
    pub fn into_children(self) -> Vec<Tlv> {
        self.children
    }

    /// Length of the value field: the summed encodings of all children.
    pub fn length(&self) -> Result<Length> {
        self.children
            .iter()
            .fold(Ok(Length::zero()), |sum, child| sum + child.encoded_len()?)
    }

    /// Decode one constructed object whose length fields use `dialect`.
    pub fn decode_with(buffer: &mut ParseBuffer<'_>, dialect: LengthDialect) -> Result<Self> {
        let tag: Tag = buffer.decode()?;
        let children = decode_children(buffer, dialect)?;
        trace!("constructed {} with {} children", tag, children.len());

        Ok(Self {
            tag,
            name: None,
            dialect,
            children,
        })
    }

    pub(crate) fn header(&self) -> Result<Header> {
        Header::new(self.tag, self.length()?, self.dialect)
    }

    pub(crate) fn from_parts(tag: Tag, dialect: LengthDialect, children: Vec<Tlv>) -> Self {
        Self {
            tag,
            name: None,
            dialect,
            children,
        }
    }
}

/// Read the length field and the children of a constructed value.
///
/// A definite length narrows the buffer to the value while the children are
/// read; the outer limit is put back afterwards, also on failure. An
/// indefinite length reads children up to and including the end-of-contents
/// marker, which is not kept. Fails with [`NestingTooDeep`](crate::ErrorKind::NestingTooDeep) past
/// [`MAX_NESTING_DEPTH`](crate::MAX_NESTING_DEPTH) levels.
pub(crate) fn decode_children(buffer: &mut ParseBuffer<'_>, dialect: LengthDialect) -> Result<Vec<Tlv>> {
    buffer.enter()?;
    let children = read_children(buffer, dialect);
    buffer.leave();
    children
}

fn read_children(buffer: &mut ParseBuffer<'_>, dialect: LengthDialect) -> Result<Vec<Tlv>> {
    match dialect.decode(buffer)? {
        Some(length) => {
            let outer = buffer.set_length(length.to_usize())?;
            let children = decode_until_exhausted(buffer, dialect);
            buffer.set_limit(outer)?;
            children
        }
        None => {
            debug!("indefinite length at byte {}", buffer.position());
            let mut children = Vec::new();
            loop {
                let child = Tlv::decode_with(buffer, dialect)?;
                if child.is_end_of_contents() {
                    return Ok(children);
                }
                children.push(child);
            }
        }
    }
}

fn decode_until_exhausted(buffer: &mut ParseBuffer<'_>, dialect: LengthDialect) -> Result<Vec<Tlv>> {
    let mut children = Vec::new();
    while !buffer.is_exhausted() {
        children.push(Tlv::decode_with(buffer, dialect)?);
    }
    Ok(children)
}

impl<'a> IntoIterator for &'a ConstructedTlv {
    type Item = &'a Tlv;
    type IntoIter = core::slice::Iter<'a, Tlv>;

    fn into_iter(self) -> Self::IntoIter {
        self.children.iter()
    }
}

impl Decodable for ConstructedTlv {
    fn decode(buffer: &mut ParseBuffer<'_>) -> Result<Self> {
        Self::decode_with(buffer, LengthDialect::Der)
    }
}

impl Encodable for ConstructedTlv {
    fn encoded_len(&self) -> Result<Length> {
        self.header()?.encoded_len()? + self.length()?
    }

    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
        self.header()?.encode(encoder)?;
        for child in &self.children {
            child.encode(encoder)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::ConstructedTlv;
    use crate::{Decodable, Encodable, ErrorKind, Length, LengthDialect, PrimitiveTlv, Tag, Tlv};
    use hex_literal::hex;

    fn cardholder() -> ConstructedTlv {
        ConstructedTlv::new(Tag::application(5)).with_children([
            Tlv::from(PrimitiveTlv::new(Tag::application(0x1B), &b"Doe<<John"[..])),
            Tlv::from(PrimitiveTlv::new(Tag::application(0x2D), &b"en"[..])),
        ])
    }

    #[test]
    fn encode() {
        let tlv = cardholder();
        assert_eq!(tlv.tag(), Tag::application(5).constructed());
        assert_eq!(tlv.length().unwrap(), Length::from(16u8));
        assert_eq!(
            tlv.to_vec().unwrap(),
            hex!("65 10 5B 09 446F653C3C4A6F686E 5F2D 02 656E")
        );
    }

    #[test]
    fn length_follows_children() {
        let mut tlv = cardholder();
        let removed = tlv.remove(0).unwrap();
        assert_eq!(removed.tag(), Tag::application(0x1B));
        assert_eq!(tlv.length().unwrap(), Length::from(5u8));

        tlv.insert(0, PrimitiveTlv::new(Tag::context(0), [0u8; 200])).unwrap();
        assert_eq!(tlv.length().unwrap(), Length::from(208u8));
        assert_eq!(&tlv.to_vec().unwrap()[..3], &[0x65, 0x81, 0xD0]);
        assert!(tlv.remove(5).is_none());

        let rejected = tlv.insert(3, PrimitiveTlv::new(Tag::context(7), [7u8])).unwrap_err();
        assert_eq!(rejected.tag(), Tag::context(7));
        assert_eq!(tlv.len(), 2);
        tlv.insert(2, rejected).unwrap();
        assert_eq!(tlv.get(2).unwrap().tag(), Tag::context(7));
    }

    #[test]
    fn find_tag_continues_after_cursor() {
        let tlv = ConstructedTlv::new(Tag::context(1)).with_children([
            Tlv::from(PrimitiveTlv::new(Tag::context(2), [1u8])),
            Tlv::from(PrimitiveTlv::new(Tag::context(3), [2u8])),
            Tlv::from(PrimitiveTlv::new(Tag::context(2), [3u8])),
        ]);

        let (first, child) = tlv.find_tag(Tag::context(2), None).unwrap();
        assert_eq!(first, 0);
        assert_eq!(child.value(), Some(&[1u8][..]));

        let (second, child) = tlv.find_tag(Tag::context(2), Some(first)).unwrap();
        assert_eq!(second, 2);
        assert_eq!(child.value(), Some(&[3u8][..]));

        assert!(tlv.find_tag(Tag::context(2), Some(second)).is_none());
        assert!(tlv.find_tag(Tag::context(9), None).is_none());
    }

    #[test]
    fn decode_restores_outer_limit() {
        // two siblings after a nested constructed value
        let bytes = hex!("A0 0C A1 03 80 01 01 81 01 02 82 01 03");
        let err = ConstructedTlv::from_bytes(&bytes[..]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::LengthExceedsRegion { .. }));

        let bytes = hex!("A0 0B A1 03 80 01 01 81 01 02 82 01 03");
        let tlv = ConstructedTlv::from_bytes(&bytes).unwrap();
        assert_eq!(tlv.len(), 3);
        assert_eq!(tlv.get(0).unwrap().children().len(), 1);
        assert_eq!(tlv.get(2).unwrap().value(), Some(&[3u8][..]));
        assert_eq!(tlv.to_vec().unwrap(), &bytes[..]);
    }

    #[test]
    fn dgi_children_inherit_dialect() {
        let mut tlv = ConstructedTlv::new(Tag::private(1)).with_dialect(LengthDialect::Dgi);
        tlv.add(PrimitiveTlv::new(Tag::private(2), [0x55u8; 300]).with_dialect(LengthDialect::Dgi));
        let encoded = tlv.to_vec().unwrap();
        assert_eq!(&encoded[..8], &hex!("E1 FF 0130 C2 FF 012C"));

        let mut buffer = crate::ParseBuffer::new(&encoded);
        let decoded = ConstructedTlv::decode_with(&mut buffer, LengthDialect::Dgi).unwrap();
        assert!(buffer.is_exhausted());
        assert_eq!(decoded, tlv);
        assert_eq!(decoded.get(0).unwrap().dialect(), LengthDialect::Dgi);
    }
}
