//! File control parameters returned when a card file is selected.
//!
//! Reading is lenient: a template that does not decode, or a field that is
//! missing or malformed, reads as `None`. The cause is logged.

use crate::{ConstructedTlv, Decodable, Tag, Tlv};

/// Decoded `62` (FCP) or `6F` (FCI) template.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileControlInfo {
    template: Option<ConstructedTlv>,
}

/// Structure of a file, from the file descriptor byte.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FileType {
    Dedicated,
    Transparent,
    LinearFixed,
    LinearVariable,
    Cyclic,
    /// Descriptor byte not covered by the other variants.
    Other(u8),
}

impl FileType {
    fn from_descriptor(byte: u8) -> Self {
        if byte & 0x38 == 0x38 {
            return FileType::Dedicated;
        }
        match byte & 0x07 {
            1 => FileType::Transparent,
            2 | 3 => FileType::LinearFixed,
            4 | 5 => FileType::LinearVariable,
            6 | 7 => FileType::Cyclic,
            _ => FileType::Other(byte),
        }
    }
}

impl FileControlInfo {
    /// File control parameters template.
    pub const FCP: Tag = Tag::application(2).constructed();
    /// File control information template.
    pub const FCI: Tag = Tag::application(15).constructed();

    const FILE_SIZE: Tag = Tag::context(0);
    const TOTAL_SIZE: Tag = Tag::context(1);
    const DESCRIPTOR: Tag = Tag::context(2);
    const FILE_ID: Tag = Tag::context(3);
    const DF_NAME: Tag = Tag::context(4);

    /// Read a select response body. Never fails; see the module docs.
    pub fn parse(bytes: &[u8]) -> Self {
        match Tlv::from_bytes(bytes) {
            Ok(tlv) => Self::from_tlv(tlv),
            Err(_e) => {
                warn!("file control information not decoded: {}", _e);
                Self { template: None }
            }
        }
    }

    /// Wrap an already decoded template.
    pub fn from_tlv(tlv: Tlv) -> Self {
        let tag = tlv.tag();
        let template = match tlv {
            Tlv::Constructed(template) if tag.matches(&Self::FCP) || tag.matches(&Self::FCI) => {
                Some(template)
            }
            _ => {
                warn!("{} is not a file control template", tag);
                None
            }
        };
        Self { template }
    }

    /// Did the response hold a usable template?
    pub fn is_valid(&self) -> bool {
        self.template.is_some()
    }

    pub fn template(&self) -> Option<&ConstructedTlv> {
        self.template.as_ref()
    }

    /// Bytes of data in a transparent file (`80`).
    pub fn file_size(&self) -> Option<u32> {
        self.field(Self::FILE_SIZE).and_then(|bytes| unsigned(Self::FILE_SIZE, bytes))
    }

    /// Bytes allocated to the file including structural overhead (`81`).
    pub fn total_size(&self) -> Option<u32> {
        self.field(Self::TOTAL_SIZE).and_then(|bytes| unsigned(Self::TOTAL_SIZE, bytes))
    }

    /// File descriptor byte (first byte of `82`).
    pub fn file_descriptor(&self) -> Option<u8> {
        self.field(Self::DESCRIPTOR).and_then(|bytes| bytes.first().copied())
    }

    pub fn file_type(&self) -> Option<FileType> {
        self.file_descriptor().map(FileType::from_descriptor)
    }

    /// Maximum record size of a record structured file (`82`, after the
    /// data coding byte).
    pub fn record_size(&self) -> Option<u16> {
        match self.field(Self::DESCRIPTOR)? {
            [_, _, size] => Some(u16::from(*size)),
            [_, _, high, low, ..] => Some(u16::from_be_bytes([*high, *low])),
            _ => None,
        }
    }

    /// Number of records (`82`, after the record size).
    pub fn record_count(&self) -> Option<u16> {
        match self.field(Self::DESCRIPTOR)? {
            [_, _, _, _, count] => Some(u16::from(*count)),
            [_, _, _, _, high, low] => Some(u16::from_be_bytes([*high, *low])),
            _ => None,
        }
    }

    /// File identifier (`83`).
    pub fn file_id(&self) -> Option<u16> {
        match self.field(Self::FILE_ID)? {
            [high, low] => Some(u16::from_be_bytes([*high, *low])),
            _other => {
                debug!("file identifier of {} bytes", _other.len());
                None
            }
        }
    }

    /// Application or DF name (`84`).
    pub fn df_name(&self) -> Option<&[u8]> {
        self.field(Self::DF_NAME)
    }

    fn field(&self, tag: Tag) -> Option<&[u8]> {
        let (_, child) = self.template.as_ref()?.find_tag(tag, None)?;
        child.value()
    }
}

fn unsigned(_tag: Tag, bytes: &[u8]) -> Option<u32> {
    if bytes.is_empty() || bytes.len() > 4 {
        debug!("{} holds {} bytes, not a size", _tag, bytes.len());
        return None;
    }
    Some(bytes.iter().fold(0u32, |acc, byte| (acc << 8) | u32::from(*byte)))
}

#[cfg(test)]
mod tests {
    use super::{FileControlInfo, FileType};
    use hex_literal::hex;

    #[test]
    fn transparent_ef() {
        let fci = FileControlInfo::parse(&hex!("62 12 80 02 0400 82 01 01 83 02 2F01 81 02 0420 8A 01 05"));
        assert!(fci.is_valid());
        assert_eq!(fci.file_size(), Some(0x400));
        assert_eq!(fci.total_size(), Some(0x420));
        assert_eq!(fci.file_type(), Some(FileType::Transparent));
        assert_eq!(fci.file_id(), Some(0x2F01));
        assert_eq!(fci.record_size(), None);
        assert_eq!(fci.df_name(), None);
    }

    #[test]
    fn linear_fixed_ef() {
        let fci = FileControlInfo::parse(&hex!("62 0D 82 05 02 41 00 1C 0A 83 02 0101 80 00"));
        assert_eq!(fci.file_type(), Some(FileType::LinearFixed));
        assert_eq!(fci.file_descriptor(), Some(0x02));
        assert_eq!(fci.record_size(), Some(0x1C));
        assert_eq!(fci.record_count(), Some(0x0A));
        // an empty size field is malformed, not zero
        assert_eq!(fci.file_size(), None);
    }

    #[test]
    fn application_df() {
        let fci = FileControlInfo::parse(&hex!("6F 0E 84 07 A0000002471001 82 01 38 83 00"));
        assert_eq!(fci.file_type(), Some(FileType::Dedicated));
        assert_eq!(fci.df_name(), Some(&hex!("A0000002471001")[..]));
        assert_eq!(fci.file_id(), None);
    }

    #[test]
    fn failures_read_as_unknown() {
        for bytes in [&hex!("62 05 80 02 04")[..], &hex!("70 03 80 01 01")[..], &[][..]] {
            let fci = FileControlInfo::parse(bytes);
            assert!(!fci.is_valid());
            assert_eq!(fci.file_size(), None);
            assert_eq!(fci.file_type(), None);
        }
    }
}
