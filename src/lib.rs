//! # cardtlv
//!
//! Tag-length-value codec for the data smart cards hand out: file control
//! information, certificates, directory attributes and EMV records.
//!
//! Three encodings share the engine:
//! - BER/DER data objects, decoded into a tree of [`Tlv`] nodes. Tags take
//!   one to five bytes, lengths use the DER short or long form, and BER
//!   indefinite lengths terminated by `00 00` are accepted on input.
//! - The same tree with DGI length fields (one byte up to `FE`, or `FF`
//!   followed by two bytes), chosen per node with [`LengthDialect`].
//! - Flat EMV and Global Platform lists ([`TlvList`]), whose tags are plain
//!   big-endian integers and which never nest.
//!
//! ```
//! use cardtlv::{Decodable, Encodable, Tlv};
//!
//! let bytes = [0x30, 0x06, 0x06, 0x01, 0x2A, 0x04, 0x01, 0xFF];
//! let tree = Tlv::from_bytes(&bytes).unwrap();
//! assert_eq!(tree.children().len(), 2);
//! assert_eq!(tree.to_vec().unwrap(), bytes);
//! ```
//!
//! Object identifiers can be written symbolically, e.g. `us rsadsi(113549)`,
//! and resolved with an [`ObjectIdentifierRegistry`].
//!
//! ## Logging
//! Logging goes through `delog`; enable one of the `log-*` features to see
//! decoder traces and the reasons lenient readers give up.

#![cfg_attr(not(any(feature = "std", test)), no_std)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

extern crate alloc;

#[macro_use]
extern crate delog;
generate_macros!();

mod attribute;
mod buffer;
pub mod compact;
mod constructed;
mod encoder;
mod error;
mod fci;
pub mod flat;
mod header;
mod length;
mod node;
pub mod oid;
mod primitive;
mod registry;
mod sequence;
mod tag;
mod traits;

pub use attribute::{AttributeEntry, AttributeValue, DirectoryAttribute, GeneralizedTime, TimeOfDay};
pub use buffer::{ParseBuffer, MAX_NESTING_DEPTH};
pub use compact::CompactInteger;
pub use constructed::ConstructedTlv;
pub use encoder::Encoder;
pub use error::{Error, ErrorKind, Result};
pub use fci::{FileControlInfo, FileType};
pub use flat::{Dgi, DgiTlv, Emv, EmvTlv, FlatFormat, GpTlv, TlvList};
pub use length::{Length, LengthDialect};
pub use node::Tlv;
pub use oid::ObjectIdentifier;
#[cfg(feature = "std")]
pub use registry::SharedRegistry;
pub use registry::{ObjectIdentifierRegistry, MAX_EXPANSION_DEPTH, MAX_OID_ARCS};
pub use primitive::PrimitiveTlv;
pub use sequence::Sequence;
pub use tag::{Class, Tag};
pub use traits::{Decodable, Encodable};
