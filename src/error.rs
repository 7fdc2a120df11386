//! Error types.

use crate::{Length, Tag};
use core::{convert::Infallible, fmt};

/// Result type.
pub type Result<T> = core::result::Result<T, Error>;

/// Error type
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Error {
    /// Kind of error
    kind: ErrorKind,

    /// Position inside of message where error occurred
    position: Option<Length>,
}

impl Error {
    /// Create a new [`Error`]
    pub fn new(kind: ErrorKind, position: Length) -> Error {
        Error {
            kind,
            position: Some(position),
        }
    }

    /// Get the [`ErrorKind`] which occurred.
    pub fn kind(self) -> ErrorKind {
        self.kind
    }

    /// Get the position inside of the message where the error occurred.
    pub fn position(self) -> Option<Length> {
        self.position
    }

    /// For errors occurring inside of a nested message, extend the position
    /// count by the location where the nested message occurs.
    pub fn nested(self, nested_position: Length) -> Self {
        let position = (nested_position + self.position.unwrap_or_default()).ok();

        Self {
            kind: self.kind,
            position,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if let Some(pos) = self.position {
            write!(f, " at byte {}", pos)?;
        }

        Ok(())
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error {
            kind,
            position: None,
        }
    }
}

impl From<Infallible> for Error {
    fn from(never: Infallible) -> Error {
        match never {}
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ErrorKind {}

/// Error type.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Operation failed due to previous error
    Failed,

    /// Read past the current limit of the parse buffer
    BufferUnderrun,

    /// DER length field announces more than four length bytes
    LengthFieldTooLarge {
        /// Number of length bytes announced by the initial octet
        octets: u8,
    },

    /// Declared value length overruns the enclosing region
    LengthExceedsRegion {
        /// Declared length of the value
        declared: Length,

        /// Bytes left before the current limit
        remaining: Length,
    },

    /// Indefinite length where the dialect or format does not allow one
    IndefiniteLength,

    /// Constructed values nest deeper than the decoder allows
    NestingTooDeep {
        /// Deepest nesting accepted
        max: usize,
    },

    /// Multi-byte tag is malformed or longer than five bytes
    InvalidTagEncoding,

    /// Length cannot be expressed in the length field of the chosen encoding
    ValueTooLarge {
        /// Length that could not be encoded
        length: usize,
    },

    /// Malformed OBJECT IDENTIFIER value or components
    InvalidOid,

    /// OID expression contains a token that is neither a number nor a name
    InvalidOidExpression,

    /// Symbolic OID names nest deeper than the resolver allows
    OidRecursionLimit,

    /// OID expression expands to more arcs than the resolver allows
    OidTooLong,

    /// Symbolic OID name is not registered
    UnknownOidName,

    /// Name or OID is already bound to something else in the registry
    DuplicateOidBinding,

    /// String value is not valid for its string type
    InvalidString {
        /// Tag of the offending value
        tag: Tag,
    },

    /// GeneralizedTime value is malformed
    InvalidTime,

    /// Integer overflow occurred
    Overflow,

    /// Encoded message is longer than the target buffer
    Overlength,

    /// Undecoded trailing data at end of message
    TrailingData {
        /// Length of the decoded data
        decoded: Length,

        /// Total length of the remaining data left in the buffer
        remaining: Length,
    },

    /// Encoded message is shorter than the expected length
    /// (i.e. an `Encodable` impl on a particular type has a buggy `encoded_len`)
    Underlength {
        /// Expected length
        expected: Length,

        /// Actual length
        actual: Length,
    },

    /// Unexpected tag
    UnexpectedTag {
        /// Tag the decoder was expecting (if there is a single such tag).
        ///
        /// `None` if multiple tags are expected/allowed, but the `actual` tag
        /// does not match any of them.
        expected: Option<Tag>,

        /// Actual tag encountered in the message
        actual: Tag,
    },
}

impl ErrorKind {
    /// Annotate an [`ErrorKind`] with context about where it occurred,
    /// returning an error.
    pub fn at(self, position: Length) -> Error {
        Error::new(self, position)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Failed => write!(f, "operation failed"),
            ErrorKind::BufferUnderrun => write!(f, "read past end of buffer region"),
            ErrorKind::LengthFieldTooLarge { octets } => {
                write!(f, "length field of {} octets exceeds maximum of 4", octets)
            }
            ErrorKind::LengthExceedsRegion { declared, remaining } => write!(
                f,
                "declared length {} exceeds the {} bytes remaining",
                declared, remaining
            ),
            ErrorKind::IndefiniteLength => write!(f, "indefinite length not allowed here"),
            ErrorKind::NestingTooDeep { max } => {
                write!(f, "constructed values nest deeper than {} levels", max)
            }
            ErrorKind::InvalidTagEncoding => write!(f, "malformed multi-byte tag"),
            ErrorKind::ValueTooLarge { length } => {
                write!(f, "length {} does not fit the length field", length)
            }
            ErrorKind::InvalidOid => write!(f, "malformed OBJECT IDENTIFIER"),
            ErrorKind::InvalidOidExpression => write!(f, "malformed OID expression"),
            ErrorKind::OidRecursionLimit => write!(f, "OID name resolution nests too deep"),
            ErrorKind::OidTooLong => write!(f, "OID expression expands to too many arcs"),
            ErrorKind::UnknownOidName => write!(f, "unknown OID name"),
            ErrorKind::DuplicateOidBinding => write!(f, "OID name or value already bound"),
            ErrorKind::InvalidString { tag } => write!(f, "invalid string value for {}", tag),
            ErrorKind::InvalidTime => write!(f, "malformed GeneralizedTime"),
            ErrorKind::Overflow => write!(f, "integer overflow"),
            ErrorKind::Overlength => write!(f, "encoded message does not fit the buffer"),
            ErrorKind::TrailingData { decoded, remaining } => {
                write!(
                    f,
                    "trailing data at end of message: decoded {} bytes, {} bytes remaining",
                    decoded, remaining
                )
            }
            ErrorKind::Underlength { expected, actual } => write!(
                f,
                "message too short: expected {}, got {}",
                expected, actual
            ),
            ErrorKind::UnexpectedTag { expected, actual } => {
                write!(f, "unexpected tag: ")?;

                if let Some(tag) = expected {
                    write!(f, "expected {}, ", tag)?;
                }

                write!(f, "got {}", actual)
            }
        }
    }
}
