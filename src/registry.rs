//! Symbolic names for object identifiers.
//!
//! An expression is a list of arcs separated by spaces or dots. Each token
//! is a number (`840`), a named number of which only the number counts
//! (`rsadsi(113549)`), or a registered name that expands to its own
//! expression, e.g. `us rsadsi(113549)`.

use crate::{oid::decode_arcs, Error, ErrorKind, ObjectIdentifier, Result};
use alloc::{
    borrow::ToOwned,
    collections::BTreeMap,
    string::String,
    vec::Vec,
};

/// Name expansions nested deeper than this fail with
/// [`ErrorKind::OidRecursionLimit`].
pub const MAX_EXPANSION_DEPTH: usize = 100;

/// Expressions expanding to more arcs than this fail with
/// [`ErrorKind::OidTooLong`].
pub const MAX_OID_ARCS: usize = 128;

/// Well-known names loaded by [`ObjectIdentifierRegistry::with_defaults`].
const DEFAULT_NAMES: &[(&str, &str)] = &[
    ("iso", "1"),
    ("member-body", "iso 2"),
    ("us", "member-body 840"),
    ("rsadsi", "us 113549"),
    ("pkcs", "rsadsi 1"),
    ("pkcs-1", "pkcs 1"),
    ("rsaEncryption", "pkcs-1 1"),
    ("pkcs-9", "pkcs 9"),
    ("emailAddress", "pkcs-9 1"),
    ("identified-organization", "iso 3"),
    ("dod", "identified-organization 6"),
    ("internet", "dod 1"),
    ("security", "internet 5"),
    ("mechanisms", "security 5"),
    ("id-pkix", "mechanisms 7"),
    ("id-pda", "id-pkix 9"),
    ("dateOfBirth", "id-pda 1"),
    ("placeOfBirth", "id-pda 2"),
    ("gender", "id-pda 3"),
    ("countryOfCitizenship", "id-pda 4"),
    ("countryOfResidence", "id-pda 5"),
    ("joint-iso-ccitt", "2"),
    ("ds", "joint-iso-ccitt 5"),
    ("id-at", "ds 4"),
    ("commonName", "id-at 3"),
    ("surname", "id-at 4"),
    ("serialNumber", "id-at 5"),
    ("countryName", "id-at 6"),
    ("localityName", "id-at 7"),
    ("stateOrProvinceName", "id-at 8"),
    ("streetAddress", "id-at 9"),
    ("organizationName", "id-at 10"),
    ("organizationalUnitName", "id-at 11"),
    ("title", "id-at 12"),
    ("postalCode", "id-at 17"),
    ("givenName", "id-at 42"),
    ("initials", "id-at 43"),
    ("pseudonym", "id-at 65"),
];

#[derive(Clone, Debug, Eq, PartialEq)]
struct Binding {
    expression: String,
    arcs: Vec<u64>,
    /// Longest chain of names below this one.
    depth: usize,
}

/// Two-way table between names and object identifiers.
///
/// The mapping is kept one-to-one: a name is bound to one identifier and an
/// identifier to one name. Registering an existing binding again is
/// accepted, anything that would break the mapping is rejected with
/// [`ErrorKind::DuplicateOidBinding`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ObjectIdentifierRegistry {
    bindings: BTreeMap<String, Binding>,
    names: BTreeMap<Vec<u64>, String>,
}

impl ObjectIdentifierRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the well-known PKCS, X.500 attribute type
    /// and PKIX personal data names.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for (name, expression) in DEFAULT_NAMES {
            if let Err(_e) = registry.add_identifier(name, expression) {
                error!("default name {} not registered: {}", name, _e);
            }
        }
        registry
    }

    /// Bind `name` to the identifier `expression` resolves to.
    pub fn add_identifier(&mut self, name: &str, expression: &str) -> Result<()> {
        let (arcs, depth) = self.expand(expression)?;

        if let Some(existing) = self.bindings.get(name) {
            if existing.arcs == arcs {
                return Ok(());
            }
            debug!("{} is already bound to another identifier", name);
            return Err(ErrorKind::DuplicateOidBinding.into());
        }
        if let Some(_owner) = self.names.get(&arcs) {
            debug!("identifier for {} is already bound to {}", name, _owner);
            return Err(ErrorKind::DuplicateOidBinding.into());
        }

        self.names.insert(arcs.clone(), name.to_owned());
        self.bindings.insert(
            name.to_owned(),
            Binding {
                expression: expression.to_owned(),
                arcs,
                depth,
            },
        );
        Ok(())
    }

    /// Identifier bound to `name`.
    pub fn oid_for(&self, name: &str) -> Result<ObjectIdentifier> {
        let binding = self.bindings.get(name).ok_or(ErrorKind::UnknownOidName)?;
        ObjectIdentifier::from_arcs(&binding.arcs)
    }

    /// Expression `name` was registered with.
    pub fn expression_for(&self, name: &str) -> Option<&str> {
        self.bindings.get(name).map(|binding| binding.expression.as_str())
    }

    /// Name bound to the identifier with content octets `value`.
    pub fn name_for(&self, value: &[u8]) -> Option<&str> {
        let arcs = decode_arcs(value).ok()?;
        self.names.get(&arcs).map(String::as_str)
    }

    /// Name bound to `oid`.
    pub fn name_of(&self, oid: &ObjectIdentifier) -> Option<&str> {
        self.names.get(oid.arcs()).map(String::as_str)
    }

    /// Evaluate an expression such as `"us rsadsi(113549) 1"`.
    pub fn resolve(&self, expression: &str) -> Result<ObjectIdentifier> {
        let (arcs, _) = self.expand(expression)?;
        ObjectIdentifier::from_arcs(&arcs)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Registered names, in lexical order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    /// Arcs of `expression`, and how deep its names nest.
    ///
    /// A bound name is replaced by the arcs it resolved to when it was
    /// added, so every expression is expanded in a single pass.
    fn expand(&self, expression: &str) -> Result<(Vec<u64>, usize)> {
        let mut arcs = Vec::new();
        let mut depth = 0;

        for token in expression.split(|c: char| c == '.' || c.is_whitespace()) {
            match Token::parse(token)? {
                Token::Empty => {}
                Token::Number(arc) => arcs.push(arc),
                Token::Name(name) => {
                    let binding = self.bindings.get(name).ok_or_else(|| {
                        debug!("unknown identifier name {}", name);
                        Error::from(ErrorKind::UnknownOidName)
                    })?;
                    depth = depth.max(binding.depth + 1);
                    if depth > MAX_EXPANSION_DEPTH {
                        return Err(ErrorKind::OidRecursionLimit.into());
                    }
                    arcs.extend_from_slice(&binding.arcs);
                }
            }
            if arcs.len() > MAX_OID_ARCS {
                return Err(ErrorKind::OidTooLong.into());
            }
        }
        Ok((arcs, depth))
    }
}

enum Token<'a> {
    Empty,
    Number(u64),
    Name(&'a str),
}

impl<'a> Token<'a> {
    fn parse(token: &'a str) -> Result<Self> {
        if token.is_empty() {
            return Ok(Token::Empty);
        }
        if token.bytes().all(|b| b.is_ascii_digit()) {
            return parse_arc(token).map(Token::Number);
        }
        // `symbol(number)`: only the number counts
        if let Some(open) = token.find('(') {
            return match token[open + 1..].strip_suffix(')') {
                Some(number) => parse_arc(number).map(Token::Number),
                None => Err(ErrorKind::InvalidOidExpression.into()),
            };
        }
        if token.contains(')') {
            return Err(ErrorKind::InvalidOidExpression.into());
        }
        Ok(Token::Name(token))
    }
}

fn parse_arc(number: &str) -> Result<u64> {
    number
        .parse()
        .map_err(|_| Error::from(ErrorKind::InvalidOidExpression))
}

/// Registry shared between threads.
///
/// Lookups hold the read lock and may run in parallel. Adding a name holds
/// the write lock, so no lookup sees a half-updated table.
#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
#[derive(Debug, Default)]
pub struct SharedRegistry {
    inner: std::sync::RwLock<ObjectIdentifierRegistry>,
}

#[cfg(feature = "std")]
impl SharedRegistry {
    pub fn new(registry: ObjectIdentifierRegistry) -> Self {
        Self {
            inner: std::sync::RwLock::new(registry),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(ObjectIdentifierRegistry::with_defaults())
    }

    pub fn add_identifier(&self, name: &str, expression: &str) -> Result<()> {
        self.write().add_identifier(name, expression)
    }

    pub fn oid_for(&self, name: &str) -> Result<ObjectIdentifier> {
        self.read().oid_for(name)
    }

    pub fn name_for(&self, value: &[u8]) -> Option<String> {
        self.read().name_for(value).map(String::from)
    }

    pub fn resolve(&self, expression: &str) -> Result<ObjectIdentifier> {
        self.read().resolve(expression)
    }

    /// Hold the read lock for several lookups.
    pub fn read(&self) -> std::sync::RwLockReadGuard<'_, ObjectIdentifierRegistry> {
        // a panicking writer never leaves the maps half updated
        self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, ObjectIdentifierRegistry> {
        self.inner.write().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::ObjectIdentifierRegistry;
    use crate::{ErrorKind, ObjectIdentifier};
    use hex_literal::hex;

    #[test]
    fn named_number_after_base_name() {
        let mut registry = ObjectIdentifierRegistry::new();
        registry.add_identifier("iso", "1").unwrap();
        registry.add_identifier("member-body", "iso 2").unwrap();
        registry.add_identifier("us", "member-body 840").unwrap();

        let named = registry.resolve("us rsadsi(113549)").unwrap();
        let dotted: ObjectIdentifier = "1.2.840.113549".parse().unwrap();
        assert_eq!(named.value(), dotted.value());
        assert_eq!(named.value(), &hex!("2A 86 48 86 F7 0D"));
    }

    #[test]
    fn lookups_both_ways() {
        let registry = ObjectIdentifierRegistry::with_defaults();
        let oid = registry.oid_for("rsaEncryption").unwrap();
        assert_eq!(oid.value(), &hex!("2A 86 48 86 F7 0D 01 01 01"));
        assert_eq!(registry.name_for(oid.value()), Some("rsaEncryption"));
        assert_eq!(registry.name_for(&hex!("55 04 03")), Some("commonName"));
        assert_eq!(registry.oid_for("dateOfBirth").unwrap().to_string(), "1.3.6.1.5.5.7.9.1");
        assert_eq!(registry.name_for(&hex!("55 04 7F")), None);
        assert_eq!(registry.oid_for("nope").unwrap_err().kind(), ErrorKind::UnknownOidName);
        assert_eq!(registry.expression_for("us"), Some("member-body 840"));
        assert!(registry.contains_name("id-at"));
    }

    #[test]
    fn duplicate_bindings() {
        let mut registry = ObjectIdentifierRegistry::with_defaults();
        let before = registry.len();

        // same binding again is fine
        registry.add_identifier("commonName", "2.5.4.3").unwrap();
        assert_eq!(
            registry.add_identifier("commonName", "2.5.4.4").unwrap_err().kind(),
            ErrorKind::DuplicateOidBinding
        );
        assert_eq!(
            registry.add_identifier("cn", "id-at 3").unwrap_err().kind(),
            ErrorKind::DuplicateOidBinding
        );
        assert_eq!(registry.len(), before);
    }

    #[test]
    fn expansion_depth_is_capped() {
        let mut registry = ObjectIdentifierRegistry::new();
        registry.add_identifier("n0", "1 2").unwrap();

        let mut failure = None;
        for depth in 1..150 {
            let name = format!("n{}", depth);
            let expression = format!("n{} {}", depth - 1, depth);
            if let Err(e) = registry.add_identifier(&name, &expression) {
                failure = Some((depth, e.kind()));
                break;
            }
        }
        assert_eq!(failure, Some((101, ErrorKind::OidRecursionLimit)));
        assert!(registry.resolve("n100 1").is_err());
        assert!(registry.resolve("n99 1").is_ok());
    }

    #[test]
    fn doubling_names_are_bounded() {
        let mut registry = ObjectIdentifierRegistry::new();
        registry.add_identifier("d0", "1.3").unwrap();

        let mut failure = None;
        for level in 1..40 {
            let name = format!("d{}", level);
            let expression = format!("d{} d{}", level - 1, level - 1);
            if let Err(e) = registry.add_identifier(&name, &expression) {
                failure = Some((level, e.kind()));
                break;
            }
        }
        // d6 has 128 arcs
        assert_eq!(failure, Some((7, ErrorKind::OidTooLong)));
        assert_eq!(registry.resolve("d6 1").unwrap_err().kind(), ErrorKind::OidTooLong);
        assert_eq!(registry.resolve("d6").unwrap().arcs().len(), super::MAX_OID_ARCS);
    }

    #[test]
    fn malformed_expressions() {
        let registry = ObjectIdentifierRegistry::with_defaults();
        assert_eq!(registry.resolve("us what").unwrap_err().kind(), ErrorKind::UnknownOidName);
        assert_eq!(registry.resolve("us x(1").unwrap_err().kind(), ErrorKind::InvalidOidExpression);
        assert_eq!(registry.resolve("us x(y)").unwrap_err().kind(), ErrorKind::InvalidOidExpression);
        assert_eq!(registry.resolve("iso").unwrap_err().kind(), ErrorKind::InvalidOid);
        assert_eq!(registry.resolve("id-at.3").unwrap().value(), &hex!("55 04 03"));
    }

    #[cfg(feature = "std")]
    #[test]
    fn shared_between_threads() {
        use super::SharedRegistry;
        use std::{sync::Arc, thread};

        let shared = Arc::new(SharedRegistry::with_defaults());
        let handles: Vec<_> = (0..4u64)
            .map(|i| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || {
                    shared
                        .add_identifier(&format!("test-{}", i), &format!("2.999.{}", i))
                        .unwrap();
                    shared.oid_for("commonName").unwrap()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap().arcs(), &[2, 5, 4, 3]);
        }
        assert_eq!(shared.name_for(&hex!("88 37 02")), Some("test-2".to_string()));
    }
}
