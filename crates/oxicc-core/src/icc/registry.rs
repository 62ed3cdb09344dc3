//! Tag type registry
//!
//! Maps a type signature to an empty [`TagData`] that the reader then fills.
//! Factories registered later take precedence over earlier ones, and every
//! registry ends with the built-in types. Signatures nobody claims become
//! [`TagData::Unknown`].

use std::fmt;
use std::sync::OnceLock;

use super::tags::TagData;
use super::types::TypeSignature;

type Predicate = Box<dyn Fn(TypeSignature) -> bool + Send + Sync>;
type Constructor = Box<dyn Fn(TypeSignature) -> TagData + Send + Sync>;

/// Claims a set of type signatures and builds empty bodies for them
pub struct TagFactory {
    name: String,
    claims: Predicate,
    build: Constructor,
}

impl TagFactory {
    pub fn new<P, C>(name: impl Into<String>, claims: P, build: C) -> Self
    where
        P: Fn(TypeSignature) -> bool + Send + Sync + 'static,
        C: Fn(TypeSignature) -> TagData + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            claims: Box::new(claims),
            build: Box::new(build),
        }
    }

    /// Factory for a single type signature
    pub fn for_type<C>(sig: TypeSignature, build: C) -> Self
    where
        C: Fn() -> TagData + Send + Sync + 'static,
    {
        Self::new(sig.to_string(), move |s| s == sig, move |_| build())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn claims(&self, sig: TypeSignature) -> bool {
        (self.claims)(sig)
    }
}

impl fmt::Debug for TagFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagFactory").field("name", &self.name).finish()
    }
}

fn builtin_factory() -> TagFactory {
    TagFactory::new(
        "builtin",
        |sig| TagData::empty(sig).is_some(),
        |sig| {
            TagData::empty(sig).unwrap_or(TagData::Unknown {
                type_sig: sig.0,
                data: Vec::new(),
            })
        },
    )
}

/// Ordered list of tag factories, newest first
#[derive(Debug)]
pub struct TagRegistry {
    factories: Vec<TagFactory>,
}

impl Default for TagRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TagRegistry {
    /// Registry holding only the built-in types
    pub fn new() -> Self {
        Self {
            factories: vec![builtin_factory()],
        }
    }

    /// Shared registry of built-in types
    pub fn standard() -> &'static TagRegistry {
        static STANDARD: OnceLock<TagRegistry> = OnceLock::new();
        STANDARD.get_or_init(TagRegistry::new)
    }

    /// Add a factory; it is consulted before every existing one
    pub fn register(&mut self, factory: TagFactory) {
        tracing::debug!(factory = factory.name(), "registering tag factory");
        self.factories.insert(0, factory);
    }

    /// Whether any factory claims `sig`
    pub fn is_supported(&self, sig: TypeSignature) -> bool {
        self.factories.iter().any(|f| f.claims(sig))
    }

    /// Empty body for `sig` from the first factory that claims it
    pub fn create(&self, sig: TypeSignature) -> TagData {
        self.factories
            .iter()
            .find(|f| f.claims(sig))
            .map(|f| (f.build)(sig))
            .unwrap_or_else(|| TagData::Unknown {
                type_sig: sig.0,
                data: Vec::new(),
            })
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icc::error::IccError;
    use crate::icc::io::{IccReader, IccWriter};
    use crate::icc::tags::CustomTag;
    use std::any::Any;

    #[derive(Debug, Clone, Default)]
    struct Counter {
        value: u32,
    }

    const CNTR: TypeSignature = TypeSignature::from_bytes(*b"cntr");

    impl CustomTag for Counter {
        fn type_signature(&self) -> TypeSignature {
            CNTR
        }

        fn read(&mut self, rd: &mut IccReader<'_>, _size: usize) -> Result<(), IccError> {
            self.value = rd.read_u32()?;
            Ok(())
        }

        fn write(&self, wr: &mut IccWriter<'_>) -> Result<(), IccError> {
            wr.write_u32(self.value)
        }

        fn clone_box(&self) -> Box<dyn CustomTag> {
            Box::new(self.clone())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_builtin_types() {
        let reg = TagRegistry::standard();
        assert!(reg.is_supported(TypeSignature::CURVE));
        assert!(matches!(reg.create(TypeSignature::XYZ), TagData::Xyz(_)));
        assert!(!reg.is_supported(CNTR));
        assert!(reg.create(CNTR).is_unknown());
    }

    #[test]
    fn test_custom_factory() {
        let mut reg = TagRegistry::new();
        reg.register(TagFactory::for_type(CNTR, || {
            TagData::Custom(Box::new(Counter::default()))
        }));
        assert!(reg.is_supported(CNTR));
        let data = reg.create(CNTR);
        assert!(data.as_custom::<Counter>().is_some());
        assert_eq!(data.type_signature(), CNTR);
    }

    #[test]
    fn test_newest_factory_wins() {
        let mut reg = TagRegistry::new();
        // Overrides the built-in text type
        reg.register(TagFactory::for_type(TypeSignature::TEXT, || {
            TagData::Custom(Box::new(Counter::default()))
        }));
        assert!(matches!(reg.create(TypeSignature::TEXT), TagData::Custom(_)));
        // Other built-ins untouched
        assert!(matches!(reg.create(TypeSignature::CURVE), TagData::Curve(_)));
        assert_eq!(reg.len(), 2);
    }
}
