//! Registration of application-defined value types.

use std::any::TypeId;
use std::fmt;

use bitstream::{BitReader, BitResult, BitWriter};

use crate::error::{CodecError, CodecResult};
use crate::types::{CustomValue, Value};

/// An application value type with its own bit-level layout.
///
/// Implementors are registered in a [`TypeRegistry`] and travel as
/// [`Value::Custom`]. Both ends must register the same types in the same order.
pub trait CustomType: Sized + 'static {
    /// Stable name used in registry hashes and diagnostics.
    const NAME: &'static str;

    fn encode(&self, writer: &mut BitWriter) -> BitResult<()>;

    fn decode(reader: &mut BitReader<'_>) -> BitResult<Self>;
}

/// Identifier of a registered custom type, assigned in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CustomTypeId(u8);

impl CustomTypeId {
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }
}

impl fmt::Display for CustomTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

type Validator = fn(&[u8]) -> BitResult<()>;

#[derive(Debug)]
struct Entry {
    name: &'static str,
    rust_type: TypeId,
    validate: Validator,
}

/// Per-node table of custom value types.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    entries: Vec<Entry>,
}

impl TypeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` and returns its id.
    pub fn register<T: CustomType>(&mut self) -> CodecResult<CustomTypeId> {
        let rust_type = TypeId::of::<T>();
        if self
            .entries
            .iter()
            .any(|entry| entry.rust_type == rust_type || entry.name == T::NAME)
        {
            return Err(CodecError::DuplicateCustomType { name: T::NAME });
        }
        let id = u8::try_from(self.entries.len())
            .map_err(|_| CodecError::CustomTypeSpaceExhausted)?;
        self.entries.push(Entry {
            name: T::NAME,
            rust_type,
            validate: validate::<T>,
        });
        Ok(CustomTypeId::new(id))
    }

    /// Returns the id registered for `T`.
    #[must_use]
    pub fn id_of<T: CustomType>(&self) -> Option<CustomTypeId> {
        let rust_type = TypeId::of::<T>();
        self.entries
            .iter()
            .position(|entry| entry.rust_type == rust_type)
            .and_then(|index| u8::try_from(index).ok())
            .map(CustomTypeId::new)
    }

    /// Returns the registered name for `id`.
    #[must_use]
    pub fn name(&self, id: CustomTypeId) -> Option<&'static str> {
        self.entries.get(usize::from(id.raw())).map(|entry| entry.name)
    }

    #[must_use]
    pub fn contains(&self, id: CustomTypeId) -> bool {
        usize::from(id.raw()) < self.entries.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encodes `value` into a [`Value::Custom`].
    pub fn pack<T: CustomType>(&self, value: &T) -> CodecResult<Value> {
        let type_id = self
            .id_of::<T>()
            .ok_or(CodecError::CustomTypeNotRegistered { name: T::NAME })?;
        let mut writer = BitWriter::new();
        value.encode(&mut writer)?;
        Ok(Value::Custom(CustomValue {
            type_id,
            bytes: writer.finish(),
        }))
    }

    /// Decodes a custom value back into `T`.
    pub fn unpack<T: CustomType>(&self, value: &CustomValue) -> CodecResult<T> {
        let expected = self
            .id_of::<T>()
            .ok_or(CodecError::CustomTypeNotRegistered { name: T::NAME })?;
        if expected != value.type_id {
            return Err(CodecError::UnknownCustomType { id: value.type_id });
        }
        let mut reader = BitReader::new(&value.bytes);
        Ok(T::decode(&mut reader)?)
    }

    /// Checks that `bytes` decode as the type registered under `id`.
    pub(crate) fn validate(&self, id: CustomTypeId, bytes: &[u8]) -> CodecResult<()> {
        let entry = self
            .entries
            .get(usize::from(id.raw()))
            .ok_or(CodecError::UnknownCustomType { id })?;
        (entry.validate)(bytes)?;
        Ok(())
    }
}

fn validate<T: CustomType>(bytes: &[u8]) -> BitResult<()> {
    let mut reader = BitReader::new(bytes);
    T::decode(&mut reader).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Health(u16);

    impl CustomType for Health {
        const NAME: &'static str = "Health";

        fn encode(&self, writer: &mut BitWriter) -> BitResult<()> {
            writer.write_u16(self.0);
            Ok(())
        }

        fn decode(reader: &mut BitReader<'_>) -> BitResult<Self> {
            Ok(Self(reader.read_u16()?))
        }
    }

    #[derive(Debug, PartialEq)]
    struct Tag(bool);

    impl CustomType for Tag {
        const NAME: &'static str = "Tag";

        fn encode(&self, writer: &mut BitWriter) -> BitResult<()> {
            writer.write_bool(self.0);
            Ok(())
        }

        fn decode(reader: &mut BitReader<'_>) -> BitResult<Self> {
            Ok(Self(reader.read_bool()?))
        }
    }

    #[test]
    fn ids_follow_registration_order() {
        let mut registry = TypeRegistry::new();
        assert_eq!(registry.register::<Health>().unwrap(), CustomTypeId::new(0));
        assert_eq!(registry.register::<Tag>().unwrap(), CustomTypeId::new(1));
        assert_eq!(registry.name(CustomTypeId::new(1)), Some("Tag"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut registry = TypeRegistry::new();
        registry.register::<Health>().unwrap();
        assert_eq!(
            registry.register::<Health>().unwrap_err(),
            CodecError::DuplicateCustomType { name: "Health" }
        );
    }

    #[test]
    fn pack_unpack() {
        let mut registry = TypeRegistry::new();
        registry.register::<Health>().unwrap();
        let value = registry.pack(&Health(77)).unwrap();
        let custom = value.as_custom().unwrap();
        assert_eq!(registry.unpack::<Health>(custom).unwrap(), Health(77));
    }

    #[test]
    fn pack_unregistered_fails() {
        let registry = TypeRegistry::new();
        assert_eq!(
            registry.pack(&Tag(true)).unwrap_err(),
            CodecError::CustomTypeNotRegistered { name: "Tag" }
        );
    }

    #[test]
    fn unpack_wrong_type_fails() {
        let mut registry = TypeRegistry::new();
        registry.register::<Health>().unwrap();
        registry.register::<Tag>().unwrap();
        let value = registry.pack(&Tag(false)).unwrap();
        assert!(registry
            .unpack::<Health>(value.as_custom().unwrap())
            .is_err());
    }

    #[test]
    fn validate_detects_truncation() {
        let mut registry = TypeRegistry::new();
        let id = registry.register::<Health>().unwrap();
        assert!(registry.validate(id, &[0x01, 0x02]).is_ok());
        assert!(registry.validate(id, &[0x01]).is_err());
        assert!(registry.validate(CustomTypeId::new(9), &[]).is_err());
    }
}
