//! Deterministic registry hashing.

use blake3::Hasher;
use codec::{Signature, TypeTag};

use crate::registry::MethodRegistry;

/// Computes a hash over method names and signatures in registration order.
///
/// Two nodes with equal hashes derive identical id tables.
#[must_use]
pub fn registry_hash(registry: &MethodRegistry) -> u64 {
    let mut hasher = Hasher::new();
    write_u32(&mut hasher, registry.len() as u32);

    for (name, signature) in registry.iter() {
        write_str(&mut hasher, name);
        write_signature(&mut hasher, signature);
    }

    let hash = hasher.finalize();
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(prefix)
}

fn write_signature(hasher: &mut Hasher, signature: &Signature) {
    write_u32(hasher, signature.len() as u32);
    for tag in signature.tags() {
        write_tag(hasher, *tag);
    }
}

fn write_tag(hasher: &mut Hasher, tag: TypeTag) {
    match tag {
        TypeTag::Custom(id) => {
            write_u8(hasher, 13);
            write_u8(hasher, id.raw());
        }
        TypeTag::Connection => write_u8(hasher, 0xFF),
        other => write_u8(hasher, other.code().unwrap_or(0xFF)),
    }
}

fn write_str(hasher: &mut Hasher, value: &str) {
    write_u32(hasher, value.len() as u32);
    hasher.update(value.as_bytes());
}

fn write_u8(hasher: &mut Hasher, value: u8) {
    hasher.update(&[value]);
}

fn write_u32(hasher: &mut Hasher, value: u32) {
    hasher.update(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(names: &[&str]) -> MethodRegistry {
        let mut registry = MethodRegistry::new();
        for name in names {
            registry
                .register(*name, Signature::new([TypeTag::U32]))
                .unwrap();
        }
        registry
    }

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(
            registry_hash(&registry(&["a", "b"])),
            registry_hash(&registry(&["a", "b"]))
        );
    }

    #[test]
    fn hash_depends_on_order() {
        assert_ne!(
            registry_hash(&registry(&["a", "b"])),
            registry_hash(&registry(&["b", "a"]))
        );
    }

    #[test]
    fn hash_depends_on_signature() {
        let mut other = MethodRegistry::new();
        other.register("a", Signature::new([TypeTag::F32])).unwrap();
        assert_ne!(registry_hash(&registry(&["a"])), registry_hash(&other));
    }

    #[test]
    fn name_boundaries_matter() {
        assert_ne!(
            registry_hash(&registry(&["ab", "c"])),
            registry_hash(&registry(&["a", "bc"]))
        );
    }
}
