//! Parameter type signatures.

use std::fmt;
use std::net::SocketAddr;

use crate::error::{CodecError, CodecResult};
use crate::types::{TypeTag, Value};

/// Ordered parameter types of a method or command.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Signature(Vec<TypeTag>);

impl Signature {
    #[must_use]
    pub fn new(tags: impl Into<Vec<TypeTag>>) -> Self {
        Self(tags.into())
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn tags(&self) -> &[TypeTag] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the slots that are carried on the wire.
    pub fn wire_tags(&self) -> impl Iterator<Item = TypeTag> + '_ {
        self.0.iter().copied().filter(|tag| !tag.is_local_only())
    }

    /// Number of slots carried on the wire.
    #[must_use]
    pub fn wire_len(&self) -> usize {
        self.wire_tags().count()
    }

    /// Checks decoded wire parameters against the wire slots.
    pub fn check_wire(&self, params: &[Value]) -> CodecResult<()> {
        check(self.wire_tags(), self.wire_len(), params)
    }

    /// Expands wire parameters to the full list, filling connection slots
    /// with `source`.
    pub fn bind(&self, wire_params: Vec<Value>, source: SocketAddr) -> CodecResult<Vec<Value>> {
        self.check_wire(&wire_params)?;
        let mut wire = wire_params.into_iter();
        let mut out = Vec::with_capacity(self.0.len());
        for tag in &self.0 {
            if tag.is_local_only() {
                out.push(Value::Connection(source));
            } else if let Some(value) = wire.next() {
                out.push(value);
            }
        }
        Ok(out)
    }
}

fn check(
    expected: impl Iterator<Item = TypeTag>,
    expected_len: usize,
    params: &[Value],
) -> CodecResult<()> {
    if expected_len != params.len() {
        return Err(CodecError::ParamCountMismatch {
            expected: expected_len,
            found: params.len(),
        });
    }
    for (index, (expected, value)) in expected.zip(params).enumerate() {
        let found = value.tag();
        if found != expected {
            return Err(CodecError::TypeMismatch {
                index,
                expected,
                found,
            });
        }
    }
    Ok(())
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, tag) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{tag}")?;
        }
        write!(f, ")")
    }
}

impl From<Vec<TypeTag>> for Signature {
    fn from(tags: Vec<TypeTag>) -> Self {
        Self(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> SocketAddr {
        "10.0.0.1:4000".parse().unwrap()
    }

    #[test]
    fn display_lists_tags() {
        let sig = Signature::new([TypeTag::U32, TypeTag::Connection]);
        assert_eq!(sig.to_string(), "(u32, connection)");
    }

    #[test]
    fn wire_tags_skip_connection() {
        let sig = Signature::new([TypeTag::Connection, TypeTag::F32, TypeTag::String]);
        assert_eq!(sig.wire_len(), 2);
        assert_eq!(
            sig.wire_tags().collect::<Vec<_>>(),
            vec![TypeTag::F32, TypeTag::String]
        );
    }

    #[test]
    fn bind_fills_connection_slot() {
        let sig = Signature::new([TypeTag::U8, TypeTag::Connection, TypeTag::Bool]);
        let bound = sig
            .bind(vec![Value::U8(3), Value::Bool(true)], addr())
            .unwrap();
        assert_eq!(
            bound,
            vec![Value::U8(3), Value::Connection(addr()), Value::Bool(true)]
        );
    }

    #[test]
    fn bind_rejects_wrong_count() {
        let sig = Signature::new([TypeTag::U8]);
        assert_eq!(
            sig.bind(vec![], addr()).unwrap_err(),
            CodecError::ParamCountMismatch {
                expected: 1,
                found: 0
            }
        );
    }

    #[test]
    fn check_reports_first_mismatch() {
        let sig = Signature::new([TypeTag::U8, TypeTag::F32]);
        let err = sig
            .check_wire(&[Value::U8(1), Value::String("x".into())])
            .unwrap_err();
        assert_eq!(
            err,
            CodecError::TypeMismatch {
                index: 1,
                expected: TypeTag::F32,
                found: TypeTag::String
            }
        );
    }
}
